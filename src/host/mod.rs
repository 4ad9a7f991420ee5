pub mod app;
pub mod feedback;

pub use app::{FrameOutcome, HostApp, OperatorCommand};
pub use feedback::FrameFeedback;
