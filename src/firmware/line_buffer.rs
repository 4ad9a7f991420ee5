/// Result of feeding one byte to a [`LineAccumulator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// Byte stored (or ignored); no line finished yet
    Continue,
    /// A terminator closed a non-empty line; raw bytes, terminator stripped
    Complete(Vec<u8>),
    /// The line outgrew the buffer and was dropped; `observed` bytes had arrived
    Overflow { observed: usize },
}

/// Bounded accumulator turning a byte stream into lines.
///
/// `\n` and `\r` both terminate a line, empty lines are dropped. Once a line
/// overflows, the remaining bytes up to its terminator are skipped.
#[derive(Debug)]
pub struct LineAccumulator {
    buffer: Vec<u8>,
    capacity: usize,
    discarding: bool,
}

impl LineAccumulator {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
            discarding: false,
        }
    }

    pub fn push(&mut self, byte: u8) -> LineEvent {
        if byte == b'\n' || byte == b'\r' {
            if self.discarding {
                self.discarding = false;
                return LineEvent::Continue;
            }
            if self.buffer.is_empty() {
                return LineEvent::Continue;
            }
            return LineEvent::Complete(std::mem::take(&mut self.buffer));
        }

        if self.discarding {
            return LineEvent::Continue;
        }

        if self.buffer.len() >= self.capacity {
            let observed = self.buffer.len() + 1;
            self.buffer.clear();
            self.discarding = true;
            return LineEvent::Overflow { observed };
        }

        self.buffer.push(byte);
        LineEvent::Continue
    }

    /// Drop any partial line
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
