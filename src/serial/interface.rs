use std::io::{Read, Write};
use std::time::{Duration, Instant};

use serialport::{SerialPort, SerialPortType};

use super::{Result, SerialDeviceInfo, SerialError};
use crate::hand::FingerState;
use crate::link::{self, BAUD_RATE};

/// Device-side lines longer than this without a terminator are dropped
const MAX_PENDING_BYTES: usize = 4096;

/// Byte-level access to an open port. Implemented for real serial ports and for
/// in-memory doubles in tests.
pub trait SerialPortIO: Send {
    fn send_data(&mut self, data: &[u8]) -> Result<usize>;

    /// Read whatever is already buffered without blocking; `Ok(0)` when idle
    fn read_data(&mut self, buffer: &mut [u8]) -> Result<usize>;

    fn flush(&mut self) -> Result<()>;

    fn clear_buffers(&mut self) -> Result<()> {
        Ok(())
    }
}

impl SerialPortIO for Box<dyn SerialPort> {
    fn send_data(&mut self, data: &[u8]) -> Result<usize> {
        self.write_all(data)?;
        Ok(data.len())
    }

    fn read_data(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let available = self.bytes_to_read()? as usize;
        if available == 0 {
            return Ok(0);
        }
        let len = available.min(buffer.len());
        match self.read(&mut buffer[..len]) {
            Ok(n) => Ok(n),
            Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(SerialError::IoError(e)),
        }
    }

    fn flush(&mut self) -> Result<()> {
        Write::flush(self)?;
        Ok(())
    }

    fn clear_buffers(&mut self) -> Result<()> {
        self.clear(serialport::ClearBuffer::All)?;
        Ok(())
    }
}

/// Parameters for opening the link to the LED controller
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub port: String,
    pub baud_rate: u32,
    /// The ESP32 resets when the port opens; wait this long before talking to it
    pub settle_ms: u64,
    /// How long to wait for the handshake reply
    pub reply_timeout_ms: u64,
}

impl ConnectOptions {
    pub fn new(port: &str) -> Self {
        Self {
            port: port.to_string(),
            baud_rate: BAUD_RATE,
            settle_ms: 2000,
            reply_timeout_ms: 1000,
        }
    }
}

/// Host end of the serial link
pub struct SerialInterface {
    port: Option<Box<dyn SerialPortIO>>,
    port_name: Option<String>,
    partial: Vec<u8>,
}

impl SerialInterface {
    pub fn new() -> Self {
        Self {
            port: None,
            port_name: None,
            partial: Vec::new(),
        }
    }

    /// Wrap an already open byte stream
    pub fn from_io(port_name: &str, io: Box<dyn SerialPortIO>) -> Self {
        Self {
            port: Some(io),
            port_name: Some(port_name.to_string()),
            partial: Vec::new(),
        }
    }

    /// List every serial port the OS knows about
    pub fn list_ports() -> Result<Vec<SerialDeviceInfo>> {
        let ports = serialport::available_ports()?;
        let devices = ports
            .into_iter()
            .map(|port| match port.port_type {
                SerialPortType::UsbPort(usb_info) => SerialDeviceInfo {
                    port_name: port.port_name,
                    description: usb_info.product.clone().unwrap_or_else(|| "USB serial".to_string()),
                    vid: Some(usb_info.vid),
                    pid: Some(usb_info.pid),
                    serial_number: usb_info.serial_number,
                    manufacturer: usb_info.manufacturer,
                    product: usb_info.product,
                },
                other => SerialDeviceInfo {
                    port_name: port.port_name,
                    description: match other {
                        SerialPortType::PciPort => "PCI serial".to_string(),
                        SerialPortType::BluetoothPort => "Bluetooth serial".to_string(),
                        _ => "Serial port".to_string(),
                    },
                    vid: None,
                    pid: None,
                    serial_number: None,
                    manufacturer: None,
                    product: None,
                },
            })
            .collect();
        Ok(devices)
    }

    /// Try to open and immediately release a port to see whether it is free
    pub fn probe(port_name: &str, baud_rate: u32) -> Result<()> {
        serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(1000))
            .open()
            .map(drop)
            .map_err(|e| SerialError::port_unavailable(port_name, e))
    }

    /// Open the port, wait for the board to boot and exchange one handshake message.
    ///
    /// Returns the first line the device answered with, if any.
    pub fn connect(&mut self, options: &ConnectOptions) -> Result<Option<String>> {
        self.disconnect();

        let port = serialport::new(&options.port, options.baud_rate)
            .timeout(Duration::from_millis(1000))
            .open()
            .map_err(|e| SerialError::port_unavailable(&options.port, e))?;

        self.port = Some(Box::new(port));
        self.port_name = Some(options.port.clone());
        log::info!("Opened {} at {} baud", options.port, options.baud_rate);

        self.handshake(options)
    }

    /// Clear stale bytes, let the board settle, then send an all-off state
    pub fn handshake(&mut self, options: &ConnectOptions) -> Result<Option<String>> {
        self.io()?.clear_buffers()?;
        self.partial.clear();

        if options.settle_ms > 0 {
            log::info!("Waiting for device to initialize...");
            std::thread::sleep(Duration::from_millis(options.settle_ms));
        }

        self.send_state(&FingerState::ALL_CLOSED)?;
        match self.read_line(Duration::from_millis(options.reply_timeout_ms)) {
            Ok(line) => {
                log::info!("Device response: {}", line);
                Ok(Some(line))
            }
            Err(SerialError::Timeout) => {
                log::warn!("No handshake reply from {}", options.port);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Disconnect from the current device
    pub fn disconnect(&mut self) {
        if self.port.take().is_some() {
            if let Some(name) = &self.port_name {
                log::info!("Disconnecting from {}", name);
            }
        }
        self.partial.clear();
    }

    pub fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    fn io(&mut self) -> Result<&mut Box<dyn SerialPortIO>> {
        self.port.as_mut().ok_or(SerialError::NotConnected)
    }

    /// Write one finger-state message.
    ///
    /// A failed write drops the connection; reconnecting is left to the operator.
    pub fn send_state(&mut self, state: &FingerState) -> Result<usize> {
        let line = link::encode_line(state);
        let name = self.port_name.clone().unwrap_or_default();
        let written = {
            let port = self.io()?;
            port.send_data(line.as_bytes()).and_then(|n| port.flush().map(|_| n))
        };
        match written {
            Ok(n) => {
                log::debug!("Sent: {} ({} bytes)", line.trim_end(), n);
                Ok(n)
            }
            Err(e) => {
                self.port = None;
                self.partial.clear();
                Err(SerialError::port_unavailable(&name, e))
            }
        }
    }

    /// Validate a textual state such as `"10110"` and send it
    pub fn send_raw(&mut self, text: &str) -> Result<usize> {
        let state = link::decode(text.trim().as_bytes())?;
        self.send_state(&state)
    }

    /// Collect complete lines the device has written so far (non-blocking)
    pub fn poll_lines(&mut self) -> Result<Vec<String>> {
        let mut buffer = [0u8; 512];
        loop {
            let n = self.io()?.read_data(&mut buffer)?;
            if n == 0 {
                break;
            }
            self.partial.extend_from_slice(&buffer[..n]);
        }

        let mut lines = Vec::new();
        while let Some(pos) = self.partial.iter().position(|b| *b == b'\n' || *b == b'\r') {
            let raw: Vec<u8> = self.partial.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]).trim().to_string();
            if !line.is_empty() {
                lines.push(line);
            }
        }

        if self.partial.len() > MAX_PENDING_BYTES {
            log::warn!("Dropping {} bytes of unterminated device output", self.partial.len());
            self.partial.clear();
        }
        Ok(lines)
    }

    /// Wait up to `timeout` for the next complete line
    pub fn read_line(&mut self, timeout: Duration) -> Result<String> {
        let deadline = Instant::now() + timeout;
        let mut pending: Vec<String> = Vec::new();
        loop {
            pending.extend(self.poll_lines()?);
            if !pending.is_empty() {
                let first = pending.remove(0);
                // Requeue the rest so callers polling afterwards still see them.
                for line in pending.into_iter().rev() {
                    let mut bytes = line.into_bytes();
                    bytes.push(b'\n');
                    self.partial.splice(0..0, bytes);
                }
                return Ok(first);
            }
            if Instant::now() >= deadline {
                return Err(SerialError::Timeout);
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Default for SerialInterface {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Loopback {
        written: Arc<Mutex<Vec<u8>>>,
        incoming: Arc<Mutex<Vec<u8>>>,
        fail_writes: bool,
    }

    impl SerialPortIO for Loopback {
        fn send_data(&mut self, data: &[u8]) -> Result<usize> {
            if self.fail_writes {
                return Err(SerialError::IoError(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged")));
            }
            self.written.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }

        fn read_data(&mut self, buffer: &mut [u8]) -> Result<usize> {
            let mut incoming = self.incoming.lock().unwrap();
            let n = incoming.len().min(buffer.len());
            buffer[..n].copy_from_slice(&incoming[..n]);
            incoming.drain(..n);
            Ok(n)
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_send_state_writes_one_line() {
        let io = Loopback::default();
        let mut link = SerialInterface::from_io("loop", Box::new(io.clone()));
        let n = link.send_state(&FingerState::from_array([true, false, true, true, false])).unwrap();
        assert_eq!(n, 6);
        assert_eq!(io.written.lock().unwrap().as_slice(), b"10110\n");
    }

    #[test]
    fn test_send_raw_validates_before_writing() {
        let io = Loopback::default();
        let mut link = SerialInterface::from_io("loop", Box::new(io.clone()));
        assert!(matches!(link.send_raw("1012"), Err(SerialError::InvalidMessage(_))));
        assert!(io.written.lock().unwrap().is_empty());
        link.send_raw(" 11111 ").unwrap();
        assert_eq!(io.written.lock().unwrap().as_slice(), b"11111\n");
    }

    #[test]
    fn test_write_failure_drops_connection() {
        let io = Loopback { fail_writes: true, ..Default::default() };
        let mut link = SerialInterface::from_io("COM8", Box::new(io));
        let err = link.send_state(&FingerState::ALL_OPEN).unwrap_err();
        assert!(matches!(err, SerialError::PortUnavailable { ref port, .. } if port == "COM8"));
        assert!(!link.is_connected());
        assert!(matches!(link.send_state(&FingerState::ALL_OPEN), Err(SerialError::NotConnected)));
    }

    #[test]
    fn test_poll_lines_splits_and_keeps_partial() {
        let io = Loopback::default();
        io.incoming.lock().unwrap().extend_from_slice(b"Received: 10110\r\nOK: LEDs upd");
        let mut link = SerialInterface::from_io("loop", Box::new(io.clone()));
        assert_eq!(link.poll_lines().unwrap(), vec!["Received: 10110".to_string()]);

        io.incoming.lock().unwrap().extend_from_slice(b"ated [10110]\n");
        assert_eq!(link.poll_lines().unwrap(), vec!["OK: LEDs updated [10110]".to_string()]);
    }

    #[test]
    fn test_read_line_keeps_following_lines() {
        let io = Loopback::default();
        io.incoming.lock().unwrap().extend_from_slice(b"first\nsecond\nthird\n");
        let mut link = SerialInterface::from_io("loop", Box::new(io));
        assert_eq!(link.read_line(Duration::from_millis(50)).unwrap(), "first");
        assert_eq!(link.poll_lines().unwrap(), vec!["second".to_string(), "third".to_string()]);
        assert!(matches!(link.read_line(Duration::from_millis(20)), Err(SerialError::Timeout)));
    }

    #[test]
    fn test_handshake_sends_all_off() {
        let io = Loopback::default();
        io.incoming.lock().unwrap().extend_from_slice(b"Received: 00000\n");
        let mut link = SerialInterface::from_io("loop", Box::new(io.clone()));
        let options = ConnectOptions { settle_ms: 0, reply_timeout_ms: 50, ..ConnectOptions::new("loop") };
        let reply = link.handshake(&options).unwrap();
        assert_eq!(reply.as_deref(), Some("Received: 00000"));
        assert_eq!(io.written.lock().unwrap().as_slice(), b"00000\n");
    }
}
