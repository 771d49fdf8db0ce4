//! Serial transport layer abstraction.
//!
//! Defines the `SerialTransport` trait for byte-stream communication,
//! allowing different implementations (serialport, mock, etc.).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to open {path}: {message}")]
    OpenFailed { path: String, message: String },

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Device disconnected")]
    Disconnected,

    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Abstract serial transport interface.
///
/// Reads never block for data that has not arrived yet: callers ask how many
/// bytes are waiting and read exactly that many.
pub trait SerialTransport: Send + Sync {
    /// Write all bytes to the port.
    fn write(&self, data: &[u8]) -> Result<usize, TransportError>;

    /// Number of bytes buffered by the port and ready to read.
    fn bytes_available(&self) -> Result<usize, TransportError>;

    /// Read up to `len` buffered bytes.
    fn read(&self, len: usize) -> Result<Vec<u8>, TransportError>;

    /// Drain everything currently buffered.
    fn read_available(&self) -> Result<Vec<u8>, TransportError> {
        match self.bytes_available()? {
            0 => Ok(Vec::new()),
            n => self.read(n),
        }
    }

    /// Port name for diagnostics.
    fn name(&self) -> String;
}
