//! serialport-based transport implementation.

use std::io::{Read, Write};
use std::sync::Mutex;
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info, instrument};

use super::traits::{SerialTransport, TransportError};

/// Transport over a serial character device such as `/dev/ttyACM0`.
pub struct SerialPortTransport {
    port: Mutex<Box<dyn SerialPort>>,
    path: String,
}

impl SerialPortTransport {
    /// Open `path` at `baud`, using `timeout` for both reads and writes.
    #[instrument(level = "info", fields(timeout_ms = timeout.as_millis() as u64))]
    pub fn open(path: &str, baud: u32, timeout: Duration) -> Result<Self, TransportError> {
        let port = serialport::new(path, baud)
            .timeout(timeout)
            .open()
            .map_err(|e| TransportError::OpenFailed {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        let name = port.name().unwrap_or_else(|| path.to_string());
        info!(port = %name, baud, "Connected");

        Ok(Self {
            port: Mutex::new(port),
            path: path.to_string(),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Box<dyn SerialPort>>, TransportError> {
        self.port
            .lock()
            .map_err(|_| TransportError::ReadFailed("Port lock poisoned".into()))
    }
}

impl SerialTransport for SerialPortTransport {
    #[instrument(skip(self, data), fields(len = data.len()))]
    fn write(&self, data: &[u8]) -> Result<usize, TransportError> {
        let mut port = self.lock()?;
        port.write_all(data)
            .map_err(|e| TransportError::WriteFailed(e.to_string()))?;
        port.flush()
            .map_err(|e| TransportError::WriteFailed(e.to_string()))?;

        debug!(bytes_written = data.len(), "Write complete");
        Ok(data.len())
    }

    fn bytes_available(&self) -> Result<usize, TransportError> {
        let port = self.lock()?;
        let n = port
            .bytes_to_read()
            .map_err(|e| TransportError::ReadFailed(e.to_string()))?;
        Ok(n as usize)
    }

    #[instrument(skip(self), level = "trace")]
    fn read(&self, len: usize) -> Result<Vec<u8>, TransportError> {
        let mut port = self.lock()?;
        let mut buf = vec![0u8; len];
        let n = port.read(&mut buf).map_err(|e| match e.kind() {
            std::io::ErrorKind::TimedOut => TransportError::Timeout {
                timeout_ms: port.timeout().as_millis() as u64,
            },
            std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::NotConnected => {
                TransportError::Disconnected
            }
            _ => TransportError::ReadFailed(e.to_string()),
        })?;

        buf.truncate(n);
        Ok(buf)
    }

    fn name(&self) -> String {
        self.path.clone()
    }
}
