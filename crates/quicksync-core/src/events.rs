//! Event system for UI decoupling.
//!
//! Lets the CLI (or any other front end) follow serial traffic and operation
//! progress without the core knowing how it is presented.

use std::fmt;

/// Log level for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Where a session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Plain AT command mode.
    Command,
    /// Switching the handset into OBEX mode.
    EnteringObex,
    /// OBEX CONNECT to the desktop-sync service.
    Connecting,
    /// Running the requested OBEX operation.
    Transfer,
    /// Escaping back to AT mode and resetting.
    LeavingObex,
    /// Operation finished.
    Complete,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPhase::Command => write!(f, "AT Command"),
            SyncPhase::EnteringObex => write!(f, "Entering OBEX"),
            SyncPhase::Connecting => write!(f, "Connecting"),
            SyncPhase::Transfer => write!(f, "Transfer"),
            SyncPhase::LeavingObex => write!(f, "Leaving OBEX"),
            SyncPhase::Complete => write!(f, "Complete"),
        }
    }
}

/// Events emitted while talking to the handset.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Serial port opened.
    Connected { port: String },
    /// Phase changed.
    PhaseChanged { from: SyncPhase, to: SyncPhase },
    /// Progress update for current operation.
    Progress {
        operation: String,
        current: u64,
        total: u64,
    },
    /// Log message.
    Log { level: LogLevel, message: String },
    /// Bytes sent or received on the serial line.
    Packet {
        direction: PacketDirection,
        data: Vec<u8>,
    },
    /// A contact from a batch import was stored.
    ContactCreated { index: usize },
    /// Operation completed successfully.
    Complete,
}

/// Serial traffic direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketDirection {
    Tx, // Host -> Device
    Rx, // Device -> Host
}

impl fmt::Display for PacketDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketDirection::Tx => write!(f, "SEND"),
            PacketDirection::Rx => write!(f, "RECEIVE"),
        }
    }
}

/// Observer trait for receiving sync events.
///
/// Implement this trait in your UI layer to receive updates.
pub trait SyncObserver: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &SyncEvent);
}

/// No-op observer that discards all events.
pub struct NullObserver;

impl SyncObserver for NullObserver {
    fn on_event(&self, _event: &SyncEvent) {}
}

/// Render bytes as text, escaping anything outside printable ASCII.
pub fn escape_ascii(data: &[u8]) -> String {
    data.escape_ascii().to_string()
}

/// Lowercase hex without separators.
pub fn to_hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

/// Observer that logs events using tracing.
///
/// Traffic is logged escaped at debug level and as hex at trace level.
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn on_event(&self, event: &SyncEvent) {
        match event {
            SyncEvent::Connected { port } => {
                tracing::info!(port = %port, "Connected");
            }
            SyncEvent::PhaseChanged { from, to } => {
                tracing::debug!(from = %from, to = %to, "Phase changed");
            }
            SyncEvent::Progress {
                operation,
                current,
                total,
            } => {
                let pct = if *total > 0 {
                    (*current * 100) / *total
                } else {
                    100
                };
                tracing::debug!(operation = %operation, progress = %format!("{}%", pct), "Progress");
            }
            SyncEvent::Log { level, message } => match level {
                LogLevel::Trace => tracing::trace!("{}", message),
                LogLevel::Debug => tracing::debug!("{}", message),
                LogLevel::Info => tracing::info!("{}", message),
                LogLevel::Warn => tracing::warn!("{}", message),
                LogLevel::Error => tracing::error!("{}", message),
            },
            SyncEvent::Packet { direction, data } => {
                tracing::trace!(dir = %direction, hex = %to_hex(data), len = data.len());
                tracing::debug!(dir = %direction, "{}", escape_ascii(data));
            }
            SyncEvent::ContactCreated { index } => {
                tracing::info!("Created contact #{}", index);
            }
            SyncEvent::Complete => {
                tracing::debug!("Operation complete");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_ascii() {
        assert_eq!(escape_ascii(b"OK\r\n"), "OK\\r\\n");
        assert_eq!(escape_ascii(&[0xA0, 0x00, 0x03]), "\\xa0\\x00\\x03");
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(&[0x83, 0x00, 0x03]), "830003");
        assert_eq!(to_hex(&[]), "");
    }
}
