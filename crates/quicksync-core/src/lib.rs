//! QuickSync-Core: AT and OBEX client for Gigaset handsets.
//!
//! Gigaset DECT handsets expose a serial port that speaks the AT command set
//! and, after `AT^SQWE=3`, tunnels OBEX for phonebook and file transfer.
//!
//! # Architecture
//!
//! The crate is organized into layers:
//!
//! - **Protocol**: AT command catalog, OBEX framing, header parsing, response codes
//! - **State**: OBEX response classifier
//! - **Transport**: Serial communication abstraction (serialport, mock)
//! - **Transceiver**: Write/poll/classify loop for one exchange
//! - **Transfer**: Chunked upload and multi-part download drivers
//! - **Payload**: Folder listings, memory status, vCard batches
//! - **Events**: Observer pattern for UI decoupling
//! - **Session**: High-level device operations
//!
//! # Example
//!
//! ```no_run
//! use quicksync_core::session::{Session, SessionConfig};
//!
//! let session = Session::open(SessionConfig::default())?;
//! let vcf = session.get_contacts()?;
//! println!("{vcf}");
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod events;
pub mod payload;
pub mod protocol;
pub mod session;
pub mod state;
pub mod transceiver;
pub mod transfer;
pub mod transport;

// Re-exports for convenience
pub use events::{LogLevel, NullObserver, SyncEvent, SyncObserver, SyncPhase, TracingObserver};
pub use payload::{FileEntry, FolderListing, MemoryStatus};
pub use protocol::{AtCommand, AtRequest, ResponseCode};
pub use session::{InfoItem, Session, SessionConfig, StorageReport, Timings};
pub use state::{ObexVerdict, TransferOperation};
pub use transceiver::{Completion, ExchangeError, Transceiver, WaitPolicy};
pub use transport::{MockTransport, SerialPortTransport, SerialTransport, TransportError};
