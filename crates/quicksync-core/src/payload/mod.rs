//! Payload handling module.
//!
//! Provides upload chunking and decoding of the objects the handset returns.

pub mod listing;
pub mod memory;
pub mod upload;
pub mod vcard;

pub use listing::{FileEntry, FolderListing, ListingError};
pub use memory::{MemoryStatus, parse_memory_response};
pub use upload::{UploadChunks, UploadPacket};
pub use vcard::{normalize_line_endings, split_vcards};
