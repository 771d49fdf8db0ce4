//! Protocol module - AT and OBEX wire formats.

pub mod at;
pub mod constants;
pub mod frame;
pub mod header;
pub mod response;

pub use at::{AtCommand, AtError, AtOutcome, AtRequest};
pub use constants::*;
pub use frame::{FrameError, ObexFrame};
pub use header::{HeaderEncoding, HeaderScan, IncompleteFrame, parse_headers};
pub use response::{ResponseCode, Status};
