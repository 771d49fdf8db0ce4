//! OBEX response classification.
//!
//! Given everything buffered since the last reset, decide whether the
//! exchange needs more bytes, must pull the next part of a multi-part reply,
//! has had an upload chunk acknowledged, is complete, or was rejected.

use std::fmt;

use tracing::{debug, trace};

use crate::protocol::constants::{MASK_FINAL, OBEX_PREAMBLE_SIZE, OPCODE_GET};
use crate::protocol::frame::{ObexFrame, declared_length};
use crate::protocol::header::parse_headers;
use crate::protocol::response::{ResponseCode, Status};

/// Selects the continuation policy applied to a `Continue` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferOperation {
    Download,
    Upload,
    #[default]
    Neither,
}

impl fmt::Display for TransferOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferOperation::Download => write!(f, "DOWNLOAD"),
            TransferOperation::Upload => write!(f, "UPLOAD"),
            TransferOperation::Neither => write!(f, "NEITHER"),
        }
    }
}

/// Outcome of classifying a buffered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObexVerdict {
    /// Keep reading; the buffer must not be reset.
    Incomplete,
    /// More bytes buffered than the frame declares.
    Malformed { declared: usize, actual: usize },
    /// A PUT chunk was accepted; send the next one after resetting the buffer.
    ChunkAcknowledged,
    /// Write `follow_up`, reset the buffer and keep reading.
    ContinueExchange { follow_up: Vec<u8> },
    /// The accumulator holds the full response.
    Complete,
    /// The device rejected the request.
    DeviceError(ResponseCode),
}

impl ObexVerdict {
    /// Whether the transceiver has to clear its buffer before the next read.
    pub fn resets_buffer(&self) -> bool {
        matches!(
            self,
            ObexVerdict::ChunkAcknowledged | ObexVerdict::ContinueExchange { .. }
        )
    }
}

/// Classify `buffer`, appending any body fragments to `results`.
///
/// Fragments are only appended once the frame is complete, so a verdict of
/// `Incomplete` never leaves partial data in the accumulator.
pub fn classify(
    buffer: &[u8],
    operation: TransferOperation,
    results: &mut Vec<Vec<u8>>,
) -> ObexVerdict {
    let Some(declared) = declared_length(buffer) else {
        return ObexVerdict::Incomplete;
    };
    if buffer.len() < declared {
        trace!(declared, buffered = buffer.len(), "Waiting for rest of frame");
        return ObexVerdict::Incomplete;
    }
    if buffer.len() > declared {
        return ObexVerdict::Malformed {
            declared,
            actual: buffer.len(),
        };
    }

    let code = ResponseCode::new(buffer[0]);
    let headers = &buffer[OBEX_PREAMBLE_SIZE..];

    match code.status() {
        Some(Status::Continue) if !code.is_final() => ObexVerdict::Incomplete,
        Some(Status::Continue) if operation == TransferOperation::Upload => {
            debug!("Chunk acknowledged");
            ObexVerdict::ChunkAcknowledged
        }
        Some(Status::Continue) => match parse_headers(headers) {
            Ok(scan) => {
                results.extend(scan.fragments);
                debug!(parts = results.len(), "Requesting next part");
                ObexVerdict::ContinueExchange {
                    follow_up: ObexFrame::empty(OPCODE_GET | MASK_FINAL).to_bytes(),
                }
            }
            Err(_) => ObexVerdict::Incomplete,
        },
        Some(Status::Success) => match parse_headers(headers) {
            Ok(scan) => {
                results.extend(scan.fragments);
                ObexVerdict::Complete
            }
            Err(_) => ObexVerdict::Incomplete,
        },
        _ => ObexVerdict::DeviceError(code),
    }
}
