//! Chunked transfer drivers.
//!
//! Uploads are sent strictly in sequence, one PUT per chunk, each waiting for
//! the device to acknowledge before the next goes out. Downloads are a single
//! GET whose multi-part continuation is handled by the transceiver.

use tracing::{debug, info};

use crate::events::{LogLevel, SyncEvent, SyncObserver};
use crate::payload::UploadChunks;
use crate::protocol::frame;
use crate::state::TransferOperation;
use crate::transceiver::{Completion, ExchangeError, Transceiver};
use crate::transport::SerialTransport;

/// Send `data` to `name` in chunks of `chunk_size` bytes.
///
/// Returns the number of PUT packets sent.
pub fn upload<T: SerialTransport, O: SyncObserver>(
    xcvr: &Transceiver<'_, T, O>,
    name: &str,
    data: &[u8],
    chunk_size: usize,
) -> Result<usize, ExchangeError> {
    let mut chunks = UploadChunks::new(name, data, chunk_size);
    let total = chunks.total();
    info!(name = %name, bytes = data.len(), chunks = total, "Uploading");

    let mut sent = 0;
    let mut offset = 0u64;
    while let Some(packet) = chunks.next() {
        let packet = packet?;
        let (index, last) = (packet.index, packet.is_last());
        let completion = xcvr.obex(packet.frame, TransferOperation::Upload)?;
        sent += 1;
        offset += packet.chunk_len as u64;

        xcvr.emit(SyncEvent::Progress {
            operation: format!("Upload {name}"),
            current: offset,
            total: data.len() as u64,
        });
        debug!(chunk = index + 1, total, pct = chunks.progress_pct(), "Chunk sent");

        if matches!(completion, Completion::Complete(_)) && !last {
            xcvr.emit(SyncEvent::Log {
                level: LogLevel::Warn,
                message: format!(
                    "Device finished {name} after chunk {} of {total}",
                    index + 1
                ),
            });
            break;
        }
    }

    Ok(sent)
}

/// GET an object, following continuations until the device reports success.
pub fn get_object<T: SerialTransport, O: SyncObserver>(
    xcvr: &Transceiver<'_, T, O>,
    headers: &[u8],
) -> Result<Vec<u8>, ExchangeError> {
    let request = frame::get(headers)?;
    let body = xcvr
        .obex(request, TransferOperation::Download)?
        .into_bytes();
    debug!(bytes = body.len(), "Object received");
    Ok(body)
}

/// Single-packet PUT carrying `headers` with the final bit set.
pub fn put_object<T: SerialTransport, O: SyncObserver>(
    xcvr: &Transceiver<'_, T, O>,
    headers: &[u8],
) -> Result<(), ExchangeError> {
    let request = frame::put(headers, true)?;
    xcvr.obex(request, TransferOperation::Neither)?;
    Ok(())
}
