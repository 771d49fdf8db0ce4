//! Upload chunk planning.
//!
//! An object larger than one chunk is sent as a series of PUT packets. Only
//! the first carries NAME and LENGTH, only the last carries END-OF-BODY and
//! the final bit.

use crate::protocol::frame::{self, FrameError};

/// One PUT packet of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPacket {
    /// 0-based chunk index.
    pub index: usize,
    /// Number of chunks in the upload.
    pub total: usize,
    /// Payload bytes carried by this packet.
    pub chunk_len: usize,
    /// Encoded PUT request.
    pub frame: Vec<u8>,
}

impl UploadPacket {
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }
}

/// Iterator over the PUT packets for one object.
#[derive(Debug)]
pub struct UploadChunks<'a> {
    name: &'a str,
    data: &'a [u8],
    chunk_size: usize,
    current: usize,
    total: usize,
}

impl<'a> UploadChunks<'a> {
    /// Plan the upload of `data` to `name`. A zero `chunk_size` is treated as 1.
    pub fn new(name: &'a str, data: &'a [u8], chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        // An empty object still needs one packet to carry NAME and END-OF-BODY.
        let total = data.len().div_ceil(chunk_size).max(1);
        Self {
            name,
            data,
            chunk_size,
            current: 0,
            total,
        }
    }

    /// Get total number of chunks.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Get current chunk index (0-based).
    pub fn current(&self) -> usize {
        self.current
    }

    /// Progress as percentage.
    pub fn progress_pct(&self) -> u8 {
        ((self.current * 100) / self.total) as u8
    }

    fn build(&self, index: usize) -> Result<UploadPacket, FrameError> {
        let start = (index * self.chunk_size).min(self.data.len());
        let end = (start + self.chunk_size).min(self.data.len());
        let chunk = &self.data[start..end];
        let last = index + 1 == self.total;

        let mut headers = Vec::with_capacity(chunk.len() + 64);
        if index == 0 {
            headers.extend(frame::name_header(self.name)?);
            let total_len = u32::try_from(self.data.len()).map_err(|_| {
                FrameError::FrameTooLarge {
                    size: self.data.len(),
                    max: u32::MAX as usize,
                }
            })?;
            headers.extend(frame::length_header(total_len));
        }
        headers.extend(frame::body_header(chunk, last)?);

        Ok(UploadPacket {
            index,
            total: self.total,
            chunk_len: chunk.len(),
            frame: frame::put(&headers, last)?,
        })
    }
}

impl Iterator for UploadChunks<'_> {
    type Item = Result<UploadPacket, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.total {
            return None;
        }
        let packet = self.build(self.current);
        self.current += 1;
        Some(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::*;
    use crate::protocol::frame::{ObexFrame, declared_length, decode_name};

    fn packets(name: &str, data: &[u8], chunk_size: usize) -> Vec<UploadPacket> {
        UploadChunks::new(name, data, chunk_size)
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_three_chunk_upload() {
        let data = vec![0x5Au8; 2000];
        let plan = packets("ring.mid", &data, UPLOAD_CHUNK_SIZE);

        assert_eq!(plan.len(), 3);
        assert_eq!(
            plan.iter().map(|p| p.chunk_len).collect::<Vec<_>>(),
            vec![958, 958, 84]
        );

        let first = ObexFrame::decode(&plan[0].frame).unwrap();
        assert_eq!(first.opcode, OPCODE_PUT);
        let name_len = declared_length(&first.payload).unwrap();
        assert_eq!(decode_name(&first.payload[..name_len]).unwrap(), "ring.mid");
        assert_eq!(
            &first.payload[name_len..name_len + 5],
            &[HEADER_LENGTH, 0x00, 0x00, 0x07, 0xD0]
        );
        assert_eq!(first.payload[name_len + 5], HEADER_BODY);

        let middle = ObexFrame::decode(&plan[1].frame).unwrap();
        assert_eq!(middle.opcode, OPCODE_PUT);
        assert_eq!(middle.payload[0], HEADER_BODY);
        assert_eq!(middle.payload.len(), 3 + 958);

        let last = ObexFrame::decode(&plan[2].frame).unwrap();
        assert_eq!(last.opcode, OPCODE_PUT | MASK_FINAL);
        assert_eq!(last.payload[0], HEADER_END_OF_BODY);
        assert_eq!(last.payload.len(), 3 + 84);
        assert!(plan[2].is_last());
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let data = vec![1u8; UPLOAD_CHUNK_SIZE * 2];
        let plan = packets("a", &data, UPLOAD_CHUNK_SIZE);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].chunk_len, UPLOAD_CHUNK_SIZE);
    }

    #[test]
    fn test_single_chunk_is_final_and_named() {
        let plan = packets("x.txt", b"hello", UPLOAD_CHUNK_SIZE);
        assert_eq!(plan.len(), 1);

        let frame = ObexFrame::decode(&plan[0].frame).unwrap();
        assert!(frame.is_final());
        assert_eq!(frame.payload[0], HEADER_NAME);
        assert!(
            frame
                .payload
                .ends_with(&[HEADER_END_OF_BODY, 0x00, 0x08, b'h', b'e', b'l', b'l', b'o'])
        );
    }

    #[test]
    fn test_empty_payload_sends_one_final_packet() {
        let plan = packets("empty", &[], UPLOAD_CHUNK_SIZE);
        assert_eq!(plan.len(), 1);

        let frame = ObexFrame::decode(&plan[0].frame).unwrap();
        assert_eq!(frame.opcode, OPCODE_PUT | MASK_FINAL);
        assert!(
            frame
                .payload
                .ends_with(&[HEADER_LENGTH, 0, 0, 0, 0, HEADER_END_OF_BODY, 0x00, 0x03])
        );
    }

    #[test]
    fn test_progress() {
        let data = vec![0u8; 10];
        let mut chunks = UploadChunks::new("p", &data, 5);
        assert_eq!(chunks.total(), 2);
        assert_eq!(chunks.progress_pct(), 0);
        chunks.next();
        assert_eq!(chunks.current(), 1);
        assert_eq!(chunks.progress_pct(), 50);
        chunks.next();
        assert_eq!(chunks.progress_pct(), 100);
        assert!(chunks.next().is_none());
    }
}
