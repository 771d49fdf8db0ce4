//! OBEX request framing.
//!
//! Every OBEX packet, and every variable-length header inside one, shares the
//! same layout:
//!
//! ```text
//! +--------+-----------------+-----------------+
//! | opcode | length (u16 BE) | payload ...     |
//! +--------+-----------------+-----------------+
//! ```
//!
//! where `length` counts the whole packet including its three-byte preamble.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use thiserror::Error;

use super::constants::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Payload too large for a single frame: {size} bytes, maximum {max}")]
    FrameTooLarge { size: usize, max: usize },
    #[error("Buffer too small: expected {expected}, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },
    #[error("Frame length mismatch: declared {declared}, buffered {actual}")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("Unexpected header id: expected 0x{expected:02X}, got 0x{actual:02X}")]
    UnexpectedHeader { expected: u8, actual: u8 },
    #[error("Name header does not hold UTF-16LE text")]
    InvalidName,
}

/// A single OBEX packet (or variable-length header).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObexFrame {
    pub opcode: u8,
    pub payload: Vec<u8>,
}

impl ObexFrame {
    pub fn new(opcode: u8, payload: Vec<u8>) -> Result<Self, FrameError> {
        if payload.len() > MAX_FRAME_PAYLOAD {
            return Err(FrameError::FrameTooLarge {
                size: payload.len(),
                max: MAX_FRAME_PAYLOAD,
            });
        }
        Ok(Self { opcode, payload })
    }

    /// A frame without payload, e.g. the follow-up `GET` of a multi-part reply.
    pub fn empty(opcode: u8) -> Self {
        Self {
            opcode,
            payload: Vec::new(),
        }
    }

    /// Total packet length as carried in the length field.
    pub fn declared_length(&self) -> u16 {
        (OBEX_PREAMBLE_SIZE + self.payload.len()) as u16
    }

    pub fn is_final(&self) -> bool {
        self.opcode & MASK_FINAL != 0
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; OBEX_PREAMBLE_SIZE];
        buf[0] = self.opcode;
        BigEndian::write_u16(&mut buf[1..OBEX_PREAMBLE_SIZE], self.declared_length());
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Parse a complete packet. The buffer must hold exactly one frame.
    pub fn decode(data: &[u8]) -> Result<Self, FrameError> {
        let declared = declared_length(data).ok_or(FrameError::BufferTooSmall {
            expected: OBEX_PREAMBLE_SIZE,
            actual: data.len(),
        })?;
        if declared != data.len() {
            return Err(FrameError::LengthMismatch {
                declared,
                actual: data.len(),
            });
        }
        Ok(Self {
            opcode: data[0],
            payload: data[OBEX_PREAMBLE_SIZE..].to_vec(),
        })
    }
}

/// Length field of a buffered packet, or `None` if the preamble is incomplete.
pub fn declared_length(buffer: &[u8]) -> Option<usize> {
    if buffer.len() < OBEX_PREAMBLE_SIZE {
        return None;
    }
    Some(BigEndian::read_u16(&buffer[1..OBEX_PREAMBLE_SIZE]) as usize)
}

/// `[opcode][u16 BE 3 + len][payload]`
pub fn message(opcode: u8, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    Ok(ObexFrame::new(opcode, payload.to_vec())?.to_bytes())
}

/// CONNECT request carrying the fixed handshake and any optional headers.
pub fn connect(optional_headers: &[u8]) -> Result<Vec<u8>, FrameError> {
    let mut payload = Vec::with_capacity(4 + optional_headers.len());
    payload.push(CONNECT_VERSION);
    payload.push(CONNECT_FLAGS);
    payload.extend_from_slice(&CONNECT_MAX_PACKET_SIZE.to_be_bytes());
    payload.extend_from_slice(optional_headers);
    message(OPCODE_CONNECT, &payload)
}

/// NAME header: a leading null, the path as UTF-16LE, a trailing null.
pub fn name_header(path: &str) -> Result<Vec<u8>, FrameError> {
    let mut text = Vec::with_capacity(2 + path.len() * 2);
    text.push(0x00);
    for unit in path.encode_utf16() {
        text.extend_from_slice(&unit.to_le_bytes());
    }
    text.push(0x00);
    message(HEADER_NAME, &text)
}

/// Recover the path from a NAME header built by [`name_header`].
pub fn decode_name(header: &[u8]) -> Result<String, FrameError> {
    let frame = ObexFrame::decode(header)?;
    if frame.opcode != HEADER_NAME {
        return Err(FrameError::UnexpectedHeader {
            expected: HEADER_NAME,
            actual: frame.opcode,
        });
    }

    let text = frame
        .payload
        .strip_prefix(&[0x00])
        .and_then(|t| t.strip_suffix(&[0x00]))
        .ok_or(FrameError::InvalidName)?;
    if text.len() % 2 != 0 {
        return Err(FrameError::InvalidName);
    }

    let units: Vec<u16> = text.chunks_exact(2).map(LittleEndian::read_u16).collect();
    String::from_utf16(&units).map_err(|_| FrameError::InvalidName)
}

/// LENGTH header announcing the total object size.
pub fn length_header(total: u32) -> [u8; FIXED4_HEADER_SIZE] {
    let mut header = [0u8; FIXED4_HEADER_SIZE];
    header[0] = HEADER_LENGTH;
    BigEndian::write_u32(&mut header[1..], total);
    header
}

/// TARGET header selecting an OBEX service.
pub fn target_header(service: &[u8]) -> Result<Vec<u8>, FrameError> {
    message(HEADER_TARGET, service)
}

/// TYPE header: null-terminated ASCII MIME type.
pub fn type_header(mime: &str) -> Result<Vec<u8>, FrameError> {
    let mut text = mime.as_bytes().to_vec();
    text.push(0x00);
    message(HEADER_TYPE, &text)
}

pub fn app_parameters_header(params: &[u8]) -> Result<Vec<u8>, FrameError> {
    message(HEADER_APP_PARAMETERS, params)
}

/// BODY header, or END-OF-BODY when `last` is set.
pub fn body_header(chunk: &[u8], last: bool) -> Result<Vec<u8>, FrameError> {
    let id = if last { HEADER_END_OF_BODY } else { HEADER_BODY };
    message(id, chunk)
}

/// Final GET request carrying `headers`.
pub fn get(headers: &[u8]) -> Result<Vec<u8>, FrameError> {
    message(OPCODE_GET | MASK_FINAL, headers)
}

/// PUT request; the final bit marks the last packet of the object.
pub fn put(headers: &[u8], last: bool) -> Result<Vec<u8>, FrameError> {
    let opcode = if last { OPCODE_PUT | MASK_FINAL } else { OPCODE_PUT };
    message(opcode, headers)
}

/// SETPATH into `folder`.
pub fn set_path(flags: u8, folder: &str) -> Result<Vec<u8>, FrameError> {
    let mut payload = vec![flags, SETPATH_CONSTANTS];
    payload.extend_from_slice(&name_header(folder)?);
    message(OPCODE_SETPATH, &payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_layout() {
        let bytes = message(0x83, b"abc").unwrap();
        assert_eq!(bytes, vec![0x83, 0x00, 0x06, b'a', b'b', b'c']);
    }

    #[test]
    fn test_declared_length_matches_payload() {
        for len in [0usize, 1, 255, 256, 958, MAX_FRAME_PAYLOAD] {
            let payload = vec![0xAB; len];
            let bytes = message(OPCODE_PUT, &payload).unwrap();
            assert_eq!(BigEndian::read_u16(&bytes[1..3]) as usize, 3 + len);
            assert_eq!(bytes.len(), 3 + len);
        }
    }

    #[test]
    fn test_decode_inverts_message() {
        for (opcode, payload) in [
            (OPCODE_CONNECT, vec![]),
            (OPCODE_GET | MASK_FINAL, b"payload".to_vec()),
            (HEADER_BODY, vec![0u8; 1000]),
        ] {
            let bytes = message(opcode, &payload).unwrap();
            let frame = ObexFrame::decode(&bytes).unwrap();
            assert_eq!(frame.opcode, opcode);
            assert_eq!(frame.payload, payload);
        }
    }

    #[test]
    fn test_frame_too_large() {
        let payload = vec![0u8; MAX_FRAME_PAYLOAD + 1];
        assert_eq!(
            message(OPCODE_PUT, &payload),
            Err(FrameError::FrameTooLarge {
                size: MAX_FRAME_PAYLOAD + 1,
                max: MAX_FRAME_PAYLOAD
            })
        );
    }

    #[test]
    fn test_connect_handshake() {
        let target = target_header(SERVICE_DES_SYNC).unwrap();
        let bytes = connect(&target).unwrap();
        assert_eq!(&bytes[..7], &[0x80, 0x00, 0x1A, 0x10, 0x00, 0xFF, 0xFE]);
        assert_eq!(&bytes[7..10], &[HEADER_TARGET, 0x00, 0x13]);
        assert_eq!(&bytes[10..], SERVICE_DES_SYNC);
    }

    #[test]
    fn test_name_header_encoding() {
        let header = name_header("abc").unwrap();
        assert_eq!(
            header,
            vec![0x01, 0x00, 0x0B, 0x00, b'a', 0x00, b'b', 0x00, b'c', 0x00, 0x00]
        );
        assert_eq!(decode_name(&header).unwrap(), "abc");
    }

    #[test]
    fn test_name_header_roundtrip_path() {
        let header = name_header(PATH_PHONEBOOK).unwrap();
        assert_eq!(decode_name(&header).unwrap(), PATH_PHONEBOOK);
    }

    #[test]
    fn test_decode_name_rejects_other_headers() {
        let header = target_header(b"x").unwrap();
        assert!(matches!(
            decode_name(&header),
            Err(FrameError::UnexpectedHeader { .. })
        ));
    }

    #[test]
    fn test_length_header() {
        assert_eq!(length_header(2000), [0xC3, 0x00, 0x00, 0x07, 0xD0]);
    }

    #[test]
    fn test_type_header_is_null_terminated() {
        let header = type_header(MIME_FOLDER_LISTING).unwrap();
        assert_eq!(header[0], HEADER_TYPE);
        assert_eq!(*header.last().unwrap(), 0x00);
        assert_eq!(header.len(), 3 + MIME_FOLDER_LISTING.len() + 1);
    }

    #[test]
    fn test_set_path_layout() {
        let bytes = set_path(SETPATH_DONT_CREATE, "/Sounds").unwrap();
        assert_eq!(bytes[0], OPCODE_SETPATH);
        assert_eq!(&bytes[3..5], &[SETPATH_DONT_CREATE, SETPATH_CONSTANTS]);
        assert_eq!(decode_name(&bytes[5..]).unwrap(), "/Sounds");
    }
}
