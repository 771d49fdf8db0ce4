//! OBEX response code parsing.
//!
//! The leading byte of every OBEX response carries the final flag in its top
//! bit and an HTTP-inspired status in the remaining seven bits.

use std::fmt;

use super::constants::{MASK_FINAL, MASK_NOT_FINAL};

/// Known response statuses (final bit stripped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    // HTTP 1xx
    Continue = 0x10,

    // HTTP 2xx
    Success = 0x20,
    Created = 0x21,
    Accepted = 0x22,
    NonAuthoritative = 0x23,
    NoContent = 0x24,
    ResetContent = 0x25,
    PartialContent = 0x26,

    // HTTP 3xx
    MultipleChoices = 0x30,
    MovedPermanently = 0x31,
    MovedTemporarily = 0x32,
    SeeOther = 0x33,
    NotModified = 0x34,
    UseProxy = 0x35,

    // HTTP 4xx
    BadRequest = 0x40,
    Unauthorized = 0x41,
    PaymentRequired = 0x42,
    Forbidden = 0x43,
    NotFound = 0x44,
    MethodNotAllowed = 0x45,
    NotAcceptable = 0x46,
    ProxyAuthRequired = 0x47,
    RequestTimeOut = 0x48,
    Conflict = 0x49,
    Gone = 0x4A,
    LengthRequired = 0x4B,
    PreconditionFail = 0x4C,
    ReqEntityTooLarge = 0x4D,
    RequestUrlTooLarge = 0x4E,
    UnsupportedMedia = 0x4F,

    // HTTP 5xx
    InternalServerError = 0x50,
    NotImplemented = 0x51,
    BadGateway = 0x52,
    ServiceUnavailable = 0x53,
    GatewayTimeout = 0x54,
    VersionNotSupported = 0x55,

    // Handset specific
    DatabaseFull = 0x60,
    DatabaseLocked = 0x61,
}

impl Status {
    pub fn from_bits(bits: u8) -> Option<Self> {
        use Status::*;
        let status = match bits {
            0x10 => Continue,
            0x20 => Success,
            0x21 => Created,
            0x22 => Accepted,
            0x23 => NonAuthoritative,
            0x24 => NoContent,
            0x25 => ResetContent,
            0x26 => PartialContent,
            0x30 => MultipleChoices,
            0x31 => MovedPermanently,
            0x32 => MovedTemporarily,
            0x33 => SeeOther,
            0x34 => NotModified,
            0x35 => UseProxy,
            0x40 => BadRequest,
            0x41 => Unauthorized,
            0x42 => PaymentRequired,
            0x43 => Forbidden,
            0x44 => NotFound,
            0x45 => MethodNotAllowed,
            0x46 => NotAcceptable,
            0x47 => ProxyAuthRequired,
            0x48 => RequestTimeOut,
            0x49 => Conflict,
            0x4A => Gone,
            0x4B => LengthRequired,
            0x4C => PreconditionFail,
            0x4D => ReqEntityTooLarge,
            0x4E => RequestUrlTooLarge,
            0x4F => UnsupportedMedia,
            0x50 => InternalServerError,
            0x51 => NotImplemented,
            0x52 => BadGateway,
            0x53 => ServiceUnavailable,
            0x54 => GatewayTimeout,
            0x55 => VersionNotSupported,
            0x60 => DatabaseFull,
            0x61 => DatabaseLocked,
            _ => return None,
        };
        Some(status)
    }
}

/// Raw response byte as received from the device.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ResponseCode(u8);

impl ResponseCode {
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Byte as it appeared on the wire.
    pub fn raw(&self) -> u8 {
        self.0
    }

    /// Status bits with the final flag masked off.
    pub fn bits(&self) -> u8 {
        self.0 & MASK_NOT_FINAL
    }

    pub fn is_final(&self) -> bool {
        self.0 & MASK_FINAL != 0
    }

    pub fn status(&self) -> Option<Status> {
        Status::from_bits(self.bits())
    }

    /// Human-readable status name, if the code is known.
    pub fn name(&self) -> Option<String> {
        self.status().map(|s| format!("{s:?}"))
    }
}

impl fmt::Debug for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResponseCode(0x{:02X} {})", self.0, self)
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status() {
            Some(status) => write!(f, "{status:?}"),
            None => write!(f, "Unknown Error"),
        }
    }
}
