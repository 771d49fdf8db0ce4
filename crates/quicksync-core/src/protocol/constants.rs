//! Protocol constants for the Gigaset AT command set and OBEX profile.
//!
//! OBEX values follow the IrDA OBEX 1.5 specification; object paths are the
//! ones the handset exposes through its desktop-sync service.

// ============================================================================
// AT Wire Markers
// ============================================================================

/// Trailer of a successful AT response.
pub const AT_OK: &[u8] = b"OK\r\n";

/// Trailer of a failed AT response.
pub const AT_ERROR: &[u8] = b"ERROR\r\n";

/// Line terminator appended to AT commands.
pub const AT_TERMINATOR: &str = "\r\n";

// ============================================================================
// OBEX Framing
// ============================================================================

/// Opcode (1) + frame length (2).
pub const OBEX_PREAMBLE_SIZE: usize = 3;

/// Largest payload that still fits the 16-bit frame length field.
pub const MAX_FRAME_PAYLOAD: usize = u16::MAX as usize - OBEX_PREAMBLE_SIZE;

/// Final bit of an opcode or response byte.
pub const MASK_FINAL: u8 = 0b1000_0000;

/// Status bits of a response byte.
pub const MASK_NOT_FINAL: u8 = 0b0111_1111;

// ============================================================================
// CONNECT Handshake
// ============================================================================

/// OBEX protocol version 1.0
pub const CONNECT_VERSION: u8 = 0x10;
pub const CONNECT_FLAGS: u8 = 0x00;
pub const CONNECT_MAX_PACKET_SIZE: u16 = 0xFFFE;

// ============================================================================
// Request Opcodes
// ============================================================================

pub const OPCODE_CONNECT: u8 = 0x80;
pub const OPCODE_DISCONNECT: u8 = 0x81;
pub const OPCODE_PUT: u8 = 0x02;
pub const OPCODE_GET: u8 = 0x03;
pub const OPCODE_SETPATH: u8 = 0x85;
pub const OPCODE_SESSION: u8 = 0x87;
pub const OPCODE_ABORT: u8 = 0xFF;

// ============================================================================
// SETPATH Flags
// ============================================================================

/// Back up a level before applying the name (`../`).
pub const SETPATH_LAYER_UP: u8 = 0b0000_0001;
/// Don't create the folder if it does not exist.
pub const SETPATH_DONT_CREATE: u8 = 0b0000_0010;
/// Reserved constants byte, always zero.
pub const SETPATH_CONSTANTS: u8 = 0x00;

// ============================================================================
// Header Identifiers
// ============================================================================

pub const HEADER_COUNT: u8 = 0xC0;
pub const HEADER_NAME: u8 = 0x01;
pub const HEADER_TYPE: u8 = 0x42;
pub const HEADER_LENGTH: u8 = 0xC3;
pub const HEADER_TIME_ISO8601: u8 = 0x44;
pub const HEADER_TIME_4BYTE: u8 = 0xC4;
pub const HEADER_DESCRIPTION: u8 = 0x05;
pub const HEADER_TARGET: u8 = 0x46;
pub const HEADER_HTTP: u8 = 0x47;
pub const HEADER_BODY: u8 = 0x48;
pub const HEADER_END_OF_BODY: u8 = 0x49;
pub const HEADER_WHO: u8 = 0x4A;
pub const HEADER_CONNECTION_ID: u8 = 0xCB;
pub const HEADER_APP_PARAMETERS: u8 = 0x4C;
pub const HEADER_AUTH_CHALLENGE: u8 = 0x4D;
pub const HEADER_AUTH_RESPONSE: u8 = 0x4E;
pub const HEADER_CREATOR_ID: u8 = 0xCF;
pub const HEADER_WAN_UUID: u8 = 0x50;
pub const HEADER_OBJECT_CLASS: u8 = 0x51;
pub const HEADER_SESSION_PARAMS: u8 = 0x52;
pub const HEADER_SESSION_SEQ_NO: u8 = 0x93;
pub const HEADER_ACTION_ID: u8 = 0x94;
pub const HEADER_DEST_NAME: u8 = 0x15;
pub const HEADER_PERMISSIONS: u8 = 0xD6;
pub const HEADER_SINGLE_RESPONSE_MODE: u8 = 0x97;
pub const HEADER_SINGLE_RESPONSE_PARAMS: u8 = 0x98;

/// Width of a four-byte-value header (ID + u32).
pub const FIXED4_HEADER_SIZE: usize = 5;

// ============================================================================
// Application Parameters
// ============================================================================

/// Query total storage size.
pub const APP_PARAM_MEMORY_TOTAL: &[u8] = &[0x32, 0x01, 0x01];
/// Query free storage size.
pub const APP_PARAM_MEMORY_FREE: &[u8] = &[0x32, 0x01, 0x02];

// ============================================================================
// Service Targets
// ============================================================================

pub const SERVICE_IRMC_SYNC: &[u8] = b"IRMC-SYNC";
/// Desktop-sync service, the only profile this client talks to.
pub const SERVICE_DES_SYNC: &[u8] = &[
    0x6b, 0x01, 0xcb, 0x31, 0x41, 0x06, 0x11, 0xd4, 0x9a, 0x77, 0x00, 0x50, 0xda, 0x3f, 0x47, 0x1f,
];
pub const SERVICE_FOLDER_BROWSING: &[u8] = &[
    0xf9, 0xec, 0x7b, 0xc4, 0x95, 0x3c, 0x11, 0xd2, 0x98, 0x4e, 0x52, 0x54, 0x00, 0xdc, 0x9e, 0x09,
];
pub const SERVICE_SYNCML: &[u8] = b"SYNCML-SYNC";

// ============================================================================
// Object Paths
// ============================================================================

pub const PATH_PHONEBOOK: &str = "/telecom/pb.vcf";
pub const PATH_INFO_LOG: &str = "/telecom/pb/info.log";
pub const PATH_DEV_INFO: &str = "/telecom/devinfo.txt";
pub const PATH_LUID_CC: &str = "/telecom/pb/luid/cc.log";
pub const PATH_LUID_0: &str = "/telecom/pb/luid/0.log";
/// Target name for creating a contact (handset assigns the luid).
pub const PATH_NEW_VCARD: &str = "/telecom/pb/luid/zapis.vcf";

/// Path of an existing contact record.
pub fn vcard_luid_path(luid: &str) -> String {
    format!("/telecom/pb/luid/{luid}.vcf")
}

pub const FOLDER_SCREEN_SAVERS: &str = "/Pictures";
pub const FOLDER_CLIP_PICTURES: &str = "/Clip Pictures";
pub const FOLDER_RINGTONES: &str = "/Sounds";

/// Folders shown by a storage listing, in display order.
pub const BROWSABLE_FOLDERS: &[&str] = &[
    FOLDER_SCREEN_SAVERS,
    FOLDER_CLIP_PICTURES,
    FOLDER_RINGTONES,
];

pub const MIME_FOLDER_LISTING: &str = "x-obex/folder-listing";
pub const MIME_CAPABILITY: &str = "x-obex/capability";

// ============================================================================
// Transfer Sizing
// ============================================================================

/// Body bytes per PUT chunk. Stays below the handset's effective packet
/// ceiling once NAME and LENGTH headers are added to the first chunk.
pub const UPLOAD_CHUNK_SIZE: usize = 958;
