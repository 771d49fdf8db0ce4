//! AT command catalog, request formatting and response classification.
//!
//! Commands are a closed catalog of templates with positional placeholders
//! (`{0}`, `{1}`, ...). A formatted [`AtRequest`] remembers which catalog
//! entry produced it so [`classify`] can apply the per-command completion
//! rules without comparing strings.

use std::fmt;

use thiserror::Error;

use super::constants::{AT_ERROR, AT_OK, AT_TERMINATOR};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AtError {
    #[error("{command} expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        command: AtCommand,
        expected: usize,
        actual: usize,
    },
    #[error("{command} argument contains non-ASCII text: {text:?}")]
    NonAscii { command: AtCommand, text: String },
    #[error("{command} argument contains a control character: {text:?}")]
    ControlCharacter { command: AtCommand, text: String },
}

/// AT commands recognized by the handset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtCommand {
    GetHardwareConnectionState,
    GetFirmwareUrl,
    GetAreaCodes,
    SetAreaCodes,
    SwitchHandsFree,
    Dial,
    DialInternal,
    Answer,
    HangUp,
    Ping,
    Reset,
    GetDeviceType,
    GetManufacturer,
    GetSerialNumber,
    GetFirmwareVersion,
    GetProductName,
    GetSupportedFeatures,
    GetCharset1,
    GetCharset2,
    GetExtendedMessageLevels,
    GetCurrentMessageLevel,
    SetExtendedMessageLevel,
    GetMwi,
    GetSupportedMultimedia,
    GetScreenSizeClip,
    GetScreenSizeFull,
    GetBatteryState,
    GetSignalState,
    GetInternalName,
    GetExtendedModesList,
    GetCurrentExtendedMode,
    PrepareHsImageXml,
    RequestPartHsImageXml,
    AnswerPartHsImageXml,
    EnterObex,
    EnterMemoryDump,
    ExitObex,
    SwitchRoleGeneric,
    SwitchRoleDefault,
    SwitchRoleQuc,
    SwitchRoleUpdate,
    ListMelodies,
    InitializeImageUpload,
    SendBasicImageInfo,
    GetImageUploadResult,
    SendImagePart,
}

impl AtCommand {
    /// Command text without its line terminator.
    pub const fn template(self) -> &'static str {
        match self {
            AtCommand::GetHardwareConnectionState => "AT^SGST",
            AtCommand::GetFirmwareUrl => "AT^SURL",
            AtCommand::GetAreaCodes => "AT^SACO?",
            AtCommand::SetAreaCodes => "AT^SACO={0},{1},{2},{3}",
            AtCommand::SwitchHandsFree => "ATC",
            AtCommand::Dial => "ATD {0}",
            AtCommand::DialInternal => "ATDI {0}",
            AtCommand::Answer => "ATA",
            AtCommand::HangUp => "ATH",
            AtCommand::Ping => "AT",
            AtCommand::Reset => "ATZ",
            AtCommand::GetDeviceType => "AT+CGMM",
            AtCommand::GetManufacturer => "AT+CGMI",
            AtCommand::GetSerialNumber => "AT+CGSN",
            AtCommand::GetFirmwareVersion => "AT+CGMR",
            AtCommand::GetProductName => "AT^WPPN",
            AtCommand::GetSupportedFeatures => "AT^LOSF=?",
            AtCommand::GetCharset1 => "AT^WPCS",
            AtCommand::GetCharset2 => "AT^WPCS?",
            AtCommand::GetExtendedMessageLevels => "AT+CMEE=?",
            AtCommand::GetCurrentMessageLevel => "AT+CMEE?",
            AtCommand::SetExtendedMessageLevel => "AT+CMEE={0}",
            AtCommand::GetMwi => "AT^HMWI?",
            AtCommand::GetSupportedMultimedia => "AT^HSMM?",
            AtCommand::GetScreenSizeClip => "AT^WPPS CLIP",
            AtCommand::GetScreenSizeFull => "AT^WPPS SCR",
            AtCommand::GetBatteryState => "AT+CBC",
            AtCommand::GetSignalState => "AT+CSQ",
            AtCommand::GetInternalName => "AT^SHSN?",
            AtCommand::GetExtendedModesList => "AT^SQWE=?",
            AtCommand::GetCurrentExtendedMode => "AT^SQWE?",
            AtCommand::PrepareHsImageXml => "AT^DMPC=?",
            AtCommand::RequestPartHsImageXml => "AT^DMPC?",
            AtCommand::AnswerPartHsImageXml => "^DMPC:",
            AtCommand::EnterObex => "AT^SQWE=3",
            AtCommand::EnterMemoryDump => "AT^SQWE=55",
            AtCommand::ExitObex => "+++",
            AtCommand::SwitchRoleGeneric => "AT^SRSR {0}",
            AtCommand::SwitchRoleDefault => "AT^SRSR 0",
            AtCommand::SwitchRoleQuc => "AT^SRSR 1",
            AtCommand::SwitchRoleUpdate => "AT^SRSR 2",
            AtCommand::ListMelodies => "AT^RM=?",
            AtCommand::InitializeImageUpload => "AT^DMPU=?",
            AtCommand::SendBasicImageInfo => "AT^DMPU={0},{1},{2}",
            AtCommand::GetImageUploadResult => "AT^DMPU?",
            AtCommand::SendImagePart => "AT^DMPW={0},{1},{2},{3}",
        }
    }

    /// Line terminator sent after the command text.
    pub const fn terminator(self) -> &'static str {
        match self {
            // The escape sequence must not be followed by anything.
            AtCommand::ExitObex => "",
            AtCommand::Reset => "\r\n\r\n",
            _ => AT_TERMINATOR,
        }
    }

    /// Number of positional placeholders in the template.
    pub fn arity(self) -> usize {
        self.template().matches('{').count()
    }

    /// Dial commands complete on the first `OK`, whatever else follows.
    pub fn is_dial(self) -> bool {
        matches!(self, AtCommand::Dial | AtCommand::DialInternal)
    }
}

impl fmt::Display for AtCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.template())
    }
}

/// A formatted AT command ready to be written to the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRequest {
    command: AtCommand,
    bytes: Vec<u8>,
}

impl AtRequest {
    /// Format a command that takes no arguments.
    pub fn new(command: AtCommand) -> Result<Self, AtError> {
        Self::with_args(command, &[])
    }

    /// Format a command, substituting `args` into its placeholders.
    pub fn with_args(command: AtCommand, args: &[&str]) -> Result<Self, AtError> {
        let bytes = format(command, args)?;
        Ok(Self { command, bytes })
    }

    pub fn command(&self) -> AtCommand {
        self.command
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Result of classifying the bytes received so far against a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtOutcome {
    /// Complete response; carries the payload without echo and trailer.
    Success(Vec<u8>),
    /// The device answered `ERROR`.
    Error,
    /// More bytes are needed; keep the buffer and classify again.
    Incomplete,
}

/// Substitute `args` into the command template and encode it for the wire.
pub fn format(command: AtCommand, args: &[&str]) -> Result<Vec<u8>, AtError> {
    let expected = command.arity();
    if args.len() != expected {
        return Err(AtError::ArgumentCount {
            command,
            expected,
            actual: args.len(),
        });
    }

    for arg in args {
        if !arg.is_ascii() {
            return Err(AtError::NonAscii {
                command,
                text: arg.to_string(),
            });
        }
        if arg.bytes().any(|b| b.is_ascii_control()) {
            return Err(AtError::ControlCharacter {
                command,
                text: arg.to_string(),
            });
        }
    }

    let template = command.template();
    let mut text = String::with_capacity(template.len() + command.terminator().len());
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        if c != '{' {
            text.push(c);
            continue;
        }
        let index: String = chars.by_ref().take_while(|&d| d != '}').collect();
        // Templates are static; a bad index would be a catalog bug caught by tests.
        if let Some(arg) = index.parse::<usize>().ok().and_then(|i| args.get(i)) {
            text.push_str(arg);
        }
    }
    text.push_str(command.terminator());

    Ok(text.into_bytes())
}

/// Classify the accumulated response bytes for `request`.
pub fn classify(buffer: &[u8], request: &AtRequest) -> AtOutcome {
    // The handset leaves OBEX mode silently.
    if request.command == AtCommand::ExitObex {
        return AtOutcome::Success(Vec::new());
    }

    // Dialling may emit unsolicited call-status lines after the OK.
    if request.command.is_dial() && contains(buffer, AT_OK) {
        return AtOutcome::Success(Vec::new());
    }

    if buffer.ends_with(AT_OK) {
        let echo = request.bytes.trim_ascii();
        let body = buffer.strip_prefix(echo).unwrap_or(buffer);
        let body = body.strip_suffix(AT_OK).unwrap_or(body);
        return AtOutcome::Success(body.trim_ascii().to_vec());
    }

    if buffer.ends_with(AT_ERROR) {
        return AtOutcome::Error;
    }

    AtOutcome::Incomplete
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_plain_command() {
        let req = AtRequest::new(AtCommand::GetManufacturer).unwrap();
        assert_eq!(req.bytes(), b"AT+CGMI\r\n");
    }

    #[test]
    fn test_format_substitutes_arguments() {
        let bytes = format(AtCommand::SetAreaCodes, &["49", "0", "30", "1"]).unwrap();
        assert_eq!(bytes, b"AT^SACO=49,0,30,1\r\n");

        let dial = AtRequest::with_args(AtCommand::Dial, &["0301234567"]).unwrap();
        assert_eq!(dial.bytes(), b"ATD 0301234567\r\n");
    }

    #[test]
    fn test_format_special_terminators() {
        assert_eq!(format(AtCommand::Reset, &[]).unwrap(), b"ATZ\r\n\r\n");
        assert_eq!(format(AtCommand::ExitObex, &[]).unwrap(), b"+++");
    }

    #[test]
    fn test_format_rejects_wrong_arity() {
        let err = format(AtCommand::Dial, &[]).unwrap_err();
        assert_eq!(
            err,
            AtError::ArgumentCount {
                command: AtCommand::Dial,
                expected: 1,
                actual: 0
            }
        );
        assert!(format(AtCommand::Ping, &["x"]).is_err());
    }

    #[test]
    fn test_format_rejects_bad_text() {
        assert!(matches!(
            format(AtCommand::Dial, &["0301ä"]),
            Err(AtError::NonAscii { .. })
        ));
        assert!(matches!(
            format(AtCommand::Dial, &["123\r\nATH"]),
            Err(AtError::ControlCharacter { .. })
        ));
    }

    #[test]
    fn test_catalog_arity() {
        assert_eq!(AtCommand::SendImagePart.arity(), 4);
        assert_eq!(AtCommand::SendBasicImageInfo.arity(), 3);
        assert_eq!(AtCommand::SetExtendedMessageLevel.arity(), 1);
        assert_eq!(AtCommand::EnterObex.arity(), 0);
    }

    #[test]
    fn test_exit_obex_ignores_buffer() {
        let req = AtRequest::new(AtCommand::ExitObex).unwrap();
        assert_eq!(classify(b"", &req), AtOutcome::Success(Vec::new()));
        assert_eq!(classify(b"garbage", &req), AtOutcome::Success(Vec::new()));
    }

    #[test]
    fn test_dial_completes_on_first_ok() {
        let req = AtRequest::with_args(AtCommand::Dial, &["**21"]).unwrap();
        assert_eq!(classify(b"ATD **21\r\n", &req), AtOutcome::Incomplete);
        assert_eq!(
            classify(b"ATD **21\r\nOK\r\n^SCST: 1,2\r\n", &req),
            AtOutcome::Success(Vec::new())
        );

        let internal = AtRequest::with_args(AtCommand::DialInternal, &["2"]).unwrap();
        assert_eq!(
            classify(b"OK\r\nRING", &internal),
            AtOutcome::Success(Vec::new())
        );
    }

    #[test]
    fn test_dial_rejected() {
        let req = AtRequest::with_args(AtCommand::Dial, &["123"]).unwrap();
        assert_eq!(classify(b"ATD 123\r\r\nERROR\r\n", &req), AtOutcome::Error);
        assert_eq!(classify(b"ATD 123\r\r\nERR", &req), AtOutcome::Incomplete);
    }

    #[test]
    fn test_reset_incomplete_until_ok() {
        let req = AtRequest::new(AtCommand::Reset).unwrap();
        let reply = b"ATZ\r\n\r\nOK\r\n";

        for end in 0..reply.len() {
            assert_eq!(classify(&reply[..end], &req), AtOutcome::Incomplete, "prefix {end}");
        }
        assert_eq!(classify(reply, &req), AtOutcome::Success(Vec::new()));
    }

    #[test]
    fn test_payload_strips_echo_and_trailer() {
        let req = AtRequest::new(AtCommand::GetManufacturer).unwrap();
        let buf = b"AT+CGMI\r\r\nGigaset Communications\r\n\r\nOK\r\n";
        assert_eq!(
            classify(buf, &req),
            AtOutcome::Success(b"Gigaset Communications".to_vec())
        );

        // Without echo the body is taken as-is.
        assert_eq!(
            classify(b"\r\nS810A\r\nOK\r\n", &AtRequest::new(AtCommand::GetDeviceType).unwrap()),
            AtOutcome::Success(b"S810A".to_vec())
        );
    }

    #[test]
    fn test_error_trailer() {
        let req = AtRequest::new(AtCommand::GetMwi).unwrap();
        assert_eq!(classify(b"AT^HMWI?\r\nERROR\r\n", &req), AtOutcome::Error);
        assert_eq!(classify(b"AT^HMWI?\r\nERR", &req), AtOutcome::Incomplete);
    }
}
