//! vCard batch handling.
//!
//! Contact files are treated as opaque text: split into individual cards and
//! normalised to CRLF line endings, nothing more.

const BEGIN: &str = "BEGIN:VCARD";
const END: &str = "END:VCARD";

/// Split a `.vcf` document into its `BEGIN:VCARD ... END:VCARD` blocks.
///
/// Text between cards and an unterminated trailing card are dropped.
pub fn split_vcards(text: &str) -> Vec<&str> {
    let mut cards = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(BEGIN) {
        let Some(len) = rest[start..].find(END) else {
            break;
        };
        let end = start + len + END.len();
        cards.push(&rest[start..end]);
        rest = &rest[end..];
    }
    cards
}

/// Convert bare LF line endings to CRLF, leaving existing CRLF untouched.
pub fn normalize_line_endings(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 32);
    let mut prev = 0u8;
    for &b in data {
        if b == b'\n' && prev != b'\r' {
            out.push(b'\r');
        }
        out.push(b);
        prev = b;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_two_cards() {
        let text = "BEGIN:VCARD\r\nN:One\r\nEND:VCARD\r\nBEGIN:VCARD\r\nN:Two\r\nEND:VCARD\r\n";
        let cards = split_vcards(text);
        assert_eq!(
            cards,
            vec![
                "BEGIN:VCARD\r\nN:One\r\nEND:VCARD",
                "BEGIN:VCARD\r\nN:Two\r\nEND:VCARD"
            ]
        );
    }

    #[test]
    fn test_split_ignores_noise_and_unterminated() {
        let text = "junk\nBEGIN:VCARD\nN:A\nEND:VCARD\nmore junk\nBEGIN:VCARD\nN:B\n";
        assert_eq!(split_vcards(text), vec!["BEGIN:VCARD\nN:A\nEND:VCARD"]);
        assert!(split_vcards("").is_empty());
    }

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings(b"a\nb\r\nc\n"), b"a\r\nb\r\nc\r\n");
        assert_eq!(normalize_line_endings(b"\n\n"), b"\r\n\r\n");
        assert_eq!(normalize_line_endings(b"no newline"), b"no newline");
    }
}
