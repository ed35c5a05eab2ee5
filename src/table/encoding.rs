use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decodes `bytes` with the first encoding in `labels` that accepts the whole stream.
///
/// Labels are WHATWG names (`"utf-8"`, `"gbk"`, `"iso-8859-1"`, ...). Unknown labels are
/// skipped. A decoder that meets a malformed sequence is rejected outright; nothing is
/// replaced with U+FFFD.
pub fn decode_with_fallback(bytes: &[u8], labels: &[&str]) -> Option<(String, &'static Encoding)> {
    for label in labels {
        let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
            debug!("unknown encoding label {:?}, skipping", label);
            continue;
        };

        let input = if encoding == UTF_8 {
            bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
        } else {
            bytes
        };

        match encoding.decode_without_bom_handling_and_without_replacement(input) {
            Some(text) => return Some((text.into_owned(), encoding)),
            None => debug!("decoding as {} failed, trying next encoding", encoding.name()),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TABLE_ENCODINGS;

    #[test]
    fn plain_utf8_is_taken_first() {
        let (text, enc) = decode_with_fallback("名称\tlon".as_bytes(), TABLE_ENCODINGS).unwrap();
        assert_eq!(text, "名称\tlon");
        assert_eq!(enc, UTF_8);
    }

    #[test]
    fn utf8_bom_is_dropped() {
        let (text, _) = decode_with_fallback(b"\xEF\xBB\xBFcity", TABLE_ENCODINGS).unwrap();
        assert_eq!(text, "city");
    }

    #[test]
    fn gbk_bytes_fall_through_to_gbk() {
        // "北京" in GBK, which is not valid UTF-8
        let bytes = [0xB1, 0xB1, 0xBE, 0xA9];
        let (text, enc) = decode_with_fallback(&bytes, TABLE_ENCODINGS).unwrap();
        assert_eq!(text, "北京");
        assert_eq!(enc.name(), "GBK");
    }

    #[test]
    fn latin1_accepts_what_gbk_rejects() {
        // 0xFF is neither a valid UTF-8 byte nor a GBK lead byte
        let bytes = b"S\xE3o Paulo\xFF";
        let (text, enc) = decode_with_fallback(bytes, TABLE_ENCODINGS).unwrap();
        assert_eq!(enc.name(), "windows-1252");
        assert!(text.starts_with("São Paulo"));
    }

    #[test]
    fn strict_list_can_be_exhausted() {
        assert!(decode_with_fallback(&[0xFF, 0xFE, 0x00], &["utf-8"]).is_none());
        assert!(decode_with_fallback(b"abc", &["no-such-encoding"]).is_none());
    }
}
