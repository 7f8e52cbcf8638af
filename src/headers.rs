use crate::buffer::trim;


pub fn is_transfer_encoding(val: &str) -> bool {
    val.eq_ignore_ascii_case("Transfer-Encoding")
}

pub fn is_content_length(val: &str) -> bool {
    val.eq_ignore_ascii_case("Content-Length")
}

pub fn is_connection(val: &str) -> bool {
    val.eq_ignore_ascii_case("Connection")
}

pub fn is_expect(val: &str) -> bool {
    val.eq_ignore_ascii_case("Expect")
}

pub fn is_upgrade(val: &str) -> bool {
    val.eq_ignore_ascii_case("Upgrade")
}

// header value is byte sequence
// we need case insensitive comparison and strip out of the whitespace
fn is_token(val: &[u8], token: &str) -> bool {
    trim(val).eq_ignore_ascii_case(token.as_bytes())
}

/// Checks whether comma-separated list `val` contains `token`
pub fn has_token(val: &[u8], token: &str) -> bool {
    val.split(|&x| x == b',').any(|item| is_token(item, token))
}

/// Last transfer coding in the list is `chunked`
pub fn is_chunked(val: &[u8]) -> bool {
    val.split(|&x| x == b',').last().map(|x| is_token(x, "chunked"))
        .unwrap_or(false)
}

pub fn is_close(val: &[u8]) -> bool {
    has_token(val, "close")
}

pub fn is_continue(val: &[u8]) -> bool {
    is_token(val, "100-continue")
}

#[cfg(test)]
mod test {
    use super::{is_content_length, is_transfer_encoding, is_connection};
    use super::{is_expect, is_upgrade, has_token};
    use super::{is_chunked, is_close, is_continue};

    #[test]
    fn test_content_len() {
        assert!(is_content_length("Content-Length"));
        assert!(is_content_length("content-length"));
        assert!(is_content_length("CONTENT-length"));
        assert!(is_content_length("CONTENT-LENGTH"));
    }

    #[test]
    fn test_transfer_encoding() {
        assert!(is_transfer_encoding("Transfer-Encoding"));
        assert!(is_transfer_encoding("transfer-ENCODING"));
        assert!(is_transfer_encoding("TRANSFER-Encoding"));
        assert!(is_transfer_encoding("TRANSFER-ENCODING"));
    }

    #[test]
    fn test_connection() {
        assert!(is_connection("Connection"));
        assert!(is_connection("CONNECTION"));
        assert!(is_connection("ConneCTION"));
        assert!(is_connection("connection"));
    }

    #[test]
    fn test_expect_upgrade() {
        assert!(is_expect("Expect"));
        assert!(is_expect("ExpECT"));
        assert!(is_upgrade("upgrade"));
        assert!(!is_upgrade("upgrades"));
    }

    #[test]
    fn test_chunked() {
        assert!(is_chunked(b"chunked"));
        assert!(is_chunked(b"Chunked"));
        assert!(is_chunked(b"chuNKED"));
        assert!(is_chunked(b"   CHUNKED  "));
        assert!(is_chunked(b"gzip, chunked"));
        assert!(!is_chunked(b"chunked, gzip"));
        assert!(!is_chunked(b"   CHUNKED 1 "));
    }

    #[test]
    fn test_close() {
        assert!(is_close(b"close"));
        assert!(is_close(b"Close"));
        assert!(is_close(b" CLOSE"));
        assert!(is_close(b"   close   "));
        assert!(is_close(b"upgrade, close"));
        assert!(!is_close(b"Close  1 "));
        assert!(!is_close(b" xclose   "));
    }

    #[test]
    fn test_continue() {
        assert!(is_continue(b"100-continue"));
        assert!(is_continue(b"100-Continue"));
        assert!(is_continue(b"   100-continue   "));
        assert!(!is_continue(b"100-continue y  "));
        assert!(!is_continue(b"100-coztinue   "));
    }

    #[test]
    fn test_tokens() {
        assert!(has_token(b"keep-alive, Upgrade", "upgrade"));
        assert!(has_token(b"Upgrade", "upgrade"));
        assert!(!has_token(b"keep-alive", "upgrade"));
    }
}
