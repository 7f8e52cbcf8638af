use std::fmt;

/// Enum reprsenting HTTP version.
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum Version {
    Http10,
    Http11,
}

impl Version {
    /// Parses the version token of a request line
    ///
    /// Only `HTTP/1.0` and `HTTP/1.1` are recognized, anything else
    /// (including `HTTP/2.0`) is `None`.
    pub fn from_bytes(token: &[u8]) -> Option<Version> {
        match token {
            b"HTTP/1.0" => Some(Version::Http10),
            b"HTTP/1.1" => Some(Version::Http11),
            _ => None,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Version::Http10 => f.write_str("HTTP/1.0"),
            Version::Http11 => f.write_str("HTTP/1.1"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Version;

    #[test]
    fn parse() {
        assert_eq!(Version::from_bytes(b"HTTP/1.1"), Some(Version::Http11));
        assert_eq!(Version::from_bytes(b"HTTP/1.0"), Some(Version::Http10));
        assert_eq!(Version::from_bytes(b"HTTP/2.0"), None);
        assert_eq!(Version::from_bytes(b"http/1.1"), None);
    }

    #[test]
    fn display() {
        assert_eq!(Version::Http11.to_string(), "HTTP/1.1");
    }
}
