//! PDF Header Parser
//!
//! Parses the PDF header and version according to ISO 32000-1 Section 7.5.2

use super::{ParseError, ParseResult};

/// How far into the file the `%PDF-` marker may appear
pub const HEADER_SEARCH_LIMIT: usize = 1024;

/// PDF Version information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfVersion {
    pub major: u8,
    pub minor: u8,
}

impl PdfVersion {
    /// Create a new PDF version
    pub fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl std::fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// PDF Header information
#[derive(Debug, Clone, PartialEq)]
pub struct PdfHeader {
    pub version: PdfVersion,
    /// Offset of the `%` of `%PDF-`; non-zero when junk precedes the header
    pub offset: u64,
}

impl PdfHeader {
    /// Parse the header from the first bytes of a file
    pub fn parse(prefix: &[u8]) -> ParseResult<Self> {
        let window = &prefix[..prefix.len().min(HEADER_SEARCH_LIMIT)];
        let start = window
            .windows(5)
            .position(|w| w == b"%PDF-")
            .ok_or(ParseError::InvalidHeader)?;

        let rest = &window[start + 5..];
        let (major, rest) = leading_number(rest).ok_or(ParseError::InvalidHeader)?;
        let rest = rest.strip_prefix(b".").ok_or(ParseError::InvalidHeader)?;
        let (minor, _) = leading_number(rest).ok_or(ParseError::InvalidHeader)?;

        if start > 0 {
            tracing::debug!("PDF header found at offset {}", start);
        }

        Ok(PdfHeader {
            version: PdfVersion::new(major, minor),
            offset: start as u64,
        })
    }
}

fn leading_number(bytes: &[u8]) -> Option<(u8, &[u8])> {
    let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 || digits > 2 {
        return None;
    }
    let value = std::str::from_utf8(&bytes[..digits]).ok()?.parse().ok()?;
    Some((value, &bytes[digits..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_versions() {
        let header = PdfHeader::parse(b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n").unwrap();
        assert_eq!(header.version, PdfVersion::new(1, 7));
        assert_eq!(header.offset, 0);

        let header = PdfHeader::parse(b"%PDF-2.0\r\n").unwrap();
        assert_eq!(header.version.to_string(), "2.0");
    }

    #[test]
    fn test_leading_garbage_tolerated() {
        let header = PdfHeader::parse(b"\x00\x00junk%PDF-1.4\n").unwrap();
        assert_eq!(header.version, PdfVersion::new(1, 4));
        assert_eq!(header.offset, 6);
    }

    #[test]
    fn test_invalid_headers() {
        for input in [&b""[..], b"%PDF-", b"%PDF-x.y", b"%PDF-1", b"%PS-1.0", b"%PDF-999.1"] {
            assert!(
                matches!(PdfHeader::parse(input), Err(ParseError::InvalidHeader)),
                "input {input:?}"
            );
        }

        let mut late = vec![b' '; HEADER_SEARCH_LIMIT];
        late.extend_from_slice(b"%PDF-1.7");
        assert!(PdfHeader::parse(&late).is_err());
    }
}
