//! ASCIIHexDecode and ASCII85Decode filters (ISO 32000-1 Sections 7.4.2, 7.4.3)

use crate::parser::{ParseError, ParseResult};

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Decode ASCIIHexDecode data
pub fn decode_ascii_hex(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len() / 2);
    let mut high: Option<u8> = None;

    for &ch in data.iter().filter(|b| !b.is_ascii_whitespace()) {
        if ch == b'>' {
            break;
        }
        let value = hex_digit_value(ch).ok_or_else(|| {
            ParseError::StreamDecodeError(format!("Invalid hex digit: {}", ch as char))
        })?;
        match high.take() {
            Some(h) => result.push((h << 4) | value),
            None => high = Some(value),
        }
    }

    // Odd number of digits, pad with 0
    if let Some(h) = high {
        result.push(h << 4);
    }

    Ok(result)
}

/// Encode as uppercase hex followed by the `>` end marker
pub fn encode_ascii_hex(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len() * 2 + 1);
    for &byte in data {
        result.push(HEX_DIGITS[(byte >> 4) as usize]);
        result.push(HEX_DIGITS[(byte & 0x0F) as usize]);
    }
    result.push(b'>');
    result
}

fn hex_digit_value(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        _ => None,
    }
}

/// Decode ASCII85Decode data
pub fn decode_ascii85(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut input: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if input.starts_with(b"<~") {
        input.drain(..2);
    }

    let mut result = Vec::with_capacity(input.len() / 5 * 4 + 4);
    let mut group = [0u8; 5];
    let mut filled = 0;
    let mut bytes = input.iter().copied();

    while let Some(c) = bytes.next() {
        match c {
            b'~' => {
                if bytes.next() != Some(b'>') {
                    return Err(ParseError::StreamDecodeError(
                        "Invalid ASCII85 end marker".to_string(),
                    ));
                }
                break;
            }
            b'z' if filled == 0 => result.extend_from_slice(&[0, 0, 0, 0]),
            b'!'..=b'u' => {
                group[filled] = c - b'!';
                filled += 1;
                if filled == 5 {
                    result.extend_from_slice(&group_value(&group)?.to_be_bytes());
                    filled = 0;
                }
            }
            _ => {
                return Err(ParseError::StreamDecodeError(format!(
                    "Invalid ASCII85 character: {}",
                    c as char
                )));
            }
        }
    }

    match filled {
        0 => {}
        1 => {
            return Err(ParseError::StreamDecodeError(
                "ASCII85 final group has a single character".to_string(),
            ))
        }
        n => {
            // Pad with 'u' and keep n - 1 bytes
            group[n..].fill(84);
            let value = group_value(&group)?;
            result.extend_from_slice(&value.to_be_bytes()[..n - 1]);
        }
    }

    Ok(result)
}

fn group_value(group: &[u8; 5]) -> ParseResult<u32> {
    let value = group
        .iter()
        .fold(0u64, |acc, &digit| acc * 85 + u64::from(digit));
    u32::try_from(value)
        .map_err(|_| ParseError::StreamDecodeError("ASCII85 group out of range".to_string()))
}

/// Encode as ASCII85 with `z` for zero groups and the `~>` end marker
pub fn encode_ascii85(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len() / 4 * 5 + 7);

    for chunk in data.chunks(4) {
        if chunk == [0, 0, 0, 0] {
            result.push(b'z');
            continue;
        }
        let mut padded = [0u8; 4];
        padded[..chunk.len()].copy_from_slice(chunk);
        let mut value = u32::from_be_bytes(padded);

        let mut digits = [0u8; 5];
        for digit in digits.iter_mut().rev() {
            *digit = (value % 85) as u8 + b'!';
            value /= 85;
        }
        result.extend_from_slice(&digits[..chunk.len() + 1]);
    }

    result.extend_from_slice(b"~>");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_hex_decode() {
        assert_eq!(decode_ascii_hex(b"48656C6C6F>").unwrap(), b"Hello");
        assert_eq!(decode_ascii_hex(b"48 65\n6c 6C 6f").unwrap(), b"Hello");
        assert_eq!(decode_ascii_hex(b"7>").unwrap(), vec![0x70]);
        assert_eq!(decode_ascii_hex(b"41>4243").unwrap(), b"A");
        assert!(decode_ascii_hex(b"").unwrap().is_empty());
        assert!(decode_ascii_hex(b"4G>").is_err());
    }

    #[test]
    fn test_ascii_hex_encode() {
        assert_eq!(encode_ascii_hex(b"\x01\xAB\xff"), b"01ABFF>");
        assert_eq!(encode_ascii_hex(b""), b">");
    }

    #[test]
    fn test_ascii85_decode() {
        assert_eq!(decode_ascii85(b"87cURDZ~>").unwrap(), b"Hello");
        assert_eq!(decode_ascii85(b"<~87cURDZ~>").unwrap(), b"Hello");
        assert_eq!(decode_ascii85(b"z~>").unwrap(), vec![0, 0, 0, 0]);
        assert_eq!(decode_ascii85(b"87cUR DZ").unwrap(), b"Hello");
        assert!(decode_ascii85(b"").unwrap().is_empty());
    }

    #[test]
    fn test_ascii85_decode_invalid() {
        assert!(decode_ascii85(b"abc{~>").is_err());
        assert!(decode_ascii85(b"87cUR~x").is_err());
        assert!(decode_ascii85(b"uuuuu~>").is_err());
        assert_eq!(
            decode_ascii85(b"87cUR!~>").unwrap_err().to_string(),
            "Stream decode error: ASCII85 final group has a single character"
        );
        assert!(decode_ascii85(b"8z~>").is_err());
    }

    #[test]
    fn test_ascii85_encode() {
        assert_eq!(encode_ascii85(b"Hello"), b"87cURDZ~>");
        assert_eq!(encode_ascii85(&[0, 0, 0, 0, 1]), b"z!<~>");
        assert_eq!(encode_ascii85(b""), b"~>");

        let data: Vec<u8> = (0..=255).collect();
        assert_eq!(decode_ascii85(&encode_ascii85(&data)).unwrap(), data);
    }
}
