//! FlateDecode filter (ISO 32000-1 Section 7.4.4)

use super::predictor::PredictorParams;
use crate::parser::objects::PdfDictionary;
use crate::parser::{ParseError, ParseResult};

#[cfg(feature = "compression")]
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
#[cfg(feature = "compression")]
use std::io::{Read, Write};

/// zlib/deflate codec with optional predictor
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlateEncoder {
    pub predictor: PredictorParams,
}

impl FlateEncoder {
    pub fn from_params(parms: Option<&PdfDictionary>) -> Self {
        Self {
            predictor: PredictorParams::from_dict(parms),
        }
    }

    pub fn decode(&self, data: &[u8]) -> ParseResult<Vec<u8>> {
        let inflated = inflate(data)?;
        self.predictor.decode(inflated)
    }

    /// Compress without prediction; encoding with a predictor is not implemented
    pub fn encode(&self, data: &[u8]) -> ParseResult<Vec<u8>> {
        if !self.predictor.is_identity() {
            return Err(ParseError::UnsupportedEncoding(format!(
                "FlateDecode with predictor {}",
                self.predictor.predictor
            )));
        }
        deflate(data)
    }
}

#[cfg(feature = "compression")]
fn inflate(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut result = Vec::new();
    decoder
        .read_to_end(&mut result)
        .map_err(|e| ParseError::StreamDecodeError(format!("Flate decode error: {e}")))?;
    Ok(result)
}

#[cfg(feature = "compression")]
fn deflate(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| ParseError::StreamDecodeError(format!("Flate encode error: {e}")))
}

#[cfg(not(feature = "compression"))]
fn inflate(_data: &[u8]) -> ParseResult<Vec<u8>> {
    Err(ParseError::StreamDecodeError(
        "FlateDecode requires 'compression' feature".to_string(),
    ))
}

#[cfg(not(feature = "compression"))]
fn deflate(_data: &[u8]) -> ParseResult<Vec<u8>> {
    Err(ParseError::UnsupportedEncoding(
        "FlateDecode requires 'compression' feature".to_string(),
    ))
}

#[cfg(all(test, feature = "compression"))]
mod tests {
    use super::*;
    use crate::parser::objects::PdfObject;

    #[test]
    fn test_flate_round_trip() {
        let encoder = FlateEncoder::default();
        let data = b"BT /F1 12 Tf 72 712 Td (Hello) Tj ET".repeat(20);
        let compressed = encoder.encode(&data).unwrap();
        assert!(compressed.len() < data.len());
        assert_eq!(encoder.decode(&compressed).unwrap(), data);
    }

    #[test]
    fn test_flate_corrupt_data() {
        let encoder = FlateEncoder::default();
        assert!(matches!(
            encoder.decode(b"definitely not zlib"),
            Err(ParseError::StreamDecodeError(_))
        ));
    }

    #[test]
    fn test_flate_with_png_predictor() {
        let mut parms = PdfDictionary::new();
        parms.insert("Predictor", PdfObject::Integer(12));
        parms.insert("Columns", PdfObject::Integer(2));
        let encoder = FlateEncoder::from_params(Some(&parms));

        // Rows: Up-filtered [1 2] then [1 1]
        let compressed = FlateEncoder::default().encode(&[2, 1, 2, 2, 1, 1]).unwrap();
        assert_eq!(encoder.decode(&compressed).unwrap(), vec![1, 2, 2, 3]);

        assert!(matches!(
            encoder.encode(b"abc"),
            Err(ParseError::UnsupportedEncoding(_))
        ));
    }
}
