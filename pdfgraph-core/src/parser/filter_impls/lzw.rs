//! LZWDecode filter (ISO 32000-1 Section 7.4.4)
//!
//! Codes are MSB-first with 8-bit literals. `EarlyChange` 1 (the default)
//! widens the code one entry early, which is the TIFF convention.

use super::predictor::PredictorParams;
use crate::parser::objects::PdfDictionary;
use crate::parser::{ParseError, ParseResult};
use weezl::{decode, encode, BitOrder};

const LZW_MIN_CODE_SIZE: u8 = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct LzwEncoder {
    pub predictor: PredictorParams,
    pub early_change: i64,
}

impl Default for LzwEncoder {
    fn default() -> Self {
        Self {
            predictor: PredictorParams::default(),
            early_change: 1,
        }
    }
}

impl LzwEncoder {
    /// `EarlyChange` is looked up on the stream dictionary, then on the decode parameters
    pub fn from_dict(stream_dict: &PdfDictionary, parms: Option<&PdfDictionary>) -> Self {
        let early_change = stream_dict
            .get("EarlyChange")
            .and_then(|o| o.as_integer())
            .or_else(|| {
                parms
                    .and_then(|p| p.get("EarlyChange"))
                    .and_then(|o| o.as_integer())
            })
            .unwrap_or(1);

        Self {
            predictor: PredictorParams::from_dict(parms),
            early_change,
        }
    }

    pub fn decode(&self, data: &[u8]) -> ParseResult<Vec<u8>> {
        let mut decoder = match self.early_change {
            0 => decode::Decoder::new(BitOrder::Msb, LZW_MIN_CODE_SIZE),
            1 => decode::Decoder::with_tiff_size_switch(BitOrder::Msb, LZW_MIN_CODE_SIZE),
            other => {
                return Err(ParseError::StreamDecodeError(format!(
                    "Invalid LZW EarlyChange value: {other}"
                )))
            }
        };
        let decoded = decoder
            .decode(data)
            .map_err(|e| ParseError::StreamDecodeError(format!("LZW decode error: {e:?}")))?;
        self.predictor.decode(decoded)
    }

    /// Only `EarlyChange 0` without a predictor can be written
    pub fn encode(&self, data: &[u8]) -> ParseResult<Vec<u8>> {
        if self.early_change != 0 {
            return Err(ParseError::UnsupportedEncoding(format!(
                "LZWDecode with EarlyChange {}",
                self.early_change
            )));
        }
        if !self.predictor.is_identity() {
            return Err(ParseError::UnsupportedEncoding(format!(
                "LZWDecode with predictor {}",
                self.predictor.predictor
            )));
        }
        encode::Encoder::new(BitOrder::Msb, LZW_MIN_CODE_SIZE)
            .encode(data)
            .map_err(|e| ParseError::StreamDecodeError(format!("LZW encode error: {e:?}")))
    }
}
