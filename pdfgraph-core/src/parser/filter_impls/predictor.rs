//! TIFF and PNG predictors (ISO 32000-1 Section 7.4.4.4)
//!
//! Applied after Flate or LZW decompression when `Predictor` > 1.

use crate::parser::objects::PdfDictionary;
use crate::parser::{ParseError, ParseResult};

/// Widest row accepted, in bytes
const MAX_ROW_BYTES: usize = 1 << 24;

/// Predictor parameters from a filter's decode parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictorParams {
    pub predictor: i64,
    pub colors: i64,
    pub bits_per_component: i64,
    pub columns: i64,
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
        }
    }
}

impl PredictorParams {
    pub fn from_dict(parms: Option<&PdfDictionary>) -> Self {
        let mut params = Self::default();
        let Some(parms) = parms else {
            return params;
        };

        let int = |key: &str| parms.get(key).and_then(|o| o.as_integer());
        if let Some(v) = int("Predictor") {
            params.predictor = v;
        }
        if let Some(v) = int("Colors") {
            params.colors = v;
        }
        if let Some(v) = int("BitsPerComponent") {
            params.bits_per_component = v;
        }
        if let Some(v) = int("Columns") {
            params.columns = v;
        }
        params
    }

    /// No prediction applied
    pub fn is_identity(&self) -> bool {
        self.predictor <= 1
    }

    /// Undo the predictor on decompressed data
    pub fn decode(&self, data: Vec<u8>) -> ParseResult<Vec<u8>> {
        if self.is_identity() {
            return Ok(data);
        }
        let layout = self.layout()?;

        match self.predictor {
            2 => {
                if self.bits_per_component != 8 {
                    return Err(ParseError::StreamDecodeError(format!(
                        "TIFF predictor with {} bits per component is not supported",
                        self.bits_per_component
                    )));
                }
                Ok(decode_tiff(data, layout))
            }
            10..=15 => decode_png(&data, layout),
            other => Err(ParseError::StreamDecodeError(format!(
                "Unsupported predictor: {other}"
            ))),
        }
    }

    fn layout(&self) -> ParseResult<RowLayout> {
        let invalid = || {
            ParseError::StreamDecodeError(format!(
                "Invalid predictor parameters: colors {}, bits {}, columns {}",
                self.colors, self.bits_per_component, self.columns
            ))
        };

        if !matches!(self.bits_per_component, 1 | 2 | 4 | 8 | 16) {
            return Err(invalid());
        }
        let colors = usize::try_from(self.colors)
            .ok()
            .filter(|c| (1..=32).contains(c))
            .ok_or_else(invalid)?;
        let columns = usize::try_from(self.columns)
            .ok()
            .filter(|c| *c >= 1)
            .ok_or_else(invalid)?;
        let bits = self.bits_per_component as usize;

        let bits_per_pixel = colors * bits;
        let bytes_per_row = bits_per_pixel
            .checked_mul(columns)
            .map(|bits| bits.div_ceil(8))
            .filter(|len| *len <= MAX_ROW_BYTES)
            .ok_or_else(invalid)?;
        Ok(RowLayout {
            bytes_per_pixel: bits_per_pixel.div_ceil(8),
            bytes_per_row,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct RowLayout {
    bytes_per_pixel: usize,
    bytes_per_row: usize,
}

/// Horizontal differencing, 8 bits per component
fn decode_tiff(mut data: Vec<u8>, layout: RowLayout) -> Vec<u8> {
    let bpp = layout.bytes_per_pixel;
    for row in data.chunks_mut(layout.bytes_per_row) {
        for i in bpp..row.len() {
            row[i] = row[i].wrapping_add(row[i - bpp]);
        }
    }
    data
}

/// Each row carries its own PNG filter type byte
fn decode_png(data: &[u8], layout: RowLayout) -> ParseResult<Vec<u8>> {
    let RowLayout {
        bytes_per_pixel: bpp,
        bytes_per_row,
    } = layout;
    let mut result = Vec::with_capacity(data.len());
    let mut prev = vec![0u8; bytes_per_row];
    let mut row = vec![0u8; bytes_per_row];

    for chunk in data.chunks(bytes_per_row + 1) {
        let (&filter_type, encoded) = match chunk.split_first() {
            Some(split) => split,
            None => break,
        };
        // A short last row is padded with zeros
        row.fill(0);
        row[..encoded.len()].copy_from_slice(encoded);

        for i in 0..bytes_per_row {
            let left = if i >= bpp { row[i - bpp] } else { 0 };
            let up = prev[i];
            let up_left = if i >= bpp { prev[i - bpp] } else { 0 };
            let predicted = match filter_type {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((u16::from(left) + u16::from(up)) / 2) as u8,
                4 => paeth(left, up, up_left),
                other => {
                    return Err(ParseError::StreamDecodeError(format!(
                        "Unknown PNG filter type: {other}"
                    )))
                }
            };
            row[i] = row[i].wrapping_add(predicted);
        }

        result.extend_from_slice(&row);
        std::mem::swap(&mut prev, &mut row);
    }

    Ok(result)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let (ia, ib, ic) = (i16::from(a), i16::from(b), i16::from(c));
    let p = ia + ib - ic;
    let (pa, pb, pc) = ((p - ia).abs(), (p - ib).abs(), (p - ic).abs());
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
