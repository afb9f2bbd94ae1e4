//! Image filters: DCTDecode, CCITTFaxDecode, JBIG2Decode, JPXDecode
//!
//! The stored image encoding is what consumers hand to an image decoder, so
//! these filters carry their parameters and pass the payload through.

use crate::parser::objects::PdfDictionary;

/// DCTDecode parameters (ISO 32000-1 Section 7.4.8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DctParams {
    /// `None` leaves the choice to the JPEG data
    pub color_transform: Option<i64>,
}

impl DctParams {
    pub fn from_dict(parms: Option<&PdfDictionary>) -> Self {
        Self {
            color_transform: parms
                .and_then(|p| p.get("ColorTransform"))
                .and_then(|o| o.as_integer()),
        }
    }
}

/// CCITTFaxDecode parameters (ISO 32000-1 Section 7.4.6)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CcittParams {
    /// Negative: Group 4, zero: Group 3 1-D, positive: Group 3 2-D
    pub k: i64,
    pub columns: u32,
    /// 0 when unknown
    pub rows: u32,
    pub end_of_line: bool,
    pub encoded_byte_align: bool,
    pub end_of_block: bool,
    pub black_is_1: bool,
    pub damaged_rows_before_error: u32,
}

impl Default for CcittParams {
    fn default() -> Self {
        Self {
            k: 0,
            columns: 1728,
            rows: 0,
            end_of_line: false,
            encoded_byte_align: false,
            end_of_block: true,
            black_is_1: false,
            damaged_rows_before_error: 0,
        }
    }
}

impl CcittParams {
    pub fn from_dict(parms: Option<&PdfDictionary>) -> Self {
        let mut params = Self::default();
        let Some(dict) = parms else {
            return params;
        };

        let int = |key: &str| dict.get(key).and_then(|o| o.as_integer());
        let flag = |key: &str| dict.get(key).and_then(|o| o.as_bool());
        let unsigned = |v: i64| u32::try_from(v.max(0)).unwrap_or(u32::MAX);

        if let Some(k) = int("K") {
            params.k = k;
        }
        if let Some(columns) = int("Columns") {
            params.columns = unsigned(columns).max(1);
        }
        if let Some(rows) = int("Rows") {
            params.rows = unsigned(rows);
        }
        if let Some(v) = flag("EndOfLine") {
            params.end_of_line = v;
        }
        if let Some(v) = flag("EncodedByteAlign") {
            params.encoded_byte_align = v;
        }
        if let Some(v) = flag("EndOfBlock") {
            params.end_of_block = v;
        }
        if let Some(v) = flag("BlackIs1") {
            params.black_is_1 = v;
        }
        if let Some(v) = int("DamagedRowsBeforeError") {
            params.damaged_rows_before_error = unsigned(v);
        }
        params
    }

    pub fn is_group4(&self) -> bool {
        self.k < 0
    }
}

/// JBIG2Decode parameters (ISO 32000-1 Section 7.4.7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Jbig2Params {
    /// A `JBIG2Globals` stream is attached
    pub has_globals: bool,
}

impl Jbig2Params {
    pub fn from_dict(parms: Option<&PdfDictionary>) -> Self {
        Self {
            has_globals: parms.is_some_and(|p| p.contains_key("JBIG2Globals")),
        }
    }
}
