//! Cross-reference streams (ISO 32000-1 Section 7.5.8)

use super::filters;
use super::objects::{PdfDictionary, PdfObject, PdfStream};
use super::xref::XRefEntry;
use super::{ParseError, ParseResult};

/// Widest field accepted in `/W`
const MAX_FIELD_WIDTH: i64 = 8;

/// A decoded cross-reference stream
#[derive(Debug, Clone)]
pub struct XRefStream {
    /// Stream dictionary, which doubles as the trailer
    pub dict: PdfDictionary,
    /// Entries in stream order
    pub entries: Vec<(u32, XRefEntry)>,
}

impl XRefStream {
    /// Decode the stream and read its entries
    pub fn parse(stream: &PdfStream) -> ParseResult<Self> {
        let dict = &stream.dict;
        if dict.get_type() != Some("XRef") {
            return Err(ParseError::InvalidXRef);
        }

        let widths = Self::field_widths(dict)?;
        let size = dict
            .get("Size")
            .and_then(|o| o.as_integer())
            .ok_or_else(|| ParseError::MissingKey("Size".to_string()))?;
        let subsections = Self::subsections(dict, size)?;

        let data = filters::decode_stream(stream)?;
        let row_len: usize = widths.iter().sum();
        if row_len == 0 {
            return Err(ParseError::InvalidXRef);
        }

        let mut rows = data.chunks_exact(row_len);
        let mut entries = Vec::new();
        'sections: for (first, count) in subsections {
            for i in 0..count {
                let Some(row) = rows.next() else {
                    tracing::warn!("XRef stream data ends before all {} subsection rows", count);
                    break 'sections;
                };
                let Some(number) = first.checked_add(i) else {
                    break 'sections;
                };
                if let Some(entry) = Self::decode_row(row, &widths) {
                    entries.push((number, entry));
                }
            }
        }

        Ok(XRefStream {
            dict: dict.clone(),
            entries,
        })
    }

    fn field_widths(dict: &PdfDictionary) -> ParseResult<[usize; 3]> {
        let w = dict
            .get("W")
            .and_then(|o| o.as_array())
            .ok_or_else(|| ParseError::MissingKey("W".to_string()))?;
        if w.len() != 3 {
            return Err(ParseError::InvalidXRef);
        }

        let mut widths = [0usize; 3];
        for (slot, obj) in widths.iter_mut().zip(w.iter()) {
            match obj.as_integer() {
                Some(n) if (0..=MAX_FIELD_WIDTH).contains(&n) => *slot = n as usize,
                _ => return Err(ParseError::InvalidXRef),
            }
        }
        Ok(widths)
    }

    /// `(first object number, count)` pairs, `[0 Size]` by default
    fn subsections(dict: &PdfDictionary, size: i64) -> ParseResult<Vec<(u32, u32)>> {
        let to_u32 = |n: i64| u32::try_from(n).map_err(|_| ParseError::InvalidXRef);

        match dict.get("Index") {
            None => Ok(vec![(0, to_u32(size)?)]),
            Some(PdfObject::Array(index)) => {
                if index.len() % 2 != 0 {
                    return Err(ParseError::InvalidXRef);
                }
                index
                    .0
                    .chunks_exact(2)
                    .map(|pair| match (pair[0].as_integer(), pair[1].as_integer()) {
                        (Some(first), Some(count)) => Ok((to_u32(first)?, to_u32(count)?)),
                        _ => Err(ParseError::InvalidXRef),
                    })
                    .collect()
            }
            Some(_) => Err(ParseError::InvalidXRef),
        }
    }

    /// Rows with an unknown type are ignored
    fn decode_row(row: &[u8], widths: &[usize; 3]) -> Option<XRefEntry> {
        let (f1, rest) = row.split_at(widths[0]);
        let (f2, f3) = rest.split_at(widths[1]);

        // A missing type field means type 1
        let kind = if widths[0] == 0 { 1 } else { read_field(f1) };
        let field2 = read_field(f2);
        let field3 = read_field(f3);

        match kind {
            0 => Some(XRefEntry::Free {
                next_free: field2,
                generation: u16::try_from(field3).unwrap_or(u16::MAX),
            }),
            1 => Some(XRefEntry::InUse {
                offset: field2,
                generation: u16::try_from(field3).unwrap_or(u16::MAX),
            }),
            2 => Some(XRefEntry::Compressed {
                stream_object: u32::try_from(field2).ok()?,
                index: u32::try_from(field3).ok()?,
            }),
            other => {
                tracing::debug!("Ignoring xref stream entry of type {}", other);
                None
            }
        }
    }
}

/// Big-endian unsigned field
fn read_field(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}
