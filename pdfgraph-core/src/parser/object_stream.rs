//! PDF Object Stream Parser
//!
//! Handles compressed objects stored in object streams (PDF 1.5+)

use super::lexer::{Lexer, Token};
use super::objects::{PdfObject, PdfStream};
use super::reader::PdfReader;
use super::source::PositionalReader;
use super::xref::XRefTable;
use super::{ParseError, ParseOptions, ParseResult};
use std::io::Cursor;

/// A decoded object stream
#[derive(Debug)]
pub struct ObjectStream {
    /// `(object number, offset relative to First)` in stream order
    offsets: Vec<(i64, u64)>,
    /// Offset of first object
    first: u64,
    /// Decoded stream data
    data: Vec<u8>,
}

impl ObjectStream {
    /// Decode an object stream and read its offset table
    pub fn parse(stream: &PdfStream) -> ParseResult<Self> {
        let dict = &stream.dict;
        if dict.get_type() != Some("ObjStm") {
            return Err(ParseError::SyntaxError {
                position: 0,
                message: format!(
                    "Expected /Type /ObjStm, found {}",
                    dict.get("Type").map(|t| t.to_string()).unwrap_or_default()
                ),
            });
        }

        let n = dict
            .get("N")
            .and_then(|obj| obj.as_integer())
            .ok_or_else(|| ParseError::MissingKey("N".to_string()))?;
        let first = dict
            .get("First")
            .and_then(|obj| obj.as_integer())
            .and_then(|i| u64::try_from(i).ok())
            .ok_or_else(|| ParseError::MissingKey("First".to_string()))?;

        let data = stream.decode()?;
        let header_end = usize::try_from(first).unwrap_or(usize::MAX).min(data.len());
        let offsets = Self::read_offsets(&data[..header_end], n)?;

        Ok(ObjectStream {
            offsets,
            first,
            data,
        })
    }

    fn read_offsets(header: &[u8], n: i64) -> ParseResult<Vec<(i64, u64)>> {
        let mut lexer = Lexer::new(PositionalReader::new(Cursor::new(header)));
        let mut offsets = Vec::new();

        for _ in 0..n.max(0) {
            let number = match lexer.next_token()? {
                Token::Integer(n) => n,
                Token::Eof => {
                    tracing::warn!(
                        "Object stream header lists {} of {} objects",
                        offsets.len(),
                        n
                    );
                    break;
                }
                other => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "object number".to_string(),
                        found: format!("{other:?}"),
                    })
                }
            };

            let offset = match lexer.next_token()? {
                Token::Integer(n) if n >= 0 => n as u64,
                other => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "object offset".to_string(),
                        found: format!("{other:?}"),
                    })
                }
            };

            offsets.push((number, offset));
        }

        Ok(offsets)
    }

    /// Number of objects listed in the header
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Object numbers in stream order
    pub fn object_numbers(&self) -> impl Iterator<Item = i64> + '_ {
        self.offsets.iter().map(|(num, _)| *num)
    }

    /// Parse object `number`, stored at `index` according to the xref entry.
    ///
    /// The index is tried first; when it names a different object the offset
    /// table is searched by number. `None` when the object is not in the stream.
    pub fn get(
        &self,
        number: i64,
        index: u32,
        options: &ParseOptions,
    ) -> ParseResult<Option<PdfObject>> {
        let slot = match self.offsets.get(index as usize) {
            Some((num, offset)) if *num == number => Some(*offset),
            _ => self
                .offsets
                .iter()
                .find(|(num, _)| *num == number)
                .map(|(_, offset)| *offset),
        };

        let Some(relative) = slot else {
            tracing::debug!("Object {} not found in object stream", number);
            return Ok(None);
        };

        let offset = self.first.saturating_add(relative);
        let mut reader = PdfReader::from_parts(
            Cursor::new(self.data.as_slice()),
            XRefTable::new(),
            options.clone(),
        );
        reader.parse_object_at(offset).map(Some)
    }
}
