//! PDF Cross-Reference Table
//!
//! Maps object numbers to storage locations according to ISO 32000-1 Section
//! 7.5.4 (classic tables) and 7.5.8 (cross-reference streams, see
//! [`xref_stream`](super::xref_stream)). Lookup is by object number only; the
//! generation number is informational.

use super::lexer::{Lexer, Token};
use super::{ParseError, ParseResult};
use std::collections::HashMap;
use std::io::{Read, Seek};

/// Cross-reference entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntry {
    /// Unused object number; resolves to Null
    Free { next_free: u64, generation: u16 },
    /// Byte offset of the `N G obj` header
    InUse { offset: u64, generation: u16 },
    /// Object stored inside an object stream
    Compressed { stream_object: u32, index: u32 },
}

impl XRefEntry {
    /// Generation number (always 0 for compressed objects)
    pub fn generation(&self) -> u16 {
        match self {
            XRefEntry::Free { generation, .. } | XRefEntry::InUse { generation, .. } => *generation,
            XRefEntry::Compressed { .. } => 0,
        }
    }

    pub fn is_in_use(&self) -> bool {
        !matches!(self, XRefEntry::Free { .. })
    }
}

/// Cross-reference table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XRefTable {
    /// Map of object number to xref entry
    entries: HashMap<u32, XRefEntry>,
}

impl XRefTable {
    /// Create a new empty xref table
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an object number.
    ///
    /// Any integer is accepted; negative or out-of-range numbers are absent.
    pub fn get(&self, object: i64) -> Option<&XRefEntry> {
        let key = u32::try_from(object).ok()?;
        self.entries.get(&key)
    }

    /// Insert or replace an entry
    pub fn insert(&mut self, object: u32, entry: XRefEntry) -> Option<XRefEntry> {
        self.entries.insert(object, entry)
    }

    /// Insert only when the number is not yet known.
    ///
    /// Sections are read newest first, so the first definition seen wins.
    pub fn insert_if_absent(&mut self, object: u32, entry: XRefEntry) -> bool {
        match self.entries.entry(object) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries (arbitrary order)
    pub fn iter(&self) -> impl Iterator<Item = (u32, &XRefEntry)> {
        self.entries.iter().map(|(num, entry)| (*num, entry))
    }
}

/// Parse the subsections of a classic table.
///
/// The `xref` keyword must already be consumed. Stops in front of the
/// `trailer` keyword, which is left unread.
pub fn parse_table_section<R: Read + Seek>(
    lexer: &mut Lexer<R>,
) -> ParseResult<Vec<(u32, XRefEntry)>> {
    let mut entries = Vec::new();

    loop {
        let first = match lexer.next_token()? {
            Token::Integer(n) => n,
            token @ Token::Keyword(_) if token.is_keyword("trailer") => {
                lexer.push_token(token);
                return Ok(entries);
            }
            _ => return Err(ParseError::InvalidXRef),
        };
        let count = match lexer.next_token()? {
            Token::Integer(n) if n >= 0 => n,
            _ => return Err(ParseError::InvalidXRef),
        };
        let first = u32::try_from(first).map_err(|_| ParseError::InvalidXRef)?;

        for i in 0..count {
            let entry = parse_table_entry(lexer)?;
            let number = u32::try_from(i)
                .ok()
                .and_then(|i| first.checked_add(i))
                .ok_or(ParseError::InvalidXRef)?;
            entries.push((number, entry));
        }
    }
}

/// One `nnnnnnnnnn ggggg n|f` line
fn parse_table_entry<R: Read + Seek>(lexer: &mut Lexer<R>) -> ParseResult<XRefEntry> {
    let field1 = match lexer.next_token()? {
        Token::Integer(n) if n >= 0 => n as u64,
        _ => return Err(ParseError::InvalidXRef),
    };
    let generation = match lexer.next_token()? {
        Token::Integer(n) => u16::try_from(n).map_err(|_| ParseError::InvalidXRef)?,
        _ => return Err(ParseError::InvalidXRef),
    };

    match lexer.next_token()? {
        Token::Keyword(kind) if kind == "n" => Ok(XRefEntry::InUse {
            offset: field1,
            generation,
        }),
        Token::Keyword(kind) if kind == "f" => Ok(XRefEntry::Free {
            next_free: field1,
            generation,
        }),
        _ => Err(ParseError::InvalidXRef),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::source::PositionalReader;
    use std::io::Cursor;

    fn lexer(input: &[u8]) -> Lexer<Cursor<Vec<u8>>> {
        Lexer::new(PositionalReader::new(Cursor::new(input.to_vec())))
    }

    #[test]
    fn test_lookup_accepts_any_integer() {
        let mut table = XRefTable::new();
        table.insert(
            3,
            XRefEntry::InUse {
                offset: 15,
                generation: 0,
            },
        );

        assert!(table.get(3).is_some());
        assert!(table.get(-1).is_none());
        assert!(table.get(i64::MAX).is_none());
        assert!(table.get(4).is_none());
    }

    #[test]
    fn test_insert_if_absent_keeps_first() {
        let mut table = XRefTable::new();
        let newer = XRefEntry::InUse {
            offset: 500,
            generation: 1,
        };
        let older = XRefEntry::InUse {
            offset: 100,
            generation: 0,
        };
        assert!(table.insert_if_absent(7, newer));
        assert!(!table.insert_if_absent(7, older));
        assert_eq!(table.get(7), Some(&newer));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_parse_table_section() {
        let mut lexer = lexer(
            b"0 3\n0000000000 65535 f \n0000000015 00000 n \n0000000079 00002 n \n\
              10 1\n0000000200 00000 n \ntrailer\n<<>>",
        );
        let entries = parse_table_section(&mut lexer).unwrap();

        assert_eq!(entries.len(), 4);
        assert_eq!(
            entries[0],
            (
                0,
                XRefEntry::Free {
                    next_free: 0,
                    generation: 65535
                }
            )
        );
        assert_eq!(
            entries[2],
            (
                2,
                XRefEntry::InUse {
                    offset: 79,
                    generation: 2
                }
            )
        );
        assert_eq!(entries[3].0, 10);
        assert!(lexer.next_token().unwrap().is_keyword("trailer"));
    }

    #[test]
    fn test_parse_table_section_truncated() {
        let mut lexer = lexer(b"0 1000000\n0000000000 65535 f \n");
        assert!(matches!(
            parse_table_section(&mut lexer),
            Err(ParseError::InvalidXRef)
        ));
    }

    #[test]
    fn test_entry_generation() {
        let entry = XRefEntry::Compressed {
            stream_object: 5,
            index: 2,
        };
        assert_eq!(entry.generation(), 0);
        assert!(entry.is_in_use());
        assert!(!XRefEntry::Free {
            next_free: 0,
            generation: 65535
        }
        .is_in_use());
    }
}
