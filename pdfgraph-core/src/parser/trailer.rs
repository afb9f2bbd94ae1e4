//! PDF Trailer
//!
//! Trailer dictionary accessors according to ISO 32000-1 Section 7.5.5

use super::objects::{PdfDictionary, PdfObject};
use super::{ParseError, ParseResult};

/// PDF Trailer information
#[derive(Debug, Clone, PartialEq)]
pub struct PdfTrailer {
    /// The trailer dictionary
    pub dict: PdfDictionary,
    /// Byte offset of the xref section this trailer belongs to
    pub xref_offset: u64,
}

impl PdfTrailer {
    pub fn from_dict(dict: PdfDictionary, xref_offset: u64) -> Self {
        PdfTrailer { dict, xref_offset }
    }

    /// Byte offset of the previous xref section (if any)
    pub fn prev(&self) -> Option<u64> {
        offset_entry(&self.dict, "Prev")
    }

    /// Byte offset of the cross-reference stream of a hybrid file
    pub fn xref_stm(&self) -> Option<u64> {
        offset_entry(&self.dict, "XRefStm")
    }

    /// Get the size (number of entries in xref table)
    pub fn size(&self) -> ParseResult<u32> {
        self.dict
            .get("Size")
            .and_then(|obj| obj.as_integer())
            .and_then(|i| u32::try_from(i).ok())
            .ok_or_else(|| ParseError::MissingKey("Size".to_string()))
    }

    /// Get the root object reference (document catalog)
    pub fn root(&self) -> ParseResult<(i64, u16)> {
        self.dict
            .get("Root")
            .and_then(|obj| obj.as_reference())
            .ok_or_else(|| ParseError::MissingKey("Root".to_string()))
    }

    /// Raw `Encrypt` entry, unresolved
    pub fn encrypt(&self) -> Option<&PdfObject> {
        self.dict.get("Encrypt")
    }
}

fn offset_entry(dict: &PdfDictionary, key: &str) -> Option<u64> {
    dict.get(key)
        .and_then(|obj| obj.as_integer())
        .and_then(|i| u64::try_from(i).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailer_accessors() {
        let mut dict = PdfDictionary::new();
        dict.insert("Size", PdfObject::Integer(12));
        dict.insert("Root", PdfObject::Reference(1, 0));
        dict.insert("Prev", PdfObject::Integer(408));
        dict.insert("XRefStm", PdfObject::Integer(-5));

        let trailer = PdfTrailer::from_dict(dict, 900);
        assert_eq!(trailer.size().unwrap(), 12);
        assert_eq!(trailer.root().unwrap(), (1, 0));
        assert_eq!(trailer.prev(), Some(408));
        assert_eq!(trailer.xref_stm(), None);
        assert!(trailer.encrypt().is_none());
    }

    #[test]
    fn test_missing_required_keys() {
        let trailer = PdfTrailer::from_dict(PdfDictionary::new(), 0);
        assert!(matches!(trailer.size(), Err(ParseError::MissingKey(k)) if k == "Size"));
        assert!(matches!(trailer.root(), Err(ParseError::MissingKey(k)) if k == "Root"));
    }
}
