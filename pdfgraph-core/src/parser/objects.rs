//! PDF Object Model
//!
//! The closed set of values a PDF document is made of (ISO 32000-1 Section 7.3).
//! Values are plain data: references are kept as numeric keys and resolved
//! through [`PdfReader::trace`](super::reader::PdfReader::trace) at use time.

use indexmap::IndexMap;
use std::fmt;

/// PDF Name object
///
/// Each byte of a parsed name is stored as the char with that code point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PdfName(pub String);

/// PDF String object
#[derive(Debug, Clone, PartialEq)]
pub struct PdfString(pub Vec<u8>);

/// PDF Array object
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdfArray(pub Vec<PdfObject>);

/// PDF Dictionary object
///
/// Entries keep their insertion order for serialization; equality ignores it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdfDictionary(pub IndexMap<PdfName, PdfObject>);

/// PDF Stream object: a dictionary plus its stored (possibly filtered) payload
#[derive(Debug, Clone, PartialEq)]
pub struct PdfStream {
    pub dict: PdfDictionary,
    pub data: Vec<u8>,
}

/// PDF Object types
#[derive(Debug, Clone, PartialEq)]
pub enum PdfObject {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(PdfString),
    Name(PdfName),
    Array(PdfArray),
    Dictionary(PdfDictionary),
    Stream(PdfStream),
    /// object number, generation number
    Reference(i64, u16),
}

/// An object parsed from `N G obj ... endobj`
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectObject {
    pub number: i64,
    pub generation: u16,
    pub object: PdfObject,
}

impl PdfObject {
    /// Check if this object is null
    pub fn is_null(&self) -> bool {
        matches!(self, PdfObject::Null)
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PdfObject::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PdfObject::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as real number
    pub fn as_real(&self) -> Option<f64> {
        match self {
            PdfObject::Real(r) => Some(*r),
            PdfObject::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as string
    pub fn as_string(&self) -> Option<&PdfString> {
        match self {
            PdfObject::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as name
    pub fn as_name(&self) -> Option<&PdfName> {
        match self {
            PdfObject::Name(n) => Some(n),
            _ => None,
        }
    }

    /// Get as array
    pub fn as_array(&self) -> Option<&PdfArray> {
        match self {
            PdfObject::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get as dictionary (the dictionary of a stream counts)
    pub fn as_dict(&self) -> Option<&PdfDictionary> {
        match self {
            PdfObject::Dictionary(d) => Some(d),
            PdfObject::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    /// Get as stream
    pub fn as_stream(&self) -> Option<&PdfStream> {
        match self {
            PdfObject::Stream(s) => Some(s),
            _ => None,
        }
    }

    /// Get as reference
    pub fn as_reference(&self) -> Option<(i64, u16)> {
        match self {
            PdfObject::Reference(num, gen) => Some((*num, *gen)),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            PdfObject::Null => "Null",
            PdfObject::Boolean(_) => "Boolean",
            PdfObject::Integer(_) => "Integer",
            PdfObject::Real(_) => "Real",
            PdfObject::String(_) => "String",
            PdfObject::Name(_) => "Name",
            PdfObject::Array(_) => "Array",
            PdfObject::Dictionary(_) => "Dictionary",
            PdfObject::Stream(_) => "Stream",
            PdfObject::Reference(_, _) => "Reference",
        }
    }
}

impl From<i64> for PdfObject {
    fn from(value: i64) -> Self {
        PdfObject::Integer(value)
    }
}

impl From<bool> for PdfObject {
    fn from(value: bool) -> Self {
        PdfObject::Boolean(value)
    }
}

impl From<PdfName> for PdfObject {
    fn from(value: PdfName) -> Self {
        PdfObject::Name(value)
    }
}

impl From<PdfDictionary> for PdfObject {
    fn from(value: PdfDictionary) -> Self {
        PdfObject::Dictionary(value)
    }
}

impl From<PdfArray> for PdfObject {
    fn from(value: PdfArray) -> Self {
        PdfObject::Array(value)
    }
}

impl PdfDictionary {
    /// Create a new empty dictionary
    pub fn new() -> Self {
        PdfDictionary(IndexMap::new())
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&PdfObject> {
        self.0.get(&PdfName::new(key))
    }

    /// Insert a key-value pair, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: PdfObject) -> Option<PdfObject> {
        self.0.insert(PdfName(key.into()), value)
    }

    /// Remove a key, keeping the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<PdfObject> {
        self.0.shift_remove(&PdfName::new(key))
    }

    /// Check if dictionary contains a key
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(&PdfName::new(key))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&PdfName, &PdfObject)> {
        self.0.iter()
    }

    /// Get the dictionary type (value of /Type key)
    pub fn get_type(&self) -> Option<&str> {
        self.get("Type")
            .and_then(|obj| obj.as_name())
            .map(|n| n.as_str())
    }
}

impl FromIterator<(PdfName, PdfObject)> for PdfDictionary {
    fn from_iter<T: IntoIterator<Item = (PdfName, PdfObject)>>(iter: T) -> Self {
        PdfDictionary(iter.into_iter().collect())
    }
}

impl PdfArray {
    /// Create a new empty array
    pub fn new() -> Self {
        PdfArray(Vec::new())
    }

    /// Get array length
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if array is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get element at index
    pub fn get(&self, index: usize) -> Option<&PdfObject> {
        self.0.get(index)
    }

    /// Push an element
    pub fn push(&mut self, obj: PdfObject) {
        self.0.push(obj);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PdfObject> {
        self.0.iter()
    }
}

impl PdfString {
    /// Create a new PDF string
    pub fn new(data: Vec<u8>) -> Self {
        PdfString(data)
    }

    /// Get as UTF-8 string if possible
    pub fn as_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.0)
    }

    /// Get as bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl PdfName {
    /// Create a new PDF name
    pub fn new(name: impl Into<String>) -> Self {
        PdfName(name.into())
    }

    /// Get the name as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PdfStream {
    /// Create a stream whose `Length` matches `data`
    pub fn new(mut dict: PdfDictionary, data: Vec<u8>) -> Self {
        dict.insert("Length", PdfObject::Integer(data.len() as i64));
        Self { dict, data }
    }

    /// Get the raw (possibly compressed) stream data
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    /// Get the decompressed stream data
    pub fn decode(&self) -> super::ParseResult<Vec<u8>> {
        super::filters::decode_stream(self)
    }
}

fn write_name_byte(f: &mut fmt::Formatter<'_>, b: u8) -> fmt::Result {
    let regular = b.is_ascii_graphic()
        && !matches!(
            b,
            b'#' | b'/' | b'%' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}'
        );
    if regular {
        write!(f, "{}", b as char)
    } else {
        write!(f, "#{b:02X}")
    }
}

impl fmt::Display for PdfName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        for ch in self.0.chars() {
            // Parsed name bytes are stored one char per byte
            match u8::try_from(ch) {
                Ok(b) => write_name_byte(f, b)?,
                Err(_) => {
                    let mut utf8 = [0u8; 4];
                    for &b in ch.encode_utf8(&mut utf8).as_bytes() {
                        write_name_byte(f, b)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for PdfString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for &b in &self.0 {
            match b {
                b'(' | b')' | b'\\' => write!(f, "\\{}", b as char)?,
                b'\n' => f.write_str("\\n")?,
                b'\r' => f.write_str("\\r")?,
                b'\t' => f.write_str("\\t")?,
                0x20..=0x7E => write!(f, "{}", b as char)?,
                _ => write!(f, "\\{b:03o}")?,
            }
        }
        f.write_str(")")
    }
}

impl fmt::Display for PdfArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, obj) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{obj}")?;
        }
        f.write_str("]")
    }
}

impl fmt::Display for PdfDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<<")?;
        for (key, value) in &self.0 {
            write!(f, " {key} {value}")?;
        }
        f.write_str(" >>")
    }
}

impl fmt::Display for PdfObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfObject::Null => f.write_str("null"),
            PdfObject::Boolean(b) => write!(f, "{b}"),
            PdfObject::Integer(i) => write!(f, "{i}"),
            PdfObject::Real(r) => write!(f, "{r}"),
            PdfObject::String(s) => write!(f, "{s}"),
            PdfObject::Name(n) => write!(f, "{n}"),
            PdfObject::Array(a) => write!(f, "{a}"),
            PdfObject::Dictionary(d) => write!(f, "{d}"),
            PdfObject::Stream(s) => write!(f, "{} stream[{} bytes]", s.dict, s.data.len()),
            PdfObject::Reference(num, gen) => write!(f, "{num} {gen} R"),
        }
    }
}
