//! PDF Parser Module
//!
//! Reads the object graph of a PDF file lazily: the cross-reference index is
//! built once when the reader is opened, and indirect objects are parsed on
//! demand whenever a reference is traced. Stream payloads are decoded and
//! encoded through the filter pipeline in [`filters`].

pub mod filter_impls;
pub mod filters;
pub mod header;
pub mod lexer;
pub mod object_stream;
pub mod objects;
pub mod reader;
pub mod source;
pub mod stack_safe;
pub mod trailer;
pub mod xref;
pub mod xref_stream;

#[doc(hidden)]
pub mod test_helpers;


pub use self::filters::{decode_stream, encode_stream, select_encoder, Encoder};
pub use self::header::{PdfHeader, PdfVersion};
pub use self::objects::{
    IndirectObject, PdfArray, PdfDictionary, PdfName, PdfObject, PdfStream, PdfString,
};
pub use self::reader::PdfReader;
pub use self::source::PositionalReader;
pub use self::xref::{XRefEntry, XRefTable};

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// PDF Parser errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File is empty")]
    EmptyFile,

    #[error("Invalid PDF header")]
    InvalidHeader,

    #[error("Syntax error at position {position}: {message}")]
    SyntaxError { position: u64, message: String },

    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Missing required key: {0}")]
    MissingKey(String),

    #[error("Invalid xref table")]
    InvalidXRef,

    #[error("Invalid trailer")]
    InvalidTrailer,

    #[error("Circular reference detected: object {object} is already being resolved")]
    CircularReference { object: i64 },

    #[error("Maximum recursion depth exceeded (limit: {limit})")]
    RecursionLimitExceeded { limit: usize },

    #[error("Failed reading: requested {requested} bytes, got {read}")]
    ReadFailed { requested: usize, read: usize },

    #[error("Invalid stream filter: {0}")]
    InvalidFilter(String),

    #[error("Unsupported encoding method ({0})")]
    UnsupportedFilter(String),

    #[error("Encoding not supported: {0}")]
    UnsupportedEncoding(String),

    #[error("Stream decode error: {0}")]
    StreamDecodeError(String),

    #[error("Invalid stream length: {0}")]
    InvalidStreamLength(String),

    #[error("Invalid encryption dictionary: {0}")]
    InvalidEncryptDictionary(String),
}

/// Options controlling how tolerant the parser is with malformed input
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    /// Recover stream payloads by scanning for `endstream` when the declared
    /// length is unusable
    pub lenient_streams: bool,
    /// How far past the declared end of a stream the recovery scan may look
    pub max_recovery_bytes: usize,
    /// Nesting limit for containers and chained references
    pub max_recursion_depth: usize,
    /// Capacity of the positional reader's read-ahead buffer
    pub buffer_capacity: usize,
}

/// Default read-ahead buffer size of the positional reader
pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;

/// Default nesting limit
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 500;

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            lenient_streams: false,
            max_recovery_bytes: 1000,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl ParseOptions {
    /// Strict parsing: every malformed stream is an error
    pub fn strict() -> Self {
        Self {
            lenient_streams: false,
            max_recovery_bytes: 0,
            ..Self::default()
        }
    }

    /// Lenient parsing for damaged real-world files
    pub fn lenient() -> Self {
        Self {
            lenient_streams: true,
            max_recovery_bytes: 5000,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_presets() {
        let default = ParseOptions::default();
        assert!(!default.lenient_streams);
        assert_eq!(default.max_recovery_bytes, 1000);
        assert_eq!(default.buffer_capacity, DEFAULT_BUFFER_CAPACITY);

        let lenient = ParseOptions::lenient();
        assert!(lenient.lenient_streams);
        assert_eq!(lenient.max_recovery_bytes, 5000);

        let strict = ParseOptions::strict();
        assert!(!strict.lenient_streams);
        assert_eq!(strict.max_recovery_bytes, 0);
        assert_eq!(strict.max_recursion_depth, DEFAULT_MAX_RECURSION_DEPTH);
    }

    #[test]
    fn test_error_display() {
        let err = ParseError::CircularReference { object: 13 };
        assert_eq!(
            err.to_string(),
            "Circular reference detected: object 13 is already being resolved"
        );

        let err = ParseError::UnsupportedFilter("Foo".to_string());
        assert_eq!(err.to_string(), "Unsupported encoding method (Foo)");
    }
}
