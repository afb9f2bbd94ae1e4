//! # pdfgraph
//!
//! Lazy access to the object graph of a PDF file: a cross-reference index
//! built once per document, cycle-safe resolution of indirect references and a
//! composable stream filter pipeline.
//!
//! ## Features
//!
//! - **Cross-reference index**: classic `xref` tables, cross-reference
//!   streams, hybrid files and incremental updates
//! - **Lazy resolution**: objects are parsed when a reference is traced;
//!   dangling references resolve to `null`
//! - **Cycle safety**: a stream whose `Length` leads back into itself fails
//!   with [`ParseError::CircularReference`] instead of recursing
//! - **Object streams**: compressed objects (PDF 1.5+) are found through the
//!   same index
//! - **Filters**: Flate, LZW, RunLength, ASCIIHex and ASCII85 in both
//!   directions, with PNG/TIFF predictors; chained filters; image filters
//!   pass their payload through
//!
//! ## Reading objects
//!
//! ```rust
//! use pdfgraph::parser::test_helpers::create_minimal_pdf;
//! use pdfgraph::{PdfObject, PdfReader};
//! use std::io::Cursor;
//!
//! # fn main() -> pdfgraph::ParseResult<()> {
//! let mut reader = PdfReader::new(Cursor::new(create_minimal_pdf()))?;
//! let (root, _) = reader.trailer().expect("trailer").root()?;
//! let catalog = reader.object(root)?;
//! assert_eq!(catalog.as_dict().and_then(|d| d.get_type()), Some("Catalog"));
//!
//! // References to unknown objects are null
//! assert_eq!(reader.trace(&PdfObject::Reference(-1, 0))?, PdfObject::Null);
//! # Ok(())
//! # }
//! ```
//!
//! ## Encoding and decoding streams
//!
//! ```rust
//! use pdfgraph::parser::{decode_stream, encode_stream};
//! use pdfgraph::{PdfDictionary, PdfName, PdfObject, PdfStream};
//!
//! # fn main() -> pdfgraph::ParseResult<()> {
//! let mut dict = PdfDictionary::new();
//! dict.insert("Filter", PdfObject::Name(PdfName::new("ASCIIHexDecode")));
//! let mut stream = PdfStream::new(dict, b"raw bytes".to_vec());
//!
//! encode_stream(&mut stream)?;
//! assert_eq!(stream.dict.get("Length"), Some(&PdfObject::Integer(19)));
//! assert_eq!(decode_stream(&stream)?, b"raw bytes");
//! # Ok(())
//! # }
//! ```

pub mod parser;

pub use parser::{
    Encoder, IndirectObject, ParseError, ParseOptions, ParseResult, PdfArray, PdfDictionary,
    PdfName, PdfObject, PdfReader, PdfStream, PdfString, XRefEntry, XRefTable,
};

/// Current version of pdfgraph
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
