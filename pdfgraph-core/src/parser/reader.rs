//! PDF Document Reader
//!
//! Builds the cross-reference index when a document is opened and resolves
//! indirect objects on demand. Every public resolution entry point creates its
//! own [`StackSafeContext`], so in-flight object numbers never leak from one
//! request into the next.

use super::filters;
use super::header::{PdfHeader, PdfVersion, HEADER_SEARCH_LIMIT};
use super::lexer::{Lexer, Token};
use super::object_stream::ObjectStream;
use super::objects::{
    IndirectObject, PdfArray, PdfDictionary, PdfName, PdfObject, PdfStream, PdfString,
};
use super::source::PositionalReader;
use super::stack_safe::{RecursionGuard, ReferenceGuard, StackSafeContext};
use super::trailer::PdfTrailer;
use super::xref::{self, XRefEntry, XRefTable};
use super::xref_stream::XRefStream;
use super::{ParseError, ParseOptions, ParseResult};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

/// How far from the end of the file `startxref` is searched for
const STARTXREF_SEARCH_LIMIT: u64 = 1024;

const ENDSTREAM: &[u8] = b"endstream";

/// Lazy PDF object graph reader
pub struct PdfReader<R: Read + Seek> {
    lexer: Lexer<R>,
    xref: XRefTable,
    trailer: Option<PdfTrailer>,
    header: Option<PdfHeader>,
    /// Parsing options
    options: ParseOptions,
}

impl PdfReader<File> {
    /// Open a PDF file from a path
    pub fn open<P: AsRef<Path>>(path: P) -> ParseResult<Self> {
        let file = File::open(path)?;
        Self::new_with_options(file, ParseOptions::lenient())
    }

    /// Open a PDF file from a path with strict parsing
    pub fn open_strict<P: AsRef<Path>>(path: P) -> ParseResult<Self> {
        let file = File::open(path)?;
        Self::new_with_options(file, ParseOptions::strict())
    }
}

impl<R: Read + Seek> PdfReader<R> {
    /// Create a new PDF reader from a reader
    pub fn new(source: R) -> ParseResult<Self> {
        Self::new_with_options(source, ParseOptions::default())
    }

    /// Create a new PDF reader with custom parsing options.
    ///
    /// Validates the header and loads every cross-reference section reachable
    /// from `startxref`.
    pub fn new_with_options(source: R, options: ParseOptions) -> ParseResult<Self> {
        let mut reader = Self::from_parts(source, XRefTable::new(), options);
        reader.load()?;
        Ok(reader)
    }

    /// Reader over an explicit index; nothing is read from `source` yet
    pub fn from_parts(source: R, xref: XRefTable, options: ParseOptions) -> Self {
        let source = PositionalReader::with_capacity(options.buffer_capacity, source);
        Self {
            lexer: Lexer::new(source),
            xref,
            trailer: None,
            header: None,
            options,
        }
    }

    /// Install a trailer dictionary on a reader built with [`Self::from_parts`]
    pub fn set_trailer(&mut self, dict: PdfDictionary) {
        self.trailer = Some(PdfTrailer::from_dict(dict, 0));
    }

    /// Get parsing options
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn xref(&self) -> &XRefTable {
        &self.xref
    }

    /// Newest trailer of the document
    pub fn trailer(&self) -> Option<&PdfTrailer> {
        self.trailer.as_ref()
    }

    pub fn header(&self) -> Option<&PdfHeader> {
        self.header.as_ref()
    }

    /// Get PDF version
    pub fn version(&self) -> Option<PdfVersion> {
        self.header.as_ref().map(|h| h.version)
    }

    /// Logical offset of the reader
    pub fn position(&mut self) -> ParseResult<u64> {
        self.lexer.position()
    }

    /// Move the reader to `offset`
    pub fn seek(&mut self, offset: u64) -> ParseResult<()> {
        self.lexer.seek(offset)
    }

    pub fn into_inner(self) -> R {
        self.lexer.into_source().into_inner()
    }

    fn new_context(&self) -> StackSafeContext {
        StackSafeContext::with_limit(self.options.max_recursion_depth)
    }

    /// Resolve `obj` if it is a reference; any other value comes back as is.
    ///
    /// Absent, free or unlocatable objects resolve to [`PdfObject::Null`]
    /// without error. The reader position is restored afterwards.
    pub fn trace(&mut self, obj: &PdfObject) -> ParseResult<PdfObject> {
        let PdfObject::Reference(number, generation) = obj else {
            return Ok(obj.clone());
        };

        let saved = self.lexer.position()?;
        let mut context = self.new_context();
        let result = self.resolve_reference(*number, *generation, &mut context);
        self.lexer.seek(saved)?;
        result
    }

    /// Resolve object `number` through the index
    pub fn object(&mut self, number: i64) -> ParseResult<PdfObject> {
        let generation = self.xref.get(number).map(|e| e.generation()).unwrap_or(0);
        self.trace(&PdfObject::Reference(number, generation))
    }

    /// Parse one `N G obj ... endobj` at the current position
    pub fn parse_indirect_object(&mut self) -> ParseResult<IndirectObject> {
        let mut context = self.new_context();
        self.parse_indirect_object_with(&mut context)
    }

    /// Parse one direct object at `offset`
    pub fn parse_object_at(&mut self, offset: u64) -> ParseResult<PdfObject> {
        self.lexer.seek(offset)?;
        let mut context = self.new_context();
        self.parse_object(&mut context)
    }

    /// Whether the trailer carries an encryption dictionary.
    ///
    /// An `Encrypt` entry that does not resolve to a dictionary is an error.
    pub fn is_encrypted(&mut self) -> ParseResult<bool> {
        let Some(encrypt) = self.trailer.as_ref().and_then(|t| t.encrypt()).cloned() else {
            return Ok(false);
        };

        match self.trace(&encrypt)? {
            PdfObject::Dictionary(_) => Ok(true),
            other => Err(ParseError::InvalidEncryptDictionary(format!(
                "Encrypt resolves to {}, expected a dictionary",
                other.type_name()
            ))),
        }
    }

    /// Decode a stream whose `Filter` / `DecodeParms` may be indirect
    pub fn decode_stream(&mut self, stream: &PdfStream) -> ParseResult<Vec<u8>> {
        let saved = self.lexer.position()?;
        let mut context = self.new_context();
        let dict = self.resolve_filter_entries(&stream.dict, &mut context);
        self.lexer.seek(saved)?;

        let resolved = PdfStream {
            dict: dict?,
            data: stream.data.clone(),
        };
        filters::decode_stream(&resolved)
    }

    /// Resolve indirect `Filter` / `DecodeParms` values and their array
    /// items within the in-flight set of `context`
    fn resolve_filter_entries(
        &mut self,
        dict: &PdfDictionary,
        context: &mut StackSafeContext,
    ) -> ParseResult<PdfDictionary> {
        let mut resolved = dict.clone();
        for key in ["Filter", "DecodeParms"] {
            let Some(value) = dict.get(key) else {
                continue;
            };
            let value = match self.resolve_value(value, context)? {
                PdfObject::Array(items) => {
                    let mut out = PdfArray::new();
                    for item in items.iter() {
                        out.push(self.resolve_value(item, context)?);
                    }
                    PdfObject::Array(out)
                }
                other => other,
            };
            resolved.insert(key, value);
        }
        Ok(resolved)
    }

    fn resolve_value(
        &mut self,
        value: &PdfObject,
        context: &mut StackSafeContext,
    ) -> ParseResult<PdfObject> {
        match value {
            PdfObject::Reference(number, generation) => {
                self.resolve_reference(*number, *generation, context)
            }
            other => Ok(other.clone()),
        }
    }

    // ---- document loading ----

    fn load(&mut self) -> ParseResult<()> {
        let len = self.lexer.source_mut().source_len()?;
        if len == 0 {
            return Err(ParseError::EmptyFile);
        }

        self.lexer.seek(0)?;
        let prefix = self
            .lexer
            .source_mut()
            .read_up_to(Some(HEADER_SEARCH_LIMIT))?;
        let header = PdfHeader::parse(&prefix)?;
        tracing::debug!("PDF version {}", header.version);
        self.header = Some(header);

        let startxref = self.find_startxref(len)?;
        self.load_xref_chain(startxref)
    }

    fn find_startxref(&mut self, len: u64) -> ParseResult<u64> {
        let tail_start = len.saturating_sub(STARTXREF_SEARCH_LIMIT);
        self.lexer.seek(tail_start)?;
        let tail = self.lexer.source_mut().read_up_to(None)?;
        let pos = tail
            .windows(b"startxref".len())
            .rposition(|w| w == b"startxref")
            .ok_or(ParseError::InvalidXRef)?;

        self.lexer.seek(tail_start + pos as u64)?;
        match self.lexer.next_token()? {
            Token::StartXRef => {}
            _ => return Err(ParseError::InvalidXRef),
        }
        match self.lexer.next_token()? {
            Token::Integer(offset) if offset >= 0 => Ok(offset as u64),
            _ => Err(ParseError::InvalidXRef),
        }
    }

    /// Walk sections newest first; the first definition of a number wins
    fn load_xref_chain(&mut self, start: u64) -> ParseResult<()> {
        let mut visited = HashSet::new();
        let mut next = Some(start);

        while let Some(offset) = next {
            if !visited.insert(offset) {
                tracing::warn!("XRef section at offset {} already loaded, stopping", offset);
                break;
            }
            let trailer = self.load_xref_section(offset, &mut visited)?;
            next = trailer.prev();
            if self.trailer.is_none() {
                self.trailer = Some(trailer);
            }
        }

        tracing::debug!("Loaded {} xref entries", self.xref.len());
        Ok(())
    }

    fn load_xref_section(
        &mut self,
        offset: u64,
        visited: &mut HashSet<u64>,
    ) -> ParseResult<PdfTrailer> {
        self.lexer.seek(offset)?;
        let token = self.lexer.next_token()?;
        if !token.is_keyword("xref") {
            return self.load_xref_stream(offset);
        }

        let entries = xref::parse_table_section(&mut self.lexer)?;
        if !self.lexer.next_token()?.is_keyword("trailer") {
            return Err(ParseError::InvalidTrailer);
        }
        let mut context = self.new_context();
        let dict = match self.parse_object(&mut context)? {
            PdfObject::Dictionary(dict) => dict,
            _ => return Err(ParseError::InvalidTrailer),
        };
        let trailer = PdfTrailer::from_dict(dict, offset);

        // Hybrid file: the stream's entries take precedence over this table
        if let Some(stm_offset) = trailer.xref_stm() {
            if visited.insert(stm_offset) {
                self.load_xref_stream(stm_offset)?;
            }
        }

        for (number, entry) in entries {
            self.xref.insert_if_absent(number, entry);
        }
        Ok(trailer)
    }

    fn load_xref_stream(&mut self, offset: u64) -> ParseResult<PdfTrailer> {
        self.lexer.seek(offset)?;
        let indirect = self.parse_indirect_object()?;
        let PdfObject::Stream(stream) = indirect.object else {
            return Err(ParseError::InvalidXRef);
        };

        let xref_stream = XRefStream::parse(&stream)?;
        for (number, entry) in xref_stream.entries {
            self.xref.insert_if_absent(number, entry);
        }
        Ok(PdfTrailer::from_dict(xref_stream.dict, offset))
    }

    // ---- resolution ----

    /// Follow a reference with `number` kept in flight for the whole lookup
    fn resolve_reference(
        &mut self,
        number: i64,
        generation: u16,
        context: &mut StackSafeContext,
    ) -> ParseResult<PdfObject> {
        let mut guard = ReferenceGuard::new(context, number)?;
        let mut depth = RecursionGuard::new(&mut guard)?;

        match self.load_object(number, generation, &mut depth)? {
            PdfObject::Reference(next_number, next_generation) => {
                tracing::trace!(
                    "Object {} {} R resolves to {} {} R",
                    number,
                    generation,
                    next_number,
                    next_generation
                );
                self.resolve_reference(next_number, next_generation, &mut depth)
            }
            object => Ok(object),
        }
    }

    fn load_object(
        &mut self,
        number: i64,
        generation: u16,
        context: &mut StackSafeContext,
    ) -> ParseResult<PdfObject> {
        let Some(entry) = self.xref.get(number).copied() else {
            tracing::debug!(
                "Object {} {} R not in xref table, resolving to null",
                number,
                generation
            );
            return Ok(PdfObject::Null);
        };

        match entry {
            XRefEntry::Free { .. } => {
                tracing::debug!("Object {} is free, resolving to null", number);
                Ok(PdfObject::Null)
            }
            XRefEntry::InUse {
                offset,
                generation: stored,
            } => {
                if stored != generation {
                    tracing::debug!(
                        "Generation mismatch for object {}: expected {}, xref has {}",
                        number,
                        generation,
                        stored
                    );
                }
                if offset >= self.lexer.source_mut().source_len()? {
                    tracing::warn!(
                        "Object {} offset {} is past the end of the file, resolving to null",
                        number,
                        offset
                    );
                    return Ok(PdfObject::Null);
                }

                self.lexer.seek(offset)?;
                let indirect = self.parse_indirect_object_with(context)?;
                if indirect.number != number {
                    tracing::debug!(
                        "XRef entry for object {} points at object {} {}",
                        number,
                        indirect.number,
                        indirect.generation
                    );
                }
                Ok(indirect.object)
            }
            XRefEntry::Compressed {
                stream_object,
                index,
            } => self.load_compressed_object(number, stream_object, index, context),
        }
    }

    fn load_compressed_object(
        &mut self,
        number: i64,
        stream_object: u32,
        index: u32,
        context: &mut StackSafeContext,
    ) -> ParseResult<PdfObject> {
        let stream_number = i64::from(stream_object);
        let mut guard = ReferenceGuard::new(context, stream_number)?;

        let PdfObject::Stream(mut stream) = self.load_object(stream_number, 0, &mut guard)? else {
            tracing::warn!(
                "Object stream {} for object {} is not a stream, resolving to null",
                stream_object,
                number
            );
            return Ok(PdfObject::Null);
        };

        stream.dict = self.resolve_filter_entries(&stream.dict, &mut guard)?;
        let objstm = ObjectStream::parse(&stream)?;
        Ok(objstm
            .get(number, index, &self.options)?
            .unwrap_or(PdfObject::Null))
    }

    // ---- object parsing ----

    fn parse_indirect_object_with(
        &mut self,
        context: &mut StackSafeContext,
    ) -> ParseResult<IndirectObject> {
        let number = match self.lexer.next_token()? {
            Token::Integer(n) => n,
            other => return Err(unexpected("object number", &other)),
        };
        let generation = match self.lexer.next_token()? {
            Token::Integer(n) => u16::try_from(n).map_err(|_| ParseError::SyntaxError {
                position: 0,
                message: format!("Invalid generation number {n}"),
            })?,
            other => return Err(unexpected("generation number", &other)),
        };
        match self.lexer.next_token()? {
            Token::Obj => {}
            other => return Err(unexpected("obj", &other)),
        }

        let object = self.parse_object(context)?;

        match self.lexer.next_token()? {
            Token::EndObj => {}
            other => {
                tracing::warn!(
                    "Missing endobj after object {} {}, found {:?}",
                    number,
                    generation,
                    other
                );
            }
        }

        Ok(IndirectObject {
            number,
            generation,
            object,
        })
    }

    fn parse_object(&mut self, context: &mut StackSafeContext) -> ParseResult<PdfObject> {
        let token = self.lexer.next_token()?;
        self.parse_object_from(token, context)
    }

    fn parse_object_from(
        &mut self,
        token: Token,
        context: &mut StackSafeContext,
    ) -> ParseResult<PdfObject> {
        match token {
            Token::Null => Ok(PdfObject::Null),
            Token::Boolean(b) => Ok(PdfObject::Boolean(b)),
            Token::Real(r) => Ok(PdfObject::Real(r)),
            Token::String(s) => Ok(PdfObject::String(PdfString(s))),
            Token::Name(n) => Ok(PdfObject::Name(PdfName(n))),
            Token::Integer(n) => self.parse_integer_or_reference(n),
            Token::ArrayStart => {
                let mut guard = RecursionGuard::new(context)?;
                self.parse_array(&mut guard).map(PdfObject::Array)
            }
            Token::DictStart => {
                let mut guard = RecursionGuard::new(context)?;
                let dict = self.parse_dictionary(&mut guard)?;
                match self.lexer.next_token()? {
                    Token::Stream => self
                        .parse_stream_body(dict, &mut guard)
                        .map(PdfObject::Stream),
                    other => {
                        self.lexer.push_token(other);
                        Ok(PdfObject::Dictionary(dict))
                    }
                }
            }
            Token::Eof => Err(ParseError::SyntaxError {
                position: self.lexer.position()?,
                message: "Unexpected end of file".to_string(),
            }),
            other => Err(unexpected("object", &other)),
        }
    }

    /// `N G R` is recognised by two-token lookahead
    fn parse_integer_or_reference(&mut self, number: i64) -> ParseResult<PdfObject> {
        let second = self.lexer.next_token()?;
        let Token::Integer(generation) = second else {
            self.lexer.push_token(second);
            return Ok(PdfObject::Integer(number));
        };

        let third = self.lexer.next_token()?;
        if third.is_keyword("R") {
            let generation = u16::try_from(generation).map_err(|_| ParseError::SyntaxError {
                position: 0,
                message: format!("Invalid generation number in reference {number} {generation} R"),
            })?;
            return Ok(PdfObject::Reference(number, generation));
        }

        self.lexer.push_token(third);
        self.lexer.push_token(Token::Integer(generation));
        Ok(PdfObject::Integer(number))
    }

    fn parse_array(&mut self, context: &mut StackSafeContext) -> ParseResult<PdfArray> {
        let mut array = PdfArray::new();
        loop {
            match self.lexer.next_token()? {
                Token::ArrayEnd => return Ok(array),
                token => array.push(self.parse_object_from(token, context)?),
            }
        }
    }

    fn parse_dictionary(&mut self, context: &mut StackSafeContext) -> ParseResult<PdfDictionary> {
        let mut dict = PdfDictionary::new();
        loop {
            match self.lexer.next_token()? {
                Token::DictEnd => return Ok(dict),
                Token::Name(key) => {
                    let value = self.parse_object(context)?;
                    dict.insert(key, value);
                }
                other => return Err(unexpected("dictionary key", &other)),
            }
        }
    }

    /// Read a stream payload; the `stream` keyword is already consumed
    fn parse_stream_body(
        &mut self,
        dict: PdfDictionary,
        context: &mut StackSafeContext,
    ) -> ParseResult<PdfStream> {
        self.lexer.skip_stream_eol()?;
        let data_start = self.lexer.position()?;

        // Resolving an indirect Length moves the reader
        let length = self.resolve_stream_length(&dict, context);
        self.lexer.seek(data_start)?;
        let length = length?;

        let data = match length {
            Some(len) => match self.read_declared_stream(len) {
                Ok(data) => data,
                Err(e) if self.options.lenient_streams => {
                    tracing::debug!("Declared stream length {} unusable: {}", len, e);
                    self.recover_stream_data(data_start, Some(len))?
                }
                Err(e) => return Err(e),
            },
            None if self.options.lenient_streams => self.recover_stream_data(data_start, None)?,
            None => {
                return Err(ParseError::InvalidStreamLength(format!(
                    "no usable Length for stream at offset {data_start}"
                )))
            }
        };

        Ok(PdfStream { dict, data })
    }

    /// `Ok(None)` when Length is missing, not a non-negative integer or dangling
    fn resolve_stream_length(
        &mut self,
        dict: &PdfDictionary,
        context: &mut StackSafeContext,
    ) -> ParseResult<Option<u64>> {
        match dict.get("Length") {
            Some(PdfObject::Integer(n)) if *n >= 0 => Ok(Some(*n as u64)),
            Some(PdfObject::Reference(number, generation)) => {
                match self.resolve_reference(*number, *generation, context)? {
                    PdfObject::Integer(n) if n >= 0 => Ok(Some(n as u64)),
                    other => {
                        tracing::debug!(
                            "Stream Length {} {} R resolves to {}",
                            number,
                            generation,
                            other.type_name()
                        );
                        Ok(None)
                    }
                }
            }
            Some(other) => {
                tracing::debug!("Stream Length is {}", other);
                Ok(None)
            }
            None => {
                tracing::debug!("Stream dictionary has no Length");
                Ok(None)
            }
        }
    }

    fn read_declared_stream(&mut self, len: u64) -> ParseResult<Vec<u8>> {
        let data = self.lexer.read_bytes(len)?;
        match self.lexer.next_token()? {
            Token::EndStream => Ok(data),
            other => Err(ParseError::InvalidStreamLength(format!(
                "expected endstream after {len} bytes, found {other:?}"
            ))),
        }
    }

    /// Take everything up to the next `endstream` as the payload
    fn recover_stream_data(&mut self, data_start: u64, declared: Option<u64>) -> ParseResult<Vec<u8>> {
        let limit = declared.map(|len| {
            usize::try_from(len)
                .unwrap_or(usize::MAX)
                .saturating_add(self.options.max_recovery_bytes)
                .saturating_add(ENDSTREAM.len())
        });

        self.lexer.seek(data_start)?;
        let end = self
            .lexer
            .find_keyword(ENDSTREAM, limit)?
            .ok_or_else(|| {
                ParseError::InvalidStreamLength(format!(
                    "endstream not found for stream at offset {data_start}"
                ))
            })?;

        self.lexer.seek(data_start)?;
        let mut data = self.lexer.read_bytes(end - data_start)?;
        // The EOL before endstream is not part of the data
        if data.ends_with(b"\r\n") {
            data.truncate(data.len() - 2);
        } else if data.ends_with(b"\n") || data.ends_with(b"\r") {
            data.truncate(data.len() - 1);
        }
        self.lexer.seek(end + ENDSTREAM.len() as u64)?;

        tracing::warn!(
            "Recovered {} stream bytes at offset {} by scanning for endstream (declared {:?})",
            data.len(),
            data_start,
            declared
        );
        Ok(data)
    }
}

fn unexpected(expected: &str, found: &Token) -> ParseError {
    ParseError::UnexpectedToken {
        expected: expected.to_string(),
        found: format!("{found:?}"),
    }
}
