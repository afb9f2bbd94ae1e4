//! PDF Lexer
//!
//! Tokenizes PDF syntax according to ISO 32000-1 Section 7.2, reading through a
//! [`PositionalReader`] so every token boundary has an exact file offset.

use super::source::PositionalReader;
use super::{ParseError, ParseResult};
use std::io::{Read, Seek};

/// PDF Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Boolean: true or false
    Boolean(bool),

    /// Integer number
    Integer(i64),

    /// Real number
    Real(f64),

    /// String (literal or hexadecimal)
    String(Vec<u8>),

    /// Name object (e.g., /Type)
    Name(String),

    /// Left square bracket [
    ArrayStart,

    /// Right square bracket ]
    ArrayEnd,

    /// Dictionary start <<
    DictStart,

    /// Dictionary end >>
    DictEnd,

    /// Stream keyword
    Stream,

    /// Endstream keyword
    EndStream,

    /// Obj keyword
    Obj,

    /// Endobj keyword
    EndObj,

    /// StartXRef keyword
    StartXRef,

    /// Null object
    Null,

    /// Any other bare word (`R`, `xref`, `trailer`, `n`, `f`, ...)
    Keyword(String),

    /// End of file
    Eof,
}

impl Token {
    pub fn is_keyword(&self, word: &str) -> bool {
        matches!(self, Token::Keyword(k) if k == word)
    }
}

/// PDF whitespace (ISO 32000-1 Table 1)
pub fn is_whitespace(ch: u8) -> bool {
    matches!(ch, b'\0' | b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

/// PDF delimiters (ISO 32000-1 Table 2)
pub fn is_delimiter(ch: u8) -> bool {
    matches!(
        ch,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// PDF Lexer for tokenizing PDF content
pub struct Lexer<R> {
    source: PositionalReader<R>,
    token_buffer: Vec<Token>,
}

impl<R: Read + Seek> Lexer<R> {
    /// Create a new lexer over a positional reader
    pub fn new(source: PositionalReader<R>) -> Self {
        Self {
            source,
            token_buffer: Vec::new(),
        }
    }

    /// Logical offset of the next unread byte
    pub fn position(&mut self) -> ParseResult<u64> {
        self.source.current_offset()
    }

    /// Jump to `offset`; pushed-back tokens are dropped
    pub fn seek(&mut self, offset: u64) -> ParseResult<()> {
        self.token_buffer.clear();
        self.source.seek_to(offset)
    }

    pub fn source_mut(&mut self) -> &mut PositionalReader<R> {
        &mut self.source
    }

    pub fn into_source(self) -> PositionalReader<R> {
        self.source
    }

    /// Get the next token
    pub fn next_token(&mut self) -> ParseResult<Token> {
        // Check if we have a pushed-back token
        if let Some(token) = self.token_buffer.pop() {
            return Ok(token);
        }

        self.skip_whitespace_and_comments()?;

        let ch = match self.source.peek_byte()? {
            Some(ch) => ch,
            None => return Ok(Token::Eof),
        };

        match ch {
            b'/' => self.read_name(),
            b'(' => self.read_literal_string(),
            b'<' => self.read_angle_bracket(),
            b'>' => {
                self.source.next_byte()?;
                if self.source.peek_byte()? == Some(b'>') {
                    self.source.next_byte()?;
                    Ok(Token::DictEnd)
                } else {
                    Err(self.syntax_error("Expected '>' after '>'"))
                }
            }
            b'[' => {
                self.source.next_byte()?;
                Ok(Token::ArrayStart)
            }
            b']' => {
                self.source.next_byte()?;
                Ok(Token::ArrayEnd)
            }
            b'+' | b'-' | b'0'..=b'9' | b'.' => self.read_number(),
            _ if ch.is_ascii_alphabetic() => {
                let word = self.read_word()?;
                Ok(Self::process_keyword(word))
            }
            _ => Err(self.syntax_error(&format!("Unexpected character: 0x{ch:02X}"))),
        }
    }

    /// Peek at the next token without consuming it
    pub fn peek_token(&mut self) -> ParseResult<Token> {
        let token = self.next_token()?;
        self.push_token(token.clone());
        Ok(token)
    }

    /// Push back a token; tokens come back out in reverse push order
    pub fn push_token(&mut self, token: Token) {
        self.token_buffer.push(token);
    }

    /// Skip whitespace and return the number of bytes skipped
    pub fn skip_whitespace(&mut self) -> ParseResult<usize> {
        let mut count = 0;
        while let Some(ch) = self.source.peek_byte()? {
            if !is_whitespace(ch) {
                break;
            }
            self.source.next_byte()?;
            count += 1;
        }
        Ok(count)
    }

    fn skip_whitespace_and_comments(&mut self) -> ParseResult<()> {
        loop {
            self.skip_whitespace()?;
            if self.source.peek_byte()? != Some(b'%') {
                return Ok(());
            }
            while let Some(ch) = self.source.peek_byte()? {
                if ch == b'\n' || ch == b'\r' {
                    break;
                }
                self.source.next_byte()?;
            }
        }
    }

    /// Skip the end-of-line marker that follows the `stream` keyword.
    ///
    /// CRLF and LF are the valid markers; a lone CR is tolerated.
    pub fn skip_stream_eol(&mut self) -> ParseResult<()> {
        // Spaces before the EOL show up in the wild
        while self.source.peek_byte()? == Some(b' ') {
            self.source.next_byte()?;
        }
        match self.source.peek_byte()? {
            Some(b'\r') => {
                self.source.next_byte()?;
                if self.source.peek_byte()? == Some(b'\n') {
                    self.source.next_byte()?;
                }
            }
            Some(b'\n') => {
                self.source.next_byte()?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Read exactly `len` raw bytes
    pub fn read_bytes(&mut self, len: u64) -> ParseResult<Vec<u8>> {
        debug_assert!(self.token_buffer.is_empty());
        self.source.read_vec(len)
    }

    /// Scan forward for `keyword`, looking at most `limit` bytes ahead.
    ///
    /// Returns the offset where the keyword starts. The reader position is
    /// unspecified afterwards.
    pub fn find_keyword(&mut self, keyword: &[u8], limit: Option<usize>) -> ParseResult<Option<u64>> {
        let start = self.position()?;
        let window = self.source.read_up_to(limit)?;
        Ok(window
            .windows(keyword.len())
            .position(|w| w == keyword)
            .map(|pos| start + pos as u64))
    }

    /// Read a name object (e.g., /Type)
    fn read_name(&mut self) -> ParseResult<Token> {
        self.source.next_byte()?; // consume '/'
        let mut name = String::new();

        while let Some(ch) = self.source.peek_byte()? {
            if is_whitespace(ch) || is_delimiter(ch) {
                break;
            }
            self.source.next_byte()?;

            // Handle hex codes in names (e.g., /A#20B means /A B)
            if ch == b'#' {
                let hi = self.next_hex_digit("Invalid hex code in name")?;
                let lo = self.next_hex_digit("Invalid hex code in name")?;
                name.push(((hi << 4) | lo) as char);
            } else {
                name.push(ch as char);
            }
        }

        Ok(Token::Name(name))
    }

    fn next_hex_digit(&mut self, message: &str) -> ParseResult<u8> {
        match self.source.next_byte()?.and_then(hex_value) {
            Some(v) => Ok(v),
            None => Err(self.syntax_error(message)),
        }
    }

    /// Read a literal string (parentheses)
    fn read_literal_string(&mut self) -> ParseResult<Token> {
        self.source.next_byte()?; // consume '('
        let mut string = Vec::new();
        let mut paren_depth = 1usize;

        while paren_depth > 0 {
            let ch = match self.source.next_byte()? {
                Some(ch) => ch,
                None => return Err(self.syntax_error("Unterminated string")),
            };

            match ch {
                b'\\' => {
                    let escaped = match self.source.next_byte()? {
                        Some(ch) => ch,
                        None => return Err(self.syntax_error("Unterminated string")),
                    };
                    match escaped {
                        b'n' => string.push(b'\n'),
                        b'r' => string.push(b'\r'),
                        b't' => string.push(b'\t'),
                        b'b' => string.push(b'\x08'),
                        b'f' => string.push(b'\x0C'),
                        b'0'..=b'7' => {
                            // Octal escape sequence, high-order overflow ignored
                            let mut value = u32::from(escaped - b'0');
                            for _ in 0..2 {
                                match self.source.peek_byte()? {
                                    Some(next @ b'0'..=b'7') => {
                                        self.source.next_byte()?;
                                        value = value * 8 + u32::from(next - b'0');
                                    }
                                    _ => break,
                                }
                            }
                            string.push((value & 0xFF) as u8);
                        }
                        // Line continuation
                        b'\r' => {
                            if self.source.peek_byte()? == Some(b'\n') {
                                self.source.next_byte()?;
                            }
                        }
                        b'\n' => {}
                        // \( \) \\ and unknown escapes are the literal character
                        other => string.push(other),
                    }
                }
                b'(' => {
                    string.push(ch);
                    paren_depth += 1;
                }
                b')' => {
                    paren_depth -= 1;
                    if paren_depth > 0 {
                        string.push(ch);
                    }
                }
                _ => string.push(ch),
            }
        }

        Ok(Token::String(string))
    }

    /// Read angle bracket tokens (hex strings or dict markers)
    fn read_angle_bracket(&mut self) -> ParseResult<Token> {
        self.source.next_byte()?; // consume '<'

        if self.source.peek_byte()? == Some(b'<') {
            self.source.next_byte()?;
            return Ok(Token::DictStart);
        }

        let mut bytes = Vec::new();
        let mut pending: Option<u8> = None;
        loop {
            let ch = match self.source.next_byte()? {
                Some(ch) => ch,
                None => return Err(self.syntax_error("Unterminated hex string")),
            };
            if ch == b'>' {
                break;
            }
            if is_whitespace(ch) {
                continue;
            }
            let value = match hex_value(ch) {
                Some(v) => v,
                None => return Err(self.syntax_error("Invalid character in hex string")),
            };
            match pending.take() {
                Some(hi) => bytes.push((hi << 4) | value),
                None => pending = Some(value),
            }
        }

        // Pad with 0 if odd number of digits
        if let Some(hi) = pending {
            bytes.push(hi << 4);
        }

        Ok(Token::String(bytes))
    }

    /// Read a number (integer or real)
    fn read_number(&mut self) -> ParseResult<Token> {
        let mut number_str = String::new();
        let mut has_dot = false;

        if let Some(ch @ (b'+' | b'-')) = self.source.peek_byte()? {
            self.source.next_byte()?;
            number_str.push(ch as char);
        }

        while let Some(ch) = self.source.peek_byte()? {
            match ch {
                b'0'..=b'9' => {
                    self.source.next_byte()?;
                    number_str.push(ch as char);
                }
                b'.' if !has_dot => {
                    self.source.next_byte()?;
                    number_str.push(ch as char);
                    has_dot = true;
                }
                _ => break,
            }
        }

        if has_dot {
            // "5." and "-.5" are valid PDF reals
            let normalized = match number_str.as_str() {
                "." | "-." | "+." => return Err(self.syntax_error("Invalid real number")),
                s if s.ends_with('.') => format!("{s}0"),
                s => s.to_string(),
            };
            let value = normalized
                .parse::<f64>()
                .map_err(|_| self.syntax_error(&format!("Invalid real number: '{number_str}'")))?;
            Ok(Token::Real(value))
        } else {
            let value = number_str
                .parse::<i64>()
                .map_err(|_| self.syntax_error(&format!("Invalid integer: '{number_str}'")))?;
            Ok(Token::Integer(value))
        }
    }

    /// Process a word as a keyword
    fn process_keyword(word: String) -> Token {
        match word.as_str() {
            "true" => Token::Boolean(true),
            "false" => Token::Boolean(false),
            "null" => Token::Null,
            "stream" => Token::Stream,
            "endstream" => Token::EndStream,
            "obj" => Token::Obj,
            "endobj" => Token::EndObj,
            "startxref" => Token::StartXRef,
            _ => Token::Keyword(word),
        }
    }

    /// Read a word (sequence of non-delimiter characters)
    fn read_word(&mut self) -> ParseResult<String> {
        let mut word = String::new();

        while let Some(ch) = self.source.peek_byte()? {
            if is_whitespace(ch) || is_delimiter(ch) {
                break;
            }
            self.source.next_byte()?;
            word.push(ch as char);
        }

        Ok(word)
    }

    fn syntax_error(&mut self, message: &str) -> ParseError {
        ParseError::SyntaxError {
            position: self.source.current_offset().unwrap_or(0),
            message: message.to_string(),
        }
    }
}

fn hex_value(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        _ => None,
    }
}
