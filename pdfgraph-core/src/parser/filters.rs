//! PDF Stream Filters
//!
//! Selects the encoder for a stream from its `Filter` and `DecodeParms`
//! entries and runs stream payloads through it, according to
//! ISO 32000-1 Section 7.4.

use super::filter_impls::{
    decode_ascii85, decode_ascii_hex, decode_run_length, encode_ascii85, encode_ascii_hex,
    encode_run_length, CcittParams, DctParams, FlateEncoder, Jbig2Params, LzwEncoder,
};
use super::objects::{PdfDictionary, PdfObject, PdfStream};
use super::{ParseError, ParseResult};
use std::fmt;

/// A stream codec built from a stream dictionary
#[derive(Debug, Clone, PartialEq)]
pub enum Encoder {
    /// No filter
    Raw,
    /// zlib/deflate compression
    Flate(FlateEncoder),
    /// LZW compression
    Lzw(LzwEncoder),
    /// JPEG
    Dct(DctParams),
    RunLength,
    AsciiHex,
    Ascii85,
    /// CCITT Group 3/4 fax
    CcittFax(CcittParams),
    Jbig2(Jbig2Params),
    /// JPEG 2000
    Jpx,
    /// Filter chain in `Filter` array order
    Multi(Vec<Encoder>),
}

type EncoderConstructor = fn(&PdfDictionary, Option<&PdfDictionary>) -> Encoder;

/// Filter names, including the inline image abbreviations
const ENCODER_TABLE: &[(&str, EncoderConstructor)] = &[
    ("FlateDecode", flate),
    ("Fl", flate),
    ("LZWDecode", lzw),
    ("LZW", lzw),
    ("DCTDecode", dct),
    ("DCT", dct),
    ("RunLengthDecode", run_length),
    ("RL", run_length),
    ("ASCIIHexDecode", ascii_hex),
    ("AHx", ascii_hex),
    ("ASCII85Decode", ascii85),
    ("A85", ascii85),
    ("CCITTFaxDecode", ccitt_fax),
    ("CCF", ccitt_fax),
    ("JBIG2Decode", jbig2),
    ("JPXDecode", jpx),
];

fn flate(_: &PdfDictionary, parms: Option<&PdfDictionary>) -> Encoder {
    Encoder::Flate(FlateEncoder::from_params(parms))
}

fn lzw(dict: &PdfDictionary, parms: Option<&PdfDictionary>) -> Encoder {
    Encoder::Lzw(LzwEncoder::from_dict(dict, parms))
}

fn dct(_: &PdfDictionary, parms: Option<&PdfDictionary>) -> Encoder {
    Encoder::Dct(DctParams::from_dict(parms))
}

fn run_length(_: &PdfDictionary, _: Option<&PdfDictionary>) -> Encoder {
    Encoder::RunLength
}

fn ascii_hex(_: &PdfDictionary, _: Option<&PdfDictionary>) -> Encoder {
    Encoder::AsciiHex
}

fn ascii85(_: &PdfDictionary, _: Option<&PdfDictionary>) -> Encoder {
    Encoder::Ascii85
}

fn ccitt_fax(_: &PdfDictionary, parms: Option<&PdfDictionary>) -> Encoder {
    Encoder::CcittFax(CcittParams::from_dict(parms))
}

fn jbig2(_: &PdfDictionary, parms: Option<&PdfDictionary>) -> Encoder {
    Encoder::Jbig2(Jbig2Params::from_dict(parms))
}

fn jpx(_: &PdfDictionary, _: Option<&PdfDictionary>) -> Encoder {
    Encoder::Jpx
}

fn encoder_for_name(
    name: &str,
    dict: &PdfDictionary,
    parms: Option<&PdfDictionary>,
) -> ParseResult<Encoder> {
    ENCODER_TABLE
        .iter()
        .find(|(filter_name, _)| *filter_name == name)
        .map(|(_, construct)| construct(dict, parms))
        .ok_or_else(|| {
            tracing::error!("Unsupported filter: {}", name);
            ParseError::UnsupportedFilter(name.to_string())
        })
}

/// Decode parameters for the filter at `index` of `count`
fn decode_params(
    dict: &PdfDictionary,
    index: usize,
    count: usize,
) -> ParseResult<Option<&PdfDictionary>> {
    match dict.get("DecodeParms").or_else(|| dict.get("DP")) {
        None | Some(PdfObject::Null) => Ok(None),
        Some(PdfObject::Dictionary(parms)) => Ok(Some(parms)),
        Some(PdfObject::Array(array)) => {
            if array.len() < count {
                return Err(ParseError::InvalidFilter(format!(
                    "DecodeParms has {} entries for {} filters",
                    array.len(),
                    count
                )));
            }
            match array.get(index) {
                Some(PdfObject::Dictionary(parms)) => Ok(Some(parms)),
                _ => Ok(None),
            }
        }
        Some(other) => Err(ParseError::InvalidFilter(format!(
            "DecodeParms must be a Dictionary or an Array, found {}",
            other.type_name()
        ))),
    }
}

fn member_name(member: &PdfObject) -> ParseResult<&str> {
    member
        .as_name()
        .map(|name| name.as_str())
        .ok_or_else(|| ParseError::InvalidFilter("array member not a Name".to_string()))
}

/// Build the encoder described by a stream dictionary's `Filter` entry
pub fn select_encoder(dict: &PdfDictionary) -> ParseResult<Encoder> {
    match dict.get("Filter") {
        None | Some(PdfObject::Null) => Ok(Encoder::Raw),
        Some(PdfObject::Name(name)) => {
            encoder_for_name(name.as_str(), dict, decode_params(dict, 0, 1)?)
        }
        Some(PdfObject::Array(array)) => match array.0.as_slice() {
            [] => Ok(Encoder::Raw),
            [single] => encoder_for_name(member_name(single)?, dict, decode_params(dict, 0, 1)?),
            members => {
                let encoders = members
                    .iter()
                    .enumerate()
                    .map(|(i, member)| {
                        let parms = decode_params(dict, i, members.len())?;
                        encoder_for_name(member_name(member)?, dict, parms)
                    })
                    .collect::<ParseResult<Vec<_>>>()?;
                Ok(Encoder::Multi(encoders))
            }
        },
        Some(other) => Err(ParseError::InvalidFilter(format!(
            "Filter must be a Name or an Array, found {}",
            other.type_name()
        ))),
    }
}

impl Encoder {
    /// Filter name as written in a `Filter` entry
    pub fn name(&self) -> String {
        match self {
            Encoder::Raw => "Raw".to_string(),
            Encoder::Flate(_) => "FlateDecode".to_string(),
            Encoder::Lzw(_) => "LZWDecode".to_string(),
            Encoder::Dct(_) => "DCTDecode".to_string(),
            Encoder::RunLength => "RunLengthDecode".to_string(),
            Encoder::AsciiHex => "ASCIIHexDecode".to_string(),
            Encoder::Ascii85 => "ASCII85Decode".to_string(),
            Encoder::CcittFax(_) => "CCITTFaxDecode".to_string(),
            Encoder::Jbig2(_) => "JBIG2Decode".to_string(),
            Encoder::Jpx => "JPXDecode".to_string(),
            Encoder::Multi(encoders) => {
                let names: Vec<String> = encoders.iter().map(Encoder::name).collect();
                format!("[{}]", names.join(" "))
            }
        }
    }

    /// Decode a stored payload
    pub fn decode_bytes(&self, data: &[u8]) -> ParseResult<Vec<u8>> {
        match self {
            Encoder::Raw => Ok(data.to_vec()),
            Encoder::Flate(flate) => flate.decode(data),
            Encoder::Lzw(lzw) => lzw.decode(data),
            Encoder::RunLength => decode_run_length(data),
            Encoder::AsciiHex => decode_ascii_hex(data),
            Encoder::Ascii85 => decode_ascii85(data),
            Encoder::Dct(_) | Encoder::CcittFax(_) | Encoder::Jbig2(_) | Encoder::Jpx => {
                Ok(data.to_vec())
            }
            Encoder::Multi(encoders) => encoders
                .iter()
                .try_fold(data.to_vec(), |bytes, encoder| encoder.decode_bytes(&bytes)),
        }
    }

    /// Encode raw bytes into the stored form
    pub fn encode_bytes(&self, data: &[u8]) -> ParseResult<Vec<u8>> {
        match self {
            Encoder::Raw => Ok(data.to_vec()),
            Encoder::Flate(flate) => flate.encode(data),
            Encoder::Lzw(lzw) => lzw.encode(data),
            Encoder::RunLength => Ok(encode_run_length(data)),
            Encoder::AsciiHex => Ok(encode_ascii_hex(data)),
            Encoder::Ascii85 => Ok(encode_ascii85(data)),
            Encoder::Dct(_) | Encoder::CcittFax(_) | Encoder::Jbig2(_) | Encoder::Jpx => {
                Ok(data.to_vec())
            }
            // The last filter listed is applied first
            Encoder::Multi(encoders) => encoders
                .iter()
                .rev()
                .try_fold(data.to_vec(), |bytes, encoder| encoder.encode_bytes(&bytes)),
        }
    }
}

impl fmt::Display for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Decode a stream's payload with the filters its dictionary names
pub fn decode_stream(stream: &PdfStream) -> ParseResult<Vec<u8>> {
    let encoder = select_encoder(&stream.dict)?;
    tracing::trace!("Decoding {} bytes with {}", stream.data.len(), encoder);
    encoder.decode_bytes(&stream.data).inspect_err(|e| {
        tracing::debug!("{} failed to decode stream: {}", encoder, e);
    })
}

/// Replace a stream's payload with its encoded form.
///
/// A top-level LZW encoder is forced to `EarlyChange 0`, which is also
/// written to the dictionary. `Length` is updated to the encoded size. The
/// stream is untouched when encoding fails.
pub fn encode_stream(stream: &mut PdfStream) -> ParseResult<()> {
    let mut encoder = select_encoder(&stream.dict)?;

    let forced_lzw = if let Encoder::Lzw(lzw) = &mut encoder {
        if lzw.early_change != 0 {
            tracing::debug!("Encoding LZW with EarlyChange 0 instead of {}", lzw.early_change);
        }
        lzw.early_change = 0;
        true
    } else {
        false
    };

    let encoded = encoder.encode_bytes(&stream.data).inspect_err(|e| {
        tracing::debug!("{} failed to encode stream: {}", encoder, e);
    })?;
    tracing::trace!(
        "Encoded {} bytes into {} with {}",
        stream.data.len(),
        encoded.len(),
        encoder
    );

    if forced_lzw {
        stream.dict.insert("EarlyChange", PdfObject::Integer(0));
    }
    stream
        .dict
        .insert("Length", PdfObject::Integer(encoded.len() as i64));
    stream.data = encoded;
    Ok(())
}
