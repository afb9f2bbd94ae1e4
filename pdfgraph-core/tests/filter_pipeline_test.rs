//! Filter selection and the encode/decode pipeline, through documents and
//! directly on stream objects

use pdfgraph::parser::filter_impls::encode_run_length;
use pdfgraph::parser::test_helpers::PdfBuilder;
use pdfgraph::parser::{decode_stream, encode_stream, select_encoder};
use pdfgraph::{Encoder, ParseError, PdfArray, PdfDictionary, PdfName, PdfObject, PdfReader, PdfStream};
use pretty_assertions::assert_eq;
use std::io::Cursor;

fn name(s: &str) -> PdfObject {
    PdfObject::Name(PdfName::new(s))
}

fn stream_with_filter(filter: PdfObject, data: &[u8]) -> PdfStream {
    let mut dict = PdfDictionary::new();
    dict.insert("Filter", filter);
    PdfStream::new(dict, data.to_vec())
}

fn document_with_stream(entries: &str, data: &[u8], extra: &[(u32, &str)]) -> Vec<u8> {
    let mut builder = PdfBuilder::new("1.4");
    builder
        .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [] /Count 0 >>")
        .stream(3, entries, data);
    for (number, body) in extra {
        builder.object(*number, body);
    }
    let xref = builder.xref_table("/Root 1 0 R");
    builder.finish(xref)
}

#[test]
fn test_stream_decoded_from_document() {
    let payload = encode_run_length(b"aaaaaaaaaaaaaaaaaaaaabc");
    let pdf = document_with_stream("/Filter /RunLengthDecode", &payload, &[]);
    let mut reader = PdfReader::new(Cursor::new(pdf)).unwrap();

    let obj = reader.object(3).unwrap();
    let stream = obj.as_stream().unwrap();
    assert_eq!(stream.data, payload);
    assert_eq!(reader.decode_stream(stream).unwrap(), b"aaaaaaaaaaaaaaaaaaaaabc");
}

#[test]
fn test_indirect_filter_array_members() {
    let pdf = document_with_stream(
        "/Filter [4 0 R /RunLengthDecode]",
        b"0041FF42>",
        &[(4, "/ASCIIHexDecode")],
    );
    let mut reader = PdfReader::new(Cursor::new(pdf)).unwrap();
    let obj = reader.object(3).unwrap();
    let stream = obj.as_stream().unwrap();

    // Unresolved, the member is not a Name
    assert!(matches!(
        decode_stream(stream),
        Err(ParseError::InvalidFilter(_))
    ));
    assert_eq!(reader.decode_stream(stream).unwrap(), b"ABB");
}

#[test]
fn test_unsupported_filter_is_reported() {
    let pdf = document_with_stream("/Filter /NoSuchDecode", b"data", &[]);
    let mut reader = PdfReader::new(Cursor::new(pdf)).unwrap();
    let obj = reader.object(3).unwrap();

    let err = reader.decode_stream(obj.as_stream().unwrap()).unwrap_err();
    assert_eq!(err.to_string(), "Unsupported encoding method (NoSuchDecode)");
}

#[test]
fn test_filter_array_of_one_matches_bare_name() {
    let data = b"48656C6C6F>";
    let bare = stream_with_filter(name("ASCIIHexDecode"), data);
    let single = stream_with_filter(PdfObject::Array(PdfArray(vec![name("ASCIIHexDecode")])), data);

    assert_eq!(select_encoder(&bare.dict).unwrap(), select_encoder(&single.dict).unwrap());
    assert_eq!(decode_stream(&bare).unwrap(), decode_stream(&single).unwrap());
}

#[test]
fn test_chain_encodes_in_reverse_order() {
    let mut stream = stream_with_filter(
        PdfObject::Array(PdfArray(vec![name("ASCII85Decode"), name("ASCIIHexDecode")])),
        b"chained",
    );
    encode_stream(&mut stream).unwrap();

    // The hex layer is innermost
    let outer = Encoder::Ascii85.decode_bytes(&stream.data).unwrap();
    assert_eq!(outer, b"636861696E6564>");
    assert_eq!(decode_stream(&stream).unwrap(), b"chained");
    assert_eq!(
        stream.dict.get("Length"),
        Some(&PdfObject::Integer(stream.data.len() as i64))
    );
}

#[test]
fn test_lzw_write_path_forces_early_change() {
    let text = b"TOBEORNOTTOBEORTOBEORNOT#".repeat(40);
    let mut dict = PdfDictionary::new();
    dict.insert("Filter", name("LZWDecode"));
    let mut parms = PdfDictionary::new();
    parms.insert("EarlyChange", PdfObject::Integer(1));
    dict.insert("DecodeParms", PdfObject::Dictionary(parms));
    let mut stream = PdfStream::new(dict, text.clone());

    encode_stream(&mut stream).unwrap();
    assert_eq!(stream.dict.get("EarlyChange"), Some(&PdfObject::Integer(0)));
    assert!(stream.data.len() < text.len());
    assert_eq!(decode_stream(&stream).unwrap(), text);

    // Encoding again from the stored form keeps the value at 0
    stream.data = text.clone();
    encode_stream(&mut stream).unwrap();
    assert_eq!(stream.dict.get("EarlyChange"), Some(&PdfObject::Integer(0)));
}

#[test]
fn test_failed_encode_keeps_payload_and_length() {
    let mut dict = PdfDictionary::new();
    dict.insert("Filter", PdfObject::Integer(42));
    let mut stream = PdfStream::new(dict, b"unchanged".to_vec());
    let before = stream.clone();

    assert!(matches!(
        encode_stream(&mut stream),
        Err(ParseError::InvalidFilter(_))
    ));
    assert_eq!(stream, before);
    assert_eq!(stream.dict.get("Length"), Some(&PdfObject::Integer(9)));
}

#[cfg(feature = "compression")]
mod compression {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flate_stream_in_document() {
        let content = b"BT /F1 24 Tf 100 700 Td (Hello, PDF!) Tj ET\n".repeat(10);
        let mut stream = stream_with_filter(name("FlateDecode"), &content);
        encode_stream(&mut stream).unwrap();

        let pdf = document_with_stream("/Filter /FlateDecode", &stream.data, &[]);
        let mut reader = PdfReader::new(Cursor::new(pdf)).unwrap();
        let obj = reader.object(3).unwrap();
        assert_eq!(reader.decode_stream(obj.as_stream().unwrap()).unwrap(), content);
    }

    #[test]
    fn test_indirect_decode_parms() {
        // Two rows of PNG Up-predicted data, 3 columns
        let predicted = [2u8, 1, 2, 3, 2, 1, 1, 1];
        let mut flate = stream_with_filter(name("FlateDecode"), &predicted);
        encode_stream(&mut flate).unwrap();

        let pdf = document_with_stream(
            "/Filter /FlateDecode /DecodeParms 4 0 R",
            &flate.data,
            &[(4, "<< /Predictor 12 /Columns 3 >>")],
        );
        let mut reader = PdfReader::new(Cursor::new(pdf)).unwrap();
        let obj = reader.object(3).unwrap();
        assert_eq!(
            reader.decode_stream(obj.as_stream().unwrap()).unwrap(),
            vec![1, 2, 3, 2, 3, 4]
        );
    }

    #[test]
    fn test_corrupt_flate_data_propagates() {
        let stream = stream_with_filter(name("FlateDecode"), b"\x78\x9c garbage");
        assert!(matches!(
            decode_stream(&stream),
            Err(ParseError::StreamDecodeError(_))
        ));
    }

    #[test]
    fn test_predictor_prevents_flate_encoding() {
        let mut parms = PdfDictionary::new();
        parms.insert("Predictor", PdfObject::Integer(12));
        let mut stream = stream_with_filter(name("FlateDecode"), b"rows");
        stream.dict.insert("DecodeParms", PdfObject::Dictionary(parms));
        let before = stream.clone();

        assert!(matches!(
            encode_stream(&mut stream),
            Err(ParseError::UnsupportedEncoding(_))
        ));
        assert_eq!(stream, before);
    }
}
