#![no_main]

use libfuzzer_sys::fuzz_target;
use pdfgraph::parser::{decode_stream, encode_stream};
use pdfgraph::{PdfDictionary, PdfName, PdfObject, PdfStream};

const FILTERS: &[&str] = &[
    "FlateDecode",
    "LZWDecode",
    "RunLengthDecode",
    "ASCIIHexDecode",
    "ASCII85Decode",
    "DCTDecode",
];

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };

    let mut dict = PdfDictionary::new();
    let filter = FILTERS[usize::from(selector) % FILTERS.len()];
    dict.insert("Filter", PdfObject::Name(PdfName::new(filter)));
    if selector & 0x80 != 0 {
        let mut parms = PdfDictionary::new();
        parms.insert("Predictor", PdfObject::Integer(i64::from(selector & 0x0f) + 10));
        parms.insert("Columns", PdfObject::Integer(i64::from(selector >> 4)));
        dict.insert("DecodeParms", PdfObject::Dictionary(parms));
    }

    let mut stream = PdfStream::new(dict, payload.to_vec());
    let _ = decode_stream(&stream);

    // What encodes must decode back
    if encode_stream(&mut stream).is_ok() {
        let decoded = decode_stream(&stream).expect("encoded stream decodes");
        assert_eq!(decoded, payload);
    }
});
