#![no_main]

use libfuzzer_sys::fuzz_target;
use pdfgraph::parser::ParseOptions;
use pdfgraph::PdfReader;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    for options in [ParseOptions::strict(), ParseOptions::lenient()] {
        let Ok(mut reader) = PdfReader::new_with_options(Cursor::new(data), options) else {
            continue;
        };
        let _ = reader.is_encrypted();

        // Resolve every indexed object, decoding streams on the way
        let numbers: Vec<u32> = reader.xref().iter().map(|(number, _)| number).collect();
        for number in numbers {
            if let Ok(obj) = reader.object(i64::from(number)) {
                if let Some(stream) = obj.as_stream() {
                    let _ = reader.decode_stream(stream);
                }
            }
        }
    }
});
