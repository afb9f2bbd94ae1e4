//! Property-based tests for parser robustness and filter round trips
//!
//! Arbitrary input must fail gracefully, never panic or hang.

use pdfgraph::parser::filter_impls::{LzwEncoder, PredictorParams};
use pdfgraph::parser::test_helpers::create_minimal_pdf;
use pdfgraph::parser::PositionalReader;
use pdfgraph::{Encoder, PdfObject, PdfReader};
use proptest::prelude::*;
use std::io::Cursor;

fn byte_codec_strategy() -> impl Strategy<Value = Encoder> {
    prop_oneof![
        Just(Encoder::Raw),
        Just(Encoder::AsciiHex),
        Just(Encoder::Ascii85),
        Just(Encoder::RunLength),
        Just(Encoder::Lzw(LzwEncoder {
            predictor: PredictorParams::default(),
            early_change: 0,
        })),
    ]
}

proptest! {
    #[test]
    fn test_reader_handles_arbitrary_bytes(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = PdfReader::new(Cursor::new(data));
    }

    #[test]
    fn test_reader_handles_truncated_documents(cut in 0usize..400) {
        let pdf = create_minimal_pdf();
        let truncated = pdf[..cut.min(pdf.len())].to_vec();
        let _ = PdfReader::new(Cursor::new(truncated));
    }

    #[test]
    fn test_reader_handles_corrupted_documents(
        flips in prop::collection::vec((any::<prop::sample::Index>(), any::<u8>()), 1..8)
    ) {
        let mut pdf = create_minimal_pdf();
        let len = pdf.len();
        for (index, byte) in flips {
            pdf[index.index(len)] = byte;
        }
        if let Ok(mut reader) = PdfReader::new(Cursor::new(pdf)) {
            for number in 0..4 {
                let _ = reader.object(number);
            }
        }
    }

    #[test]
    fn test_absent_objects_trace_to_null(number in any::<i64>(), generation in any::<u16>()) {
        prop_assume!(!(0..=2).contains(&number));
        let mut reader = PdfReader::new(Cursor::new(create_minimal_pdf())).unwrap();
        prop_assert_eq!(
            reader.trace(&PdfObject::Reference(number, generation)).unwrap(),
            PdfObject::Null
        );
    }

    #[test]
    fn test_offset_is_independent_of_buffer_capacity(
        data in prop::collection::vec(any::<u8>(), 1..300),
        capacity in 1usize..64,
        start in any::<prop::sample::Index>(),
        take in 0usize..64,
    ) {
        let start = start.index(data.len()) as u64;
        let mut small = PositionalReader::with_capacity(capacity, Cursor::new(data.clone()));
        let mut large = PositionalReader::new(Cursor::new(data.clone()));

        for reader in [&mut small, &mut large] {
            reader.seek_to(start).unwrap();
            let mut consumed = 0;
            while consumed < take && reader.next_byte().unwrap().is_some() {
                consumed += 1;
            }
            prop_assert_eq!(reader.current_offset().unwrap(), start + consumed as u64);
        }
    }

    #[test]
    fn test_codec_round_trip(
        encoder in byte_codec_strategy(),
        data in prop::collection::vec(any::<u8>(), 0..1024),
    ) {
        let encoded = encoder.encode_bytes(&data).unwrap();
        prop_assert_eq!(encoder.decode_bytes(&encoded).unwrap(), data);
    }

    #[test]
    fn test_chain_round_trip(
        chain in prop::collection::vec(byte_codec_strategy(), 1..4),
        data in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let encoder = Encoder::Multi(chain);
        let encoded = encoder.encode_bytes(&data).unwrap();
        prop_assert_eq!(encoder.decode_bytes(&encoded).unwrap(), data);
    }

    #[test]
    fn test_decoders_handle_arbitrary_bytes(
        encoder in byte_codec_strategy(),
        data in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let _ = encoder.decode_bytes(&data);
    }
}
