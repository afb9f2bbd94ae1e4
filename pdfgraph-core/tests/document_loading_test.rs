//! Document loading: header, startxref, xref tables and streams, incremental
//! updates and compressed objects

use pdfgraph::parser::test_helpers::{create_minimal_pdf, create_pdf_with_version, PdfBuilder};
use pdfgraph::parser::{ParseOptions, PdfVersion};
use pdfgraph::{ParseError, PdfObject, PdfReader, PdfString, XRefEntry};
use pretty_assertions::assert_eq;
use std::io::Cursor;

fn open(pdf: Vec<u8>) -> PdfReader<Cursor<Vec<u8>>> {
    PdfReader::new(Cursor::new(pdf)).unwrap()
}

fn string(s: &str) -> PdfObject {
    PdfObject::String(PdfString::new(s.as_bytes().to_vec()))
}

fn catalog_and_pages(builder: &mut PdfBuilder) {
    builder
        .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [] /Count 0 >>");
}

#[test]
fn test_minimal_document() {
    let mut reader = open(create_minimal_pdf());
    assert_eq!(reader.version(), Some(PdfVersion::new(1, 4)));
    assert_eq!(reader.header().unwrap().offset, 0);
    assert!(matches!(
        reader.xref().get(0),
        Some(XRefEntry::Free { .. })
    ));

    let trailer = reader.trailer().unwrap();
    assert_eq!(trailer.size().unwrap(), 3);
    assert_eq!(trailer.prev(), None);
    assert!(!reader.is_encrypted().unwrap());
}

#[test]
fn test_versions() {
    for (text, expected) in [("1.0", PdfVersion::new(1, 0)), ("1.7", PdfVersion::new(1, 7)), ("2.0", PdfVersion::new(2, 0))] {
        let reader = open(create_pdf_with_version(text));
        assert_eq!(reader.version(), Some(expected));
    }
}

#[test]
fn test_missing_startxref() {
    let mut builder = PdfBuilder::new("1.4");
    catalog_and_pages(&mut builder);
    builder.xref_table("/Root 1 0 R");
    let mut pdf = builder.finish(0);
    let cut = pdf.len() - "startxref\n0\n%%EOF\n".len();
    pdf.truncate(cut);

    assert!(matches!(
        PdfReader::new(Cursor::new(pdf)),
        Err(ParseError::InvalidXRef)
    ));
}

#[test]
fn test_startxref_pointing_at_garbage() {
    let mut builder = PdfBuilder::new("1.4");
    catalog_and_pages(&mut builder);
    builder.xref_table("/Root 1 0 R");
    let pdf = builder.finish(3);

    assert!(PdfReader::new(Cursor::new(pdf)).is_err());
}

#[test]
fn test_incremental_update_newest_definition_wins() {
    let mut builder = PdfBuilder::new("1.4");
    catalog_and_pages(&mut builder);
    builder.object(3, "(original)");
    let first = builder.xref_table("/Root 1 0 R");
    builder.object(3, "(updated)").object(4, "(added)");
    let second = builder.xref_table("/Root 1 0 R");
    let mut reader = open(builder.finish(second));

    assert_eq!(reader.object(3).unwrap(), string("updated"));
    assert_eq!(reader.object(4).unwrap(), string("added"));
    assert_eq!(reader.object(1).unwrap().as_dict().unwrap().get_type(), Some("Catalog"));

    let trailer = reader.trailer().unwrap();
    assert_eq!(trailer.xref_offset, second);
    assert_eq!(trailer.prev(), Some(first));
    assert_eq!(trailer.size().unwrap(), 5);
}

#[test]
fn test_prev_loop_is_loaded_once() {
    let mut builder = PdfBuilder::new("1.4");
    let catalog = builder.position();
    builder.object(1, "<< /Type /Catalog >>");
    let xref = builder.position();
    builder.raw(
        format!(
            "xref\n0 2\n0000000000 65535 f \n{catalog:010} 00000 n \ntrailer\n<< /Size 2 /Root 1 0 R /Prev {xref} >>\n"
        )
        .as_bytes(),
    );
    let mut reader = open(builder.finish(xref));

    assert_eq!(reader.xref().len(), 2);
    assert_eq!(reader.object(1).unwrap().as_dict().unwrap().get_type(), Some("Catalog"));
}

#[test]
fn test_xref_stream_with_object_stream() {
    let mut builder = PdfBuilder::new("1.5");
    catalog_and_pages(&mut builder);
    builder.object_stream(5, &[(3, "<< /Kind /Compressed >>"), (4, "[1 2 3]")]);
    let xref = builder.xref_stream(6, "/Root 1 0 R");
    let mut reader = open(builder.finish(xref));

    assert_eq!(
        reader.xref().get(3),
        Some(&XRefEntry::Compressed {
            stream_object: 5,
            index: 0
        })
    );
    let three = reader.object(3).unwrap();
    assert_eq!(
        three.as_dict().unwrap().get("Kind"),
        Some(&PdfObject::Name(pdfgraph::PdfName::new("Compressed")))
    );
    assert_eq!(reader.trace(&PdfObject::Reference(4, 0)).unwrap().as_array().unwrap().len(), 3);

    // The xref stream doubles as the trailer
    let trailer = reader.trailer().unwrap();
    assert_eq!(trailer.dict.get_type(), Some("XRef"));
    assert_eq!(trailer.root().unwrap(), (1, 0));
}

#[test]
fn test_hybrid_file_prefers_xref_stream_entries() {
    let mut builder = PdfBuilder::new("1.5");
    builder.object(3, "(from stream section)");
    let stm = builder.xref_stream(7, "");
    catalog_and_pages(&mut builder);
    builder.object(3, "(from table)");
    let table = builder.xref_table(&format!("/Root 1 0 R /XRefStm {stm}"));
    let mut reader = open(builder.finish(table));

    assert_eq!(reader.object(3).unwrap(), string("from stream section"));
    assert_eq!(reader.trailer().unwrap().xref_stm(), Some(stm));
    assert_eq!(reader.object(2).unwrap().as_dict().unwrap().get_type(), Some("Pages"));
}

#[test]
fn test_compressed_object_in_missing_stream_is_null() {
    let mut builder = PdfBuilder::new("1.5");
    catalog_and_pages(&mut builder);
    builder.object_stream(5, &[(3, "true")]);
    builder.object(5, "(not a stream any more)");
    let xref = builder.xref_stream(6, "/Root 1 0 R");
    let mut reader = open(builder.finish(xref));

    assert_eq!(reader.object(3).unwrap(), PdfObject::Null);
}

#[test]
fn test_object_stream_containing_itself() {
    let mut builder = PdfBuilder::new("1.5");
    catalog_and_pages(&mut builder);
    builder.object_stream(5, &[(8, "1")]);
    let xref = builder.xref_stream(6, "/Root 1 0 R");
    let mut reader = PdfReader::new(Cursor::new(builder.finish(xref))).unwrap();

    assert_eq!(reader.object(8).unwrap(), PdfObject::Integer(1));

    // Point object 5 into its own stream
    let mut xref = reader.xref().clone();
    xref.insert(
        5,
        XRefEntry::Compressed {
            stream_object: 5,
            index: 0,
        },
    );
    let mut looped = PdfReader::from_parts(reader.into_inner(), xref, ParseOptions::default());
    assert!(matches!(
        looped.object(5),
        Err(ParseError::CircularReference { object: 5 })
    ));
}

#[test]
fn test_open_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("incremental.pdf");

    let mut builder = PdfBuilder::new("1.6");
    catalog_and_pages(&mut builder);
    builder.xref_table("/Root 1 0 R");
    builder.object(9, "<< /Producer (pdfgraph) >>");
    let xref = builder.xref_table("/Root 1 0 R /Info 9 0 R");
    std::fs::write(&path, builder.finish(xref)).unwrap();

    let mut reader = PdfReader::open(&path).unwrap();
    assert_eq!(reader.version(), Some(PdfVersion::new(1, 6)));
    let info_ref = reader.trailer().unwrap().dict.get("Info").cloned().unwrap();
    assert_eq!(info_ref, PdfObject::Reference(9, 0));
    let info = reader.trace(&info_ref).unwrap();
    assert_eq!(info.as_dict().unwrap().get("Producer"), Some(&string("pdfgraph")));
}

#[cfg(feature = "compression")]
#[test]
fn test_flate_xref_stream_with_png_predictor() {
    use pdfgraph::parser::filter_impls::FlateEncoder;

    let mut builder = PdfBuilder::new("1.5");
    let catalog = builder.position();
    builder.object(1, "<< /Type /Catalog /Pages 2 0 R >>");
    let pages = builder.position();
    builder.object(2, "<< /Type /Pages /Kids [] /Count 0 >>");
    let xref = builder.position();

    // W [1 2 1]: type, offset, generation
    let row = |kind: u8, offset: u64, generation: u8| {
        [kind, (offset >> 8) as u8, offset as u8, generation]
    };
    let rows = [row(0, 0, 255), row(1, catalog, 0), row(1, pages, 0), row(1, xref, 0)];
    let mut predicted = Vec::new();
    let mut prev = [0u8; 4];
    for r in rows {
        predicted.push(2);
        predicted.extend(r.iter().zip(prev.iter()).map(|(b, p)| b.wrapping_sub(*p)));
        prev = r;
    }
    let data = FlateEncoder::default().encode(&predicted).unwrap();

    builder.raw(
        format!(
            "3 0 obj\n<< /Type /XRef /Size 4 /W [1 2 1] /Filter /FlateDecode \
             /DecodeParms << /Predictor 12 /Columns 4 >> /Root 1 0 R /Length {} >>\nstream\n",
            data.len()
        )
        .as_bytes(),
    );
    builder.raw(&data).raw(b"\nendstream\nendobj\n");
    let mut reader = open(builder.finish(xref));

    assert_eq!(
        reader.xref().get(2),
        Some(&XRefEntry::InUse {
            offset: pages,
            generation: 0
        })
    );
    assert_eq!(reader.object(2).unwrap().as_dict().unwrap().get_type(), Some("Pages"));
}
