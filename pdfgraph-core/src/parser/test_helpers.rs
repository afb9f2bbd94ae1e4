//! Helper functions for creating valid test PDFs with correct offsets

/// Creates a minimal valid PDF with correct xref offsets
pub fn create_minimal_pdf() -> Vec<u8> {
    create_pdf_with_version("1.4")
}

/// Creates a minimal PDF with a specific version
pub fn create_pdf_with_version(version: &str) -> Vec<u8> {
    let mut builder = PdfBuilder::new(version);
    builder
        .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [] /Count 0 >>");
    let xref = builder.xref_table("/Root 1 0 R");
    builder.finish(xref)
}

#[derive(Debug)]
enum Pending {
    Offset(u32, u64),
    Compressed(u32, u32, u32),
}

/// Writes a document body and its cross-reference sections.
///
/// Every xref section covers the objects written since the previous one and
/// links to it with `/Prev`, so several sections form incremental updates.
#[derive(Debug, Default)]
pub struct PdfBuilder {
    buf: Vec<u8>,
    pending: Vec<Pending>,
    highest: u32,
    last_xref: Option<u64>,
}

impl PdfBuilder {
    pub fn new(version: &str) -> Self {
        Self {
            buf: format!("%PDF-{version}\n%\u{e2}\u{e3}\n").into_bytes(),
            ..Self::default()
        }
    }

    /// Current end of the document
    pub fn position(&self) -> u64 {
        self.buf.len() as u64
    }

    /// Append bytes that are not indexed
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// `N 0 obj <body> endobj`
    pub fn object(&mut self, number: u32, body: &str) -> &mut Self {
        self.record(number);
        self.buf
            .extend_from_slice(format!("{number} 0 obj\n{body}\nendobj\n").as_bytes());
        self
    }

    /// A stream object with a direct `Length`; `entries` go inside `<< >>`
    pub fn stream(&mut self, number: u32, entries: &str, data: &[u8]) -> &mut Self {
        self.record(number);
        self.write_stream(number, entries, data);
        self
    }

    /// An uncompressed object stream holding `objects` in order
    pub fn object_stream(&mut self, number: u32, objects: &[(u32, &str)]) -> &mut Self {
        let mut header = String::new();
        let mut body = String::new();
        for (index, (object, text)) in objects.iter().enumerate() {
            header.push_str(&format!("{} {} ", object, body.len()));
            body.push_str(text);
            body.push(' ');
            self.pending
                .push(Pending::Compressed(*object, number, index as u32));
            self.highest = self.highest.max(*object);
        }

        let entries = format!(
            "/Type /ObjStm /N {} /First {}",
            objects.len(),
            header.len()
        );
        self.stream(number, &entries, format!("{header}{body}").as_bytes())
    }

    /// Classic `xref` table plus trailer; returns the section offset
    pub fn xref_table(&mut self, trailer_entries: &str) -> u64 {
        let offset = self.position();
        let mut rows = self.take_rows();
        if self.last_xref.is_none() {
            rows.insert(0, (0, "0000000000 65535 f \n".to_string()));
        }

        let mut text = String::from("xref\n");
        for run in contiguous_runs(&rows) {
            text.push_str(&format!("{} {}\n", run[0].0, run.len()));
            for (_, line) in run {
                text.push_str(line);
            }
        }
        text.push_str(&format!(
            "trailer\n<< /Size {}{} {} >>\n",
            self.highest + 1,
            self.prev_entry(),
            trailer_entries
        ));
        self.buf.extend_from_slice(text.as_bytes());

        self.last_xref = Some(offset);
        offset
    }

    /// Cross-reference stream with `W [1 4 2]`, stored as object `number`;
    /// returns the section offset
    pub fn xref_stream(&mut self, number: u32, trailer_entries: &str) -> u64 {
        let offset = self.position();
        self.pending.push(Pending::Offset(number, offset));
        self.highest = self.highest.max(number);

        let mut rows: Vec<(u32, [u8; 7])> = self
            .pending
            .drain(..)
            .rev()
            .map(|entry| match entry {
                Pending::Offset(n, off) => (n, xref_row(1, off as u32, 0)),
                Pending::Compressed(n, stream, index) => (n, xref_row(2, stream, index as u16)),
            })
            .collect();
        if self.last_xref.is_none() {
            rows.push((0, xref_row(0, 0, 65535)));
        }
        rows.sort_by_key(|(n, _)| *n);
        rows.dedup_by_key(|(n, _)| *n);

        let mut index = Vec::new();
        let mut data = Vec::new();
        for run in contiguous_runs(&rows) {
            index.push(format!("{} {}", run[0].0, run.len()));
            for (_, row) in run {
                data.extend_from_slice(row);
            }
        }

        let entries = format!(
            "/Type /XRef /Size {} /W [1 4 2] /Index [{}]{} {}",
            self.highest + 1,
            index.join(" "),
            self.prev_entry(),
            trailer_entries
        );
        self.write_stream(number, &entries, &data);

        self.last_xref = Some(offset);
        offset
    }

    /// Append `startxref` and `%%EOF`
    pub fn finish(mut self, startxref: u64) -> Vec<u8> {
        self.buf
            .extend_from_slice(format!("startxref\n{startxref}\n%%EOF\n").as_bytes());
        self.buf
    }

    fn record(&mut self, number: u32) {
        let offset = self.position();
        self.pending.push(Pending::Offset(number, offset));
        self.highest = self.highest.max(number);
    }

    fn write_stream(&mut self, number: u32, entries: &str, data: &[u8]) {
        self.buf.extend_from_slice(
            format!(
                "{number} 0 obj\n<< {entries} /Length {} >>\nstream\n",
                data.len()
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn prev_entry(&self) -> String {
        self.last_xref
            .map(|prev| format!(" /Prev {prev}"))
            .unwrap_or_default()
    }

    /// Table lines for pending objects, newest write first before sorting;
    /// compressed objects cannot be listed
    fn take_rows(&mut self) -> Vec<(u32, String)> {
        let mut rows: Vec<(u32, String)> = self
            .pending
            .drain(..)
            .rev()
            .filter_map(|entry| match entry {
                Pending::Offset(n, offset) => Some((n, format!("{offset:010} 00000 n \n"))),
                Pending::Compressed(..) => None,
            })
            .collect();
        rows.sort_by_key(|(n, _)| *n);
        rows.dedup_by_key(|(n, _)| *n);
        rows
    }
}

fn xref_row(kind: u8, field2: u32, field3: u16) -> [u8; 7] {
    let mut row = [0u8; 7];
    row[0] = kind;
    row[1..5].copy_from_slice(&field2.to_be_bytes());
    row[5..7].copy_from_slice(&field3.to_be_bytes());
    row
}

/// Split sorted rows into runs of consecutive object numbers
fn contiguous_runs<T>(rows: &[(u32, T)]) -> Vec<&[(u32, T)]> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..=rows.len() {
        if i == rows.len() || rows[i].0 != rows[i - 1].0 + 1 {
            if start < i {
                runs.push(&rows[start..i]);
            }
            start = i;
        }
    }
    runs
}
