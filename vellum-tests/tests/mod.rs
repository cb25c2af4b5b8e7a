use vellum_syntax::{Document, DocumentSettings, ScannedSource};

mod document;
mod persist;
mod round_trip;

/// A small file with a catalog, a page tree with one page and a content
/// stream.
pub(crate) const SIMPLE_PDF: &[u8] = b"%PDF-1.7
1 0 obj
<</Type/Catalog/Pages 2 0 R>>
endobj
2 0 obj
<</Type/Pages/Kids[3 0 R]/Count 1/Rotate 90/MediaBox[0 0 612 792]>>
endobj
3 0 obj
<</Type/Page/Parent 2 0 R/Contents 4 0 R>>
endobj
4 0 obj
<</Length 18>>
stream
BT (Hello) Tj ET\r\n
endstream
endobj
trailer
<</Root 1 0 R/Size 5>>
%%EOF
";

pub(crate) fn load(data: &[u8]) -> Document {
    Document::with_source(ScannedSource::new(data), DocumentSettings::default())
}

pub(crate) fn load_journaled(data: &[u8]) -> Document {
    let doc = load(data);
    doc.enable_journal();

    doc
}
