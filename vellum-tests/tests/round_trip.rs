use crate::load;
use vellum_syntax::parse::Parser;
use vellum_syntax::write::Serializer;
use vellum_syntax::{Array, Document, Name, PdfString, names};

fn write_incremental(doc: &Document) -> Vec<u8> {
    let mut s = Serializer::new(false, false);
    let mut out = b"%PDF-1.7\n".to_vec();

    for num in doc.incremental_objects() {
        let obj = doc.object(num);
        let stream = doc.load_raw_stream(num);
        s.write_indirect(num, 0, &obj, stream.as_deref());
    }

    out.extend(s.finish());
    out
}

#[test]
fn written_objects_read_back_equal() {
    let doc = Document::new();

    let content = doc.new_dict();
    content.put(names::FILTER, Name::new(b"Odd Name/#1")).unwrap();
    let content_ref = doc
        .add_stream(content, b"0 0 m\nendstreamish (x) Tj".to_vec())
        .unwrap();

    let media_box: Array = [0.0, 0.0, 595.5, 842.25].into_iter().collect();

    let page = doc.new_dict();
    page.put(names::TYPE, names::PAGE).unwrap();
    page.put(names::MEDIA_BOX, media_box).unwrap();
    page.put(names::CONTENTS, content_ref).unwrap();
    page.put(names::TITLE, PdfString::from_text("Grüße")).unwrap();
    page.put("Hidden", false).unwrap();
    doc.add_object(page).unwrap();

    let reloaded = load(&write_incremental(&doc));

    assert_eq!(reloaded.len(), doc.len());

    for num in doc.incremental_objects() {
        let (a, b) = (doc.object(num), reloaded.resolve(num, 0));
        assert!(a.compare_deep(&b).is_eq(), "object {num} differs");
        assert_eq!(doc.load_raw_stream(num), reloaded.load_raw_stream(num));
    }

    let page = reloaded.resolve(2, 0).as_dict().unwrap();
    assert_eq!(
        page.get_string(names::TITLE).map(|t| t.to_text().to_string()),
        Some("Grüße".to_string())
    );
    assert_eq!(
        page.get_resolved(names::CONTENTS)
            .and_then(|c| c.as_dict())
            .and_then(|c| c.get_name(names::FILTER)),
        Some(Name::new(b"Odd Name/#1"))
    );
}

#[test]
fn garbage_is_skipped_in_lenient_mode() {
    let data = b"<</A 1 ) /C (ok)>>";

    let obj = Parser::new(data).lenient(true).parse_object().unwrap();
    let dict = obj.as_dict().unwrap();

    assert_eq!(dict.get_int("A"), Some(1));
    assert_eq!(dict.get_string("C").map(|s| s.as_bytes().to_vec()), Some(b"ok".to_vec()));

    assert!(Parser::new(data).parse_object().is_err());
}
