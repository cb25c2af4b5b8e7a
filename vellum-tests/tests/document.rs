use crate::{SIMPLE_PDF, load};
use std::cell::RefCell;
use std::rc::Rc;
use vellum_syntax::{
    ArgumentError, Document, DocumentSettings, DocumentWarning, Object, ObjectSource,
    ScannedSource, names,
};

#[test]
fn resolve_through_page_tree() {
    let doc = load(SIMPLE_PDF);
    assert_eq!(doc.len(), 5);

    let catalog = doc.resolve(1, 0).as_dict().unwrap();
    let pages = catalog.get_dict(names::PAGES).unwrap();
    assert_eq!(pages.get_int(names::COUNT), Some(1));

    let kid = pages.get_array(names::KIDS).unwrap().get(0).unwrap();
    assert!(kid.is_indirect());
    assert_eq!(kid.to_object_number(), 3);
    assert_eq!(kid.as_dict().unwrap().get_name(names::TYPE), Some(names::PAGE));

    let contents = kid.as_dict().unwrap().get(names::CONTENTS).unwrap();
    assert!(contents.is_stream());
    assert_eq!(
        doc.load_raw_stream(contents.to_object_number()).as_deref(),
        Some(&b"BT (Hello) Tj ET\r\n"[..])
    );
}

#[test]
fn missing_objects_are_null() {
    let doc = load(SIMPLE_PDF);
    assert!(doc.resolve(42, 0).is_null());
    assert!(Object::from(doc.new_ref(42)).resolve().is_null());
    assert!(!doc.is_stream(42));
}

#[test]
fn incremental_objects_are_tracked() {
    let doc = load(SIMPLE_PDF);
    assert!(doc.incremental_objects().is_empty());

    let page = doc.resolve(3, 0).as_dict().unwrap();
    page.put(names::ROTATE, 180).unwrap();

    let annots = doc.new_array();
    let annots_ref = doc.add_object(annots).unwrap();
    page.put(names::ANNOTS, annots_ref.clone()).unwrap();

    assert_eq!(doc.incremental_objects(), vec![3, annots_ref.num()]);
    assert_eq!(annots_ref.num(), 5);
    assert!(Object::from(page).is_dirty());

    // The file itself is left alone.
    let original = doc.load_object(3).unwrap();
    assert!(original.as_dict().unwrap().get(names::ROTATE).is_none());
}

#[test]
fn warnings_reach_the_sink() {
    let warnings = Rc::new(RefCell::new(vec![]));
    let sink = warnings.clone();

    let settings = DocumentSettings {
        warning_sink: Rc::new(move |w| sink.borrow_mut().push(w)),
        ..DocumentSettings::default()
    };

    let data = b"1 0 obj\n<</A 2 0 R>>\nendobj\n2 0 obj\n[1 2\nendobj\n";
    let doc = Document::with_source(ScannedSource::new(&data[..]).strict(), settings);

    let a = doc.resolve(1, 0).as_dict().unwrap();
    assert!(a.get_resolved("A").unwrap().is_null());
    assert_eq!(*warnings.borrow(), vec![DocumentWarning::BrokenObject(2)]);
    assert!(doc.resolve_checked(2, 0).is_err());
}

#[test]
fn streams_can_be_added() {
    let doc = Document::new();
    let dict = doc.new_dict();
    dict.put(names::TYPE, names::XOBJECT).unwrap();

    let stream = doc.add_stream(dict.clone(), b"0 0 m 1 1 l S".to_vec()).unwrap();
    assert!(Object::from(stream.clone()).is_stream());
    assert_eq!(dict.get_int(names::LENGTH), Some(13));

    doc.update_stream(stream.num(), b"".to_vec()).unwrap();
    assert_eq!(doc.load_raw_stream(stream.num()).as_deref(), Some(&b""[..]));
    assert_eq!(dict.get_int(names::LENGTH), Some(0));

    let number = doc.add_object(5).unwrap();
    assert_eq!(
        doc.update_stream(number.num(), b"x".to_vec()),
        Err(ArgumentError::WrongKind.into())
    );
}

#[test]
fn stream_dicts_compare_by_data() {
    let doc = Document::new();
    let a = doc.add_stream(doc.new_dict(), b"same".to_vec()).unwrap();
    let b = doc.add_stream(doc.new_dict(), b"same".to_vec()).unwrap();
    let c = doc.add_stream(doc.new_dict(), b"diff".to_vec()).unwrap();

    let (a, b, c) = (a.resolve(), b.resolve(), c.resolve());

    assert_ne!(a, b);
    assert!(a.compare_deep(&b).is_eq());
    assert!(a.compare_deep(&c).is_ne());
    assert_eq!(a, a.clone());
}

#[test]
fn custom_sources() {
    struct Numbers;

    impl ObjectSource for Numbers {
        fn len(&self) -> usize {
            4
        }

        fn entry(&self, num: i32) -> Option<vellum_syntax::SourceEntry> {
            (1..4).contains(&num).then_some(vellum_syntax::SourceEntry {
                kind: vellum_syntax::EntryKind::InUse,
                gen_num: 0,
            })
        }

        fn load_object(&self, num: i32) -> vellum_syntax::Result<Object> {
            Ok(Object::Integer(i64::from(num) * 10))
        }

        fn load_stream(&self, _: i32) -> vellum_syntax::Result<Option<Vec<u8>>> {
            Ok(None)
        }

        fn file_size(&self) -> u64 {
            0
        }

        fn fingerprint(&self) -> [u8; 16] {
            [0; 16]
        }
    }

    let doc = Document::with_source(Numbers, DocumentSettings::default());
    assert_eq!(doc.resolve(3, 0).to_int(), 30);
    assert!(doc.resolve(4, 0).is_null());
    assert_eq!(doc.create_object(), Ok(4));
}
