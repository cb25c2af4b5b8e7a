use crate::{SIMPLE_PDF, load, load_journaled};
use vellum_syntax::{ArgumentError, PdfString};

#[test]
fn history_survives_reopening() {
    let doc = load_journaled(SIMPLE_PDF);
    let catalog = doc.resolve(1, 0).as_dict().unwrap();

    doc.operation("Set language", || catalog.put("Lang", PdfString::from_text("de-DE")))
        .unwrap();
    doc.operation("Replace content", || {
        doc.update_stream(4, b"BT (Gr\xfc\xdfe) Tj ET".to_vec())
    })
    .unwrap();

    // Go back to the state that matches the file.
    doc.undo().unwrap();
    doc.undo().unwrap();

    let log = doc.write_journal().unwrap();

    let reopened = load(SIMPLE_PDF);
    assert!(reopened.read_journal(&log).unwrap());
    assert!(reopened.is_journaling());
    assert_eq!(reopened.undo_redo_state(), (0, 2));
    assert_eq!(
        reopened.undo_redo_step(1),
        Ok(Some("Replace content".to_string()))
    );

    reopened.redo().unwrap();
    reopened.redo().unwrap();

    let catalog = reopened.resolve(1, 0).as_dict().unwrap();
    assert_eq!(
        catalog.get_string("Lang").map(|s| s.to_text().to_string()),
        Some("de-DE".to_string())
    );
    assert_eq!(
        reopened.load_raw_stream(4).as_deref(),
        Some(&b"BT (Gr\xfc\xdfe) Tj ET"[..])
    );

    reopened.undo().unwrap();
    assert_eq!(
        reopened.load_raw_stream(4).as_deref(),
        Some(&b"BT (Hello) Tj ET\r\n"[..])
    );
}

#[test]
fn logs_of_other_files_are_ignored() {
    let doc = load_journaled(SIMPLE_PDF);
    let log = doc.write_journal().unwrap();

    let mut edited = SIMPLE_PDF.to_vec();
    edited.extend_from_slice(b"% appended\n");

    let other = load(&edited);
    assert_eq!(other.read_journal(&log), Ok(false));
    assert!(!other.is_journaling());
}

#[test]
fn writing_needs_a_journal() {
    let doc = load(SIMPLE_PDF);
    assert_eq!(doc.write_journal(), Err(ArgumentError::NotJournaling.into()));

    doc.enable_journal();
    doc.begin_operation("Open").unwrap();
    assert_eq!(
        doc.write_journal(),
        Err(ArgumentError::OperationInProgress.into())
    );
}
