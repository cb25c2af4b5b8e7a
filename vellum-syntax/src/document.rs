//! Documents and the binding of objects to them.

use crate::error::{ArgumentError, Error, Result, bail};
use crate::journal::Journal;
use crate::object::{Array, Dict, ObjFlags, ObjRef, Object, names};
use crate::source::ObjectSource;
use crate::xref::XRef;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::{Rc, Weak};

/// A callback function for warnings emitted while working with a document.
pub type WarningSinkFn = Rc<dyn Fn(DocumentWarning)>;
/// A callback function that is invoked with the numbers of all objects that
/// were restored by an undo, redo or abandoned operation.
pub type ChangeSinkFn = Rc<dyn Fn(&[i32])>;

#[derive(Clone)]
/// Settings of a document.
pub struct DocumentSettings {
    /// Whether malformed objects should be replaced with the null object
    /// instead of failing the operation that loads them.
    pub lenient: bool,

    /// In certain cases, a warning is emitted when an issue was encountered
    /// while loading objects. Providing a callback allows you to catch those
    /// warnings and handle them, if desired.
    pub warning_sink: WarningSinkFn,

    /// Called after the journal restored objects to a previous state, so that
    /// cached derived data can be invalidated.
    pub change_sink: ChangeSinkFn,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            lenient: true,
            warning_sink: Rc::new(|_| {}),
            change_sink: Rc::new(|_| {}),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Warnings that can occur while working with a document.
pub enum DocumentWarning {
    /// An object couldn't be loaded and was replaced with the null object.
    BrokenObject(i32),
    /// A chain of indirect references starting at the given object was too
    /// long to be followed.
    TooManyIndirections(i32),
    /// A journal log was written for a different file and was ignored.
    StaleJournal,
}

pub(crate) struct DocInner {
    pub(crate) xref: RefCell<XRef>,
    pub(crate) journal: RefCell<Option<Journal>>,
    pub(crate) settings: DocumentSettings,
}

/// The link from an object to the document it belongs to.
///
/// Objects only hold a weak link, so a document is freed once the last
/// [`Document`] handle is dropped, even if objects of it are still alive.
#[derive(Clone, Default)]
pub(crate) struct Binding(Option<Weak<DocInner>>);

impl Binding {
    pub(crate) fn new(doc: Weak<DocInner>) -> Self {
        Self(Some(doc))
    }

    pub(crate) fn doc(&self) -> Option<Document> {
        self.0.as_ref()?.upgrade().map(Document)
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.0.is_some()
    }

    pub(crate) fn same(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

/// Prepare the object with the given number for an alteration, if the
/// binding belongs to a live document.
pub(crate) fn prepare_alteration(binding: &Binding, num: i32) -> Result<()> {
    match binding.doc() {
        Some(doc) => doc.prepare_alteration(num),
        None => Ok(()),
    }
}

/// The document and object number of the stream that `dict` is the
/// dictionary of.
pub(crate) fn stream_backing(dict: &Dict) -> Option<(Document, i32)> {
    let (num, binding) = {
        let repr = dict.0.borrow();
        (repr.parent_num, repr.binding.clone())
    };

    let doc = binding.doc()?;

    if num <= 0 || !doc.is_stream(num) {
        return None;
    }

    match doc.object(num) {
        Object::Dict(d) if d.ptr_eq(dict) => Some((doc, num)),
        _ => None,
    }
}

/// A PDF document.
///
/// Cloning a document is cheap and yields another handle to the same
/// document.
#[derive(Clone)]
pub struct Document(pub(crate) Rc<DocInner>);

impl Document {
    /// Create a new, empty document.
    pub fn new() -> Self {
        Self::with_settings(DocumentSettings::default())
    }

    /// Create a new, empty document with the given settings.
    pub fn with_settings(settings: DocumentSettings) -> Self {
        Self::build(None, settings)
    }

    /// Create a document whose objects are loaded from `source`.
    pub fn with_source(source: impl ObjectSource + 'static, settings: DocumentSettings) -> Self {
        Self::build(Some(Box::new(source)), settings)
    }

    fn build(source: Option<Box<dyn ObjectSource>>, settings: DocumentSettings) -> Self {
        let lenient = settings.lenient;

        Self(Rc::new_cyclic(|weak| DocInner {
            xref: RefCell::new(XRef::new(source, Binding::new(weak.clone()), lenient)),
            journal: RefCell::new(None),
            settings,
        }))
    }

    /// The settings of the document.
    pub fn settings(&self) -> &DocumentSettings {
        &self.0.settings
    }

    pub(crate) fn binding(&self) -> Binding {
        Binding::new(Rc::downgrade(&self.0))
    }

    /// Whether two handles refer to the same document.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// One more than the highest object number in use.
    pub fn len(&self) -> usize {
        self.0.xref.borrow().len()
    }

    /// Whether the document contains no objects.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// The numbers of all objects that were created or altered since the
    /// document was opened.
    pub fn incremental_objects(&self) -> Vec<i32> {
        self.0.xref.borrow().incremental_nums()
    }

    /// Create a new dictionary belonging to this document.
    pub fn new_dict(&self) -> Dict {
        Dict::from_parts(vec![], ObjFlags::empty(), 0, self.binding())
    }

    /// Create a new array belonging to this document.
    pub fn new_array(&self) -> Array {
        Array::from_parts(vec![], ObjFlags::empty(), 0, self.binding())
    }

    /// Create a reference to the object with the given number.
    pub fn new_ref(&self, num: i32) -> ObjRef {
        let gen_num = self.0.xref.borrow().generation(num);
        ObjRef::bound(num, gen_num, self.binding())
    }

    /// Allocate a new object number. The object itself is null until it is
    /// set with [`Document::update_object`].
    pub fn create_object(&self) -> Result<i32> {
        let num = i32::try_from(self.len()).map_err(|_| Error::Limit)?;
        self.prepare_alteration(num)?;

        ldebug!("created object {num}");

        Ok(num)
    }

    /// Store `obj` as a new indirect object and return a reference to it.
    pub fn add_object(&self, obj: impl Into<Object>) -> Result<ObjRef> {
        let obj = obj.into();
        obj.check_binding(&self.binding())?;

        let num = self.create_object()?;
        self.update_object(num, obj)?;

        Ok(self.new_ref(num))
    }

    /// Replace the object with the given number.
    pub fn update_object(&self, num: i32, obj: impl Into<Object>) -> Result<()> {
        let mut obj = obj.into();
        let binding = self.binding();

        self.check_num(num)?;
        obj.check_binding(&binding)?;
        self.prepare_alteration(num)?;

        obj.adopt(num, &binding);
        self.0.xref.borrow_mut().entry_mut(num).obj = Some(obj);

        Ok(())
    }

    /// Free the object with the given number.
    pub fn delete_object(&self, num: i32) -> Result<()> {
        self.check_num(num)?;
        self.prepare_alteration(num)?;

        let mut xref = self.0.xref.borrow_mut();
        let entry = xref.entry_mut(num);
        entry.obj = None;
        entry.stream = None;

        Ok(())
    }

    /// Get the object with the given number.
    ///
    /// The generation number is only used for diagnostics. Objects that don't
    /// exist or fail to load are returned as the null object.
    pub fn resolve(&self, num: i32, gen_num: i32) -> Object {
        self.check_generation(num, gen_num);

        let result = self.0.xref.borrow_mut().get(num);
        self.flush_warnings();

        result.unwrap_or_else(|e| {
            lwarn!("failed to resolve {num} {gen_num} R: {e}");
            Object::Null
        })
    }

    /// Like [`Document::resolve`], but fail if the object is malformed, even
    /// in lenient mode.
    pub fn resolve_checked(&self, num: i32, gen_num: i32) -> Result<Object> {
        self.check_generation(num, gen_num);
        self.0.xref.borrow_mut().get_checked(num)
    }

    /// Get the current version of the object with the given number.
    pub fn object(&self, num: i32) -> Object {
        let result = self.0.xref.borrow_mut().get(num);
        self.flush_warnings();

        result.unwrap_or_default()
    }

    /// Load the object with the given number as stored in the source,
    /// ignoring all cached and altered versions.
    pub fn load_object(&self, num: i32) -> Result<Object> {
        self.0.xref.borrow().load_fresh(num)
    }

    /// Drop the cached version of an object, so that it is loaded again the
    /// next time it is resolved.
    ///
    /// Objects that were altered are not affected.
    pub fn purge_cache(&self, num: i32) {
        self.0.xref.borrow_mut().purge(num);
    }

    /// Whether the object with the given number is a stream.
    pub fn is_stream(&self, num: i32) -> bool {
        let result = self.0.xref.borrow_mut().is_stream(num);
        self.flush_warnings();

        result.unwrap_or(false)
    }

    /// The raw, undecoded data of a stream.
    pub fn load_raw_stream(&self, num: i32) -> Option<Rc<[u8]>> {
        let result = self.0.xref.borrow_mut().stream(num);
        self.flush_warnings();

        result.ok().flatten()
    }

    /// Replace the data of a stream and update its `/Length`.
    ///
    /// The object must be a dictionary. It turns into a stream if it isn't
    /// one already.
    pub fn update_stream(&self, num: i32, data: impl Into<Vec<u8>>) -> Result<()> {
        let data = data.into();

        self.check_num(num)?;

        let Object::Dict(dict) = self.object(num) else {
            bail!(ArgumentError::WrongKind);
        };

        self.prepare_alteration(num)?;
        let len = i64::try_from(data.len()).map_err(|_| Error::Limit)?;
        self.0.xref.borrow_mut().entry_mut(num).stream = Some(Rc::from(data));
        dict.put(names::LENGTH, len)?;

        Ok(())
    }

    /// Store a new stream object.
    pub fn add_stream(&self, dict: Dict, data: impl Into<Vec<u8>>) -> Result<ObjRef> {
        let obj_ref = self.add_object(dict)?;
        self.update_stream(obj_ref.num, data)?;

        Ok(obj_ref)
    }

    pub(crate) fn warn(&self, warning: DocumentWarning) {
        (self.0.settings.warning_sink)(warning);
    }

    pub(crate) fn source_fingerprint(&self) -> (u64, [u8; 16]) {
        let xref = self.0.xref.borrow();

        match xref.source() {
            Some(source) => (source.file_size(), source.fingerprint()),
            None => (0, md5::compute(b"").0),
        }
    }

    fn check_num(&self, num: i32) -> Result<()> {
        if num <= 0 || num as usize >= self.len() {
            bail!(ArgumentError::InvalidObjectNumber);
        }

        Ok(())
    }

    fn check_generation(&self, num: i32, gen_num: i32) {
        let stored = self.0.xref.borrow().generation(num);

        if stored != gen_num {
            ldebug!("reference {num} {gen_num} R doesn't match generation {stored}");
        }
    }

    pub(crate) fn flush_warnings(&self) {
        let broken = self.0.xref.borrow_mut().take_broken();

        for num in broken {
            self.warn(DocumentWarning::BrokenObject(num));
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("len", &self.len())
            .field("journaling", &self.is_journaling())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatError;
    use crate::source::ScannedSource;
    use std::cell::Cell;

    const FILE: &[u8] = b"1 0 obj\n<</Type/Catalog/Pages 2 0 R>>\nendobj\n\
2 0 obj\n<</Type/Pages/Count 0/Kids[]>>\nendobj\n\
3 0 obj\n<</Length 3>>\nstream\nabc\nendstream\nendobj\n\
4 0 obj\n<</Broken (oops>>\nendobj\n";

    #[test]
    fn resolves_from_source() {
        let doc = Document::with_source(ScannedSource::new(FILE), DocumentSettings::default());
        let catalog = doc.resolve(1, 0);

        let pages = catalog.as_dict().unwrap().get(names::PAGES).unwrap();
        assert!(pages.is_indirect());
        assert_eq!(pages.as_dict().unwrap().get_int(names::COUNT), Some(0));
        assert_eq!(catalog.parent_num(), 1);
        assert!(catalog.document().is_some_and(|d| d.ptr_eq(&doc)));
    }

    #[test]
    fn cache_keeps_identity() {
        let doc = Document::with_source(ScannedSource::new(FILE), DocumentSettings::default());
        let a = doc.resolve(2, 0).as_dict().unwrap();
        let b = doc.resolve(2, 0).as_dict().unwrap();
        assert!(a.ptr_eq(&b));

        doc.purge_cache(2);
        let c = doc.resolve(2, 0).as_dict().unwrap();
        assert!(!a.ptr_eq(&c));
        assert_eq!(a, c);
    }

    #[test]
    fn broken_objects() {
        let warnings = Rc::new(Cell::new(0));
        let counter = warnings.clone();
        let settings = DocumentSettings {
            warning_sink: Rc::new(move |w| {
                assert_eq!(w, DocumentWarning::BrokenObject(4));
                counter.set(counter.get() + 1);
            }),
            ..DocumentSettings::default()
        };

        let doc = Document::with_source(ScannedSource::new(FILE).strict(), settings);
        assert_eq!(
            doc.resolve_checked(4, 0),
            Err(Error::Format(FormatError::BrokenObject(4)))
        );
        assert!(doc.resolve(4, 0).is_null());
        assert_eq!(warnings.get(), 1);
    }

    #[test]
    fn streams() {
        let doc = Document::with_source(ScannedSource::new(FILE), DocumentSettings::default());
        assert!(doc.is_stream(3));
        assert!(!doc.is_stream(1));
        assert_eq!(doc.load_raw_stream(3).as_deref(), Some(&b"abc"[..]));

        doc.update_stream(3, b"hello".to_vec()).unwrap();
        assert_eq!(doc.load_raw_stream(3).as_deref(), Some(&b"hello"[..]));
        assert_eq!(doc.resolve(3, 0).as_dict().unwrap().get_int(names::LENGTH), Some(5));
        assert_eq!(doc.incremental_objects(), vec![3]);
    }

    #[test]
    fn promotion_keeps_handles_live() {
        let doc = Document::with_source(ScannedSource::new(FILE), DocumentSettings::default());
        let pages = doc.resolve(2, 0).as_dict().unwrap();

        pages.put(names::COUNT, 1).unwrap();
        assert_eq!(doc.resolve(2, 0).as_dict().unwrap().get_int(names::COUNT), Some(1));
        assert!(doc.resolve(2, 0).as_dict().unwrap().ptr_eq(&pages));
        assert_eq!(doc.load_object(2).unwrap().as_dict().unwrap().get_int(names::COUNT), Some(0));
    }

    #[test]
    fn create_and_delete() {
        let doc = Document::new();
        assert!(doc.is_empty());

        let a = doc.create_object().unwrap();
        let b = doc.create_object().unwrap();
        assert_eq!((a, b), (1, 2));
        assert!(doc.resolve(a, 0).is_null());

        let dict = doc.new_dict();
        dict.put("Value", 7).unwrap();
        doc.update_object(a, dict).unwrap();
        assert_eq!(doc.resolve(a, 0).as_dict().unwrap().get_int(b"Value"), Some(7));

        doc.delete_object(a).unwrap();
        assert!(doc.resolve(a, 0).is_null());
        assert_eq!(doc.update_object(10, 1), Err(ArgumentError::InvalidObjectNumber.into()));
    }

    #[test]
    fn foreign_objects() {
        let first = Document::new();
        let second = Document::new();

        let dict = first.new_dict();
        let other = second.new_dict();
        assert_eq!(dict.put("Other", other.clone()), Err(ArgumentError::ForeignObject.into()));
        assert_eq!(second.add_object(dict).map(|_| ()), Err(ArgumentError::ForeignObject.into()));

        // Unbound objects are adopted.
        let free = Dict::new();
        let obj_ref = second.add_object(free.clone()).unwrap();
        assert_eq!(free.parent_num(), obj_ref.num());
        assert!(Object::from(free).document().is_some_and(|d| d.ptr_eq(&second)));
    }

    #[test]
    fn references_resolve_through_document() {
        let doc = Document::new();
        let target = doc.add_object(42).unwrap();
        let middle = doc.add_object(target.clone()).unwrap();

        assert_eq!(Object::from(middle).to_int(), 42);
        assert_eq!(target.resolve().to_int(), 42);
    }

    #[test]
    fn reference_loops() {
        let warnings = Rc::new(Cell::new(0));
        let counter = warnings.clone();
        let doc = Document::with_settings(DocumentSettings {
            warning_sink: Rc::new(move |_| counter.set(counter.get() + 1)),
            ..DocumentSettings::default()
        });

        let a = doc.create_object().unwrap();
        let b = doc.create_object().unwrap();
        doc.update_object(a, doc.new_ref(b)).unwrap();
        doc.update_object(b, doc.new_ref(a)).unwrap();

        assert!(Object::from(doc.new_ref(a)).resolve().is_null());
        assert_eq!(warnings.get(), 1);
    }

    #[test]
    fn documents_are_freed() {
        let doc = Document::new();
        let dict = doc.new_dict();
        drop(doc);

        assert!(Object::from(dict.clone()).document().is_none());
        dict.put("Key", 1).unwrap();
    }
}
