//! The object table of a document.
//!
//! Objects live in one of two sections. The base section caches objects
//! loaded from the [`ObjectSource`] of the document. The incremental section
//! holds every object that was created or altered since the document was
//! opened. An object is promoted into the incremental section right before
//! its first alteration and always shadows its base version afterwards.

use crate::document::Binding;
use crate::error::{FormatError, Result, bail};
use crate::object::Object;
use crate::source::{EntryKind, ObjectSource};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// An object of the incremental section.
#[derive(Debug, Default, Clone)]
pub(crate) struct Entry {
    /// The object, or `None` if the number is free.
    pub(crate) obj: Option<Object>,
    /// The raw data, if the object is a stream.
    pub(crate) stream: Option<Rc<[u8]>>,
}

#[derive(Debug, Default)]
struct BaseEntry {
    obj: Object,
    in_use: bool,
    // Whether loading failed and `obj` is a null placeholder.
    broken: bool,
    // `None` until the data was requested for the first time.
    stream: Option<Option<Rc<[u8]>>>,
}

pub(crate) struct XRef {
    source: Option<Box<dyn ObjectSource>>,
    base: FxHashMap<i32, BaseEntry>,
    incremental: FxHashMap<i32, Entry>,
    binding: Binding,
    lenient: bool,
    broken: Vec<i32>,
}

impl XRef {
    pub(crate) fn new(source: Option<Box<dyn ObjectSource>>, binding: Binding, lenient: bool) -> Self {
        Self {
            source,
            base: FxHashMap::default(),
            incremental: FxHashMap::default(),
            binding,
            lenient,
            broken: vec![],
        }
    }

    pub(crate) fn source(&self) -> Option<&dyn ObjectSource> {
        self.source.as_deref()
    }

    /// One more than the highest object number in use.
    pub(crate) fn len(&self) -> usize {
        let base = self.source.as_ref().map_or(1, |s| s.len().max(1));
        let incremental = self
            .incremental
            .keys()
            .max()
            .map_or(0, |max| *max as usize + 1);

        base.max(incremental)
    }

    pub(crate) fn is_incremental(&self, num: i32) -> bool {
        self.incremental.contains_key(&num)
    }

    /// The numbers of all objects in the incremental section, in ascending
    /// order.
    pub(crate) fn incremental_nums(&self) -> Vec<i32> {
        let mut nums = self.incremental.keys().copied().collect::<Vec<_>>();
        nums.sort_unstable();

        nums
    }

    /// The generation number stored for an object.
    pub(crate) fn generation(&self, num: i32) -> i32 {
        if self.is_incremental(num) {
            return 0;
        }

        self.source
            .as_ref()
            .and_then(|s| s.entry(num))
            .map_or(0, |e| e.gen_num)
    }

    /// The numbers of objects that failed to load since the last call.
    pub(crate) fn take_broken(&mut self) -> Vec<i32> {
        std::mem::take(&mut self.broken)
    }

    /// Get the current version of an object.
    pub(crate) fn get(&mut self, num: i32) -> Result<Object> {
        if let Some(entry) = self.incremental.get(&num) {
            return Ok(entry.obj.clone().unwrap_or_default());
        }

        if !self.in_source(num) {
            return Ok(Object::Null);
        }

        Ok(self.load_base(num, self.lenient)?.obj.clone())
    }

    /// Like [`XRef::get`], but never swallow loading errors.
    pub(crate) fn get_checked(&mut self, num: i32) -> Result<Object> {
        if let Some(entry) = self.incremental.get(&num) {
            return Ok(entry.obj.clone().unwrap_or_default());
        }

        if !self.in_source(num) {
            return Ok(Object::Null);
        }

        let entry = self.load_base(num, false)?;

        if entry.broken {
            bail!(FormatError::BrokenObject(num));
        }

        Ok(entry.obj.clone())
    }

    /// Load an object from the source, bypassing the cache.
    pub(crate) fn load_fresh(&self, num: i32) -> Result<Object> {
        let Some(source) = &self.source else {
            return Ok(Object::Null);
        };

        match source.entry(num) {
            Some(entry) if entry.kind != EntryKind::Free => {}
            _ => return Ok(Object::Null),
        }

        let mut obj = source.load_object(num)?;
        obj.adopt(num, &self.binding);

        Ok(obj)
    }

    /// Drop the cached base version of an object.
    pub(crate) fn purge(&mut self, num: i32) {
        if self.base.remove(&num).is_some() {
            ldebug!("purged object {num} from the cache");
        }
    }

    pub(crate) fn is_stream(&mut self, num: i32) -> Result<bool> {
        if let Some(entry) = self.incremental.get(&num) {
            return Ok(entry.stream.is_some());
        }

        Ok(self.stream(num)?.is_some())
    }

    /// The raw data of a stream object.
    pub(crate) fn stream(&mut self, num: i32) -> Result<Option<Rc<[u8]>>> {
        if let Some(entry) = self.incremental.get(&num) {
            return Ok(entry.stream.clone());
        }

        self.base_stream(num)
    }

    /// Move an object into the incremental section, if it isn't there yet.
    ///
    /// The live object is moved, while the base section keeps a copy, so that
    /// existing handles to the object observe later alterations. Returns
    /// whether the incremental entry holds no object, i.e. the number is new
    /// or free.
    pub(crate) fn ensure_incremental(&mut self, num: i32) -> Result<bool> {
        if let Some(entry) = self.incremental.get(&num) {
            return Ok(entry.obj.is_none());
        }

        let in_use = self.in_source(num) && self.load_base(num, self.lenient)?.in_use;

        if !in_use {
            ldebug!("allocating incremental entry for free object {num}");
            self.incremental.insert(num, Entry::default());

            return Ok(true);
        }

        let stream = self.base_stream(num)?;
        let base = self.load_base(num, self.lenient)?;
        let live = std::mem::replace(&mut base.obj, Object::Null);
        base.obj = live.deep_copy();

        ldebug!("promoted object {num} into the incremental section");

        self.incremental.insert(
            num,
            Entry {
                obj: Some(live),
                stream,
            },
        );

        Ok(false)
    }

    /// The incremental entry of an object, which is created if needed.
    pub(crate) fn entry_mut(&mut self, num: i32) -> &mut Entry {
        self.incremental.entry(num).or_default()
    }

    /// Whether the source has an entry for the number, free or not. Only
    /// such numbers get a base entry.
    fn in_source(&self, num: i32) -> bool {
        self.source.as_ref().is_some_and(|s| s.entry(num).is_some())
    }

    fn load_base(&mut self, num: i32, lenient: bool) -> Result<&mut BaseEntry> {
        let entry = match self.base.remove(&num) {
            Some(entry) => entry,
            None => {
                let in_use = self
                    .source
                    .as_ref()
                    .and_then(|s| s.entry(num))
                    .is_some_and(|e| e.kind != EntryKind::Free);

                let (obj, broken) = match self.load_fresh(num) {
                    Ok(obj) => (obj, false),
                    Err(e) if lenient => {
                        lwarn!("failed to load object {num}: {e}");
                        self.broken.push(num);

                        (Object::Null, true)
                    }
                    Err(e) => return Err(e),
                };

                BaseEntry {
                    obj,
                    in_use,
                    broken,
                    stream: None,
                }
            }
        };

        Ok(self.base.entry(num).or_insert(entry))
    }

    fn base_stream(&mut self, num: i32) -> Result<Option<Rc<[u8]>>> {
        if !self.in_source(num) {
            return Ok(None);
        }

        let lenient = self.lenient;
        let in_use = self.load_base(num, lenient)?.in_use;

        if let Some(Some(stream)) = self.base.get(&num).map(|e| e.stream.clone()) {
            return Ok(stream);
        }

        let stream = match self.source.as_ref() {
            Some(source) if in_use => match source.load_stream(num) {
                Ok(data) => data.map(Rc::from),
                Err(e) if lenient => {
                    lwarn!("failed to load the data of stream {num}: {e}");
                    self.broken.push(num);

                    None
                }
                Err(e) => return Err(e),
            },
            _ => None,
        };

        self.load_base(num, lenient)?.stream = Some(stream.clone());

        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ScannedSource;

    fn xref(data: &'static [u8]) -> XRef {
        XRef::new(Some(Box::new(ScannedSource::new(data))), Binding::default(), true)
    }

    #[test]
    fn unknown_numbers_are_not_cached() {
        let mut xref = xref(b"1 0 obj\n<</A 1>>\nendobj\n");

        for num in [-3, 0, 2, 1000] {
            assert!(xref.get(num).unwrap().is_null());
            assert!(!xref.is_stream(num).unwrap());
        }

        assert!(xref.base.is_empty());

        assert!(xref.get(1).unwrap().is_dict());
        assert_eq!(xref.base.len(), 1);
    }

    #[test]
    fn promotion_of_unknown_numbers() {
        let mut xref = xref(b"1 0 obj\n5\nendobj\n");

        assert!(xref.ensure_incremental(7).unwrap());
        assert!(!xref.ensure_incremental(1).unwrap());
        assert!(xref.base.get(&7).is_none());
        assert_eq!(xref.incremental_nums(), vec![1, 7]);
    }
}
