//! Dictionaries.

use crate::document::{Binding, prepare_alteration};
use crate::error::{ArgumentError, FormatError, Result};
use crate::mark::MarkGuard;
use crate::object::name::names;
use crate::object::{Array, MAX_LEN, Name, Object, ObjFlags, PdfString, check_insert, reserve_one};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// Above this length, the next insertion sorts the dictionary.
pub(crate) const SORT_THRESHOLD: usize = 100;
/// Below this length, deleting from a sorted dictionary gives up the order.
pub(crate) const UNSORT_THRESHOLD: usize = 50;

pub(crate) struct DictRepr {
    pub(crate) entries: Vec<(Name, Object)>,
    pub(crate) flags: ObjFlags,
    pub(crate) parent_num: i32,
    pub(crate) binding: Binding,
}

impl DictRepr {
    pub(crate) fn is_adopted_by(&self, parent_num: i32, binding: &Binding) -> bool {
        self.parent_num == parent_num && (!binding.is_bound() || self.binding.same(binding))
    }

    fn is_sorted(&self) -> bool {
        self.flags.contains(ObjFlags::SORTED)
    }

    /// Find the position of `key`, or the position it would have to be
    /// inserted at.
    fn find(&self, key: &[u8]) -> std::result::Result<usize, usize> {
        if self.is_sorted() {
            self.entries
                .binary_search_by(|(k, _)| k.as_bytes().cmp(key))
        } else {
            self.entries
                .iter()
                .position(|(k, _)| k.as_bytes() == key)
                .ok_or(self.entries.len())
        }
    }

    fn sort(&mut self) {
        self.entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        self.flags.insert(ObjFlags::SORTED);
    }
}

/// A PDF dictionary.
///
/// Small dictionaries keep their keys in insertion order and are searched
/// linearly. Once a dictionary grows beyond [`SORT_THRESHOLD`] entries, its
/// keys are sorted and searched with a binary search.
///
/// Like arrays, dictionaries are handles to shared state.
#[derive(Clone)]
pub struct Dict(pub(crate) Rc<RefCell<DictRepr>>);

impl Dict {
    /// Create a new, empty dictionary that doesn't belong to any document.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a new, empty dictionary with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_parts(
            Vec::with_capacity(capacity),
            ObjFlags::empty(),
            0,
            Binding::default(),
        )
    }

    pub(crate) fn from_parts(
        entries: Vec<(Name, Object)>,
        flags: ObjFlags,
        parent_num: i32,
        binding: Binding,
    ) -> Self {
        Self(Rc::new(RefCell::new(DictRepr {
            entries,
            flags,
            parent_num,
            binding,
        })))
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.0.borrow().entries.len()
    }

    /// Whether the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the keys are currently kept in sorted order.
    pub fn is_sorted(&self) -> bool {
        self.0.borrow().is_sorted()
    }

    /// The number of the nearest enclosing indirect object, or 0.
    pub fn parent_num(&self) -> i32 {
        self.0.borrow().parent_num
    }

    /// Whether both handles point to the same dictionary.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn refs(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Return the value of `key`, without resolving it.
    ///
    /// Returns `None` if the key is absent. A key that is present with the
    /// null object as value returns `Some(Object::Null)`.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<Object> {
        let repr = self.0.borrow();
        let idx = repr.find(key.as_ref()).ok()?;

        Some(repr.entries[idx].1.clone())
    }

    /// Return the value of `key`, resolving indirect references.
    pub fn get_resolved(&self, key: impl AsRef<[u8]>) -> Option<Object> {
        self.get(key).map(|o| o.resolve())
    }

    /// Whether the dictionary has an entry for `key`.
    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> bool {
        self.0.borrow().find(key.as_ref()).is_ok()
    }

    /// The key of the entry at `index`.
    pub fn key_at(&self, index: usize) -> Option<Name> {
        self.0.borrow().entries.get(index).map(|(k, _)| k.clone())
    }

    /// The value of the entry at `index`.
    pub fn value_at(&self, index: usize) -> Option<Object> {
        self.0.borrow().entries.get(index).map(|(_, v)| v.clone())
    }

    /// Return a snapshot of the entries, in their current order.
    pub fn iter(&self) -> impl Iterator<Item = (Name, Object)> + use<> {
        self.0.borrow().entries.clone().into_iter()
    }

    /// Return a snapshot of the keys, in their current order.
    pub fn keys(&self) -> impl Iterator<Item = Name> + use<> {
        self.iter().map(|(k, _)| k)
    }

    /// Return the integer value of `key`, rounding reals like
    /// [`Object::to_int`].
    pub fn get_int(&self, key: impl AsRef<[u8]>) -> Option<i64> {
        self.get_resolved(key)?.try_int().ok()
    }

    /// Return the numeric value of `key`.
    pub fn get_real(&self, key: impl AsRef<[u8]>) -> Option<f64> {
        match self.get_resolved(key)? {
            Object::Integer(i) => Some(i as f64),
            Object::Real(r) => Some(r),
            _ => None,
        }
    }

    /// Return the boolean value of `key`.
    pub fn get_bool(&self, key: impl AsRef<[u8]>) -> Option<bool> {
        match self.get_resolved(key)? {
            Object::Boolean(b) => Some(b),
            _ => None,
        }
    }

    /// Return the name value of `key`.
    pub fn get_name(&self, key: impl AsRef<[u8]>) -> Option<Name> {
        self.get(key)?.as_name()
    }

    /// Return the string value of `key`.
    pub fn get_string(&self, key: impl AsRef<[u8]>) -> Option<PdfString> {
        self.get(key)?.as_string()
    }

    /// Return the dictionary value of `key`.
    pub fn get_dict(&self, key: impl AsRef<[u8]>) -> Option<Dict> {
        self.get(key)?.as_dict()
    }

    /// Return the array value of `key`.
    pub fn get_array(&self, key: impl AsRef<[u8]>) -> Option<Array> {
        self.get(key)?.as_array()
    }

    /// Look up `key` in this dictionary and then in the chain of `/Parent`
    /// dictionaries, as done for inheritable page attributes.
    ///
    /// Fails if the chain of parents loops.
    pub fn get_inheritable(&self, key: impl AsRef<[u8]>) -> Result<Option<Object>> {
        let key = key.as_ref();
        let mut visited = SmallVec::<[Object; 8]>::new();
        let mut current = Some(self.clone());

        let result = loop {
            let Some(dict) = current else {
                break Ok(None);
            };

            let obj = Object::Dict(dict.clone());

            if obj.mark() {
                break Err(FormatError::Cycle.into());
            }

            visited.push(obj);

            if let Some(value) = dict.get(key) {
                break Ok(Some(value));
            }

            current = dict.get_dict(&names::PARENT);
        };

        for obj in visited {
            obj.unmark();
        }

        result
    }

    /// Set the value of `key`, replacing any previous value.
    pub fn put(&self, key: impl Into<Name>, value: impl Into<Object>) -> Result<()> {
        let key = key.into();
        let value = value.into();

        self.check(&value)?;

        let grows = {
            let repr = self.0.borrow();
            repr.find(&key).is_err()
        };

        if grows {
            self.reserve_one()?;
        }

        let value = self.prepare_insert(value)?;

        let mut repr = self.0.borrow_mut();

        if !repr.is_sorted() && repr.entries.len() > SORT_THRESHOLD {
            repr.sort();
        }

        match repr.find(&key) {
            Ok(idx) => repr.entries[idx].1 = value,
            Err(idx) => repr.entries.insert(idx, (key, value)),
        }

        repr.flags.insert(ObjFlags::DIRTY);

        Ok(())
    }

    /// Like [`Dict::put`], but with the key given as an object.
    ///
    /// Fails if the key isn't a name.
    pub fn put_key_obj(&self, key: &Object, value: impl Into<Object>) -> Result<()> {
        match key {
            Object::Name(name) => self.put(name, value),
            _ => Err(ArgumentError::KeyNotName.into()),
        }
    }

    /// Remove the entry for `key`, if present.
    pub fn delete(&self, key: impl AsRef<[u8]>) -> Result<()> {
        let key = key.as_ref();

        if !self.contains_key(key) {
            return Ok(());
        }

        self.prepare()?;

        let mut repr = self.0.borrow_mut();

        if let Ok(idx) = repr.find(key) {
            if repr.is_sorted() && repr.entries.len() <= UNSORT_THRESHOLD {
                repr.entries.swap_remove(idx);
                repr.flags.remove(ObjFlags::SORTED);
            } else {
                repr.entries.remove(idx);
            }

            repr.flags.insert(ObjFlags::DIRTY);
        }

        Ok(())
    }

    /// Sort the keys of the dictionary, switching lookups to binary search.
    pub fn sort(&self) -> Result<()> {
        if self.is_sorted() {
            return Ok(());
        }

        self.prepare()?;

        let mut repr = self.0.borrow_mut();
        repr.sort();
        repr.flags.insert(ObjFlags::DIRTY);

        Ok(())
    }

    fn check(&self, value: &Object) -> Result<()> {
        let binding = self.0.borrow().binding.clone();
        check_insert(&Object::Dict(self.clone()), value, &binding)
    }

    fn prepare(&self) -> Result<()> {
        let (parent_num, binding) = {
            let repr = self.0.borrow();
            (repr.parent_num, repr.binding.clone())
        };

        prepare_alteration(&binding, parent_num)
    }

    fn prepare_insert(&self, mut value: Object) -> Result<Object> {
        self.prepare()?;

        let (parent_num, binding) = {
            let repr = self.0.borrow();
            (repr.parent_num, repr.binding.clone())
        };

        value.adopt(parent_num, &binding);

        Ok(value)
    }

    fn reserve_one(&self) -> Result<()> {
        reserve_one(&mut self.0.borrow_mut().entries, MAX_LEN)
    }
}

impl Default for Dict {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Dict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let Some(_guard) = MarkGuard::new(&Object::Dict(self.clone())) else {
            return write!(f, "<<...>>");
        };

        let entries = self.0.borrow().entries.clone();
        let mut debug_map = f.debug_map();

        for (key, value) in &entries {
            debug_map.entry(key, value);
        }

        debug_map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(i: usize) -> Name {
        Name::new(format!("K{i:03}").as_bytes())
    }

    #[test]
    fn absent_is_not_null() {
        let dict = Dict::new();
        dict.put("A", Object::Null).unwrap();
        assert_eq!(dict.get(b"A"), Some(Object::Null));
        assert_eq!(dict.get(b"B"), None);
    }

    #[test]
    fn insertion_order_is_kept() {
        let dict = Dict::new();
        dict.put("Z", 1).unwrap();
        dict.put(names::TYPE, names::PAGE).unwrap();
        dict.put("A", 2).unwrap();
        let keys: Vec<_> = dict.keys().map(|k| k.as_str().to_string()).collect();
        assert_eq!(keys, ["Z", "Type", "A"]);
    }

    #[test]
    fn replace_keeps_length() {
        let dict = Dict::new();
        dict.put("A", 1).unwrap();
        dict.put("A", 2).unwrap();
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get_int(b"A"), Some(2));
    }

    #[test]
    fn sorts_past_threshold() {
        let dict = Dict::new();

        for i in (0..=SORT_THRESHOLD + 1).rev() {
            dict.put(key(i), i as i64).unwrap();
        }

        assert!(dict.is_sorted());

        for i in 0..=SORT_THRESHOLD + 1 {
            assert_eq!(dict.get_int(key(i)), Some(i as i64));
        }

        let keys: Vec<_> = dict.keys().collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn delete_hysteresis() {
        let dict = Dict::new();

        for i in 0..=SORT_THRESHOLD + 1 {
            dict.put(key(i), 0).unwrap();
        }

        assert!(dict.is_sorted());

        let mut i = 0;
        while dict.len() > UNSORT_THRESHOLD {
            dict.delete(key(i)).unwrap();
            assert!(dict.is_sorted());
            i += 1;
        }

        dict.delete(key(i)).unwrap();
        assert!(!dict.is_sorted());
        assert_eq!(dict.len(), UNSORT_THRESHOLD - 1);
        assert!(dict.contains_key(key(i + 1)));
        assert!(!dict.contains_key(key(i)));
    }

    #[test]
    fn delete_missing_key() {
        let dict = Dict::new();
        dict.delete(b"A").unwrap();
        assert!(!Object::Dict(dict).is_dirty());
    }

    #[test]
    fn put_key_obj() {
        let dict = Dict::new();
        assert_eq!(
            dict.put_key_obj(&Object::Integer(1), 1),
            Err(ArgumentError::KeyNotName.into())
        );
        dict.put_key_obj(&Object::Name(names::KIDS), 1).unwrap();
        assert!(dict.contains_key(&names::KIDS));
    }

    #[test]
    fn inheritable() {
        let root = Dict::new();
        root.put(names::ROTATE, 90).unwrap();
        let page = Dict::new();
        page.put(names::PARENT, root.clone()).unwrap();

        assert_eq!(
            page.get_inheritable(&names::ROTATE).unwrap(),
            Some(Object::Integer(90))
        );
        assert_eq!(page.get_inheritable(&names::MEDIA_BOX).unwrap(), None);
    }

    #[test]
    fn typed_getters() {
        let dict = Dict::new();
        dict.put("I", 3).unwrap();
        dict.put("R", 1.5).unwrap();
        dict.put("B", true).unwrap();
        dict.put("N", names::PAGE).unwrap();

        assert_eq!(dict.get_int(b"I"), Some(3));
        assert_eq!(dict.get_real(b"I"), Some(3.0));
        assert_eq!(dict.get_real(b"R"), Some(1.5));
        assert_eq!(dict.get_int(b"R"), Some(2));
        assert_eq!(dict.get_int(b"R"), Some(Object::Real(1.5).to_int()));
        assert_eq!(dict.get_bool(b"B"), Some(true));
        assert_eq!(dict.get_name(b"N"), Some(names::PAGE));
        assert_eq!(dict.get_dict(b"N"), None);
        assert_eq!(dict.get_int(b"N"), None);
    }
}
