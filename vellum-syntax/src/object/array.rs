//! Arrays.

use crate::document::{Binding, prepare_alteration};
use crate::error::{ArgumentError, Result, bail};
use crate::mark::MarkGuard;
use crate::object::{MAX_LEN, Object, ObjFlags, check_insert, reserve_one};
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

pub(crate) struct ArrayRepr {
    pub(crate) items: Vec<Object>,
    pub(crate) flags: ObjFlags,
    pub(crate) parent_num: i32,
    pub(crate) binding: Binding,
}

impl ArrayRepr {
    pub(crate) fn is_adopted_by(&self, parent_num: i32, binding: &Binding) -> bool {
        self.parent_num == parent_num && (!binding.is_bound() || self.binding.same(binding))
    }
}

/// An array of PDF objects.
///
/// Arrays are handles: cloning an array yields another handle to the same
/// items, and changes made through one handle are visible through all others.
#[derive(Clone)]
pub struct Array(pub(crate) Rc<RefCell<ArrayRepr>>);

impl Array {
    /// Create a new, empty array that doesn't belong to any document.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a new, empty array with room for `capacity` items.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_parts(
            Vec::with_capacity(capacity),
            ObjFlags::empty(),
            0,
            Binding::default(),
        )
    }

    pub(crate) fn from_parts(
        items: Vec<Object>,
        flags: ObjFlags,
        parent_num: i32,
        binding: Binding,
    ) -> Self {
        Self(Rc::new(RefCell::new(ArrayRepr {
            items,
            flags,
            parent_num,
            binding,
        })))
    }

    /// The number of items.
    pub fn len(&self) -> usize {
        self.0.borrow().items.len()
    }

    /// Whether the array has no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of items the array can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.0.borrow().items.capacity()
    }

    /// The number of the nearest enclosing indirect object, or 0.
    pub fn parent_num(&self) -> i32 {
        self.0.borrow().parent_num
    }

    /// Whether both handles point to the same array.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn refs(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Return the item at `index`, without resolving it.
    pub fn get(&self, index: usize) -> Option<Object> {
        self.0.borrow().items.get(index).cloned()
    }

    /// Return the item at `index`, resolving indirect references.
    pub fn get_resolved(&self, index: usize) -> Option<Object> {
        self.get(index).map(|o| o.resolve())
    }

    /// Replace the item at `index`.
    ///
    /// An index equal to the length of the array appends the value.
    pub fn put(&self, index: usize, value: impl Into<Object>) -> Result<()> {
        let len = self.len();

        if index == len {
            return self.push(value);
        }

        if index > len {
            bail!(ArgumentError::IndexOutOfBounds);
        }

        let value = self.prepare_insert(value.into())?;

        let mut repr = self.0.borrow_mut();
        repr.items[index] = value;
        repr.flags.insert(ObjFlags::DIRTY);

        Ok(())
    }

    /// Append a value to the end of the array.
    pub fn push(&self, value: impl Into<Object>) -> Result<()> {
        let value = value.into();
        self.check(&value)?;
        self.reserve_one()?;
        let value = self.prepare_insert(value)?;

        let mut repr = self.0.borrow_mut();
        repr.items.push(value);
        repr.flags.insert(ObjFlags::DIRTY);

        Ok(())
    }

    /// Insert a value at `index`, shifting all later items up.
    pub fn insert(&self, index: usize, value: impl Into<Object>) -> Result<()> {
        if index > self.len() {
            bail!(ArgumentError::IndexOutOfBounds);
        }

        let value = value.into();
        self.check(&value)?;
        self.reserve_one()?;
        let value = self.prepare_insert(value)?;

        let mut repr = self.0.borrow_mut();
        repr.items.insert(index, value);
        repr.flags.insert(ObjFlags::DIRTY);

        Ok(())
    }

    /// Remove the item at `index`, shifting all later items down.
    pub fn delete(&self, index: usize) -> Result<()> {
        if index >= self.len() {
            bail!(ArgumentError::IndexOutOfBounds);
        }

        self.prepare()?;

        let mut repr = self.0.borrow_mut();
        repr.items.remove(index);
        repr.flags.insert(ObjFlags::DIRTY);

        Ok(())
    }

    /// Return a snapshot of the items.
    pub fn iter(&self) -> impl Iterator<Item = Object> + use<> {
        self.0.borrow().items.clone().into_iter()
    }

    /// Whether the array contains an item equal to `value`.
    pub fn contains(&self, value: &Object) -> bool {
        self.find(value).is_some()
    }

    /// The index of the first item equal to `value`.
    pub fn find(&self, value: &Object) -> Option<usize> {
        self.iter().position(|item| item == *value)
    }

    fn check(&self, value: &Object) -> Result<()> {
        let binding = self.0.borrow().binding.clone();
        check_insert(&Object::Array(self.clone()), value, &binding)
    }

    fn prepare(&self) -> Result<()> {
        let (parent_num, binding) = {
            let repr = self.0.borrow();
            (repr.parent_num, repr.binding.clone())
        };

        prepare_alteration(&binding, parent_num)
    }

    fn prepare_insert(&self, mut value: Object) -> Result<Object> {
        self.check(&value)?;
        self.prepare()?;

        let (parent_num, binding) = {
            let repr = self.0.borrow();
            (repr.parent_num, repr.binding.clone())
        };

        value.adopt(parent_num, &binding);

        Ok(value)
    }

    fn reserve_one(&self) -> Result<()> {
        reserve_one(&mut self.0.borrow_mut().items, MAX_LEN)
    }
}

impl Default for Array {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Array {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let Some(_guard) = MarkGuard::new(&Object::Array(self.clone())) else {
            return write!(f, "[...]");
        };

        let items = self.0.borrow().items.clone();
        f.debug_list().entries(items.iter()).finish()
    }
}

impl<T: Into<Object>> FromIterator<T> for Array {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let items = iter.into_iter().map(Into::into).collect();

        Self::from_parts(items, ObjFlags::empty(), 0, Binding::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(array: &Array) -> Vec<i64> {
        array.iter().map(|o| o.to_int()).collect()
    }

    #[test]
    fn edit_sequence() {
        let array: Array = [1, 2, 3].into_iter().collect();
        array.delete(1).unwrap();
        assert_eq!(ints(&array), [1, 3]);
        array.push(4).unwrap();
        assert_eq!(ints(&array), [1, 3, 4]);
        array.insert(0, 0).unwrap();
        assert_eq!(ints(&array), [0, 1, 3, 4]);
    }

    #[test]
    fn put_at_end_appends() {
        let array = Array::new();
        array.put(0, 7).unwrap();
        array.put(0, 8).unwrap();
        assert_eq!(ints(&array), [8]);
        assert_eq!(
            array.put(3, 1),
            Err(ArgumentError::IndexOutOfBounds.into())
        );
    }

    #[test]
    fn out_of_bounds() {
        let array = Array::new();
        assert_eq!(array.delete(0), Err(ArgumentError::IndexOutOfBounds.into()));
        assert_eq!(
            array.insert(1, 0),
            Err(ArgumentError::IndexOutOfBounds.into())
        );
        assert!(array.get(0).is_none());
    }

    #[test]
    fn growth() {
        let array = Array::new();

        for i in 0..20 {
            array.push(i).unwrap();
            assert!(array.len() <= array.capacity());
        }

        assert_eq!(array.len(), 20);
    }

    #[test]
    fn handles_share_items() {
        let array = Array::new();
        let other = array.clone();
        other.push(true).unwrap();
        assert_eq!(array.len(), 1);
        assert!(array.contains(&Object::Boolean(true)));
        assert_eq!(array.find(&Object::Boolean(false)), None);
    }

    #[test]
    fn debug_of_self_containing_array() {
        let array = Array::new();
        array.0.borrow_mut().items.push(Object::Array(array.clone()));
        assert_eq!(format!("{array:?}"), "[[...]]");
        // Break the cycle so the test doesn't leak.
        array.0.borrow_mut().items.clear();
    }
}
