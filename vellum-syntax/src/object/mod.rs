//! The PDF object model.

use crate::document::{Binding, Document, DocumentWarning};
use crate::error::{ArgumentError, Error, Result, bail};
use bitflags::bitflags;
use std::cmp::Ordering;
use std::fmt::{Debug, Formatter};

pub mod array;
pub mod compare;
pub mod dict;
pub mod name;
pub mod r#ref;
pub mod string;

pub use array::Array;
pub use dict::Dict;
pub use name::{Name, names};
pub use r#ref::ObjRef;
pub use string::PdfString;

/// The maximum number of indirections followed before giving up.
pub(crate) const MAX_INDIRECTIONS: usize = 10;

bitflags! {
    /// Flags carried by arrays and dictionaries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ObjFlags: u8 {
        /// The object was marked by a graph walk.
        const MARKED = 1 << 0;
        /// The keys of the dictionary are in sorted order.
        const SORTED = 1 << 1;
        /// The object was modified since it was last marked clean.
        const DIRTY = 1 << 2;
    }
}

/// A PDF object.
#[derive(Clone, Default)]
pub enum Object {
    /// The null object.
    #[default]
    Null,
    /// A boolean.
    Boolean(bool),
    /// An integer.
    Integer(i64),
    /// A real number.
    Real(f64),
    /// A string.
    String(PdfString),
    /// A name.
    Name(Name),
    /// An array.
    Array(Array),
    /// A dictionary.
    Dict(Dict),
    /// An indirect reference.
    Ref(ObjRef),
}

impl Object {
    /// The number of strong handles to the object.
    ///
    /// Returns 0 for objects that aren't reference counted. This is only
    /// meant for diagnostics.
    pub fn refs(&self) -> usize {
        match self {
            Self::String(s) => s.refs(),
            Self::Name(n) => n.refs(),
            Self::Array(a) => a.refs(),
            Self::Dict(d) => d.refs(),
            Self::Null | Self::Boolean(_) | Self::Integer(_) | Self::Real(_) | Self::Ref(_) => 0,
        }
    }

    /// Follow indirect references until a direct object is reached.
    ///
    /// Returns the null object for dangling references and for chains that are
    /// longer than the supported maximum.
    pub fn resolve(&self) -> Self {
        let Self::Ref(first) = self else {
            return self.clone();
        };

        let mut current = first.clone();

        for _ in 0..MAX_INDIRECTIONS {
            let Some(doc) = current.document() else {
                ldebug!("reference {} {} R is not bound to a document", current.num, current.gen_num);

                return Self::Null;
            };

            match doc.resolve(current.num, current.gen_num) {
                Self::Ref(next) => current = next,
                obj => return obj,
            }
        }

        lwarn!("too many indirections starting at {} {} R", first.num, first.gen_num);

        if let Some(doc) = first.document() {
            doc.warn(DocumentWarning::TooManyIndirections(first.num));
        }

        Self::Null
    }

    /// Whether the object is an indirect reference.
    pub fn is_indirect(&self) -> bool {
        matches!(self, Self::Ref(_))
    }

    /// The object number of an indirect reference, or 0.
    pub fn to_object_number(&self) -> i32 {
        match self {
            Self::Ref(r) => r.num,
            _ => 0,
        }
    }

    /// The generation number of an indirect reference, or 0.
    pub fn to_generation(&self) -> i32 {
        match self {
            Self::Ref(r) => r.gen_num,
            _ => 0,
        }
    }

    /// Whether the (resolved) object is null.
    pub fn is_null(&self) -> bool {
        matches!(self.resolve(), Self::Null)
    }

    /// Whether the (resolved) object is a boolean.
    pub fn is_bool(&self) -> bool {
        matches!(self.resolve(), Self::Boolean(_))
    }

    /// Whether the (resolved) object is an integer.
    pub fn is_int(&self) -> bool {
        matches!(self.resolve(), Self::Integer(_))
    }

    /// Whether the (resolved) object is a real.
    pub fn is_real(&self) -> bool {
        matches!(self.resolve(), Self::Real(_))
    }

    /// Whether the (resolved) object is an integer or a real.
    pub fn is_number(&self) -> bool {
        matches!(self.resolve(), Self::Integer(_) | Self::Real(_))
    }

    /// Whether the (resolved) object is a string.
    pub fn is_string(&self) -> bool {
        matches!(self.resolve(), Self::String(_))
    }

    /// Whether the (resolved) object is a name.
    pub fn is_name(&self) -> bool {
        matches!(self.resolve(), Self::Name(_))
    }

    /// Whether the (resolved) object is an array.
    pub fn is_array(&self) -> bool {
        matches!(self.resolve(), Self::Array(_))
    }

    /// Whether the (resolved) object is a dictionary.
    pub fn is_dict(&self) -> bool {
        matches!(self.resolve(), Self::Dict(_))
    }

    /// Whether the object is a reference to a stream object.
    pub fn is_stream(&self) -> bool {
        match self {
            Self::Ref(r) => r.document().is_some_and(|doc| doc.is_stream(r.num)),
            _ => false,
        }
    }

    /// The boolean value of the object, or `false`.
    pub fn to_bool(&self) -> bool {
        match self.resolve() {
            Self::Boolean(b) => b,
            _ => false,
        }
    }

    /// The integer value of the object, or 0.
    ///
    /// Reals are rounded to the nearest integer.
    pub fn to_int(&self) -> i64 {
        match self.resolve() {
            Self::Integer(i) => i,
            Self::Real(r) => {
                ldebug!("converting real {r} to an integer");

                (r + 0.5).floor() as i64
            }
            _ => 0,
        }
    }

    /// The numeric value of the object, or 0.
    pub fn to_real(&self) -> f64 {
        match self.resolve() {
            Self::Integer(i) => i as f64,
            Self::Real(r) => r,
            _ => 0.0,
        }
    }

    /// The name held by the object, or the empty name.
    pub fn to_name(&self) -> Name {
        self.as_name().unwrap_or_else(|| Name::new(b""))
    }

    /// The bytes of the string held by the object, or an empty vector.
    pub fn to_string_bytes(&self) -> Vec<u8> {
        self.as_string()
            .map(|s| s.as_bytes().to_vec())
            .unwrap_or_default()
    }

    /// The decoded text of the string held by the object, or an empty string.
    ///
    /// Names are returned as their UTF-8 text.
    pub fn to_text(&self) -> String {
        match self.resolve() {
            Self::String(s) => s.to_text().to_string(),
            Self::Name(n) => String::from_utf8_lossy(n.as_bytes()).into_owned(),
            _ => String::new(),
        }
    }

    /// Cast the (resolved) object to a dictionary.
    pub fn as_dict(&self) -> Option<Dict> {
        match self.resolve() {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Cast the (resolved) object to an array.
    pub fn as_array(&self) -> Option<Array> {
        match self.resolve() {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Cast the (resolved) object to a name.
    pub fn as_name(&self) -> Option<Name> {
        match self.resolve() {
            Self::Name(n) => Some(n),
            _ => None,
        }
    }

    /// Cast the (resolved) object to a string.
    pub fn as_string(&self) -> Option<PdfString> {
        match self.resolve() {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Return the indirect reference held by the object, without resolving it.
    pub fn as_indirect(&self) -> Option<ObjRef> {
        match self {
            Self::Ref(r) => Some(r.clone()),
            _ => None,
        }
    }

    /// Like [`Object::to_int`], but fail if the object isn't a number.
    pub fn try_int(&self) -> Result<i64> {
        match self.resolve() {
            Self::Integer(i) => Ok(i),
            Self::Real(r) => Ok((r + 0.5).floor() as i64),
            _ => Err(ArgumentError::WrongKind.into()),
        }
    }

    /// The document the object belongs to, if any.
    pub fn document(&self) -> Option<Document> {
        self.binding().and_then(|b| b.doc())
    }

    /// The number of the nearest enclosing indirect object, or 0.
    pub fn parent_num(&self) -> i32 {
        match self {
            Self::Array(a) => a.parent_num(),
            Self::Dict(d) => d.parent_num(),
            _ => 0,
        }
    }

    /// Whether the container was structurally modified since it was last
    /// marked clean. Always `false` for other objects.
    pub fn is_dirty(&self) -> bool {
        self.flags().contains(ObjFlags::DIRTY)
    }

    /// Clear the dirty flag of a container, recursively.
    pub fn set_clean(&self) {
        let mut stack = vec![self.clone()];

        while let Some(obj) = stack.pop() {
            let was_dirty = obj.is_dirty();
            obj.update_flags(|f| f.remove(ObjFlags::DIRTY));

            if was_dirty {
                stack.extend(obj.children());
            }
        }
    }

    /// Set the mark bit of the (resolved) container.
    ///
    /// Returns whether the object was already marked. Objects that aren't
    /// containers can't be marked and always return `false`.
    pub fn mark(&self) -> bool {
        let resolved = self.resolve();
        let was_marked = resolved.is_marked();
        resolved.update_flags(|f| f.insert(ObjFlags::MARKED));

        was_marked
    }

    /// Clear the mark bit of the (resolved) container.
    pub fn unmark(&self) {
        self.resolve()
            .update_flags(|f| f.remove(ObjFlags::MARKED));
    }

    /// Whether the (resolved) container is marked.
    pub fn is_marked(&self) -> bool {
        self.resolve().flags().contains(ObjFlags::MARKED)
    }

    /// Create a copy of the object in which all direct arrays and dictionaries
    /// are duplicated.
    ///
    /// Strings and names are shared, since they are immutable. Indirect
    /// references are copied as references. The copy keeps the parent number
    /// and the document of the original.
    pub fn deep_copy(&self) -> Self {
        self.deep_copy_with(&|_| None)
    }

    /// Like [`Object::deep_copy`], but copy the contents of `recorded(c)`
    /// instead of those of `c` for every container `c` it returns a
    /// replacement for.
    pub(crate) fn deep_copy_with(&self, recorded: &dyn Fn(&Self) -> Option<Self>) -> Self {
        self.deep_copy_impl(&mut Vec::new(), recorded)
    }

    fn deep_copy_impl(
        &self,
        path: &mut Vec<*const ()>,
        recorded: &dyn Fn(&Self) -> Option<Self>,
    ) -> Self {
        let Some(ptr) = self.container_ptr() else {
            return self.clone();
        };

        if path.contains(&ptr) {
            lwarn!("cycle in direct objects while copying");

            return Self::Null;
        }

        path.push(ptr);

        let source = recorded(self).unwrap_or_else(|| self.clone());

        let copy = match &source {
            Self::Array(a) => {
                let (items, flags, parent_num, binding) = {
                    let repr = a.0.borrow();
                    (
                        repr.items.clone(),
                        repr.flags,
                        repr.parent_num,
                        repr.binding.clone(),
                    )
                };

                let items = items
                    .iter()
                    .map(|i| i.deep_copy_impl(path, recorded))
                    .collect();

                Self::Array(Array::from_parts(
                    items,
                    flags - ObjFlags::MARKED,
                    parent_num,
                    binding,
                ))
            }
            Self::Dict(d) => {
                let (entries, flags, parent_num, binding) = {
                    let repr = d.0.borrow();
                    (
                        repr.entries.clone(),
                        repr.flags,
                        repr.parent_num,
                        repr.binding.clone(),
                    )
                };

                let entries = entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_copy_impl(path, recorded)))
                    .collect();

                Self::Dict(Dict::from_parts(
                    entries,
                    flags - ObjFlags::MARKED,
                    parent_num,
                    binding,
                ))
            }
            _ => self.clone(),
        };

        path.pop();

        copy
    }

    /// Compare two objects. See [`compare::compare`].
    pub fn compare(&self, other: &Self) -> Ordering {
        compare::compare(self, other)
    }

    /// Compare two objects, including stream data. See [`compare::compare_deep`].
    pub fn compare_deep(&self, other: &Self) -> Ordering {
        compare::compare_deep(self, other)
    }

    pub(crate) fn flags(&self) -> ObjFlags {
        match self {
            Self::Array(a) => a.0.borrow().flags,
            Self::Dict(d) => d.0.borrow().flags,
            _ => ObjFlags::empty(),
        }
    }

    pub(crate) fn update_flags(&self, f: impl FnOnce(&mut ObjFlags)) {
        match self {
            Self::Array(a) => f(&mut a.0.borrow_mut().flags),
            Self::Dict(d) => f(&mut d.0.borrow_mut().flags),
            _ => {}
        }
    }

    pub(crate) fn binding(&self) -> Option<Binding> {
        match self {
            Self::Array(a) => Some(a.0.borrow().binding.clone()),
            Self::Dict(d) => Some(d.0.borrow().binding.clone()),
            Self::Ref(r) => Some(r.binding.clone()),
            _ => None,
        }
    }

    /// The direct children of a container.
    pub(crate) fn children(&self) -> Vec<Self> {
        match self {
            Self::Array(a) => a.0.borrow().items.clone(),
            Self::Dict(d) => d.0.borrow().entries.iter().map(|(_, v)| v.clone()).collect(),
            _ => vec![],
        }
    }

    /// Fail if the object belongs to a document other than `binding`.
    pub(crate) fn check_binding(&self, binding: &Binding) -> Result<()> {
        match self.binding() {
            Some(own) if own.is_bound() && binding.is_bound() && !own.same(binding) => {
                Err(ArgumentError::ForeignObject.into())
            }
            _ => Ok(()),
        }
    }

    /// Move the object into a container with the given parent number and
    /// document.
    ///
    /// The parent number and the binding are propagated into all directly
    /// nested arrays and dictionaries. Unbound indirect references take the
    /// binding of the container.
    pub(crate) fn adopt(&mut self, parent_num: i32, binding: &Binding) {
        let mut stack = match self {
            Self::Ref(r) => {
                if !r.binding.is_bound() {
                    r.binding = binding.clone();
                }

                return;
            }
            Self::Array(_) | Self::Dict(_) => vec![self.clone()],
            _ => return,
        };

        while let Some(obj) = stack.pop() {
            match obj {
                Self::Array(a) => {
                    let mut repr = a.0.borrow_mut();

                    if repr.is_adopted_by(parent_num, binding) {
                        continue;
                    }

                    repr.parent_num = parent_num;

                    if binding.is_bound() {
                        repr.binding = binding.clone();
                    }

                    for item in repr.items.iter_mut() {
                        adopt_child(item, binding, &mut stack);
                    }
                }
                Self::Dict(d) => {
                    let mut repr = d.0.borrow_mut();

                    if repr.is_adopted_by(parent_num, binding) {
                        continue;
                    }

                    repr.parent_num = parent_num;

                    if binding.is_bound() {
                        repr.binding = binding.clone();
                    }

                    for (_, value) in repr.entries.iter_mut() {
                        adopt_child(value, binding, &mut stack);
                    }
                }
                _ => {}
            }
        }
    }

    /// Whether `target` can be reached from this object through direct
    /// containment.
    #[cfg(feature = "cycle-checks")]
    pub(crate) fn reaches(&self, target: &Self) -> bool {
        use rustc_hash::FxHashSet;

        let Some(target) = target.container_ptr() else {
            return false;
        };

        let mut seen = FxHashSet::default();
        let mut stack = vec![self.clone()];

        while let Some(obj) = stack.pop() {
            let Some(ptr) = obj.container_ptr() else {
                continue;
            };

            if ptr == target {
                return true;
            }

            if seen.insert(ptr) {
                stack.extend(obj.children());
            }
        }

        false
    }

    /// Exchange the contents of two containers of the same kind, so that
    /// existing handles to either one observe the contents of the other.
    ///
    /// Returns `false` without doing anything if the objects aren't two arrays
    /// or two dictionaries.
    pub(crate) fn swap_contents(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => {
                if !a.ptr_eq(b) {
                    a.0.swap(&b.0);
                }

                true
            }
            (Self::Dict(a), Self::Dict(b)) => {
                if !a.ptr_eq(b) {
                    a.0.swap(&b.0);
                }

                true
            }
            _ => false,
        }
    }

    /// A new container with the same flags and the same item handles.
    pub(crate) fn shallow_copy(&self) -> Self {
        match self {
            Self::Array(a) => {
                let repr = a.0.borrow();

                Self::Array(Array::from_parts(
                    repr.items.clone(),
                    repr.flags - ObjFlags::MARKED,
                    repr.parent_num,
                    repr.binding.clone(),
                ))
            }
            Self::Dict(d) => {
                let repr = d.0.borrow();

                Self::Dict(Dict::from_parts(
                    repr.entries.clone(),
                    repr.flags - ObjFlags::MARKED,
                    repr.parent_num,
                    repr.binding.clone(),
                ))
            }
            _ => self.clone(),
        }
    }

    pub(crate) fn container_ptr(&self) -> Option<*const ()> {
        match self {
            Self::Array(a) => Some(std::rc::Rc::as_ptr(&a.0).cast()),
            Self::Dict(d) => Some(std::rc::Rc::as_ptr(&d.0).cast()),
            _ => None,
        }
    }
}

fn adopt_child(child: &mut Object, binding: &Binding, stack: &mut Vec<Object>) {
    match child {
        Object::Ref(r) if binding.is_bound() && !r.binding.is_bound() => {
            r.binding = binding.clone();
        }
        Object::Array(_) | Object::Dict(_) => stack.push(child.clone()),
        _ => {}
    }
}

/// The most items an array or dictionary may hold.
pub(crate) const MAX_LEN: usize = i32::MAX as usize;

/// Make room for one more item, growing the capacity by half.
pub(crate) fn reserve_one<T>(items: &mut Vec<T>, max_len: usize) -> Result<()> {
    if items.len() >= max_len {
        bail!(Error::Limit);
    }

    if items.len() == items.capacity() {
        let grown = (items.capacity() + items.capacity() / 2).max(items.len() + 1);
        items.try_reserve_exact(grown - items.len())?;
    }

    Ok(())
}

/// Validate that `value` may be stored in a container with the given binding.
pub(crate) fn check_insert(container: &Object, value: &Object, binding: &Binding) -> Result<()> {
    value.check_binding(binding)?;

    #[cfg(feature = "cycle-checks")]
    debug_assert!(
        !value.reaches(container),
        "inserting a container into itself"
    );

    #[cfg(not(feature = "cycle-checks"))]
    let _ = container;

    Ok(())
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Debug for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::String(s) => s.fmt(f),
            Self::Name(n) => n.fmt(f),
            Self::Array(a) => a.fmt(f),
            Self::Dict(d) => d.fmt(f),
            Self::Ref(r) => r.fmt(f),
        }
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Object {
    fn from(value: i32) -> Self {
        Self::Integer(value as i64)
    }
}

impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<Name> for Object {
    fn from(value: Name) -> Self {
        Self::Name(value)
    }
}

impl From<PdfString> for Object {
    fn from(value: PdfString) -> Self {
        Self::String(value)
    }
}

impl From<Array> for Object {
    fn from(value: Array) -> Self {
        Self::Array(value)
    }
}

impl From<Dict> for Object {
    fn from(value: Dict) -> Self {
        Self::Dict(value)
    }
}

impl From<ObjRef> for Object {
    fn from(value: ObjRef) -> Self {
        Self::Ref(value)
    }
}

impl From<&Self> for Object {
    fn from(value: &Self) -> Self {
        value.clone()
    }
}
