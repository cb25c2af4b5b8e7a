//! Indirect references.

use crate::document::{Binding, Document};
use crate::object::Object;
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};

/// A reference to an indirect object.
///
/// References never keep the referenced object, nor the document they belong
/// to, alive.
#[derive(Clone)]
pub struct ObjRef {
    pub(crate) num: i32,
    pub(crate) gen_num: i32,
    pub(crate) binding: Binding,
}

impl ObjRef {
    /// Create a new reference that isn't bound to any document yet.
    ///
    /// The reference is bound as soon as it's stored in a container of a
    /// document.
    pub fn new(num: i32, gen_num: i32) -> Self {
        Self {
            num,
            gen_num,
            binding: Binding::default(),
        }
    }

    pub(crate) fn bound(num: i32, gen_num: i32, binding: Binding) -> Self {
        Self {
            num,
            gen_num,
            binding,
        }
    }

    /// The object number.
    pub fn num(&self) -> i32 {
        self.num
    }

    /// The generation number.
    pub fn gen_num(&self) -> i32 {
        self.gen_num
    }

    /// The document the reference belongs to.
    pub fn document(&self) -> Option<Document> {
        self.binding.doc()
    }

    /// Resolve the reference.
    pub fn resolve(&self) -> Object {
        Object::Ref(self.clone()).resolve()
    }
}

impl PartialEq for ObjRef {
    fn eq(&self, other: &Self) -> bool {
        self.num == other.num && self.gen_num == other.gen_num
    }
}

impl Eq for ObjRef {}

impl Hash for ObjRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.num.hash(state);
        self.gen_num.hash(state);
    }
}

impl Debug for ObjRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.num, self.gen_num)
    }
}
