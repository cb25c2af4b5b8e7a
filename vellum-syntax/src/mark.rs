//! Guards against cycles while walking the object graph.
//!
//! Three mechanisms are available:
//! - The mark bit of arrays and dictionaries, usually set through a
//!   [`MarkGuard`]. It is global per object.
//! - [`MarkList`] and [`CycleList`], which track the object numbers on the
//!   current path without touching the objects themselves.
//! - [`MarkBits`], a dense set of object numbers for whole-document walks.

use crate::error::{FormatError, Result};
use crate::object::Object;
use smallvec::SmallVec;

/// Sets the mark bit of a container for as long as the guard is alive.
pub struct MarkGuard {
    obj: Object,
}

impl MarkGuard {
    /// Mark the (resolved) object.
    ///
    /// Returns `None` if the object was already marked, meaning that the walk
    /// reached it a second time.
    pub fn new(obj: &Object) -> Option<Self> {
        let obj = obj.resolve();

        if obj.mark() {
            return None;
        }

        Some(Self { obj })
    }
}

impl Drop for MarkGuard {
    fn drop(&mut self) {
        self.obj.unmark();
    }
}

/// A stack of the object numbers on the current path of a walk.
#[derive(Debug, Default, Clone)]
pub struct MarkList {
    nums: SmallVec<[i32; 8]>,
}

impl MarkList {
    /// Create a new, empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the object number of an indirect reference.
    ///
    /// Returns whether the number was already on the list, in which case it
    /// isn't pushed again. Direct objects have no number and are never found.
    pub fn push(&mut self, obj: &Object) -> bool {
        self.push_num(obj.to_object_number())
    }

    /// Like [`MarkList::push`], with an object number.
    pub fn push_num(&mut self, num: i32) -> bool {
        if num > 0 && self.nums.contains(&num) {
            return true;
        }

        self.nums.push(num);

        false
    }

    /// Pop the last pushed number.
    pub fn pop(&mut self) -> Option<i32> {
        self.nums.pop()
    }

    /// The length of the current path.
    pub fn len(&self) -> usize {
        self.nums.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.nums.is_empty()
    }
}

/// A path of object numbers threaded through the call stack of a recursive
/// walk.
///
/// Each level of the recursion creates a new link pointing to the link of
/// its caller.
#[derive(Debug, Clone, Copy)]
pub struct CycleList<'a> {
    up: Option<&'a CycleList<'a>>,
    num: i32,
}

impl<'a> CycleList<'a> {
    /// Enter `obj` from the level `up`.
    ///
    /// Fails if the object number of `obj` is already on the path.
    pub fn enter(up: Option<&'a CycleList<'a>>, obj: &Object) -> Result<Self> {
        let num = obj.to_object_number();

        if num > 0 && up.is_some_and(|up| up.contains(num)) {
            return Err(FormatError::Cycle.into());
        }

        Ok(Self { up, num })
    }

    /// Whether `num` is on the path ending at this link.
    pub fn contains(&self, num: i32) -> bool {
        let mut link = Some(self);

        while let Some(current) = link {
            if current.num == num {
                return true;
            }

            link = current.up;
        }

        false
    }
}

/// A dense set of object numbers.
#[derive(Debug, Clone)]
pub struct MarkBits {
    bits: Vec<u64>,
}

impl MarkBits {
    /// Create a set able to hold the numbers below `len` without growing.
    pub fn new(len: usize) -> Self {
        Self {
            bits: vec![0; len.div_ceil(64)],
        }
    }

    /// Add `num` to the set, returning whether it was already present.
    ///
    /// Numbers below 1 are never stored.
    pub fn mark(&mut self, num: i32) -> bool {
        if num <= 0 {
            return false;
        }

        let (word, bit) = (num as usize / 64, num as usize % 64);

        if word >= self.bits.len() {
            self.bits.resize(word + 1, 0);
        }

        let was_marked = self.bits[word] & (1 << bit) != 0;
        self.bits[word] |= 1 << bit;

        was_marked
    }

    /// Whether `num` is in the set.
    pub fn is_marked(&self, num: i32) -> bool {
        if num <= 0 {
            return false;
        }

        self.bits
            .get(num as usize / 64)
            .is_some_and(|word| word & (1 << (num as usize % 64)) != 0)
    }

    /// Clear the set.
    pub fn reset(&mut self) {
        self.bits.fill(0);
    }
}
