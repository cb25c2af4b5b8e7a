//! Recorded states of the containers of an object.
//!
//! A snapshot pairs every array and dictionary that is reachable from an
//! object through direct links with a detached container holding a shallow
//! copy of its contents. The copies keep the handles of nested containers, so
//! exchanging the contents of every pair restores the whole tree in place and
//! all handles into it stay attached.

use crate::object::Object;
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Default)]
pub(crate) struct Snapshot {
    /// Live containers and the holders of their recorded contents.
    pairs: Vec<(Object, Object)>,
}

impl Snapshot {
    pub(crate) fn capture(root: &Object) -> Self {
        let mut pairs = vec![];
        let mut seen = FxHashSet::default();
        let mut stack = vec![root.clone()];

        while let Some(obj) = stack.pop() {
            let Some(ptr) = obj.container_ptr() else {
                continue;
            };

            if !seen.insert(ptr) {
                continue;
            }

            stack.extend(obj.children());
            let holder = obj.shallow_copy();
            pairs.push((obj, holder));
        }

        Self { pairs }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Exchange the recorded and the live contents of all containers.
    pub(crate) fn swap(&mut self) {
        for (live, holder) in &self.pairs {
            live.swap_contents(holder);
        }
    }

    /// A detached copy of `obj` in the recorded state.
    pub(crate) fn materialize(&self, obj: &Object) -> Object {
        if self.pairs.is_empty() {
            return obj.deep_copy();
        }

        let holders = self
            .pairs
            .iter()
            .filter_map(|(live, holder)| Some((live.container_ptr()?, holder)))
            .collect::<FxHashMap<_, _>>();

        obj.deep_copy_with(&|c| {
            c.container_ptr()
                .and_then(|ptr| holders.get(&ptr))
                .map(|h| (*h).clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Array, Dict};

    #[test]
    fn nested_containers_are_restored_in_place() {
        let inner: Array = [1, 2].into_iter().collect();
        let outer = Dict::new();
        outer.put("Inner", inner.clone()).unwrap();

        let root = Object::from(outer.clone());
        let mut snapshot = Snapshot::capture(&root);

        inner.push(3).unwrap();
        outer.put("Other", true).unwrap();

        let recorded = snapshot.materialize(&root);
        assert_eq!(recorded.as_dict().unwrap().len(), 1);
        assert_eq!(recorded.as_dict().unwrap().get_array("Inner").unwrap().len(), 2);

        snapshot.swap();
        assert_eq!(inner.len(), 2);
        assert!(!outer.contains_key("Other"));
        assert!(outer.get_array("Inner").unwrap().ptr_eq(&inner));

        snapshot.swap();
        assert_eq!(inner.len(), 3);
        assert_eq!(outer.get_bool("Other"), Some(true));
    }

    #[test]
    fn shared_containers_are_recorded_once() {
        let shared = Array::new();
        let outer = Array::new();
        outer.push(shared.clone()).unwrap();
        outer.push(shared.clone()).unwrap();

        let snapshot = Snapshot::capture(&Object::from(outer));
        assert_eq!(snapshot.pairs.len(), 2);
    }
}
