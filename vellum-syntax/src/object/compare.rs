//! Structural comparison of objects.

use crate::document::stream_backing;
use crate::object::{Array, Dict, Name, Object, ObjFlags};
use std::cmp::Ordering;

/// Compare two objects structurally.
///
/// Numbers compare by value, strings and names by their bytes, references by
/// object and generation number and arrays item by item. Dictionaries compare
/// as sets of entries. Two distinct dictionaries that back streams never
/// compare equal, since their data isn't looked at.
pub fn compare(a: &Object, b: &Object) -> Ordering {
    compare_impl(a, b, false)
}

/// Like [`compare`], but also compare the raw data of streams.
pub fn compare_deep(a: &Object, b: &Object) -> Ordering {
    compare_impl(a, b, true)
}

fn rank(obj: &Object) -> u8 {
    match obj {
        Object::Null => 0,
        Object::Boolean(_) => 1,
        Object::Integer(_) | Object::Real(_) => 2,
        Object::String(_) => 3,
        Object::Name(_) => 4,
        Object::Array(_) => 5,
        Object::Dict(_) => 6,
        Object::Ref(_) => 7,
    }
}

fn compare_impl(a: &Object, b: &Object, deep: bool) -> Ordering {
    match (a, b) {
        (Object::Null, Object::Null) => Ordering::Equal,
        (Object::Boolean(a), Object::Boolean(b)) => a.cmp(b),
        (Object::Integer(a), Object::Integer(b)) => a.cmp(b),
        (Object::Integer(_) | Object::Real(_), Object::Integer(_) | Object::Real(_)) => a
            .to_real()
            .partial_cmp(&b.to_real())
            .unwrap_or(Ordering::Equal),
        (Object::String(a), Object::String(b)) => a.as_bytes().cmp(b.as_bytes()),
        (Object::Name(a), Object::Name(b)) => a.as_bytes().cmp(b.as_bytes()),
        (Object::Ref(a), Object::Ref(b)) => (a.num, a.gen_num).cmp(&(b.num, b.gen_num)),
        (Object::Array(a), Object::Array(b)) => compare_arrays(a, b, deep),
        (Object::Dict(a), Object::Dict(b)) => compare_dicts(a, b, deep),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn compare_arrays(a: &Array, b: &Array, deep: bool) -> Ordering {
    if a.ptr_eq(b) {
        return Ordering::Equal;
    }

    let a = a.0.borrow().items.clone();
    let b = b.0.borrow().items.clone();

    a.iter()
        .zip(b.iter())
        .map(|(a, b)| compare_impl(a, b, deep))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

fn sorted_entries(dict: &Dict) -> Vec<(Name, Object)> {
    let repr = dict.0.borrow();
    let mut entries = repr.entries.clone();

    if !repr.flags.contains(ObjFlags::SORTED) {
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    }

    entries
}

fn compare_dicts(a: &Dict, b: &Dict, deep: bool) -> Ordering {
    if a.ptr_eq(b) {
        return Ordering::Equal;
    }

    let streams = (stream_backing(a), stream_backing(b));

    if let (Some((_, a_num)), Some((_, b_num))) = &streams
        && !deep
    {
        // Distinct streams are never equal without looking at their data.
        return a_num.cmp(b_num).then(Ordering::Less);
    }

    let a_entries = sorted_entries(a);
    let b_entries = sorted_entries(b);

    let entries = a_entries
        .iter()
        .zip(b_entries.iter())
        .map(|((ak, av), (bk, bv))| ak.cmp(bk).then_with(|| compare_impl(av, bv, deep)))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a_entries.len().cmp(&b_entries.len()));

    if entries.is_ne() {
        return entries;
    }

    match streams {
        (Some((a_doc, a_num)), Some((b_doc, b_num))) => {
            let a_data = a_doc.load_raw_stream(a_num).unwrap_or_default();
            let b_data = b_doc.load_raw_stream(b_num).unwrap_or_default();

            a_data.cmp(&b_data)
        }
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        compare_arrays(self, other, false).is_eq()
    }
}

impl PartialEq for Dict {
    fn eq(&self, other: &Self) -> bool {
        compare_dicts(self, other, false).is_eq()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{ObjRef, PdfString, names};

    #[test]
    fn numbers() {
        assert_eq!(compare(&Object::Integer(1), &Object::Real(1.0)), Ordering::Equal);
        assert_eq!(compare(&Object::Integer(1), &Object::Real(1.5)), Ordering::Less);
        assert_eq!(compare(&Object::Integer(3), &Object::Integer(2)), Ordering::Greater);
    }

    #[test]
    fn strings_order_prefix_first() {
        let a = Object::from(PdfString::new(b"ab".to_vec()));
        let b = Object::from(PdfString::new(b"abc".to_vec()));
        assert_eq!(compare(&a, &b), Ordering::Less);
        assert_eq!(compare(&b, &a), Ordering::Greater);
    }

    #[test]
    fn references() {
        let a = Object::from(ObjRef::new(1, 0));
        let b = Object::from(ObjRef::new(1, 1));
        assert_eq!(compare(&a, &b), Ordering::Less);
        assert_eq!(compare(&a, &Object::from(ObjRef::new(1, 0))), Ordering::Equal);
    }

    #[test]
    fn dicts_compare_as_sets() {
        let a = Dict::new();
        a.put(names::TYPE, names::PAGE).unwrap();
        a.put("A", 1).unwrap();

        let b = Dict::new();
        b.put("A", 1).unwrap();
        b.put(names::TYPE, names::PAGE).unwrap();

        assert_eq!(a, b);

        b.sort().unwrap();
        assert_eq!(a, b);

        b.put("A", 2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn arrays_pairwise() {
        let a: Array = [1, 2].into_iter().collect();
        let b: Array = [1, 2, 3].into_iter().collect();
        assert_eq!(compare(&a.clone().into(), &b.clone().into()), Ordering::Less);
        b.delete(2).unwrap();
        assert_eq!(a, b);
    }
}
