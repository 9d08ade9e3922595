//! Iterators over an `OrderedStringMap` in insertion order.

use crate::links::Link;
use crate::map::{Bucket, OrderedStringMap};
use core::iter::FusedIterator;

/// Borrowing iterator following the order links from both ends.
///
/// `remaining` keeps the front and back walks from crossing.
pub struct Iter<'a, V> {
    buckets: &'a [Option<Bucket<V>>],
    links: &'a [Link],
    front: Option<usize>,
    back: Option<usize>,
    remaining: usize,
}

impl<'a, V> Iter<'a, V> {
    pub(crate) fn new(
        buckets: &'a [Option<Bucket<V>>],
        links: &'a [Link],
        front: Option<usize>,
        back: Option<usize>,
        remaining: usize,
    ) -> Self {
        Self {
            buckets,
            links,
            front,
            back,
            remaining,
        }
    }

    fn entry(&self, pos: usize) -> Option<(&'a str, &'a V)> {
        let buckets: &'a [Option<Bucket<V>>] = self.buckets;
        buckets[pos].as_ref().map(|b| (b.key.as_str(), &b.value))
    }
}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let pos = self.front?;
        self.front = self.links[pos].next();
        self.remaining -= 1;
        self.entry(pos)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> DoubleEndedIterator for Iter<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let pos = self.back?;
        self.back = self.links[pos].prev();
        self.remaining -= 1;
        self.entry(pos)
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}
impl<V> FusedIterator for Iter<'_, V> {}

/// Mutable iterator; the order is resolved up front into a list of disjoint
/// borrows.
pub struct IterMut<'a, V> {
    inner: std::vec::IntoIter<(&'a str, &'a mut V)>,
}

impl<'a, V> IterMut<'a, V> {
    pub(crate) fn new(ordered: Vec<(&'a str, &'a mut V)>) -> Self {
        Self {
            inner: ordered.into_iter(),
        }
    }
}

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = (&'a str, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> DoubleEndedIterator for IterMut<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<V> ExactSizeIterator for IterMut<'_, V> {}
impl<V> FusedIterator for IterMut<'_, V> {}

/// Owning iterator; yields `(String, V)` in insertion order.
pub struct IntoIter<V> {
    buckets: Vec<Option<Bucket<V>>>,
    links: Vec<Link>,
    front: Option<usize>,
    back: Option<usize>,
    remaining: usize,
}

impl<V> Iterator for IntoIter<V> {
    type Item = (String, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let pos = self.front?;
        self.front = self.links[pos].next();
        self.remaining -= 1;
        self.buckets[pos].take().map(|b| (b.key, b.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> DoubleEndedIterator for IntoIter<V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let pos = self.back?;
        self.back = self.links[pos].prev();
        self.remaining -= 1;
        self.buckets[pos].take().map(|b| (b.key, b.value))
    }
}

impl<V> ExactSizeIterator for IntoIter<V> {}
impl<V> FusedIterator for IntoIter<V> {}

impl<V, S> IntoIterator for OrderedStringMap<V, S> {
    type Item = (String, V);
    type IntoIter = IntoIter<V>;

    fn into_iter(self) -> IntoIter<V> {
        IntoIter {
            front: self.head,
            back: self.tail,
            remaining: self.size,
            buckets: self.buckets,
            links: self.links,
        }
    }
}

impl<'a, V, S> IntoIterator for &'a OrderedStringMap<V, S> {
    type Item = (&'a str, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Iter<'a, V> {
        self.iter()
    }
}

impl<'a, V, S> IntoIterator for &'a mut OrderedStringMap<V, S> {
    type Item = (&'a str, &'a mut V);
    type IntoIter = IterMut<'a, V>;

    fn into_iter(self) -> IterMut<'a, V> {
        self.iter_mut()
    }
}

/// Keys in insertion order.
#[derive(Clone)]
pub struct Keys<'a, V> {
    inner: Iter<'a, V>,
}

impl<'a, V> Keys<'a, V> {
    pub(crate) fn new(inner: Iter<'a, V>) -> Self {
        Self { inner }
    }
}

impl<'a, V> Iterator for Keys<'a, V> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> DoubleEndedIterator for Keys<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<V> ExactSizeIterator for Keys<'_, V> {}
impl<V> FusedIterator for Keys<'_, V> {}

/// Values in insertion order.
#[derive(Clone)]
pub struct Values<'a, V> {
    inner: Iter<'a, V>,
}

impl<'a, V> Values<'a, V> {
    pub(crate) fn new(inner: Iter<'a, V>) -> Self {
        Self { inner }
    }
}

impl<'a, V> Iterator for Values<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> DoubleEndedIterator for Values<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<V> ExactSizeIterator for Values<'_, V> {}
impl<V> FusedIterator for Values<'_, V> {}

pub struct ValuesMut<'a, V> {
    inner: IterMut<'a, V>,
}

impl<'a, V> ValuesMut<'a, V> {
    pub(crate) fn new(inner: IterMut<'a, V>) -> Self {
        Self { inner }
    }
}

impl<'a, V> Iterator for ValuesMut<'a, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> DoubleEndedIterator for ValuesMut<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<V> ExactSizeIterator for ValuesMut<'_, V> {}
impl<V> FusedIterator for ValuesMut<'_, V> {}

#[cfg(test)]
mod tests {
    use crate::OrderedStringMap;

    fn sample() -> OrderedStringMap<i32> {
        [("one", 1), ("two", 2), ("three", 3), ("four", 4)]
            .into_iter()
            .collect()
    }

    #[test]
    fn double_ended_walks_meet_once() {
        let m = sample();
        let mut it = m.iter();
        assert_eq!(it.len(), 4);
        assert_eq!(it.next(), Some(("one", &1)));
        assert_eq!(it.next_back(), Some(("four", &4)));
        assert_eq!(it.next_back(), Some(("three", &3)));
        assert_eq!(it.next(), Some(("two", &2)));
        assert_eq!(it.next(), None);
        assert_eq!(it.next_back(), None);
    }

    #[test]
    fn iter_mut_edits_in_order() {
        let mut m = sample();
        for (i, (_, v)) in m.iter_mut().enumerate() {
            *v += 10 * i as i32;
        }
        assert_eq!(m.values().copied().collect::<Vec<_>>(), vec![1, 12, 23, 34]);
        for v in m.values_mut().rev().take(1) {
            *v = 0;
        }
        assert_eq!(m.get("four"), Some(&0));
    }

    #[test]
    fn owning_iter_yields_keys_in_order() {
        let mut m = sample();
        m.remove("two");
        m.put("two", 22);
        let items: Vec<(String, i32)> = m.into_iter().collect();
        assert_eq!(
            items,
            vec![
                ("one".to_string(), 1),
                ("three".to_string(), 3),
                ("four".to_string(), 4),
                ("two".to_string(), 22),
            ]
        );
    }

    #[test]
    fn keys_reverse() {
        let m = sample();
        assert_eq!(m.keys().rev().collect::<Vec<_>>(), vec!["four", "three", "two", "one"]);
        let by_ref: Vec<&str> = (&m).into_iter().map(|(k, _)| k).collect();
        assert_eq!(by_ref, vec!["one", "two", "three", "four"]);
    }
}
