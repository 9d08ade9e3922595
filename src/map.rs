//! OrderedStringMap: open-addressing table threaded by an insertion-order list.
//!
//! Slots live in a power-of-two `Vec`; collisions resolve by linear probing and
//! removals close gaps by backward shifting, so the table never holds
//! tombstones. A parallel `Vec<Link>` records each occupied slot's predecessor
//! and successor in insertion order. Whenever an entry changes physical slot
//! (rehash or backward shift) its neighbours are retargeted to the new index.

use crate::cursor::CursorMut;
use crate::error::{Error, Result};
use crate::iter::{Iter, IterMut, Keys, Values, ValuesMut};
use crate::links::Link;
use core::fmt;
use core::hash::BuildHasher;
use core::mem;
use core::ops::Index;
use hashbrown::hash_map::DefaultHashBuilder;

/// Table length of a freshly created map; also the floor for shrinking.
pub const DEFAULT_CAPACITY: usize = 16;
/// Fraction of the table that may be occupied before it doubles.
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;
const MAX_CAPACITY: usize = 1 << 30;

#[derive(Clone, Debug)]
pub(crate) struct Bucket<V> {
    pub(crate) key: String,
    pub(crate) value: V,
}

/// Spreads the hasher output so that the low bits used for slot selection
/// depend on the whole hash.
#[inline]
fn mix(raw: u64) -> usize {
    let h = raw.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    (h ^ (h >> 32)) as usize
}

// Always leaves at least one free slot so probes terminate.
fn threshold_for(cap: usize, load_factor: f32) -> usize {
    ((cap as f64 * load_factor as f64) as usize).clamp(1, cap - 1)
}

fn table_size_for(entries: usize, load_factor: f32) -> usize {
    let wanted = (entries as f64 / load_factor as f64).ceil() as usize;
    let cap = wanted.max(DEFAULT_CAPACITY).next_power_of_two();
    assert!(cap <= MAX_CAPACITY, "capacity overflow");
    cap
}

fn empty_buckets<V>(cap: usize) -> Vec<Option<Bucket<V>>> {
    let mut v = Vec::with_capacity(cap);
    v.resize_with(cap, || None);
    v
}

/// A stable reference to an occupied slot.
///
/// A handle stays meaningful only while its slot holds the entry it was
/// obtained for. Removing that entry (or any removal that shifts it, or a
/// rehash) invalidates the handle; a stale handle resolves to `None` or to
/// whichever entry now occupies the slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct EntryHandle(usize);

impl EntryHandle {
    pub fn key<'a, V, S>(&self, map: &'a OrderedStringMap<V, S>) -> Option<&'a str> {
        map.entry_at(self.0).map(|(k, _)| k)
    }

    pub fn value<'a, V, S>(&self, map: &'a OrderedStringMap<V, S>) -> Option<&'a V> {
        map.entry_at(self.0).map(|(_, v)| v)
    }

    pub fn value_mut<'a, V, S>(&self, map: &'a mut OrderedStringMap<V, S>) -> Option<&'a mut V> {
        map.entry_mut_at(self.0).map(|(_, v)| v)
    }

    /// Replaces the value in place and returns the old one. Returns `None`,
    /// dropping `value`, if the slot is empty.
    pub fn set_value<V, S>(&self, map: &mut OrderedStringMap<V, S>, value: V) -> Option<V> {
        self.value_mut(map).map(|slot| mem::replace(slot, value))
    }
}

/// An insertion-ordered map from `String` keys to `V`.
///
/// Iteration visits entries in the order their keys were first inserted;
/// overwriting an existing key keeps its position, while removing and
/// re-inserting moves it to the end.
///
/// The map owns its values outright, so it can never contain itself:
///
/// ```compile_fail
/// use linked_strmap::{DataMap, Value};
///
/// let mut m = DataMap::new();
/// m.put("x", Value::Map(m));
/// ```
#[derive(Clone)]
pub struct OrderedStringMap<V, S = DefaultHashBuilder> {
    pub(crate) buckets: Vec<Option<Bucket<V>>>,
    pub(crate) links: Vec<Link>,
    pub(crate) head: Option<usize>,
    pub(crate) tail: Option<usize>,
    pub(crate) size: usize,
    threshold: usize,
    load_factor: f32,
    hasher: S,
}

impl<V> OrderedStringMap<V> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    /// Creates a map whose table can take `n` entries without growing.
    pub fn with_capacity(n: usize) -> Self {
        Self::with_capacity_and_hasher(n, Default::default())
    }
}

impl<V, S: Default> Default for OrderedStringMap<V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<V, S> OrderedStringMap<V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(0, hasher)
    }

    pub fn with_capacity_and_hasher(n: usize, hasher: S) -> Self {
        Self::build(table_size_for(n, DEFAULT_LOAD_FACTOR), DEFAULT_LOAD_FACTOR, hasher)
    }

    /// Creates a map with an explicit load factor, which must lie strictly
    /// between 0 and 1.
    pub fn with_options(n: usize, load_factor: f32, hasher: S) -> Result<Self> {
        if !(load_factor > 0.0 && load_factor < 1.0) {
            return Err(Error::InvalidArgument(format!(
                "load factor {load_factor} is not in (0, 1)"
            )));
        }
        Ok(Self::build(table_size_for(n, load_factor), load_factor, hasher))
    }

    fn build(cap: usize, load_factor: f32, hasher: S) -> Self {
        Self {
            buckets: empty_buckets(cap),
            links: vec![Link::DETACHED; cap],
            head: None,
            tail: None,
            size: 0,
            threshold: threshold_for(cap, load_factor),
            load_factor,
            hasher,
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Current table length (always a power of two).
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    #[inline]
    fn mask(&self) -> usize {
        self.buckets.len() - 1
    }

    pub(crate) fn entry_at(&self, pos: usize) -> Option<(&str, &V)> {
        self.buckets
            .get(pos)?
            .as_ref()
            .map(|b| (b.key.as_str(), &b.value))
    }

    pub(crate) fn entry_mut_at(&mut self, pos: usize) -> Option<(&str, &mut V)> {
        self.buckets
            .get_mut(pos)?
            .as_mut()
            .map(|b| (b.key.as_str(), &mut b.value))
    }

    /// First entry in iteration order.
    pub fn first(&self) -> Option<(&str, &V)> {
        self.entry_at(self.head?)
    }

    /// Last entry in iteration order.
    pub fn last(&self) -> Option<(&str, &V)> {
        self.entry_at(self.tail?)
    }

    // Walks from whichever end of the order list is closer.
    fn slot_at(&self, index: usize) -> Result<usize> {
        let out_of_range = || Error::IndexOutOfRange {
            index,
            len: self.size,
        };
        if index >= self.size {
            return Err(out_of_range());
        }
        let pos = if index < self.size / 2 {
            (0..index).fold(self.head, |p, _| p.and_then(|p| self.links[p].next()))
        } else {
            (index + 1..self.size).fold(self.tail, |p, _| p.and_then(|p| self.links[p].prev()))
        };
        pos.ok_or_else(out_of_range)
    }

    /// Returns the entry at position `index` in iteration order. O(n).
    pub fn get_index(&self, index: usize) -> Result<(&str, &V)> {
        let pos = self.slot_at(index)?;
        self.entry_at(pos).ok_or(Error::IndexOutOfRange {
            index,
            len: self.size,
        })
    }

    pub fn get_index_mut(&mut self, index: usize) -> Result<(&str, &mut V)> {
        let pos = self.slot_at(index)?;
        let len = self.size;
        self.entry_mut_at(pos)
            .ok_or(Error::IndexOutOfRange { index, len })
    }

    /// Removes every entry, keeping the current table length.
    pub fn clear(&mut self) {
        if self.size == 0 {
            return;
        }
        self.buckets.iter_mut().for_each(|b| *b = None);
        self.links.iter_mut().for_each(|l| *l = Link::DETACHED);
        self.head = None;
        self.tail = None;
        self.size = 0;
    }

    pub fn iter(&self) -> Iter<'_, V> {
        Iter::new(&self.buckets, &self.links, self.head, self.tail, self.size)
    }

    /// Mutable iteration in insertion order.
    ///
    /// Collects the `len()` borrows up front, so each call allocates; use
    /// [`cursor_mut`](Self::cursor_mut) to walk without allocating.
    pub fn iter_mut(&mut self) -> IterMut<'_, V> {
        let mut by_slot: Vec<Option<&mut Bucket<V>>> =
            self.buckets.iter_mut().map(Option::as_mut).collect();
        let mut ordered = Vec::with_capacity(self.size);
        let mut cursor = self.head;
        while let Some(pos) = cursor {
            cursor = self.links[pos].next();
            if let Some(Bucket { key, value }) = by_slot[pos].take() {
                ordered.push((key.as_str(), value));
            }
        }
        IterMut::new(ordered)
    }

    pub fn keys(&self) -> Keys<'_, V> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'_, V> {
        Values::new(self.iter())
    }

    /// Built on [`iter_mut`](Self::iter_mut) and allocates the same way.
    pub fn values_mut(&mut self) -> ValuesMut<'_, V> {
        ValuesMut::new(self.iter_mut())
    }

    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.values().any(|v| v == value)
    }
}

impl<V, S: BuildHasher> OrderedStringMap<V, S> {
    #[inline]
    fn ideal_slot(&self, key: &str) -> usize {
        mix(self.hasher.hash_one(key)) & self.mask()
    }

    /// Probes for `key`: `Ok(slot)` if present, otherwise `Err(free_slot)`
    /// where it would be inserted.
    fn find(&self, key: &str) -> core::result::Result<usize, usize> {
        let mask = self.mask();
        let mut pos = self.ideal_slot(key);
        loop {
            match &self.buckets[pos] {
                None => return Err(pos),
                Some(b) if b.key == key => return Ok(pos),
                Some(_) => pos = (pos + 1) & mask,
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        let pos = self.find(key).ok()?;
        self.entry_at(pos).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let pos = self.find(key).ok()?;
        self.entry_mut_at(pos).map(|(_, v)| v)
    }

    pub fn get_key_value(&self, key: &str) -> Option<(&str, &V)> {
        let pos = self.find(key).ok()?;
        self.entry_at(pos)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.find(key).is_ok()
    }

    /// Returns a handle to the slot currently holding `key`.
    pub fn handle(&self, key: &str) -> Option<EntryHandle> {
        self.find(key).ok().map(EntryHandle)
    }

    /// Associates `value` with `key`, returning the previous value.
    ///
    /// An existing key is overwritten in place and keeps its position; a new
    /// key is appended to the end of the iteration order.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<V>) -> Option<V> {
        let key = key.into();
        match self.find(&key) {
            Ok(pos) => self.buckets[pos]
                .as_mut()
                .map(|b| mem::replace(&mut b.value, value.into())),
            Err(pos) => {
                self.insert_at(pos, key, value.into());
                None
            }
        }
    }

    /// Returns the value for `key`, inserting `default()` at the end of the
    /// order first if the key is absent.
    pub fn get_or_insert_with(&mut self, key: impl Into<String>, default: impl FnOnce() -> V) -> &mut V {
        let key = key.into();
        let pos = match self.find(&key) {
            Ok(pos) => pos,
            Err(pos) => {
                self.insert_at(pos, key, default());
                // A new entry is always the tail, even if the insert rehashed.
                self.tail.unwrap_or(pos)
            }
        };
        match self.entry_mut_at(pos) {
            Some((_, v)) => v,
            None => unreachable!("slot {pos} was just located or filled"),
        }
    }

    fn insert_at(&mut self, pos: usize, key: String, value: V) {
        self.buckets[pos] = Some(Bucket { key, value });
        self.links[pos] = Link::new(self.tail, None);
        match self.tail {
            Some(t) => self.links[t].set_next(Some(pos)),
            None => self.head = Some(pos),
        }
        self.tail = Some(pos);
        self.size += 1;
        if self.size > self.threshold {
            let cap = self.capacity();
            assert!(cap < MAX_CAPACITY, "capacity overflow");
            self.rehash(cap << 1);
        }
    }

    /// Moves every entry into a fresh table of length `cap`, re-inserting in
    /// iteration order so that the new links are built front to back.
    fn rehash(&mut self, cap: usize) {
        log::trace!("rehash: {} -> {} slots ({} entries)", self.capacity(), cap, self.size);
        let mut old = mem::replace(&mut self.buckets, empty_buckets(cap));
        let old_links = mem::replace(&mut self.links, vec![Link::DETACHED; cap]);
        let mask = cap - 1;

        let mut cursor = self.head;
        let mut prev: Option<usize> = None;
        self.head = None;
        while let Some(i) = cursor {
            cursor = old_links[i].next();
            let Some(bucket) = old[i].take() else {
                break;
            };
            let mut pos = self.ideal_slot(&bucket.key);
            while self.buckets[pos].is_some() {
                pos = (pos + 1) & mask;
            }
            self.buckets[pos] = Some(bucket);
            self.links[pos] = Link::new(prev, None);
            match prev {
                Some(p) => self.links[p].set_next(Some(pos)),
                None => self.head = Some(pos),
            }
            prev = Some(pos);
        }
        self.tail = prev;
        self.threshold = threshold_for(cap, self.load_factor);
    }

    /// Grows the table, if needed, so that `additional` more entries fit
    /// without a rehash.
    pub fn reserve(&mut self, additional: usize) {
        let cap = table_size_for(self.size.saturating_add(additional), self.load_factor);
        if cap > self.capacity() {
            self.rehash(cap);
        }
    }

    /// Shrinks the table to the smallest length that holds the current entries.
    pub fn shrink_to_fit(&mut self) {
        let cap = table_size_for(self.size, self.load_factor);
        if cap < self.capacity() {
            self.rehash(cap);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry(&mut self, key: &str) -> Option<(String, V)> {
        let pos = self.find(key).ok()?;
        self.remove_at(pos)
    }

    /// Removes the first entry in iteration order.
    pub fn remove_first(&mut self) -> Result<(String, V)> {
        let pos = self.head.ok_or(Error::NoSuchElement)?;
        self.remove_at(pos).ok_or(Error::NoSuchElement)
    }

    /// Removes the last entry in iteration order.
    pub fn remove_last(&mut self) -> Result<(String, V)> {
        let pos = self.tail.ok_or(Error::NoSuchElement)?;
        self.remove_at(pos).ok_or(Error::NoSuchElement)
    }

    pub(crate) fn remove_at(&mut self, pos: usize) -> Option<(String, V)> {
        let removed = self.detach(pos, |_, _| {});
        self.shrink_if_sparse();
        removed
    }

    /// Empties `pos`, unlinks it and closes the gap. `on_move(from, to)` is
    /// called for every entry the backward shift relocates.
    pub(crate) fn detach(
        &mut self,
        pos: usize,
        on_move: impl FnMut(usize, usize),
    ) -> Option<(String, V)> {
        let bucket = self.buckets[pos].take()?;
        self.unlink(pos);
        self.size -= 1;
        self.shift_back(pos, on_move);
        Some((bucket.key, bucket.value))
    }

    /// Halves the table until `len()` is at least a quarter of the
    /// threshold or the default capacity is reached, then rehashes once.
    pub(crate) fn shrink_if_sparse(&mut self) {
        let mut cap = self.capacity();
        while cap > DEFAULT_CAPACITY && self.size < threshold_for(cap, self.load_factor) / 4 {
            cap /= 2;
        }
        if cap != self.capacity() {
            self.rehash(cap);
        }
    }

    fn unlink(&mut self, pos: usize) {
        let link = self.links[pos];
        match link.prev() {
            Some(p) => self.links[p].set_next(link.next()),
            None => self.head = link.next(),
        }
        match link.next() {
            Some(n) => self.links[n].set_prev(link.prev()),
            None => self.tail = link.prev(),
        }
        self.links[pos] = Link::DETACHED;
    }

    // The entry keeps its place in the order; only its neighbours' pointers
    // (or head/tail) change to name the new slot.
    fn relocate_link(&mut self, from: usize, to: usize) {
        let link = self.links[from];
        match link.prev() {
            Some(p) => self.links[p].set_next(Some(to)),
            None => self.head = Some(to),
        }
        match link.next() {
            Some(n) => self.links[n].set_prev(Some(to)),
            None => self.tail = Some(to),
        }
        self.links[to] = link;
        self.links[from] = Link::DETACHED;
    }

    /// Backward-shift deletion starting from the empty slot `gap`.
    ///
    /// Scans the probe run after the gap; the first entry whose ideal slot
    /// does not lie cyclically in `(gap, pos]` would become unreachable, so it
    /// moves into the gap and its old slot becomes the new gap. Stops at the
    /// first empty slot.
    fn shift_back(&mut self, mut gap: usize, mut on_move: impl FnMut(usize, usize)) {
        let mask = self.mask();
        loop {
            let mut pos = (gap + 1) & mask;
            let from = loop {
                let Some(bucket) = &self.buckets[pos] else {
                    return;
                };
                let ideal = self.ideal_slot(&bucket.key);
                let reachable = if gap <= pos {
                    gap < ideal && ideal <= pos
                } else {
                    gap < ideal || ideal <= pos
                };
                if !reachable {
                    break pos;
                }
                pos = (pos + 1) & mask;
            };
            self.buckets[gap] = self.buckets[from].take();
            self.relocate_link(from, gap);
            on_move(from, gap);
            gap = from;
        }
    }

    /// Cursor positioned before the first entry.
    pub fn cursor_mut(&mut self) -> CursorMut<'_, V, S> {
        CursorMut::at_front(self)
    }

    /// Cursor positioned after the last entry.
    pub fn cursor_mut_back(&mut self) -> CursorMut<'_, V, S> {
        CursorMut::at_back(self)
    }

    /// Cursor positioned immediately after `key`, or `None` if it is absent.
    pub fn cursor_mut_after(&mut self, key: &str) -> Option<CursorMut<'_, V, S>> {
        let pos = self.find(key).ok()?;
        Some(CursorMut::at_slot(self, pos))
    }

    /// Keeps only the entries for which `keep` returns `true`, preserving
    /// their order.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &mut V) -> bool) {
        let mut cursor = self.cursor_mut();
        while let Some((k, v)) = cursor.next() {
            if !keep(k, v) {
                match cursor.remove() {
                    Ok(_) => {}
                    Err(_) => unreachable!("next() just made an entry current"),
                }
            }
        }
    }

    /// Checks the probe and order invariants, panicking on the first
    /// violation.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let cap = self.capacity();
        let mask = self.mask();
        assert!(cap.is_power_of_two());
        assert_eq!(self.links.len(), cap);
        assert_eq!(self.threshold, threshold_for(cap, self.load_factor));
        assert!(self.size <= self.threshold);

        let occupied = self.buckets.iter().filter(|b| b.is_some()).count();
        assert_eq!(occupied, self.size, "size disagrees with occupied slots");

        // Every entry is reachable from its ideal slot through occupied slots.
        for (i, b) in self.buckets.iter().enumerate() {
            if let Some(b) = b {
                let mut pos = self.ideal_slot(&b.key);
                while pos != i {
                    assert!(self.buckets[pos].is_some(), "gap before `{}` at {pos}", b.key);
                    pos = (pos + 1) & mask;
                }
            }
        }

        // The order list covers exactly the occupied slots, with consistent
        // back pointers.
        let mut seen = 0;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(pos) = cursor {
            assert!(self.buckets[pos].is_some(), "link to empty slot {pos}");
            assert_eq!(self.links[pos].prev(), prev, "bad back link at {pos}");
            seen += 1;
            assert!(seen <= self.size, "order list has a cycle");
            prev = Some(pos);
            cursor = self.links[pos].next();
        }
        assert_eq!(seen, self.size);
        assert_eq!(self.tail, prev);
    }
}

impl<V: fmt::Debug, S> fmt::Debug for OrderedStringMap<V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Map equality: same keys mapped to equal values, regardless of order.
impl<V: PartialEq, S: BuildHasher> PartialEq for OrderedStringMap<V, S> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<V: Eq, S: BuildHasher> Eq for OrderedStringMap<V, S> {}

impl<V, S: BuildHasher> Index<&str> for OrderedStringMap<V, S> {
    type Output = V;

    fn index(&self, key: &str) -> &V {
        match self.get(key) {
            Some(v) => v,
            None => panic!("no entry for key `{key}`"),
        }
    }
}

impl<K, V, S> Extend<(K, V)> for OrderedStringMap<V, S>
where
    K: Into<String>,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for OrderedStringMap<V, S>
where
    K: Into<String>,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}
