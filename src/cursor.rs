//! Bidirectional cursor that can edit and remove entries mid-walk.
//!
//! The cursor sits *between* entries: `prev` is the slot a call to
//! [`CursorMut::previous`] would return, `next` the slot [`CursorMut::next`]
//! would return. Removing the current entry can backward-shift other entries
//! into new slots; the cursor follows those moves so it keeps pointing at the
//! same logical neighbours. Shrinking the table is postponed until the cursor
//! is dropped, since a rehash would move every entry at once.

use crate::error::{Error, Result};
use crate::map::OrderedStringMap;
use core::hash::BuildHasher;
use core::mem;

pub struct CursorMut<'a, V, S: BuildHasher> {
    map: &'a mut OrderedStringMap<V, S>,
    prev: Option<usize>,
    next: Option<usize>,
    current: Option<usize>,
    // Entries before the cursor; computed lazily when the cursor was
    // positioned by key.
    index: Option<usize>,
}

impl<'a, V, S: BuildHasher> CursorMut<'a, V, S> {
    pub(crate) fn at_front(map: &'a mut OrderedStringMap<V, S>) -> Self {
        let next = map.head;
        Self {
            map,
            prev: None,
            next,
            current: None,
            index: Some(0),
        }
    }

    pub(crate) fn at_back(map: &'a mut OrderedStringMap<V, S>) -> Self {
        let prev = map.tail;
        let len = map.size;
        Self {
            map,
            prev,
            next: None,
            current: None,
            index: Some(len),
        }
    }

    pub(crate) fn at_slot(map: &'a mut OrderedStringMap<V, S>, pos: usize) -> Self {
        let next = map.links[pos].next();
        Self {
            map,
            prev: Some(pos),
            next,
            current: None,
            index: None,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.prev.is_some()
    }

    /// Steps forward over the next entry and makes it current.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<(&str, &mut V)> {
        let pos = self.next?;
        self.current = Some(pos);
        self.prev = Some(pos);
        self.next = self.map.links[pos].next();
        if let Some(i) = &mut self.index {
            *i += 1;
        }
        self.map.entry_mut_at(pos)
    }

    /// Steps backward over the previous entry and makes it current.
    pub fn previous(&mut self) -> Option<(&str, &mut V)> {
        let pos = self.prev?;
        self.current = Some(pos);
        self.next = Some(pos);
        self.prev = self.map.links[pos].prev();
        if let Some(i) = &mut self.index {
            *i -= 1;
        }
        self.map.entry_mut_at(pos)
    }

    fn resolve_index(&mut self) -> usize {
        if let Some(i) = self.index {
            return i;
        }
        let i = match (self.prev, self.next) {
            (None, _) => 0,
            (_, None) => self.map.size,
            (Some(target), _) => {
                let mut pos = self.map.head;
                let mut i = 1;
                while pos.is_some() && pos != Some(target) {
                    pos = pos.and_then(|p| self.map.links[p].next());
                    i += 1;
                }
                i
            }
        };
        self.index = Some(i);
        i
    }

    /// Position the next call to [`next`](Self::next) would report; equals
    /// `len()` at the end.
    pub fn next_index(&mut self) -> usize {
        self.resolve_index()
    }

    /// Position of the entry before the cursor, or `None` at the front.
    pub fn previous_index(&mut self) -> Option<usize> {
        self.resolve_index().checked_sub(1)
    }

    /// The entry last returned by `next`/`previous`, unless it was removed.
    pub fn current(&self) -> Option<(&str, &V)> {
        self.map.entry_at(self.current?)
    }

    pub fn current_mut(&mut self) -> Option<(&str, &mut V)> {
        self.map.entry_mut_at(self.current?)
    }

    /// Replaces the current entry's value, returning the old one.
    pub fn set_value(&mut self, value: V) -> Result<V> {
        let (_, slot) = self.current_mut().ok_or(Error::NoCurrentEntry)?;
        Ok(mem::replace(slot, value))
    }

    /// Advances up to `n` entries; returns how many were passed.
    pub fn skip(&mut self, n: usize) -> usize {
        let mut moved = 0;
        while moved < n && self.next().is_some() {
            moved += 1;
        }
        moved
    }

    /// Retreats up to `n` entries; returns how many were passed.
    pub fn back(&mut self, n: usize) -> usize {
        let mut moved = 0;
        while moved < n && self.previous().is_some() {
            moved += 1;
        }
        moved
    }

    /// Removes the current entry, leaving the cursor between its former
    /// neighbours. Fails with [`Error::NoCurrentEntry`] if no entry is
    /// current, including right after a previous `remove`.
    pub fn remove(&mut self) -> Result<(String, V)> {
        let pos = self.current.take().ok_or(Error::NoCurrentEntry)?;
        self.resolve_index();
        let link = self.map.links[pos];
        if self.prev == Some(pos) {
            // Reached by `next`: the cursor now has one fewer entry behind it.
            if let Some(i) = &mut self.index {
                *i -= 1;
            }
            self.prev = link.prev();
        } else {
            self.next = link.next();
        }

        let (prev, next) = (&mut self.prev, &mut self.next);
        let removed = self.map.detach(pos, |from, to| {
            if *prev == Some(from) {
                *prev = Some(to);
            }
            if *next == Some(from) {
                *next = Some(to);
            }
        });
        removed.ok_or(Error::NoCurrentEntry)
    }
}

impl<V, S: BuildHasher> Drop for CursorMut<'_, V, S> {
    fn drop(&mut self) {
        self.map.shrink_if_sparse();
    }
}
