//! Packed predecessor/successor pairs that thread insertion order through the
//! slot table.
//!
//! Each occupied slot owns one `Link`. The predecessor lives in the high 32 bits
//! and the successor in the low 32 bits; `u32::MAX` marks "none". Table
//! capacity never exceeds `1 << 30`, so a real index never collides with the
//! sentinel.

const NONE: u32 = u32::MAX;
const LOW: u64 = 0x0000_0000_FFFF_FFFF;
const HIGH: u64 = 0xFFFF_FFFF_0000_0000;

#[derive(Copy, Clone, Eq, PartialEq)]
pub(crate) struct Link(u64);

#[inline]
fn pack(i: Option<usize>) -> u64 {
    match i {
        Some(i) => {
            debug_assert!(i < NONE as usize);
            i as u64
        }
        None => NONE as u64,
    }
}

#[inline]
fn unpack(raw: u32) -> Option<usize> {
    if raw == NONE {
        None
    } else {
        Some(raw as usize)
    }
}

impl Link {
    /// A link with neither neighbour; also the filler for free slots.
    pub(crate) const DETACHED: Link = Link(u64::MAX);

    #[inline]
    pub(crate) fn new(prev: Option<usize>, next: Option<usize>) -> Self {
        Link((pack(prev) << 32) | pack(next))
    }

    #[inline]
    pub(crate) fn prev(self) -> Option<usize> {
        unpack((self.0 >> 32) as u32)
    }

    #[inline]
    pub(crate) fn next(self) -> Option<usize> {
        unpack(self.0 as u32)
    }

    #[inline]
    pub(crate) fn set_prev(&mut self, prev: Option<usize>) {
        self.0 = (self.0 & LOW) | (pack(prev) << 32);
    }

    #[inline]
    pub(crate) fn set_next(&mut self, next: Option<usize>) {
        self.0 = (self.0 & HIGH) | pack(next);
    }
}

impl core::fmt::Debug for Link {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Link")
            .field("prev", &self.prev())
            .field("next", &self.next())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Link;

    #[test]
    fn detached_has_no_neighbours() {
        assert_eq!(Link::DETACHED.prev(), None);
        assert_eq!(Link::DETACHED.next(), None);
        assert_eq!(Link::new(None, None), Link::DETACHED);
    }

    #[test]
    fn halves_update_independently() {
        let mut l = Link::new(Some(3), Some(7));
        assert_eq!((l.prev(), l.next()), (Some(3), Some(7)));

        l.set_next(Some(1 << 30));
        assert_eq!((l.prev(), l.next()), (Some(3), Some(1 << 30)));

        l.set_prev(None);
        assert_eq!((l.prev(), l.next()), (None, Some(1 << 30)));

        l.set_next(None);
        l.set_prev(Some(0));
        assert_eq!((l.prev(), l.next()), (Some(0), None));
    }
}
