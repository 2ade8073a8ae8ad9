use crate::digest::Digests;

/// One occupant of the table.
///
/// `primary` is the home digest: it addresses the bin the entry physically
/// lives in. Displacing the entry to its other bin swaps the two digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Entry<'k, V> {
    pub(crate) primary: u32,
    pub(crate) alternate: u32,
    pub(crate) key: &'k [u8],
    pub(crate) value: V,
}

impl<'k, V> Entry<'k, V> {
    #[inline]
    pub(crate) fn new(digests: Digests, key: &'k [u8], value: V) -> Self {
        Entry {
            primary: digests.h1,
            alternate: digests.h2,
            key,
            value,
        }
    }

    /// Returns the entry rehomed to its other bin.
    #[inline]
    pub(crate) fn swapped(self) -> Self {
        Entry {
            primary: self.alternate,
            alternate: self.primary,
            ..self
        }
    }

    /// Whether this entry is `key` stored under `primary`.
    #[inline]
    pub(crate) fn matches(&self, primary: u32, alternate: u32, key: &[u8]) -> bool {
        self.primary == primary && self.alternate == alternate && self.key == key
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot<'k, V> {
    Empty,
    Occupied(Entry<'k, V>),
}

impl<'k, V> Slot<'k, V> {
    #[inline]
    pub(crate) fn entry(&self) -> Option<&Entry<'k, V>> {
        match self {
            Slot::Empty => None,
            Slot::Occupied(entry) => Some(entry),
        }
    }

    #[inline]
    pub(crate) fn entry_mut(&mut self) -> Option<&mut Entry<'k, V>> {
        match self {
            Slot::Empty => None,
            Slot::Occupied(entry) => Some(entry),
        }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }
}
