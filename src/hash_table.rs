//! The bucketized cuckoo hash table.
//!
//! Every key has two candidate bins, one per digest. A bin is a run of
//! `bin_size` consecutive slots in one flat array of `2^power` bins. Lookup
//! scans at most the two candidate bins, so it is O(1) in the worst case.
//!
//! Insertion walks a bounded eviction chain: when the target bin is full, the
//! occupant under a round-robin cursor is displaced to its other bin and the
//! walk continues from there. When the chain runs out, the table first doubles
//! its bin count and retries once, then widens every bin by one slot, which
//! always leaves room. If that allocation fails the chain is replayed
//! backwards, so a failed insert leaves the table untouched.
//!
//! Doubling copies the storage verbatim into the new upper half. For every
//! entry exactly one of the two copies is addressed by its home digest under
//! the wider mask; the other copy is *residue*. Residue is never returned by
//! lookup or iteration and is overwritten by later inserts.

use core::fmt::Debug;
use core::hash::BuildHasher;
use core::iter::FusedIterator;

use crate::digest::Digests;
use crate::error::AllocError;
use crate::probe::NoProbe;
use crate::probe::Phase;
use crate::probe::Probe;
use crate::probe::Shape;
use crate::slot::Entry;
use crate::slot::Slot;
use crate::storage::INITIAL_BIN_SIZE;
use crate::storage::Storage;

#[cfg(any(feature = "std", feature = "foldhash"))]
use crate::digest::DefaultHashBuilder;

/// Position of an element inside a [`HashTable`].
///
/// Handles are returned by [`HashTable::lookup`], [`HashTable::insert`] (for
/// duplicates) and iteration. A handle stays valid until the next
/// [`HashTable::insert`]; removing other elements or mutating values does not
/// invalidate it. Accessors return `None` for a handle whose slot has since
/// been emptied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(usize);

impl Handle {
    /// Physical slot index of the element.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A cuckoo hash table with two-slot addressing and growable bins.
///
/// Keys are borrowed byte strings that must outlive the table; values are
/// `Copy` (references, indices, small integers). `S` produces the digests and
/// `P` receives instrumentation events.
///
/// ## Example
///
/// ```rust
/// # #[cfg(any(feature = "std", feature = "foldhash"))]
/// # {
/// use cuckoo_bins::HashTable;
///
/// let keys: [&[u8]; 3] = [b"alpha", b"beta", b"gamma"];
/// let mut table = HashTable::new();
/// for (i, key) in keys.into_iter().enumerate() {
///     assert_eq!(table.insert(key, i), Ok(None));
/// }
///
/// assert_eq!(table.get(b"beta"), Some(&1));
/// assert_eq!(table.len(), 3);
///
/// // Inserting an existing key hands back the element already stored.
/// let existing = table.insert(b"beta", 7).unwrap().unwrap();
/// *table.value_mut(existing).unwrap() = 7;
/// assert_eq!(table.get(b"beta"), Some(&7));
///
/// table.remove(table.lookup(b"alpha"));
/// assert!(!table.contains_key(b"alpha"));
/// # }
/// ```
pub struct HashTable<'k, V, S, P = NoProbe> {
    storage: Storage<'k, V>,
    len: usize,
    hash_builder: S,
    probe: P,
}

/// The pending element of an insert and the bookkeeping to walk its chain.
struct Chain<'k, V> {
    pending: Entry<'k, V>,
    cursor: usize,
    max_depth: usize,
    evictions: usize,
}

/// Steps of [`HashTable::place`].
#[derive(Debug, Clone, Copy)]
enum State {
    Scanning { doubled: bool, depth: usize },
    Evicting { doubled: bool, depth: usize, bin: usize },
    GrowingTable,
    GrowingBins { doubled: bool },
    Undoing { doubled: bool, error: AllocError },
    Done { phase: Phase },
    Failed(AllocError),
}

struct KeyDebug<'a>(&'a [u8]);

impl Debug for KeyDebug<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "b\"{}\"", self.0.escape_ascii())
    }
}

impl<'k, V, S, P> Debug for HashTable<'k, V, S, P>
where
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(_, key, value)| (KeyDebug(key), value)))
            .finish()
    }
}

#[cfg(any(feature = "std", feature = "foldhash"))]
impl<'k, V: Copy> HashTable<'k, V, DefaultHashBuilder> {
    /// Creates a table with two bins of four slots.
    pub fn new() -> Self {
        Self::with_power(1)
    }

    /// Creates a table with `2^power` bins of four slots. Zero means one.
    ///
    /// # Panics
    ///
    /// Panics if `power` exceeds 32 or the storage cannot be allocated.
    pub fn with_power(power: u8) -> Self {
        Self::with_power_and_hasher(power, DefaultHashBuilder::default())
    }

    /// Creates a table with room for at least `slots` elements.
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use cuckoo_bins::HashTable;
    ///
    /// let table: HashTable<'_, u32, _> = HashTable::with_capacity(8);
    /// assert_eq!(table.capacity(), 8);
    /// assert_eq!(table.power(), 1);
    /// # }
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the required size overflows or cannot be allocated.
    pub fn with_capacity(slots: usize) -> Self {
        Self::with_power(power_for(slots))
    }
}

#[cfg(any(feature = "std", feature = "foldhash"))]
impl<'k, V: Copy> Default for HashTable<'k, V, DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "std", feature = "foldhash"))]
fn power_for(slots: usize) -> u8 {
    let bins = slots.div_ceil(INITIAL_BIN_SIZE).next_power_of_two();
    bins.trailing_zeros().max(1) as u8
}

impl<'k, V: Copy, S> HashTable<'k, V, S> {
    /// Creates a table with `2^power` bins of four slots using `hash_builder`.
    ///
    /// # Panics
    ///
    /// Panics if `power` exceeds 32 or the storage cannot be allocated.
    pub fn with_power_and_hasher(power: u8, hash_builder: S) -> Self {
        match Self::try_with_power_and_hasher(power, hash_builder) {
            Ok(table) => table,
            Err(err) => panic!("{err}"),
        }
    }

    /// Fallible form of [`HashTable::with_power_and_hasher`].
    pub fn try_with_power_and_hasher(power: u8, hash_builder: S) -> Result<Self, AllocError> {
        let storage = Storage::try_new(power.max(1), INITIAL_BIN_SIZE, None)?;
        Ok(HashTable {
            storage,
            len: 0,
            hash_builder,
            probe: NoProbe,
        })
    }
}

impl<'k, V, S, P> HashTable<'k, V, S, P> {
    /// Replaces the probe that receives table events.
    pub fn with_probe<Q: Probe>(self, probe: Q) -> HashTable<'k, V, S, Q> {
        HashTable {
            storage: self.storage,
            len: self.len,
            hash_builder: self.hash_builder,
            probe,
        }
    }

    /// Caps the total number of slots growth may allocate.
    ///
    /// Inserts that would need to grow past the limit fail with
    /// [`AllocError::SlotLimit`] and leave the table unchanged. `None` removes
    /// the cap. The limit does not shrink a table that is already larger.
    pub fn with_slot_limit(mut self, limit: Option<usize>) -> Self {
        self.storage.set_slot_limit(limit);
        self
    }

    /// The configured slot limit.
    pub fn slot_limit(&self) -> Option<usize> {
        self.storage.slot_limit()
    }

    /// The installed probe.
    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Mutable access to the installed probe.
    pub fn probe_mut(&mut self) -> &mut P {
        &mut self.probe
    }

    /// The hasher builder used to compute digests.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table holds no live elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total number of slots, `bin_size << power`.
    pub fn capacity(&self) -> usize {
        self.storage.slots().len()
    }

    /// Log2 of the number of bins.
    pub fn power(&self) -> u8 {
        self.storage.power()
    }

    /// Slots per bin.
    pub fn bin_size(&self) -> usize {
        self.storage.bin_size()
    }

    fn shape(&self) -> Shape {
        Shape {
            power: self.storage.power(),
            bin_size: self.storage.bin_size(),
            len: self.len,
        }
    }

    /// Whether slot `index` holds an element reachable by lookup.
    fn is_live(&self, index: usize) -> bool {
        match self.storage.slot(index) {
            Some(Slot::Occupied(entry)) => self.storage.is_homed(index, entry),
            _ => false,
        }
    }

    fn live_entry(&self, handle: Handle) -> Option<&Entry<'k, V>> {
        if self.is_live(handle.0) {
            self.storage.slot(handle.0).and_then(Slot::entry)
        } else {
            None
        }
    }

    /// Key of the element at `handle`.
    pub fn key(&self, handle: Handle) -> Option<&'k [u8]> {
        self.live_entry(handle).map(|entry| entry.key)
    }

    /// Value of the element at `handle`.
    pub fn value(&self, handle: Handle) -> Option<&V> {
        self.live_entry(handle).map(|entry| &entry.value)
    }

    /// Mutable value of the element at `handle`.
    ///
    /// Overwriting the value does not invalidate any handle.
    pub fn value_mut(&mut self, handle: Handle) -> Option<&mut V> {
        if !self.is_live(handle.0) {
            return None;
        }
        self.storage
            .slot_mut(handle.0)
            .and_then(Slot::entry_mut)
            .map(|entry| &mut entry.value)
    }

    /// Handle of the first live element after `prev`, in storage order.
    ///
    /// Pass `None` to start a traversal. Removing elements between calls is
    /// fine; inserting is not, as it may move elements past the cursor or
    /// back in front of it.
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use cuckoo_bins::HashTable;
    ///
    /// let mut table = HashTable::new();
    /// table.insert(b"a", 1).unwrap();
    /// table.insert(b"b", 2).unwrap();
    ///
    /// let mut sum = 0;
    /// let mut cursor = table.next(None);
    /// while let Some(handle) = cursor {
    ///     sum += table.value(handle).unwrap();
    ///     cursor = table.next(Some(handle));
    /// }
    /// assert_eq!(sum, 3);
    /// # }
    /// ```
    pub fn next(&self, prev: Option<Handle>) -> Option<Handle> {
        let start = prev.map_or(0, |handle| handle.0 + 1);
        (start..self.capacity())
            .find(|&index| self.is_live(index))
            .map(Handle)
    }

    /// Iterates over `(handle, key, value)` in storage order.
    pub fn iter(&self) -> Iter<'_, 'k, V, S, P> {
        Iter {
            table: self,
            cursor: None,
            remaining: self.len,
        }
    }

    /// Removes the element at `item` and returns its value.
    ///
    /// `None`, or a handle whose slot is already empty, is a no-op, so the
    /// result of [`HashTable::lookup`] can be passed straight in.
    pub fn remove(&mut self, item: impl Into<Option<Handle>>) -> Option<V>
    where
        V: Copy,
    {
        let handle = item.into()?;
        let value = self.live_entry(handle)?.value;
        if let Some(slot) = self.storage.slot_mut(handle.0) {
            *slot = Slot::Empty;
        }
        self.len -= 1;
        Some(value)
    }

    /// Occupancy snapshot of the table.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> crate::stats::DebugStats {
        let occupied_slots = self
            .storage
            .slots()
            .iter()
            .filter(|slot| !slot.is_empty())
            .count();
        let total_slots = self.capacity();
        crate::stats::DebugStats {
            populated: self.len,
            power: self.power(),
            bin_size: self.bin_size(),
            total_slots,
            occupied_slots,
            residue_slots: occupied_slots - self.len,
            load_factor: self.len as f64 / total_slots as f64,
        }
    }
}

impl<'k, V, S, P> HashTable<'k, V, S, P>
where
    V: Copy,
    S: BuildHasher,
    P: Probe,
{
    fn digests(&self, key: &[u8]) -> Digests {
        Digests::compute(&self.hash_builder, key)
    }

    fn find_index(&self, key: &[u8], digests: Digests) -> Option<usize> {
        let Digests { h1, h2 } = digests;
        let first = self.storage.bin_index(h1);
        self.storage
            .find_in_bin(first, |slot| {
                slot.entry().is_some_and(|entry| entry.matches(h1, h2, key))
            })
            .or_else(|| {
                let second = self.storage.bin_index(h2);
                self.storage.find_in_bin(second, |slot| {
                    slot.entry().is_some_and(|entry| entry.matches(h2, h1, key))
                })
            })
    }

    /// Finds the element stored under `key`.
    pub fn lookup(&self, key: &[u8]) -> Option<Handle> {
        self.find_index(key, self.digests(key)).map(Handle)
    }

    /// Returns a reference to the value stored under `key`.
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        self.lookup(key).and_then(|handle| self.value(handle))
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        let handle = self.lookup(key)?;
        self.value_mut(handle)
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.lookup(key).is_some()
    }

    /// Inserts `value` under `key`.
    ///
    /// Returns `Ok(None)` when the element was added and `Ok(Some(handle))`
    /// when `key` was already present; in that case nothing changes and the
    /// caller may overwrite the stored value through
    /// [`HashTable::value_mut`]. Growth may be needed to make room; if it
    /// cannot be allocated the error is returned and the table is exactly as
    /// it was before the call.
    pub fn insert(&mut self, key: &'k [u8], value: V) -> Result<Option<Handle>, AllocError> {
        let digests = self.digests(key);
        if let Some(index) = self.find_index(key, digests) {
            log::trace!("insert of existing key at slot {index}");
            let shape = self.shape();
            self.probe.duplicate_found(shape);
            return Ok(Some(Handle(index)));
        }

        self.place(Entry::new(digests, key, value))?;
        self.len += 1;
        Ok(None)
    }

    /// Places a new entry, growing as needed.
    fn place(&mut self, entry: Entry<'k, V>) -> Result<(), AllocError> {
        let mut chain = Chain {
            pending: entry,
            cursor: 0,
            max_depth: self.storage.max_depth(),
            evictions: 0,
        };

        let mut state = State::Scanning {
            doubled: false,
            depth: 0,
        };
        loop {
            state = match state {
                State::Scanning { doubled, depth } if depth == chain.max_depth => {
                    if doubled {
                        State::GrowingBins { doubled }
                    } else {
                        State::GrowingTable
                    }
                }
                State::Scanning { doubled, depth } => {
                    let bin = self.storage.bin_index(chain.pending.primary);
                    match self.storage.reclaimable(bin) {
                        Some(index) => {
                            self.storage.replace(index, chain.pending);
                            State::Done {
                                phase: if doubled {
                                    Phase::Doubled
                                } else {
                                    Phase::Initial
                                },
                            }
                        }
                        None => State::Evicting {
                            doubled,
                            depth,
                            bin,
                        },
                    }
                }
                State::Evicting {
                    doubled,
                    depth,
                    bin,
                } => {
                    let index = self.storage.bin_start(bin) + chain.cursor;
                    match self.storage.replace(index, chain.pending) {
                        Slot::Occupied(victim) => chain.pending = victim.swapped(),
                        Slot::Empty => unreachable!("evicted from a bin with a free slot"),
                    }
                    chain.cursor = (chain.cursor + 1) % self.storage.bin_size();
                    chain.evictions += 1;
                    State::Scanning {
                        doubled,
                        depth: depth + 1,
                    }
                }
                State::GrowingTable => match self.storage.double() {
                    Ok(()) => {
                        log::debug!("doubled table to {} bins", self.storage.bin_count());
                        let shape = self.shape();
                        self.probe.table_doubled(shape);
                        State::Scanning {
                            doubled: true,
                            depth: 0,
                        }
                    }
                    Err(err) => {
                        log::debug!("could not double table: {err}");
                        State::GrowingBins { doubled: false }
                    }
                },
                State::GrowingBins { doubled } => {
                    let shape = self.shape();
                    self.probe.chain_exhausted(shape, chain.max_depth);
                    match self.storage.widen() {
                        Ok(()) => {
                            log::debug!("widened bins to {} slots", self.storage.bin_size());
                            let shape = self.shape();
                            self.probe.bin_widened(shape);

                            let bin = self.storage.bin_index(chain.pending.primary);
                            let index = self.storage.bin_start(bin) + self.storage.bin_size() - 1;
                            debug_assert!(self.storage.slot(index).is_some_and(Slot::is_empty));
                            self.storage.replace(index, chain.pending);
                            State::Done {
                                phase: Phase::Widened,
                            }
                        }
                        Err(error) => State::Undoing { doubled, error },
                    }
                }
                State::Undoing { doubled, error } => {
                    log::debug!("rolling back {} evictions: {error}", chain.evictions);
                    let steps = chain.max_depth;
                    if doubled {
                        self.undo_evictions(&mut chain, steps);
                        self.storage.revert_double();
                        let shape = self.shape();
                        self.probe.doubling_reverted(shape);
                    }
                    self.undo_evictions(&mut chain, steps);
                    debug_assert_eq!(chain.evictions, 0);
                    State::Failed(error)
                }
                State::Done { phase } => {
                    let shape = Shape {
                        len: self.len + 1,
                        ..self.shape()
                    };
                    self.probe
                        .insert_done(shape, phase, chain.evictions, chain.max_depth);
                    return Ok(());
                }
                State::Failed(error) => return Err(error),
            };
        }
    }

    /// Replays the last `steps` evictions of `chain` backwards.
    ///
    /// Each step puts the pending entry back into the slot it was lifted from,
    /// with its digests swapped back, and takes up the entry that displaced it.
    fn undo_evictions(&mut self, chain: &mut Chain<'k, V>, steps: usize) {
        let bin_size = self.storage.bin_size();
        for _ in 0..steps {
            chain.cursor = chain.cursor.checked_sub(1).unwrap_or(bin_size - 1);
            let bin = self.storage.bin_index(chain.pending.alternate);
            let index = self.storage.bin_start(bin) + chain.cursor;
            match self.storage.replace(index, chain.pending.swapped()) {
                Slot::Occupied(displacer) => chain.pending = displacer,
                Slot::Empty => unreachable!("eviction chain crossed an empty slot"),
            }
            chain.evictions -= 1;
        }
    }
}

/// Iterator over the live elements of a [`HashTable`] in storage order.
///
/// Created by [`HashTable::iter`].
pub struct Iter<'a, 'k, V, S, P> {
    table: &'a HashTable<'k, V, S, P>,
    cursor: Option<Handle>,
    remaining: usize,
}

impl<'a, 'k, V, S, P> Iterator for Iter<'a, 'k, V, S, P> {
    type Item = (Handle, &'k [u8], &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let table = self.table;
        let handle = table.next(self.cursor)?;
        self.cursor = Some(handle);
        self.remaining = self.remaining.saturating_sub(1);
        let entry = table.live_entry(handle)?;
        Some((handle, entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V, S, P> ExactSizeIterator for Iter<'_, '_, V, S, P> {}

impl<V, S, P> FusedIterator for Iter<'_, '_, V, S, P> {}

impl<'a, 'k, V, S, P> IntoIterator for &'a HashTable<'k, V, S, P> {
    type Item = (Handle, &'k [u8], &'a V);
    type IntoIter = Iter<'a, 'k, V, S, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
