use alloc::vec::Vec;

use crate::error::AllocError;
use crate::slot::Entry;
use crate::slot::Slot;

/// Digests are 32 bits wide, so the table can never address more bins.
pub(crate) const MAX_POWER: u8 = 32;

/// Slots per bin in a freshly created table.
pub(crate) const INITIAL_BIN_SIZE: usize = 4;

/// Flat slot array split into `2^power` bins of `bin_size` slots each.
///
/// Bin `b` occupies `b * bin_size .. (b + 1) * bin_size`.
#[derive(Debug)]
pub(crate) struct Storage<'k, V> {
    slots: Vec<Slot<'k, V>>,
    power: u8,
    bin_size: usize,
    slot_limit: Option<usize>,
}

fn slot_count(power: u8, bin_size: usize) -> Result<usize, AllocError> {
    if power > MAX_POWER {
        return Err(AllocError::CapacityOverflow);
    }
    1usize
        .checked_shl(u32::from(power))
        .and_then(|bins| bins.checked_mul(bin_size))
        .ok_or(AllocError::CapacityOverflow)
}

fn check_limit(requested: usize, slot_limit: Option<usize>) -> Result<(), AllocError> {
    match slot_limit {
        Some(limit) if requested > limit => Err(AllocError::SlotLimit { requested, limit }),
        _ => Ok(()),
    }
}

impl<'k, V: Copy> Storage<'k, V> {
    pub(crate) fn try_new(
        power: u8,
        bin_size: usize,
        slot_limit: Option<usize>,
    ) -> Result<Self, AllocError> {
        let len = slot_count(power, bin_size)?;
        check_limit(len, slot_limit)?;

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(len)
            .map_err(|_| AllocError::OutOfMemory { slots: len })?;
        slots.resize(len, Slot::Empty);

        Ok(Storage {
            slots,
            power,
            bin_size,
            slot_limit,
        })
    }

    /// Doubles the number of bins by appending a verbatim copy of the storage.
    ///
    /// Under the wider mask each entry's primary digest addresses exactly one
    /// of its two copies. The other copy is residue.
    pub(crate) fn double(&mut self) -> Result<(), AllocError> {
        if self.power >= MAX_POWER {
            return Err(AllocError::CapacityOverflow);
        }
        let len = self.slots.len();
        let requested = len.checked_mul(2).ok_or(AllocError::CapacityOverflow)?;
        check_limit(requested, self.slot_limit)?;
        self.slots
            .try_reserve_exact(len)
            .map_err(|_| AllocError::OutOfMemory { slots: requested })?;

        self.slots.extend_from_within(..);
        self.power += 1;
        Ok(())
    }

    /// Drops the upper half added by [`Storage::double`].
    ///
    /// Only valid while the upper half is still an exact mirror of the lower.
    pub(crate) fn revert_double(&mut self) {
        debug_assert!(self.power > 1);
        let half = self.slots.len() / 2;
        self.slots.truncate(half);
        self.power -= 1;
    }

    /// Adds one slot to every bin. Each bin ends with a guaranteed empty slot.
    pub(crate) fn widen(&mut self) -> Result<(), AllocError> {
        let bins = self.bin_count();
        let old_size = self.bin_size;
        let new_size = old_size.checked_add(1).ok_or(AllocError::CapacityOverflow)?;
        let requested = bins
            .checked_mul(new_size)
            .ok_or(AllocError::CapacityOverflow)?;
        check_limit(requested, self.slot_limit)?;
        self.slots
            .try_reserve_exact(bins)
            .map_err(|_| AllocError::OutOfMemory { slots: requested })?;

        self.slots.resize(requested, Slot::Empty);
        // Highest bin first, so no bin is overwritten before it moves.
        for bin in (0..bins).rev() {
            let old = bin * old_size;
            let new = bin * new_size;
            self.slots.copy_within(old..old + old_size, new);
            self.slots[new + old_size] = Slot::Empty;
        }
        self.bin_size = new_size;
        Ok(())
    }
}

impl<'k, V> Storage<'k, V> {
    #[inline]
    pub(crate) fn power(&self) -> u8 {
        self.power
    }

    #[inline]
    pub(crate) fn bin_size(&self) -> usize {
        self.bin_size
    }

    #[inline]
    pub(crate) fn bin_count(&self) -> usize {
        1usize << self.power
    }

    #[inline]
    pub(crate) fn slot_limit(&self) -> Option<usize> {
        self.slot_limit
    }

    #[inline]
    pub(crate) fn set_slot_limit(&mut self, slot_limit: Option<usize>) {
        self.slot_limit = slot_limit;
    }

    #[inline]
    pub(crate) fn mask(&self) -> u32 {
        ((1u64 << self.power) - 1) as u32
    }

    #[inline]
    pub(crate) fn bin_index(&self, digest: u32) -> usize {
        (digest & self.mask()) as usize
    }

    #[inline]
    pub(crate) fn bin_start(&self, bin: usize) -> usize {
        bin * self.bin_size
    }

    /// Longest eviction chain an insert may walk per phase.
    #[inline]
    pub(crate) fn max_depth(&self) -> usize {
        (usize::from(self.power) * 32).min(self.slots.len())
    }

    #[inline]
    pub(crate) fn slots(&self) -> &[Slot<'k, V>] {
        &self.slots
    }

    #[inline]
    pub(crate) fn slot(&self, index: usize) -> Option<&Slot<'k, V>> {
        self.slots.get(index)
    }

    #[inline]
    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut Slot<'k, V>> {
        self.slots.get_mut(index)
    }

    /// Whether `entry`, stored at `index`, is addressed by its primary digest.
    ///
    /// Residue left behind by doubling fails this test.
    #[inline]
    pub(crate) fn is_homed(&self, index: usize, entry: &Entry<'k, V>) -> bool {
        self.bin_index(entry.primary) == index / self.bin_size
    }

    /// Index of the first slot in `bin` satisfying `pred`.
    #[inline]
    pub(crate) fn find_in_bin(
        &self,
        bin: usize,
        mut pred: impl FnMut(&Slot<'k, V>) -> bool,
    ) -> Option<usize> {
        let start = self.bin_start(bin);
        self.slots[start..start + self.bin_size]
            .iter()
            .position(|slot| pred(slot))
            .map(|offset| start + offset)
    }

    /// First slot of `bin` that may be overwritten: empty, or holding residue.
    #[inline]
    pub(crate) fn reclaimable(&self, bin: usize) -> Option<usize> {
        self.find_in_bin(bin, |slot| match slot {
            Slot::Empty => true,
            Slot::Occupied(entry) => self.bin_index(entry.primary) != bin,
        })
    }

    /// Stores `entry` at `index`, returning the previous occupant.
    #[inline]
    pub(crate) fn replace(&mut self, index: usize, entry: Entry<'k, V>) -> Slot<'k, V> {
        core::mem::replace(&mut self.slots[index], Slot::Occupied(entry))
    }
}
