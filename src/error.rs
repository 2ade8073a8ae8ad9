/// Failure to obtain storage for a table.
///
/// Returned by the fallible constructors and by
/// [`HashTable::insert`](crate::HashTable::insert) when growth is required but
/// cannot be performed. An insert that fails with this error leaves the table
/// exactly as it was before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    /// The requested size does not fit in `usize`, or the table already uses
    /// every bit of the 32-bit digests for addressing.
    #[error("table size computation overflowed")]
    CapacityOverflow,

    /// Growing would exceed the slot limit configured with
    /// [`HashTable::with_slot_limit`](crate::HashTable::with_slot_limit).
    #[error("growing to {requested} slots exceeds the limit of {limit}")]
    SlotLimit {
        /// Total number of slots the growth step needed.
        requested: usize,
        /// The configured limit.
        limit: usize,
    },

    /// The allocator refused to provide memory.
    #[error("out of memory allocating {slots} slots")]
    OutOfMemory {
        /// Total number of slots the growth step needed.
        slots: usize,
    },
}
