//! Instrumentation call-outs fired by [`HashTable`](crate::HashTable).
//!
//! A probe sees the shape of the table at each event but never the table
//! itself, so it cannot observe or mutate entries mid-operation. The default
//! [`NoProbe`] ignores every event.

/// Geometry of a table at the moment a probe fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    /// Log2 of the number of bins.
    pub power: u8,
    /// Slots per bin.
    pub bin_size: usize,
    /// Number of live elements.
    pub len: usize,
}

impl Shape {
    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.bin_size << self.power
    }
}

/// Which stage of an insert placed the new element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Placed by the eviction chain against the table as it was on entry.
    Initial,
    /// Placed by the retry that follows doubling the table.
    Doubled,
    /// Placed into a slot created by widening the bins.
    Widened,
}

/// Receives table events. Every method defaults to doing nothing.
pub trait Probe {
    /// An insert found the key already present.
    fn duplicate_found(&mut self, shape: Shape) {
        let _ = shape;
    }

    /// The table doubled its bin count. `shape` is the new geometry.
    fn table_doubled(&mut self, shape: Shape) {
        let _ = shape;
    }

    /// A failed insert undid the doubling it performed. `shape` is the
    /// restored geometry.
    fn doubling_reverted(&mut self, shape: Shape) {
        let _ = shape;
    }

    /// Every eviction chain of an insert ran out; bins are about to widen.
    fn chain_exhausted(&mut self, shape: Shape, max_depth: usize) {
        let _ = (shape, max_depth);
    }

    /// Every bin gained one slot. `shape` is the new geometry.
    fn bin_widened(&mut self, shape: Shape) {
        let _ = shape;
    }

    /// An insert completed after `depth` evictions in `phase`.
    ///
    /// `depth` counts evictions across all phases of the insert.
    fn insert_done(&mut self, shape: Shape, phase: Phase, depth: usize, max_depth: usize) {
        let _ = (shape, phase, depth, max_depth);
    }
}

/// A probe that ignores every event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoProbe;

impl Probe for NoProbe {}

impl<P: Probe + ?Sized> Probe for &mut P {
    fn duplicate_found(&mut self, shape: Shape) {
        (**self).duplicate_found(shape);
    }

    fn table_doubled(&mut self, shape: Shape) {
        (**self).table_doubled(shape);
    }

    fn doubling_reverted(&mut self, shape: Shape) {
        (**self).doubling_reverted(shape);
    }

    fn chain_exhausted(&mut self, shape: Shape, max_depth: usize) {
        (**self).chain_exhausted(shape, max_depth);
    }

    fn bin_widened(&mut self, shape: Shape) {
        (**self).bin_widened(shape);
    }

    fn insert_done(&mut self, shape: Shape, phase: Phase, depth: usize, max_depth: usize) {
        (**self).insert_done(shape, phase, depth, max_depth);
    }
}
