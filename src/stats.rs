//! Occupancy snapshots and insert-depth statistics.

use alloc::vec::Vec;

use crate::probe::Phase;
use crate::probe::Probe;
use crate::probe::Shape;

/// Occupancy snapshot returned by
/// [`HashTable::debug_stats`](crate::HashTable::debug_stats).
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of live elements.
    pub populated: usize,
    /// Log2 of the number of bins.
    pub power: u8,
    /// Slots per bin.
    pub bin_size: usize,
    /// Total number of slots allocated.
    pub total_slots: usize,
    /// Slots holding an entry, live or residue.
    pub occupied_slots: usize,
    /// Slots holding a stale copy left behind by doubling.
    pub residue_slots: usize,
    /// Load factor (populated / total_slots).
    pub load_factor: f64,
}

impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Cuckoo Table Debug Statistics ===");
        println!(
            "Shape: 2^{} bins x {} slots = {} slots",
            self.power, self.bin_size, self.total_slots
        );
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.total_slots,
            self.load_factor * 100.0
        );
        println!(
            "Occupied: {} slots ({} residue)",
            self.occupied_slots, self.residue_slots
        );
    }
}

/// Chain depths of inserts that completed without growing, for one power.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepthHistogram {
    /// The eviction bound in effect for these inserts.
    pub max_depth: usize,
    /// `counts[d]` is the number of inserts that needed `d` evictions.
    pub counts: Vec<usize>,
}

impl DepthHistogram {
    /// Total number of inserts recorded.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// A [`Probe`] that records how deep eviction chains go.
///
/// Inserts that completed in the first phase are binned by table power into a
/// [`DepthHistogram`]. For inserts that needed growth only the depth of the
/// latest one per resulting power is kept.
#[derive(Debug, Clone, Default)]
pub struct InsertStats {
    histograms: Vec<DepthHistogram>,
    grown_depths: Vec<Option<usize>>,
    duplicates: usize,
    doublings: usize,
    widenings: usize,
}

impl InsertStats {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Depth histogram for inserts done at `power`, if any happened.
    pub fn histogram(&self, power: u8) -> Option<&DepthHistogram> {
        self.histograms
            .get(usize::from(power))
            .filter(|histogram| histogram.total() > 0)
    }

    /// Evictions performed by the latest growing insert that ended at `power`.
    pub fn grown_depth(&self, power: u8) -> Option<usize> {
        self.grown_depths.get(usize::from(power)).copied().flatten()
    }

    /// Number of inserts that found their key already present.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Number of times the table doubled, not counting doublings undone by a
    /// failed insert.
    pub fn doublings(&self) -> usize {
        self.doublings
    }

    /// Number of times bins were widened.
    pub fn widenings(&self) -> usize {
        self.widenings
    }

    /// Prints cumulative depth percentages per power, then growth depths.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("insert depth:");
        for (power, histogram) in self.histograms.iter().enumerate() {
            let total = histogram.total();
            if total == 0 {
                continue;
            }
            let norm = total as f64 / 100.0;
            let mut line = format!("{power:2} ({}):", histogram.max_depth);
            let mut sum = 0;
            for (depth, &count) in histogram.counts.iter().enumerate() {
                if count == 0 {
                    continue;
                }
                sum += count;
                line.push_str(&format!(" {depth}={:2.3}%", sum as f64 / norm));
            }
            println!("{line}");
        }

        println!("insert depth after table grows:");
        for (power, depth) in self.grown_depths.iter().enumerate() {
            if let Some(depth) = depth {
                println!("{power:2}: {depth:10}");
            }
        }
        println!(
            "duplicates: {}, doublings: {}, widenings: {}",
            self.duplicates, self.doublings, self.widenings
        );
    }
}

impl Probe for InsertStats {
    fn duplicate_found(&mut self, _shape: Shape) {
        self.duplicates += 1;
    }

    fn table_doubled(&mut self, _shape: Shape) {
        self.doublings += 1;
    }

    fn doubling_reverted(&mut self, _shape: Shape) {
        self.doublings = self.doublings.saturating_sub(1);
    }

    fn bin_widened(&mut self, _shape: Shape) {
        self.widenings += 1;
    }

    fn insert_done(&mut self, shape: Shape, phase: Phase, depth: usize, max_depth: usize) {
        let power = usize::from(shape.power);
        match phase {
            Phase::Initial => {
                if self.histograms.len() <= power {
                    self.histograms.resize_with(power + 1, DepthHistogram::default);
                }
                let histogram = &mut self.histograms[power];
                if histogram.counts.len() <= depth {
                    histogram.counts.resize(depth + 1, 0);
                }
                histogram.counts[depth] += 1;
                histogram.max_depth = max_depth;
            }
            Phase::Doubled | Phase::Widened => {
                if self.grown_depths.len() <= power {
                    self.grown_depths.resize(power + 1, None);
                }
                self.grown_depths[power] = Some(depth);
            }
        }
    }
}
