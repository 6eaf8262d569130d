//! Count-Min sketch for approximate access frequencies.
//!
//! Four hash rows over a power-of-two number of 8-bit saturating counters.
//! A key is hashed once (outside the sketch); the per-row column is derived
//! from that single hash with a distinct odd multiplier per row, the
//! standard stand-in for independent hash functions.
//!
//! ```text
//!   row 0: [ 0 | 3 | 0 | 1 | ... ]   index = mix(hash, seed_0) & mask
//!   row 1: [ 1 | 0 | 2 | 0 | ... ]   index = mix(hash, seed_1) & mask
//!   row 2: [ 0 | 0 | 3 | 0 | ... ]
//!   row 3: [ 2 | 1 | 0 | 0 | ... ]
//!
//!   count(key) = min over rows        (one-sided, over-estimating error)
//!   decay()    = halve every counter  (exponential recency weighting)
//! ```
//!
//! The error is one-sided: counts never under-estimate. Counters saturate
//! at 255, far above the promotion thresholds in play, and the periodic
//! decay halves everything before saturation matters in practice.

use log::debug;

/// Number of hash rows.
const NUM_ROWS: usize = 4;

/// Per-row mixing constants (odd, from the splitmix64/xxhash families).
const ROW_SEEDS: [u64; NUM_ROWS] = [
    0x9e37_79b9_7f4a_7c15,
    0xc2b2_ae3d_27d4_eb4f,
    0x1656_67b1_9e37_79f9,
    0x27d4_eb2f_1656_67c5,
];

/// Approximate frequency counters over key hashes.
#[derive(Debug, Clone)]
pub struct CountMinSketch {
    /// `NUM_ROWS * width` counters, row-major.
    table: Box<[u8]>,
    /// Column count per row; always a power of two.
    width: usize,
}

impl CountMinSketch {
    /// Creates a sketch with at least `min_width` columns per row.
    ///
    /// The width is rounded up to the next power of two so column selection
    /// is a mask.
    pub fn new(min_width: usize) -> Self {
        let width = min_width.max(1).next_power_of_two();
        Self {
            table: vec![0u8; NUM_ROWS * width].into_boxed_slice(),
            width,
        }
    }

    /// Number of counters per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Total size of the counter array in bytes.
    pub fn byte_size(&self) -> usize {
        self.table.len()
    }

    #[inline]
    fn index(&self, hash: u64, row: usize) -> usize {
        // Multiply-mix the shared hash with a per-row seed and take the
        // high bits, which are the best-distributed after multiplication.
        let mixed = (hash ^ ROW_SEEDS[row]).wrapping_mul(ROW_SEEDS[row] | 1);
        row * self.width + ((mixed >> 32) as usize & (self.width - 1))
    }

    /// Raises every addressed counter by one, saturating at `u8::MAX`.
    pub fn increment(&mut self, hash: u64) {
        for row in 0..NUM_ROWS {
            let idx = self.index(hash, row);
            self.table[idx] = self.table[idx].saturating_add(1);
        }
    }

    /// Returns the estimated count: the minimum over the addressed counters.
    pub fn count(&self, hash: u64) -> u32 {
        let mut min = u8::MAX;
        for row in 0..NUM_ROWS {
            min = min.min(self.table[self.index(hash, row)]);
        }
        u32::from(min)
    }

    /// Halves every counter (integer floor).
    pub fn decay(&mut self) {
        for counter in self.table.iter_mut() {
            *counter >>= 1;
        }
        debug!("count-min sketch decayed ({} counters)", self.table.len());
    }
}
