//! Fibonacci-tiered chunk planning.
//!
//! The planner covers a byte range with tiers of geometrically growing
//! chunks: tier `t` uses chunks of `base_chunk_bytes * fib[t]` bytes and
//! holds at most `fib[t + 1]` of them. Small early chunks make the head of
//! a file cheap to fetch and verify; later tiers grow exponentially, so
//! the tier count is logarithmic in the file size.
//!
//! Planning is pure arithmetic over `(byte_length, base_chunk_bytes,
//! fib_start)`; re-running it always reproduces the exact same boundaries,
//! which is how readers re-derive a manifest's chunk layout.

use strata_types::{ChunkPlan, ChunkingParams, TierRange};

/// Number of pre-generated Fibonacci terms.
///
/// With the default seed this outgrows any representable byte length long
/// before the table is exhausted; the planner clamps to the final term as
/// a termination guard regardless.
pub const FIB_TERMS: usize = 32;

/// Default Fibonacci seed pair.
pub const DEFAULT_FIB_START: [u64; 2] = [1, 2];

/// A fully derived chunk plan: the flat chunk list plus per-tier ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkLayout {
    /// Every planned chunk in tier-then-index order, leaf indexes strictly
    /// increasing from zero.
    pub plan: Vec<ChunkPlan>,
    /// One range per tier, in tier order.
    pub tiers: Vec<TierRange>,
}

impl ChunkLayout {
    /// Highest tier number in the plan (0 for an empty plan).
    pub fn max_tier(&self) -> u32 {
        self.tiers.last().map_or(0, |t| t.tier)
    }

    /// The chunking parameters that reproduce this layout.
    pub fn params(&self, base_chunk_bytes: u64, fib_start: [u64; 2]) -> ChunkingParams {
        ChunkingParams {
            base_chunk_bytes,
            fib_start,
            max_tier: self.max_tier(),
        }
    }
}

/// Generate `terms` Fibonacci numbers from the given seed pair.
///
/// # Panics
///
/// Panics if either seed term is zero or `terms < 2`.
pub fn fibonacci(fib_start: [u64; 2], terms: usize) -> Vec<u64> {
    assert!(terms >= 2, "need at least the two seed terms");
    assert!(
        fib_start[0] > 0 && fib_start[1] > 0,
        "fibonacci seed terms must be non-zero (got {fib_start:?})"
    );

    let mut fib = Vec::with_capacity(terms);
    fib.push(fib_start[0]);
    fib.push(fib_start[1]);
    while fib.len() < terms {
        let next = fib[fib.len() - 1].saturating_add(fib[fib.len() - 2]);
        fib.push(next);
    }
    fib
}

/// Plan chunks covering `[0, byte_length)`.
///
/// The resulting chunks are contiguous and non-overlapping, the final
/// chunk ends exactly at `byte_length`, and leaf indexes increase by one
/// per chunk in emission order. `byte_length == 0` yields an empty layout.
///
/// # Panics
///
/// Panics if `base_chunk_bytes` is zero or a seed term is zero.
pub fn plan_chunks(byte_length: u64, base_chunk_bytes: u64, fib_start: [u64; 2]) -> ChunkLayout {
    assert!(base_chunk_bytes > 0, "base_chunk_bytes must be non-zero");

    let fib = fibonacci(fib_start, FIB_TERMS);

    let mut plan = Vec::new();
    let mut tiers = Vec::new();
    let mut offset = 0u64;
    let mut leaf_index = 0u64;
    let mut tier = 0u32;

    while offset < byte_length {
        // Clamp keeps the loop terminating even if the table runs out.
        let t = (tier as usize).min(fib.len() - 2);
        let chunk_bytes = base_chunk_bytes.saturating_mul(fib[t]);
        let tier_cap = fib[t + 1];

        let mut count = 0u64;
        let mut index = 0u32;
        while (index as u64) < tier_cap && offset < byte_length {
            let length = chunk_bytes.min(byte_length - offset);
            plan.push(ChunkPlan {
                tier,
                index,
                offset,
                length,
                chunk_bytes,
                leaf_index,
            });
            leaf_index += 1;
            offset += length;
            index += 1;
            count += 1;
        }

        tiers.push(TierRange {
            tier,
            count,
            chunk_bytes,
        });
        tier += 1;
    }

    ChunkLayout { plan, tiers }
}
