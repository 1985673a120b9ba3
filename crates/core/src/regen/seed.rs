//! Per-purpose RNG streams and the draw helpers shared by every pass.
//!
//! One run seed fans out into five independent ChaCha8 streams. Each pass
//! draws only from its own stream, so draw counts in one pass never shift the
//! sequence another pass sees: reruns of a seed are bit-identical.

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{Rng, SeedableRng};

const STREAM_ROOMS: u64 = 1;
const STREAM_MONSTERS: u64 = 2;
const STREAM_DOORS: u64 = 3;
const STREAM_SHAPE: u64 = 4;
const STREAM_ITEMS: u64 = 5;

pub(super) struct RngStreams {
    /// Cross-dungeon room pool shuffle.
    pub(super) rooms: ChaCha8Rng,
    /// Lazy monster-list pool shuffles.
    pub(super) monsters: ChaCha8Rng,
    /// Solver neighbor ordering, bonus-door rolls, lock draws.
    pub(super) doors: ChaCha8Rng,
    /// Size variance, flood-fill pushes, cell reclassification, transport pairing.
    pub(super) shape: ChaCha8Rng,
    /// Per-dungeon item pool shuffles.
    pub(super) items: ChaCha8Rng,
}

impl RngStreams {
    pub(super) fn new(run_seed: u64) -> RngStreams {
        RngStreams {
            rooms: stream_rng(run_seed, STREAM_ROOMS),
            monsters: stream_rng(run_seed, STREAM_MONSTERS),
            doors: stream_rng(run_seed, STREAM_DOORS),
            shape: stream_rng(run_seed, STREAM_SHAPE),
            items: stream_rng(run_seed, STREAM_ITEMS),
        }
    }
}

fn stream_rng(run_seed: u64, stream: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(mix_seed_stream(run_seed, stream))
}

pub(super) fn mix_seed_stream(seed: u64, stream: u64) -> u64 {
    let mut mixed = seed.wrapping_add(stream.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    mixed ^= mixed >> 30;
    mixed = mixed.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    mixed ^= mixed >> 27;
    mixed = mixed.wrapping_mul(0x94D0_49BB_1331_11EB);
    mixed ^ (mixed >> 31)
}

/// Uniform draw in `min..=max`.
pub(super) fn random_usize(rng: &mut ChaCha8Rng, min_value: usize, max_value: usize) -> usize {
    debug_assert!(min_value <= max_value);
    let range_size = max_value - min_value + 1;
    min_value + (rng.next_u64() as usize % range_size)
}

pub(super) fn random_index(rng: &mut ChaCha8Rng, len: usize) -> usize {
    debug_assert!(len > 0);
    rng.next_u64() as usize % len
}

/// Uniform draw in 0..100, compared against percentage constants.
pub(super) fn percent_roll(rng: &mut ChaCha8Rng) -> u32 {
    rng.next_u32() % 100
}

pub(super) fn coin_flip(rng: &mut ChaCha8Rng) -> bool {
    rng.next_u32() & 1 == 0
}

/// In-place Fisher-Yates.
pub(super) fn shuffle<T>(rng: &mut ChaCha8Rng, values: &mut [T]) {
    for index in (1..values.len()).rev() {
        let other = random_index(rng, index + 1);
        values.swap(index, other);
    }
}
