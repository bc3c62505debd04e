//! Seed-stable, promotion-weighted scoring
//!
//! Every search request turns its caller-supplied seed into a salt. Each
//! matching document then gets a pseudo-random base score drawn from a
//! generator seeded with `salt + id`, offset by the salt, and boosted by
//! `10 * salt` when the document is promoted.
//!
//! The generator is the 48-bit linear congruential generator
//! (multiplier `0x5DEECE66D`, increment `0xB`). Its output sequence is fully
//! determined by the seed on every platform, so scores can be compared across
//! processes and across releases.

/// Lowest possible salt
pub const MIN_SALT: i32 = 100_000;

/// Highest possible salt
pub const MAX_SALT: i32 = 2 * MIN_SALT - 1;

/// Spread of the random base score, `[0, BASE_SCORE_SPREAD)`
pub const BASE_SCORE_SPREAD: i32 = 100;

/// Multiple of the salt added to promoted documents
pub const PROMOTION_FACTOR: i64 = 10;

const MULTIPLIER: u64 = 0x5_DEEC_E66D;
const INCREMENT: u64 = 0xB;
const STATE_MASK: u64 = (1 << 48) - 1;

/// 32-bit polynomial hash of a string over its UTF-16 code units
///
/// `h = 31 * h + unit`, wrapping on overflow. The empty string hashes to 0.
pub fn string_hash(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32))
}

/// Derive the per-request salt from a seed string
///
/// Always lands in `[MIN_SALT, MAX_SALT]`, which keeps it above any document
/// id the salt is later added to.
pub fn salt_from_seed(seed: &str) -> i32 {
    (string_hash(seed) % MIN_SALT).abs() + MIN_SALT
}

/// Deterministic 48-bit LCG
#[derive(Debug, Clone)]
pub struct SeededRandom {
    state: u64,
}

impl SeededRandom {
    pub fn new(seed: i64) -> Self {
        SeededRandom {
            state: (seed as u64 ^ MULTIPLIER) & STATE_MASK,
        }
    }

    fn next_bits(&mut self, bits: u32) -> i32 {
        self.state = self
            .state
            .wrapping_mul(MULTIPLIER)
            .wrapping_add(INCREMENT)
            & STATE_MASK;
        (self.state >> (48 - bits)) as u32 as i32
    }

    /// Next uniformly distributed `i32`
    pub fn next_i32(&mut self) -> i32 {
        self.next_bits(32)
    }
}

/// Score of one document under a given salt
pub fn document_score(salt: i32, id: i64, promoted: bool) -> f64 {
    let mut rng = SeededRandom::new(i64::from(salt).wrapping_add(id));
    let base = (rng.next_i32() % BASE_SCORE_SPREAD).abs();

    let mut score = i64::from(base) + i64::from(salt);
    if promoted {
        score += PROMOTION_FACTOR * i64::from(salt);
    }
    score as f64
}
