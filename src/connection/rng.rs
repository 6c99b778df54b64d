//! Keyed random streams.
//!
//! Random decisions of a connect call are drawn from streams keyed by the
//! call seed and a node GID, so every thread that revisits a node draws the
//! same numbers and the result does not depend on the thread count.

use rand::rngs::StdRng;
use rand::SeedableRng;

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

/// Combine a seed and a key into a new, well-mixed seed
pub fn mix(seed: u64, key: u64) -> u64 {
    splitmix64(seed ^ splitmix64(key))
}

pub fn keyed_rng(seed: u64, key: u64) -> StdRng {
    StdRng::seed_from_u64(mix(seed, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_same_key_same_stream() {
        let a: Vec<u32> = keyed_rng(7, 42).sample_iter(rand::distributions::Standard).take(8).collect();
        let b: Vec<u32> = keyed_rng(7, 42).sample_iter(rand::distributions::Standard).take(8).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_keys_are_decorrelated() {
        assert_ne!(mix(1, 2), mix(1, 3));
        assert_ne!(mix(1, 2), mix(2, 2));
        let x: u64 = keyed_rng(1, 2).gen();
        let y: u64 = keyed_rng(1, 3).gen();
        assert_ne!(x, y);
    }
}
