//! Randomized invariant check for the LRU cache, modeled on the teacher's
//! stress-test style (`tests/concurrent_stress_tests.rs`) but adapted to a
//! single-threaded budget invariant instead of cross-thread correctness.

use distcache::lru::Lru;
use distcache::value::Value;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn v(payload: &str) -> Value {
    Value::with_expire(payload.as_bytes().to_vec(), "g", i64::MAX)
}

/// Invariant 1: after any sequence of add/get/remove, `current_bytes` never
/// exceeds the byte budget and never goes negative.
#[test]
fn random_operation_sequence_never_violates_the_byte_budget() {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let max_bytes = 200;
    let mut cache = Lru::new(max_bytes, None);

    for _ in 0..5_000 {
        let key = format!("k{}", rng.gen_range(0..30));
        match rng.gen_range(0..3) {
            0 => {
                let payload = "x".repeat(rng.gen_range(1..20));
                cache.add(key, v(&payload));
            }
            1 => {
                cache.get(&key);
            }
            _ => {
                cache.remove(&key);
            }
        }
        assert!(cache.current_bytes() >= 0);
        assert!(cache.current_bytes() <= max_bytes);
    }
}
