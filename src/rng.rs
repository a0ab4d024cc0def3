use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeded generator used for every randomized initialization.
pub type BeamRng = ChaCha8Rng;

pub fn seeded(seed: u64) -> BeamRng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Fresh seed for mounts that did not configure one.
#[cfg(target_arch = "wasm32")]
pub fn entropy_seed() -> u64 {
    let hi = (js_sys::Math::random() * f64::from(u32::MAX)) as u64;
    let lo = (js_sys::Math::random() * f64::from(u32::MAX)) as u64;
    (hi << 32) | lo
}

#[cfg(not(target_arch = "wasm32"))]
pub fn entropy_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x9E37_79B9_7F4A_7C15)
}
