//! Process-wide random generator used by `Tensor::randomize`.
//!
//! The generator is seeded from OS entropy on first use. `seed_global`
//! replaces it with a deterministic one, which is what `EngineConfig::seed`
//! does when an engine is built.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

static GLOBAL_RNG: Mutex<Option<StdRng>> = parking_lot::const_mutex(None);

/// Reseed the process-wide generator.
pub fn seed_global(seed: u64) {
    tracing::debug!(seed, "reseeding global tensor RNG");
    *GLOBAL_RNG.lock() = Some(StdRng::seed_from_u64(seed));
}

/// Run `f` with exclusive access to the process-wide generator.
pub fn with_global_rng<R>(f: impl FnOnce(&mut StdRng) -> R) -> R {
    let mut guard = GLOBAL_RNG.lock();
    let rng = guard.get_or_insert_with(StdRng::from_entropy);
    f(rng)
}

/// Overwrite `data` with samples from U[0, 1) drawn from `rng`.
pub fn fill_uniform_with<R: Rng + ?Sized>(rng: &mut R, data: &mut [f32]) {
    for v in data {
        *v = rng.gen::<f32>();
    }
}

/// Overwrite `data` with samples from U[0, 1) drawn from the process-wide
/// generator.
pub fn fill_uniform(data: &mut [f32]) {
    with_global_rng(|rng| fill_uniform_with(rng, data));
}
