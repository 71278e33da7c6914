use crate::Generator;
use typed_builder::TypedBuilder;
use xxhash_rust::xxh64::xxh64;

/// Derives the id from a 64-bit xxHash of the URL.
///
/// The same URL always maps to the same id, so retrying after a collision
/// needs a different generator or a different seed.
#[derive(Debug, Clone, TypedBuilder)]
pub struct HashGenerator {
    /// Hex digits kept from the hash, at most 16.
    #[builder(default = 7)]
    length: usize,
    #[builder(default = 0)]
    seed: u64,
}

impl Default for HashGenerator {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Generator for HashGenerator {
    fn generate(&self, long_url: &str) -> String {
        let mut hex = format!("{:016x}", xxh64(long_url.as_bytes(), self.seed));
        hex.truncate(self.length);
        hex
    }
}
