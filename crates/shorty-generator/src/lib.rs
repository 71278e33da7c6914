mod hash;
mod random;

pub use hash::HashGenerator;
pub use random::RandomGenerator;

/// Trait for generating short ids.
///
/// Implementations are pure generators that don't interact with storage.
/// Uniqueness is not guaranteed: the store reports collisions and the caller
/// decides whether to retry.
pub trait Generator: Send + Sync + 'static {
    /// Produces a candidate short id for `long_url`.
    fn generate(&self, long_url: &str) -> String;
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate(&self, long_url: &str) -> String {
        (**self).generate(long_url)
    }
}
