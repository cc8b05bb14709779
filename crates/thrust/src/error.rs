use thiserror::Error;

/// Reasons an event cannot be analysed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("event has {count} particle(s); at least 2 are required")]
    InsufficientParticles { count: usize },
    #[error("no particle carries a usable momentum direction")]
    DegenerateMomentum,
}
