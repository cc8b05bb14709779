//! Thrust, major, minor, and oblateness of an event's final-state momenta.
//!
//! Two optimizer variants share one refinement fixed point and differ only in their seeds:
//! [`BaselineThrust`] refines every single-particle direction plus every pairwise sum and
//! difference, while [`AcceleratedThrust`] refines the single-particle directions alone and
//! reruns the full seed set whenever a refinement fails to converge or the single seeds
//! disagree on the thrust axis.

pub mod analyzer;
pub mod error;
pub mod refine;
pub mod seeds;
pub mod strategy;

pub use analyzer::{AnalysisOutcome, AnalyzerSettings, EventAxis, Listing, ShapeAnalyzer, ShapeResult};
pub use error::ShapeError;
pub use strategy::{Exhaustive, SearchDiagnostics, SeedStrategy, SingleSeed};

use shapes_core::momentum::Momentum;

/// Reference optimizer with the exhaustive seed set.
pub type BaselineThrust = ShapeAnalyzer<Exhaustive>;
/// Optimizer seeded by single particles only.
pub type AcceleratedThrust = ShapeAnalyzer<SingleSeed>;

/// Anything that turns an event into shape observables.
pub trait ShapeExtractor {
    /// Short label used in listings, records, and logs.
    fn name(&self) -> &'static str;

    fn analyze(&mut self, event: &[Momentum]) -> AnalysisOutcome;

    /// Multiplicity of the most recently analysed event.
    fn particle_count(&self) -> usize;
}

impl<S: SeedStrategy> ShapeExtractor for ShapeAnalyzer<S> {
    fn name(&self) -> &'static str {
        S::NAME
    }

    fn analyze(&mut self, event: &[Momentum]) -> AnalysisOutcome {
        ShapeAnalyzer::analyze(self, event)
    }

    fn particle_count(&self) -> usize {
        ShapeAnalyzer::particle_count(self)
    }
}
