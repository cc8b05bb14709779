//! Shape analysis orchestrating the thrust, major, and minor axis searches.

use std::fmt;

use shapes_config::ToleranceConfig;
use shapes_core::momentum::{Momentum, total_magnitude};
use shapes_core::tolerance;
use shapes_core::vector::{Vector3, any_orthogonal, canonical_sign, cross, normalize, reject};

use crate::error::ShapeError;
use crate::refine::{projected_sum, refine};
use crate::strategy::{SearchDiagnostics, SeedStrategy};

/// Outcome of analysing one event.
pub type AnalysisOutcome = Result<ShapeResult, ShapeError>;

/// Rounds of promoting a better in-plane direction to thrust axis.
const MAX_PROMOTIONS: usize = 3;

/// Numeric knobs shared by both optimizer variants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzerSettings {
    pub epsilon: f64,
    pub max_iterations: usize,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            epsilon: tolerance::EPSILON,
            max_iterations: tolerance::MAX_ITERATIONS,
        }
    }
}

impl From<&ToleranceConfig> for AnalyzerSettings {
    fn from(config: &ToleranceConfig) -> Self {
        Self {
            epsilon: config.epsilon,
            max_iterations: config.max_iterations,
        }
    }
}

/// Which of the three event axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAxis {
    Thrust,
    Major,
    Minor,
}

/// Event-shape observables of one analysed event.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeResult {
    pub thrust: f64,
    pub major: f64,
    pub minor: f64,
    pub oblateness: f64,
    /// Thrust, major, and minor axes, in that order, forming a right-handed frame.
    pub axes: [Vector3; 3],
    pub diagnostics: SearchDiagnostics,
}

impl ShapeResult {
    pub fn axis(&self, which: EventAxis) -> Vector3 {
        match which {
            EventAxis::Thrust => self.axes[0],
            EventAxis::Major => self.axes[1],
            EventAxis::Minor => self.axes[2],
        }
    }

    pub fn value(&self, which: EventAxis) -> f64 {
        match which {
            EventAxis::Thrust => self.thrust,
            EventAxis::Major => self.major,
            EventAxis::Minor => self.minor,
        }
    }

    /// Human-readable table of the values and axis components.
    pub fn listing<'a>(&'a self, label: &'a str) -> Listing<'a> {
        Listing {
            label,
            result: self,
        }
    }
}

/// Diagnostic listing of a [`ShapeResult`].
pub struct Listing<'a> {
    label: &'a str,
    result: &'a ShapeResult,
}

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.result;
        writeln!(f, " --------  Thrust Analysis ({})  --------", self.label)?;
        writeln!(f, "          value      e_x       e_y       e_z")?;
        for (name, which) in [
            ("Thr", EventAxis::Thrust),
            ("Maj", EventAxis::Major),
            ("Min", EventAxis::Minor),
        ] {
            let axis = r.axis(which);
            writeln!(
                f,
                "  {name}  {:>9.5} {:>9.5} {:>9.5} {:>9.5}",
                r.value(which),
                axis[0],
                axis[1],
                axis[2]
            )?;
        }
        writeln!(f, "  Obl  {:>9.5}", r.oblateness)?;
        writeln!(
            f,
            "  seeds {} (degenerate {}, unconverged {}){}",
            r.diagnostics.seeds_tried,
            r.diagnostics.degenerate_seeds,
            r.diagnostics.non_converged,
            if r.diagnostics.fell_back { ", full-seed fallback" } else { "" }
        )?;
        write!(f, " --------  End Thrust Analysis  --------")
    }
}

/// Thrust/major/minor analyzer parameterised by its seed strategy.
///
/// The momentum, projection, and sign buffers are reused between events and only grow;
/// they never influence results.
#[derive(Debug, Clone, Default)]
pub struct ShapeAnalyzer<S: SeedStrategy> {
    strategy: S,
    settings: AnalyzerSettings,
    momenta: Vec<Vector3>,
    projected: Vec<Vector3>,
    signs: Vec<bool>,
    particle_count: usize,
}

impl<S: SeedStrategy> ShapeAnalyzer<S> {
    pub fn new(settings: AnalyzerSettings) -> Self {
        Self {
            strategy: S::default(),
            settings,
            momenta: Vec::new(),
            projected: Vec::new(),
            signs: Vec::new(),
            particle_count: 0,
        }
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    /// Multiplicity of the most recently analysed event.
    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    pub fn analyze(&mut self, event: &[Momentum]) -> AnalysisOutcome {
        self.particle_count = event.len();
        if event.len() < 2 {
            return Err(ShapeError::InsufficientParticles { count: event.len() });
        }
        let total = total_magnitude(event);
        if !(total > 0.0) {
            return Err(ShapeError::DegenerateMomentum);
        }

        self.momenta.clear();
        self.momenta.extend(event.iter().map(|p| p.vector));
        let max_iterations = self.settings.max_iterations;

        let search = self
            .strategy
            .search(&self.momenta, max_iterations, &mut self.signs);
        let mut diagnostics = search.diagnostics;
        let best = search.best.ok_or(ShapeError::DegenerateMomentum)?;
        let mut thrust_axis = best.axis;
        let mut thrust_sum = best.projected;

        let (mut major_axis, mut major_sum) = self.major_search(&thrust_axis, &mut diagnostics);

        // The thrust search may stop in a local optimum that the in-plane search beats.
        for _ in 0..MAX_PROMOTIONS {
            if major_sum <= thrust_sum + self.settings.epsilon * total {
                break;
            }
            diagnostics.seeds_tried += 1;
            let promoted = refine(&self.momenta, &major_axis, max_iterations, &mut self.signs);
            let promoted = match promoted {
                Ok(promoted) if promoted.projected > thrust_sum => promoted,
                _ => break,
            };
            if !promoted.converged {
                diagnostics.non_converged += 1;
            }
            thrust_axis = promoted.axis;
            thrust_sum = promoted.projected;
            (major_axis, major_sum) = self.major_search(&thrust_axis, &mut diagnostics);
        }

        let thrust_axis = canonical_sign(&thrust_axis);
        let mut major_axis = canonical_sign(&major_axis);
        let mut minor_axis = frame_completion(&thrust_axis, &major_axis);
        let mut minor_sum = projected_sum(&self.momenta, &minor_axis);
        if minor_sum > major_sum {
            major_axis = canonical_sign(&minor_axis);
            minor_axis = frame_completion(&thrust_axis, &major_axis);
            std::mem::swap(&mut major_sum, &mut minor_sum);
        }

        let slack = self.settings.epsilon;
        let thrust = bounded(thrust_sum / total, 1.0, slack, &mut diagnostics);
        let major = bounded(major_sum / total, thrust, slack, &mut diagnostics);
        let minor = bounded(minor_sum / total, major, slack, &mut diagnostics);
        Ok(ShapeResult {
            thrust,
            major,
            minor,
            oblateness: major - minor,
            axes: [thrust_axis, major_axis, minor_axis],
            diagnostics,
        })
    }

    /// Best direction in the plane orthogonal to `thrust_axis`, with its projected sum.
    fn major_search(
        &mut self,
        thrust_axis: &Vector3,
        diagnostics: &mut SearchDiagnostics,
    ) -> (Vector3, f64) {
        self.projected.clear();
        self.projected
            .extend(self.momenta.iter().map(|p| reject(p, thrust_axis)));
        let search = self.strategy.search_plane(
            &self.projected,
            self.settings.max_iterations,
            &mut self.signs,
        );
        *diagnostics += search.diagnostics;

        let axis = search
            .best
            .and_then(|best| normalize(&reject(&best.axis, thrust_axis)).ok())
            .unwrap_or_else(|| any_orthogonal(thrust_axis));
        (axis, projected_sum(&self.momenta, &axis))
    }
}

/// `raw` capped at `bound`. Excesses beyond rounding (`slack`) are counted as clamps.
fn bounded(raw: f64, bound: f64, slack: f64, diagnostics: &mut SearchDiagnostics) -> f64 {
    if raw > bound + slack {
        diagnostics.clamped += 1;
        tracing::debug!(raw, bound, "event shape value clamped");
    }
    raw.min(bound)
}

/// `n1 × n2`, renormalised.
fn frame_completion(n1: &Vector3, n2: &Vector3) -> Vector3 {
    let n3 = cross(n1, n2);
    normalize(&n3).unwrap_or(n3)
}
