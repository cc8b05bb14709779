//! Configuration models and loaders for the event shapes workspace.

use std::fs::File;
use std::path::Path;

use serde::Deserialize;
use shapes_core::tolerance;
use thiserror::Error;

/// Complete run configuration: numeric tolerances, toy generator, and harness knobs.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    pub tolerance: ToleranceConfig,
    pub generator: GeneratorConfig,
    pub harness: HarnessConfig,
}

/// Tolerances shared by both optimizer variants.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ToleranceConfig {
    /// Unit-norm and orthogonality tolerance.
    pub epsilon: f64,
    /// Largest thrust difference accepted between baseline and accelerated results.
    pub cross_validation: f64,
    /// Bound on hemisphere refinement iterations per seed.
    pub max_iterations: usize,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            epsilon: tolerance::EPSILON,
            cross_validation: tolerance::CROSS_VALIDATION,
            max_iterations: tolerance::MAX_ITERATIONS,
        }
    }
}

/// Parameters of the toy e+e- → jets event source.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    /// Collision energy in GeV (defaults to the Z0 mass).
    pub center_of_mass_gev: f64,
    /// Probability that an event radiates a hard third jet.
    pub three_jet_fraction: f64,
    pub min_particles_per_jet: usize,
    pub max_particles_per_jet: usize,
    /// Typical transverse momentum of a particle relative to its jet axis (GeV).
    pub jet_width_gev: f64,
    /// Largest tangent of a particle's angle to its jet before recoil balancing.
    pub max_cone_tan: f64,
    /// Three-jet events need the hardest jet at a cosine at most this value to both others.
    /// `1.0` disables the cut.
    pub hardest_jet_max_cos: f64,
    /// Smallest energy-fraction lead of the hardest jet over the others. `0.0` disables it.
    pub hardest_jet_min_gap: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 20_181_001,
            center_of_mass_gev: 91.1876,
            three_jet_fraction: 0.3,
            min_particles_per_jet: 3,
            max_particles_per_jet: 12,
            jet_width_gev: 0.6,
            max_cone_tan: 0.14,
            hardest_jet_max_cos: -0.766,
            hardest_jet_min_gap: 0.1,
        }
    }
}

/// Event-loop behaviour of the comparison harness.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HarnessConfig {
    pub events: usize,
    /// Number of leading events that get a full listing and a per-event record.
    pub list_first: usize,
    /// Emit a per-event record for every event instead of only the first `list_first`.
    pub record_every: bool,
    /// Leading events whose timings are discarded.
    pub warmup_events: usize,
    /// Optimizer calls per timing measurement; the mean is recorded.
    pub repeats: u32,
    /// Worker threads for sharded runs (1 keeps the run sequential).
    pub workers: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            events: 10_000,
            list_first: 3,
            record_every: false,
            warmup_events: 0,
            repeats: 1,
            workers: 1,
        }
    }
}

/// Failures while reading, parsing, or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl RunConfig {
    /// Reject values the optimizers and harness cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tol = &self.tolerance;
        if !(tol.epsilon > 0.0 && tol.epsilon < 1.0e-3) {
            return Err(invalid(format!("epsilon {} outside (0, 1e-3)", tol.epsilon)));
        }
        if !(tol.cross_validation >= tol.epsilon) {
            return Err(invalid(format!(
                "cross_validation tolerance {} is tighter than epsilon {}",
                tol.cross_validation, tol.epsilon
            )));
        }
        if tol.max_iterations == 0 {
            return Err(invalid("max_iterations must be at least 1".into()));
        }

        let generator = &self.generator;
        if !(generator.center_of_mass_gev > 0.0) {
            return Err(invalid("center_of_mass_gev must be positive".into()));
        }
        if !(0.0..=1.0).contains(&generator.three_jet_fraction) {
            return Err(invalid("three_jet_fraction must lie in [0, 1]".into()));
        }
        if generator.min_particles_per_jet == 0
            || generator.min_particles_per_jet > generator.max_particles_per_jet
        {
            return Err(invalid(format!(
                "particles per jet range [{}, {}] is empty",
                generator.min_particles_per_jet, generator.max_particles_per_jet
            )));
        }
        if !(generator.jet_width_gev >= 0.0) {
            return Err(invalid("jet_width_gev must be non-negative".into()));
        }
        if !(generator.max_cone_tan > 0.0) {
            return Err(invalid("max_cone_tan must be positive".into()));
        }
        if !(-1.0..=1.0).contains(&generator.hardest_jet_max_cos) {
            return Err(invalid("hardest_jet_max_cos must lie in [-1, 1]".into()));
        }
        if !(0.0..1.0).contains(&generator.hardest_jet_min_gap) {
            return Err(invalid("hardest_jet_min_gap must lie in [0, 1)".into()));
        }

        if self.harness.repeats == 0 {
            return Err(invalid("repeats must be at least 1".into()));
        }
        if self.harness.workers == 0 {
            return Err(invalid("workers must be at least 1".into()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}

/// Load and validate a run configuration from a TOML (`.toml`) or YAML file.
pub fn load_run_config<P: AsRef<Path>>(path: P) -> Result<RunConfig, ConfigError> {
    let path = path.as_ref();
    let config: RunConfig = if path.extension().map(|ext| ext == "toml").unwrap_or(false) {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)?
    } else {
        let reader = File::open(path)?;
        serde_yaml::from_reader(reader)?
    };
    config.validate()?;
    Ok(config)
}
