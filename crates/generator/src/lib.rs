//! Deterministic toy e+e- → two/three-jet event source.
//!
//! The generator only needs to supply realistic-looking final-state momenta to the shape
//! optimizers: massless partons are balanced exactly, then fragmented into collimated
//! particles whose momenta sum back to the parton momentum. Three-jet configurations are
//! restricted to a clearly hardest jet well separated from the other two; the cone and
//! separation cuts come from [`GeneratorConfig`] and can be opened up to produce ambiguous
//! topologies.

use std::f64::consts::PI;
use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shapes_config::GeneratorConfig;
use shapes_core::momentum::{Momentum, ThreeMomentum, collect_event};
use shapes_core::vector::{Vector3, add, any_orthogonal, cross, dot, norm, normalize, scale, sub};
use thiserror::Error;

const THREE_JET_ATTEMPTS: usize = 256;

/// Hadron species produced by the toy fragmentation (PDG codes).
const SPECIES: [i32; 3] = [211, -211, 111];

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("invalid generator configuration: {0}")]
    InvalidConfig(String),
}

/// A final-state particle record.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub id: i32,
    pub momentum: Vector3,
    pub energy: f64,
}

impl Particle {
    pub fn charge(&self) -> i32 {
        match self.id {
            211 => 1,
            -211 => -1,
            _ => 0,
        }
    }
}

impl ThreeMomentum for Particle {
    fn three_momentum(&self) -> Vector3 {
        self.momentum
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    TwoJet,
    ThreeJet,
}

/// One generated collision.
#[derive(Debug, Clone)]
pub struct GeneratedEvent {
    pub index: usize,
    pub topology: Topology,
    pub particles: Vec<Particle>,
}

impl GeneratedEvent {
    /// Final-state momenta in particle order.
    pub fn momenta(&self) -> Vec<Momentum> {
        collect_event(&self.particles)
    }
}

/// Running counters kept by the generator, printed at the end of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratorStats {
    pub events: usize,
    pub two_jet: usize,
    pub three_jet: usize,
    /// Three-jet kinematics discarded for failing the separation cuts.
    pub rejected_three_jet: usize,
    pub particles: usize,
}

impl GeneratorStats {
    pub fn mean_multiplicity(&self) -> f64 {
        if self.events == 0 {
            0.0
        } else {
            self.particles as f64 / self.events as f64
        }
    }
}

impl fmt::Display for GeneratorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " *-------  Toy Generator Statistics  -------*")?;
        writeln!(f, " | events generated        {:>12} |", self.events)?;
        writeln!(f, " | two-jet topology        {:>12} |", self.two_jet)?;
        writeln!(f, " | three-jet topology      {:>12} |", self.three_jet)?;
        writeln!(f, " | rejected 3-jet configs  {:>12} |", self.rejected_three_jet)?;
        writeln!(f, " | mean multiplicity       {:>12.3} |", self.mean_multiplicity())?;
        write!(f, " *------------------------------------------*")
    }
}

/// Seeded toy generator; the same configuration always yields the same event sequence.
#[derive(Debug, Clone)]
pub struct ToyEventGenerator {
    config: GeneratorConfig,
    rng: ChaCha8Rng,
    stats: GeneratorStats,
}

impl ToyEventGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self, GeneratorError> {
        if !(config.center_of_mass_gev > 0.0) {
            return Err(GeneratorError::InvalidConfig(
                "center_of_mass_gev must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&config.three_jet_fraction) {
            return Err(GeneratorError::InvalidConfig(
                "three_jet_fraction must lie in [0, 1]".into(),
            ));
        }
        if config.min_particles_per_jet == 0
            || config.min_particles_per_jet > config.max_particles_per_jet
        {
            return Err(GeneratorError::InvalidConfig(
                "particles per jet range is empty".into(),
            ));
        }
        if !(config.jet_width_gev >= 0.0) {
            return Err(GeneratorError::InvalidConfig(
                "jet_width_gev must be non-negative".into(),
            ));
        }
        if !(config.max_cone_tan > 0.0) {
            return Err(GeneratorError::InvalidConfig(
                "max_cone_tan must be positive".into(),
            ));
        }
        if !(-1.0..=1.0).contains(&config.hardest_jet_max_cos)
            || !(0.0..1.0).contains(&config.hardest_jet_min_gap)
        {
            return Err(GeneratorError::InvalidConfig(
                "three-jet separation cuts out of range".into(),
            ));
        }
        Ok(Self {
            config: config.clone(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            stats: GeneratorStats::default(),
        })
    }

    pub fn stats(&self) -> &GeneratorStats {
        &self.stats
    }

    pub fn next_event(&mut self) -> GeneratedEvent {
        let half_energy = 0.5 * self.config.center_of_mass_gev;
        let three_jet = if self.rng.gen_bool(self.config.three_jet_fraction) {
            self.three_jet_partons()
        } else {
            None
        };
        let (topology, fractions) = match three_jet {
            Some(partons) => (Topology::ThreeJet, partons.to_vec()),
            None => (Topology::TwoJet, vec![[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]]),
        };

        let (e1, e2) = self.random_frame();
        let mut particles = Vec::new();
        for parton in &fractions {
            let jet = scale(&add(&scale(&e1, parton[0]), &scale(&e2, parton[1])), half_energy);
            self.fragment(&jet, &mut particles);
        }

        let index = self.stats.events;
        self.stats.events += 1;
        self.stats.particles += particles.len();
        match topology {
            Topology::TwoJet => self.stats.two_jet += 1,
            Topology::ThreeJet => self.stats.three_jet += 1,
        }
        GeneratedEvent {
            index,
            topology,
            particles,
        }
    }

    /// Massless three-parton momenta in units of the beam energy, in a local (x, y) plane.
    fn three_jet_partons(&mut self) -> Option<[Vector3; 3]> {
        for _ in 0..THREE_JET_ATTEMPTS {
            let x1: f64 = self.rng.gen_range(0.4..1.0);
            let x2: f64 = self.rng.gen_range(0.4..1.0);
            let x3 = 2.0 - x1 - x2;
            if x3 <= 0.0 || x3 > 1.0 {
                self.stats.rejected_three_jet += 1;
                continue;
            }
            // Massless three-body kinematics: 1 - x3 = x1 x2 (1 - cos θ12) / 2.
            let cos12 = (1.0 - 2.0 * (1.0 - x3) / (x1 * x2)).clamp(-1.0, 1.0);
            let sin12 = (1.0 - cos12 * cos12).sqrt();
            let p1 = [x1, 0.0, 0.0];
            let p2 = [x2 * cos12, x2 * sin12, 0.0];
            let p3 = scale(&add(&p1, &p2), -1.0);
            let partons = [p1, p2, p3];
            if well_separated(&partons, &self.config) {
                return Some(partons);
            }
            self.stats.rejected_three_jet += 1;
        }
        None
    }

    /// Isotropic orientation: a random event axis and a random second direction orthogonal to it.
    fn random_frame(&mut self) -> (Vector3, Vector3) {
        let cos_theta: f64 = self.rng.gen_range(-1.0..=1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
        let phi: f64 = self.rng.gen_range(0.0..2.0 * PI);
        let axis = [sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta];
        let v0 = any_orthogonal(&axis);
        let w0 = cross(&axis, &v0);
        let psi: f64 = self.rng.gen_range(0.0..2.0 * PI);
        let second = add(&scale(&v0, psi.cos()), &scale(&w0, psi.sin()));
        (axis, second)
    }

    /// Split a jet into collimated massless particles whose momenta sum to the jet momentum.
    fn fragment(&mut self, jet: &Vector3, out: &mut Vec<Particle>) {
        let jet_momentum = norm(jet);
        let Ok(direction) = normalize(jet) else {
            return;
        };
        let a = any_orthogonal(&direction);
        let b = cross(&direction, &a);

        let count = self
            .rng
            .gen_range(self.config.min_particles_per_jet..=self.config.max_particles_per_jet);
        let weights: Vec<f64> = (0..count).map(|_| self.rng.gen_range(0.05..1.0)).collect();
        let weight_sum: f64 = weights.iter().sum();

        let mut fractions = Vec::with_capacity(count);
        let mut tilts = Vec::with_capacity(count);
        let mut recoil = [0.0; 3];
        for w in &weights {
            let z = w / weight_sum;
            let kt = (self.config.jet_width_gev * self.rng.gen_range(0.0..1.0))
                .min(self.config.max_cone_tan * z * jet_momentum);
            let phi: f64 = self.rng.gen_range(0.0..2.0 * PI);
            let tilt = scale(
                &add(&scale(&a, phi.cos()), &scale(&b, phi.sin())),
                kt / (z * jet_momentum),
            );
            recoil = add(&recoil, &scale(&tilt, z));
            fractions.push(z);
            tilts.push(tilt);
        }

        for (z, tilt) in fractions.into_iter().zip(tilts) {
            let transverse = scale(&sub(&tilt, &recoil), jet_momentum);
            let momentum = scale(&add(jet, &transverse), z);
            let id = SPECIES[self.rng.gen_range(0..SPECIES.len())];
            out.push(Particle {
                id,
                energy: norm(&momentum),
                momentum,
            });
        }
    }
}

impl Iterator for ToyEventGenerator {
    type Item = GeneratedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_event())
    }
}

/// The hardest parton must lead the others clearly and point well away from both.
fn well_separated(partons: &[Vector3; 3], cuts: &GeneratorConfig) -> bool {
    let norms = partons.map(|p| norm(&p));
    let hardest = (0..3)
        .max_by(|&i, &j| norms[i].total_cmp(&norms[j]))
        .unwrap_or(0);
    (0..3).filter(|&k| k != hardest).all(|k| {
        let cos = dot(&partons[hardest], &partons[k]) / (norms[hardest] * norms[k]);
        cos <= cuts.hardest_jet_max_cos && norms[hardest] - norms[k] >= cuts.hardest_jet_min_gap
    })
}
