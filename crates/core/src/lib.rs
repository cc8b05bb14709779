//! Core vector kernel, tolerances, and momentum primitives shared across the event shapes workspace.

/// Numeric tolerances. Everything downstream is expressed as a multiple of [`EPSILON`].
pub mod tolerance {
    /// Base tolerance for unit norms and orthogonality checks.
    pub const EPSILON: f64 = 1.0e-9;
    /// Below this norm a vector has no usable direction.
    pub const DEGENERATE_NORM: f64 = 1.0e-3 * EPSILON;
    /// Default allowed thrust difference between the two optimizer variants.
    pub const CROSS_VALIDATION: f64 = 1.0e3 * EPSILON;
    /// Default bound on hemisphere refinement iterations.
    pub const MAX_ITERATIONS: usize = 50;
}

/// Cartesian three-vector arithmetic on plain `[f64; 3]` arrays.
pub mod vector {
    use thiserror::Error;

    use crate::tolerance::DEGENERATE_NORM;

    /// Alias for a 3D vector (momentum in GeV/c, or a dimensionless direction).
    pub type Vector3 = [f64; 3];

    /// Unit vectors along x, y and z.
    pub const BASIS: [Vector3; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    /// Raised when a vector is too short to define a direction.
    #[derive(Debug, Clone, Copy, PartialEq, Error)]
    #[error("cannot normalize vector with norm {norm:e}")]
    pub struct DegenerateVectorError {
        pub norm: f64,
    }

    /// Euclidean length.
    #[inline]
    pub fn norm(v: &Vector3) -> f64 {
        dot(v, v).sqrt()
    }

    #[inline]
    pub fn dot(a: &Vector3, b: &Vector3) -> f64 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    /// Cross product `a × b`.
    #[inline]
    pub fn cross(a: &Vector3, b: &Vector3) -> Vector3 {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    #[inline]
    pub fn add(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
    }

    #[inline]
    pub fn sub(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    #[inline]
    pub fn scale(v: &Vector3, s: f64) -> Vector3 {
        [v[0] * s, v[1] * s, v[2] * s]
    }

    /// Unit vector along `v`.
    pub fn normalize(v: &Vector3) -> Result<Vector3, DegenerateVectorError> {
        let n = norm(v);
        if !(n >= DEGENERATE_NORM) {
            return Err(DegenerateVectorError { norm: n });
        }
        Ok(scale(v, 1.0 / n))
    }

    /// Component of `v` orthogonal to the unit vector `axis`.
    #[inline]
    pub fn reject(v: &Vector3, axis: &Vector3) -> Vector3 {
        sub(v, &scale(axis, dot(v, axis)))
    }

    /// Flip `v` so its z component is positive; zero components fall through to x, then y.
    pub fn canonical_sign(v: &Vector3) -> Vector3 {
        for i in [2, 0, 1] {
            if v[i] > 0.0 {
                return *v;
            }
            if v[i] < 0.0 {
                return scale(v, -1.0);
            }
        }
        *v
    }

    /// Deterministic unit vector orthogonal to the unit vector `axis`.
    pub fn any_orthogonal(axis: &Vector3) -> Vector3 {
        // Cross with the basis vector least aligned with the axis.
        let mut best = 0;
        for i in 1..3 {
            if axis[i].abs() < axis[best].abs() {
                best = i;
            }
        }
        let v = cross(axis, &BASIS[best]);
        let n = norm(&v);
        scale(&v, 1.0 / n)
    }
}

/// Particle momentum primitives consumed by the shape optimizers.
pub mod momentum {
    use crate::vector::{Vector3, norm};

    /// A final-state three-momentum with its cached magnitude.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Momentum {
        pub vector: Vector3,
        pub magnitude: f64,
    }

    impl Momentum {
        pub fn new(px: f64, py: f64, pz: f64) -> Self {
            Self::from_vector([px, py, pz])
        }

        pub fn from_vector(vector: Vector3) -> Self {
            Self {
                vector,
                magnitude: norm(&vector),
            }
        }

        #[inline]
        pub fn px(&self) -> f64 {
            self.vector[0]
        }

        #[inline]
        pub fn py(&self) -> f64 {
            self.vector[1]
        }

        #[inline]
        pub fn pz(&self) -> f64 {
            self.vector[2]
        }
    }

    impl From<Vector3> for Momentum {
        fn from(vector: Vector3) -> Self {
            Self::from_vector(vector)
        }
    }

    /// Anything that exposes a three-momentum: particle records, raw vectors, momenta.
    pub trait ThreeMomentum {
        fn three_momentum(&self) -> Vector3;
    }

    impl ThreeMomentum for Momentum {
        fn three_momentum(&self) -> Vector3 {
            self.vector
        }
    }

    impl ThreeMomentum for Vector3 {
        fn three_momentum(&self) -> Vector3 {
            *self
        }
    }

    /// Read the momenta of an ordered particle list into a fresh event.
    pub fn collect_event<'a, P, I>(particles: I) -> Vec<Momentum>
    where
        P: ThreeMomentum + 'a,
        I: IntoIterator<Item = &'a P>,
    {
        particles
            .into_iter()
            .map(|p| Momentum::from_vector(p.three_momentum()))
            .collect()
    }

    /// Sum of the momentum magnitudes of an event.
    pub fn total_magnitude(event: &[Momentum]) -> f64 {
        event.iter().map(|p| p.magnitude).sum()
    }
}
