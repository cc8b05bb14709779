//! Hemisphere-reassignment refinement: the fixed point of the thrust maximisation.

use shapes_core::vector::{DegenerateVectorError, Vector3, add, dot, normalize, sub};

/// Local optimum reached from one seed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Refinement {
    pub axis: Vector3,
    /// Σ|p·axis| (not yet divided by the total magnitude).
    pub projected: f64,
    pub iterations: usize,
    /// False when the iteration bound was reached before the signs settled.
    pub converged: bool,
}

/// Σ|p·axis| over the event.
pub fn projected_sum(momenta: &[Vector3], axis: &Vector3) -> f64 {
    momenta.iter().map(|p| dot(p, axis).abs()).sum()
}

/// Refine `seed` until no particle changes hemisphere or `max_iterations` is reached.
///
/// Every pass assigns each particle the sign of its projection on the current axis (a zero
/// projection counts as positive) and replaces the axis by the normalised signed sum. The
/// signs buffer is scratch space owned by the caller and is resized to the event.
pub fn refine(
    momenta: &[Vector3],
    seed: &Vector3,
    max_iterations: usize,
    signs: &mut Vec<bool>,
) -> Result<Refinement, DegenerateVectorError> {
    signs.clear();
    signs.resize(momenta.len(), true);

    let mut axis = *seed;
    for iteration in 1..=max_iterations {
        let mut flips = 0usize;
        let mut total = [0.0; 3];
        for (p, sign) in momenta.iter().zip(signs.iter_mut()) {
            let positive = dot(p, &axis) >= 0.0;
            if positive != *sign {
                flips += 1;
                *sign = positive;
            }
            total = if positive { add(&total, p) } else { sub(&total, p) };
        }
        if iteration > 1 && flips == 0 {
            return Ok(Refinement {
                axis,
                projected: projected_sum(momenta, &axis),
                iterations: iteration,
                converged: true,
            });
        }
        axis = normalize(&total)?;
    }

    Ok(Refinement {
        axis,
        projected: projected_sum(momenta, &axis),
        iterations: max_iterations,
        converged: false,
    })
}
