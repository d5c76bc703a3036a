use super::{PhaseSpacePoint, UnitSampler};
use rand::Rng;
use rand::distributions::Open01;
use rand_distr::StandardNormal;

/// Ramped triangular current profile in `t` with a Gaussian `pt`, 4D waterbag transversely.
///
/// This is the usual bunch model for beams injected into plasma accelerating stages.
pub(super) struct Triangle;

const TRANSVERSE_DIMENSION: f64 = 4.0;

impl UnitSampler for Triangle {
    fn sample_unit(&self, rng: &mut impl Rng) -> PhaseSpacePoint {
        // Inverse CDF of a linear ramp on [-sqrt(2), 2 sqrt(2)], zero mean and unit variance.
        let t = 2.0_f64.sqrt() * (2.0 - 3.0 * rng.r#gen::<f64>().sqrt());

        let g: [f64; 4] = std::array::from_fn(|_| rng.sample(StandardNormal));
        let pt: f64 = rng.sample(StandardNormal);

        let norm = g.iter().map(|v| v * v).sum::<f64>().sqrt();
        let u: f64 = rng.sample(Open01);
        let radius = (TRANSVERSE_DIMENSION + 2.0).sqrt() * u.powf(1.0 / TRANSVERSE_DIMENSION);
        let scale = radius / norm;

        PhaseSpacePoint {
            x: g[0] * scale,
            y: g[1] * scale,
            t,
            px: g[2] * scale,
            py: g[3] * scale,
            pt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::variance;
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn time_profile_is_a_ramp_with_unit_variance() {
        let mut rng = StdRng::seed_from_u64(21);
        let points: Vec<_> = (0..20_000).map(|_| Triangle.sample_unit(&mut rng)).collect();
        let (mean_t, var_t) = variance(&points, |p| p.t);
        assert!(mean_t.abs() < 0.05);
        assert!((var_t - 1.0).abs() < 0.05);

        let lower = -(2.0_f64.sqrt()) - 1e-12;
        let upper = 2.0 * 2.0_f64.sqrt() + 1e-12;
        assert!(points.iter().all(|p| p.t >= lower && p.t <= upper));
    }

    #[test]
    fn transverse_coordinates_have_unit_variance() {
        let mut rng = StdRng::seed_from_u64(22);
        let points: Vec<_> = (0..20_000).map(|_| Triangle.sample_unit(&mut rng)).collect();
        let (_, var_x) = variance(&points, |p| p.x);
        let (_, var_py) = variance(&points, |p| p.py);
        assert!((var_x - 1.0).abs() < 0.05);
        assert!((var_py - 1.0).abs() < 0.05);
    }
}
