use super::{PhaseSpacePoint, UnitSampler};
use rand::Rng;
use rand_distr::StandardNormal;

/// Independent unit normals in all six coordinates.
pub(super) struct Gaussian;

impl UnitSampler for Gaussian {
    fn sample_unit(&self, rng: &mut impl Rng) -> PhaseSpacePoint {
        PhaseSpacePoint {
            x: rng.sample(StandardNormal),
            y: rng.sample(StandardNormal),
            t: rng.sample(StandardNormal),
            px: rng.sample(StandardNormal),
            py: rng.sample(StandardNormal),
            pt: rng.sample(StandardNormal),
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
    fn unit_samples_have_zero_mean_and_unit_variance() {
        let mut rng = StdRng::seed_from_u64(3);
        let points: Vec<_> = (0..20_000).map(|_| Gaussian.sample_unit(&mut rng)).collect();
        let (mean_x, var_x) = variance(&points, |p| p.x);
        let (mean_py, var_py) = variance(&points, |p| p.py);
        let (mean_pt, var_pt) = variance(&points, |p| p.pt);
        for (mean, var) in [(mean_x, var_x), (mean_py, var_py), (mean_pt, var_pt)] {
            assert!(mean.abs() < 0.05);
            assert!((var - 1.0).abs() < 0.05);
        }
    }
}
