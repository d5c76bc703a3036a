use super::{PhaseSpacePoint, UnitSampler};
use rand::Rng;
use rand::distributions::Open01;
use rand_distr::StandardNormal;

/// Uniform filling of a 6D ball, scaled so each coordinate has unit variance.
pub(super) struct Waterbag;

const DIMENSION: f64 = 6.0;

impl UnitSampler for Waterbag {
    fn sample_unit(&self, rng: &mut impl Rng) -> PhaseSpacePoint {
        // Isotropic direction from a normal vector, radius from the volume CDF.
        let g: [f64; 6] = std::array::from_fn(|_| rng.sample(StandardNormal));
        let norm = g.iter().map(|v| v * v).sum::<f64>().sqrt();
        let u: f64 = rng.sample(Open01);
        let radius = (DIMENSION + 2.0).sqrt() * u.powf(1.0 / DIMENSION);
        let scale = radius / norm;

        PhaseSpacePoint {
            x: g[0] * scale,
            y: g[1] * scale,
            t: g[2] * scale,
            px: g[3] * scale,
            py: g[4] * scale,
            pt: g[5] * scale,
        }
    }
}
