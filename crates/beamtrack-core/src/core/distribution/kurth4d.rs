use super::{PhaseSpacePoint, UnitSampler};
use rand::Rng;
use rand_distr::StandardNormal;
use std::f64::consts::PI;

/// 4D Kurth distribution transversely, uniform in `t` and Gaussian in `pt`.
///
/// The transverse part is a stationary distribution of a linear focusing channel with
/// space charge: uniform in the `(x, y)` disk with a fixed relation between radius and
/// the accessible momentum range.
pub(super) struct Kurth4D;

impl UnitSampler for Kurth4D {
    fn sample_unit(&self, rng: &mut impl Rng) -> PhaseSpacePoint {
        let r = rng.r#gen::<f64>().sqrt();
        let phi = 2.0 * PI * rng.r#gen::<f64>();
        let x = r * phi.cos();
        let y = r * phi.sin();

        let lz = r * (2.0 * rng.r#gen::<f64>() - 1.0);
        let alpha = PI * rng.r#gen::<f64>();

        let (pr, pphi) = if r > 0.0 {
            let pmax = (1.0 - (lz / r).powi(2) - r * r + lz * lz).max(0.0).sqrt();
            (pmax * alpha.cos(), lz / r)
        } else {
            (0.0, 0.0)
        };
        let px = pr * phi.cos() - pphi * phi.sin();
        let py = pr * phi.sin() + pphi * phi.cos();

        let t = 2.0 * (rng.r#gen::<f64>() - 0.5);
        let pt: f64 = rng.sample(StandardNormal);

        PhaseSpacePoint {
            x: 2.0 * x,
            y: 2.0 * y,
            t: 3.0_f64.sqrt() * t,
            px: 2.0 * px,
            py: 2.0 * py,
            pt,
        }
    }
}
