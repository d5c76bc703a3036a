//! Parametric 6D phase-space distributions used to sample a particle bunch.
//!
//! Every distribution is described by the same [`Moments`]: the rms sizes and momenta in the
//! three planes and one position-momentum correlation per plane. Each kind first draws a point
//! with unit variance in every coordinate and then applies the shared [`Moments::correlate`]
//! transform, so the second moments of the sampled bunch match the descriptor regardless of the
//! underlying shape.

mod gaussian;
mod kurth4d;
mod triangle;
mod waterbag;

use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum DistributionError {
    #[error("Distribution parameter '{name}' must be finite and non-negative, got {value}")]
    InvalidSigma { name: &'static str, value: f64 },
    #[error("Correlation '{name}' must lie strictly between -1 and 1, got {value}")]
    InvalidCorrelation { name: &'static str, value: f64 },
}

/// One sampled phase-space coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhaseSpacePoint {
    pub x: f64,
    pub y: f64,
    pub t: f64,
    pub px: f64,
    pub py: f64,
    pub pt: f64,
}

/// Second-moment description of a 6D phase-space ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Moments {
    pub sigma_x: f64,
    pub sigma_y: f64,
    pub sigma_t: f64,
    pub sigma_px: f64,
    pub sigma_py: f64,
    pub sigma_pt: f64,
    pub mu_xpx: f64,
    pub mu_ypy: f64,
    pub mu_tpt: f64,
}

impl Moments {
    /// Uncorrelated moments.
    pub fn new(
        sigma_x: f64,
        sigma_y: f64,
        sigma_t: f64,
        sigma_px: f64,
        sigma_py: f64,
        sigma_pt: f64,
    ) -> Self {
        Self {
            sigma_x,
            sigma_y,
            sigma_t,
            sigma_px,
            sigma_py,
            sigma_pt,
            ..Self::default()
        }
    }

    pub fn with_correlations(mut self, mu_xpx: f64, mu_ypy: f64, mu_tpt: f64) -> Self {
        self.mu_xpx = mu_xpx;
        self.mu_ypy = mu_ypy;
        self.mu_tpt = mu_tpt;
        self
    }

    pub fn validate(&self) -> Result<(), DistributionError> {
        let sigmas = [
            ("sigma_x", self.sigma_x),
            ("sigma_y", self.sigma_y),
            ("sigma_t", self.sigma_t),
            ("sigma_px", self.sigma_px),
            ("sigma_py", self.sigma_py),
            ("sigma_pt", self.sigma_pt),
        ];
        for (name, value) in sigmas {
            if !value.is_finite() || value < 0.0 {
                return Err(DistributionError::InvalidSigma { name, value });
            }
        }
        let correlations = [
            ("mu_xpx", self.mu_xpx),
            ("mu_ypy", self.mu_ypy),
            ("mu_tpt", self.mu_tpt),
        ];
        for (name, value) in correlations {
            if !value.is_finite() || value.abs() >= 1.0 {
                return Err(DistributionError::InvalidCorrelation { name, value });
            }
        }
        Ok(())
    }

    /// Maps a unit-variance point onto the requested second moments and correlations.
    pub fn correlate(&self, unit: PhaseSpacePoint) -> PhaseSpacePoint {
        let (x, px) = correlate_plane(unit.x, unit.px, self.sigma_x, self.sigma_px, self.mu_xpx);
        let (y, py) = correlate_plane(unit.y, unit.py, self.sigma_y, self.sigma_py, self.mu_ypy);
        let (t, pt) = correlate_plane(unit.t, unit.pt, self.sigma_t, self.sigma_pt, self.mu_tpt);
        PhaseSpacePoint {
            x,
            y,
            t,
            px,
            py,
            pt,
        }
    }
}

#[inline]
fn correlate_plane(q: f64, p: f64, sigma_q: f64, sigma_p: f64, mu: f64) -> (f64, f64) {
    let root = (1.0 - mu * mu).sqrt();
    (sigma_q * q / root, sigma_p * (-mu * q / root + p))
}

/// A unit-variance sample, before the moments transform.
trait UnitSampler {
    fn sample_unit(&self, rng: &mut impl Rng) -> PhaseSpacePoint;
}

/// The known distribution kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distribution {
    /// Places every particle on the reference orbit.
    Empty,
    Gaussian(Moments),
    Waterbag(Moments),
    Kurth4D(Moments),
    Triangle(Moments),
}

impl Distribution {
    pub fn name(&self) -> &'static str {
        match self {
            Distribution::Empty => "Empty",
            Distribution::Gaussian(_) => "Gaussian",
            Distribution::Waterbag(_) => "Waterbag",
            Distribution::Kurth4D(_) => "Kurth4D",
            Distribution::Triangle(_) => "Triangle",
        }
    }

    pub fn moments(&self) -> Option<&Moments> {
        match self {
            Distribution::Empty => None,
            Distribution::Gaussian(m)
            | Distribution::Waterbag(m)
            | Distribution::Kurth4D(m)
            | Distribution::Triangle(m) => Some(m),
        }
    }

    pub fn validate(&self) -> Result<(), DistributionError> {
        self.moments().map_or(Ok(()), Moments::validate)
    }

    pub fn sample(&self, rng: &mut impl Rng) -> PhaseSpacePoint {
        match self {
            Distribution::Empty => PhaseSpacePoint::default(),
            Distribution::Gaussian(m) => m.correlate(gaussian::Gaussian.sample_unit(rng)),
            Distribution::Waterbag(m) => m.correlate(waterbag::Waterbag.sample_unit(rng)),
            Distribution::Kurth4D(m) => m.correlate(kurth4d::Kurth4D.sample_unit(rng)),
            Distribution::Triangle(m) => m.correlate(triangle::Triangle.sample_unit(rng)),
        }
    }

    /// Draws `count` points in one go.
    pub fn sample_n(&self, count: usize, rng: &mut impl Rng) -> Vec<PhaseSpacePoint> {
        (0..count).map(|_| self.sample(rng)).collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::PhaseSpacePoint;

    pub fn variance(points: &[PhaseSpacePoint], f: impl Fn(&PhaseSpacePoint) -> f64) -> (f64, f64) {
        let n = points.len() as f64;
        let mean = points.iter().map(&f).sum::<f64>() / n;
        let var = points.iter().map(|p| (f(p) - mean).powi(2)).sum::<f64>() / n;
        (mean, var)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::variance;
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn validate_rejects_negative_sigma_and_unit_correlation() {
        let bad_sigma = Moments::new(-1.0, 1.0, 1.0, 1.0, 1.0, 1.0);
        assert_eq!(
            bad_sigma.validate(),
            Err(DistributionError::InvalidSigma {
                name: "sigma_x",
                value: -1.0
            })
        );

        let bad_mu = Moments::new(1.0, 1.0, 1.0, 1.0, 1.0, 1.0).with_correlations(0.0, 1.0, 0.0);
        assert!(matches!(
            bad_mu.validate(),
            Err(DistributionError::InvalidCorrelation { name: "mu_ypy", .. })
        ));
    }

    #[test]
    fn correlate_scales_uncorrelated_planes() {
        let moments = Moments::new(2.0, 3.0, 4.0, 5.0, 6.0, 7.0);
        let unit = PhaseSpacePoint {
            x: 1.0,
            y: 1.0,
            t: 1.0,
            px: 1.0,
            py: 1.0,
            pt: 1.0,
        };
        let out = moments.correlate(unit);
        assert_eq!((out.x, out.y, out.t), (2.0, 3.0, 4.0));
        assert_eq!((out.px, out.py, out.pt), (5.0, 6.0, 7.0));
    }

    #[test]
    fn empty_distribution_samples_the_origin() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(Distribution::Empty.sample(&mut rng), PhaseSpacePoint::default());
        assert!(Distribution::Empty.validate().is_ok());
    }

    #[test]
    fn correlated_sampling_reproduces_covariance() {
        let mu = 0.6;
        let moments = Moments::new(1.0, 1.0, 1.0, 1.0, 1.0, 1.0).with_correlations(mu, 0.0, 0.0);
        let mut rng = StdRng::seed_from_u64(7);
        let points = Distribution::Gaussian(moments).sample_n(40_000, &mut rng);

        let (_, var_x) = variance(&points, |p| p.x);
        let (_, var_px) = variance(&points, |p| p.px);
        let cov = points.iter().map(|p| p.x * p.px).sum::<f64>() / points.len() as f64;

        // x = q/sqrt(1-mu^2), px = p - mu*q/sqrt(1-mu^2): <x px> = -mu/(1-mu^2)
        let expected_var_x = 1.0 / (1.0 - mu * mu);
        assert!((var_x - expected_var_x).abs() / expected_var_x < 0.05);
        assert!((var_px - (1.0 + mu * mu * expected_var_x)).abs() < 0.1);
        assert!((cov + mu * expected_var_x).abs() < 0.05);
    }

    #[test]
    fn sampling_is_deterministic_for_a_seed() {
        let distr = Distribution::Triangle(Moments::new(1.0, 1.0, 1.0, 1.0, 1.0, 1.0));
        let a = distr.sample_n(8, &mut StdRng::seed_from_u64(42));
        let b = distr.sample_n(8, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
