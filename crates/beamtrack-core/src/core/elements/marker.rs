use super::BeamOptic;
use crate::core::particles::{Particle, RefPart};

/// Zero-length placeholder that leaves particles and the reference particle untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Marker;

impl BeamOptic for Marker {
    fn name(&self) -> &'static str {
        "Marker"
    }

    fn push_particle(&self, _particle: &mut Particle, _refpart: &RefPart) {}

    fn push_reference(&self, _refpart: &mut RefPart) {}
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::{Element, Marker};
    use super::*;

    #[test]
    fn marker_is_the_identity_map() {
        let mut refpart = reference(25.0);
        let before = refpart;
        let start = particle(1e-3, -2e-3, 3e-4, 4e-4, -5e-4, 0.01);
        let mut p = start;

        Marker.push_particle(&mut p, &refpart);
        Marker.push_reference(&mut refpart);

        assert_eq!(p, start);
        assert_eq!(refpart, before);
    }

    #[test]
    fn marker_is_thin() {
        let element = Element::from(Marker);
        assert_eq!(element.name(), "Marker");
        assert_eq!(element.length(), 0.0);
        assert_eq!(element.nslice(), 1);
    }
}
