use phf::{Map, phf_map};

/// Speed of light in vacuum, in m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Elementary charge, in C.
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;

/// One MeV/c² expressed in kg.
pub const MEV_INV_C2: f64 = ELEMENTARY_CHARGE * 1.0e6 / (SPEED_OF_LIGHT * SPEED_OF_LIGHT);

/// Electron rest mass, in MeV/c².
pub const ELECTRON_MASS_MEV: f64 = 0.510_998_950;

/// Proton rest mass, in MeV/c².
pub const PROTON_MASS_MEV: f64 = 938.272_088_16;

pub const DEGREE_TO_RADIAN: f64 = std::f64::consts::PI / 180.0;

/// Charge (in elementary charges) and rest mass (in MeV/c²) of a named particle species.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Species {
    pub charge_qe: f64,
    pub mass_mev: f64,
}

static SPECIES: Map<&'static str, Species> = phf_map! {
    "electron" => Species { charge_qe: -1.0, mass_mev: ELECTRON_MASS_MEV },
    "positron" => Species { charge_qe: 1.0, mass_mev: ELECTRON_MASS_MEV },
    "proton" => Species { charge_qe: 1.0, mass_mev: PROTON_MASS_MEV },
    "antiproton" => Species { charge_qe: -1.0, mass_mev: PROTON_MASS_MEV },
    "muon" => Species { charge_qe: -1.0, mass_mev: 105.658_375_5 },
    "antimuon" => Species { charge_qe: 1.0, mass_mev: 105.658_375_5 },
    "deuteron" => Species { charge_qe: 1.0, mass_mev: 1_875.612_942_57 },
    "alpha" => Species { charge_qe: 2.0, mass_mev: 3_727.379_405_8 },
};

/// Looks up a species by name. Names are case-insensitive and surrounding whitespace is ignored.
pub fn species(name: &str) -> Option<Species> {
    SPECIES.get(name.trim().to_ascii_lowercase().as_str()).copied()
}

/// All known species names, sorted alphabetically.
pub fn species_names() -> Vec<&'static str> {
    let mut names: Vec<_> = SPECIES.keys().copied().collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_lookup_is_case_insensitive_and_trims() {
        let positron = species(" Positron ").unwrap();
        assert_eq!(positron.charge_qe, 1.0);
        assert_eq!(positron.mass_mev, ELECTRON_MASS_MEV);
    }

    #[test]
    fn species_lookup_returns_none_for_unknown_names() {
        assert!(species("graviton").is_none());
        assert!(species("").is_none());
    }

    #[test]
    fn species_names_are_sorted_and_complete() {
        let names = species_names();
        assert_eq!(names.len(), 8);
        assert_eq!(names.first(), Some(&"alpha"));
        assert!(names.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn mev_inv_c2_matches_electron_mass_in_kg() {
        let electron_kg = ELECTRON_MASS_MEV * MEV_INV_C2;
        assert!((electron_kg - 9.109_383_701_5e-31).abs() / 9.109e-31 < 1e-9);
    }
}
