use crate::error::Result;
use beamtrack::core::constants::{species, species_names};

pub fn run() -> Result<()> {
    println!("{:<12} {:>10} {:>18}", "species", "charge/qe", "mass/MeV");
    for name in species_names() {
        if let Some(s) = species(name) {
            println!("{:<12} {:>10} {:>18}", name, s.charge_qe, s.mass_mev);
        }
    }
    Ok(())
}
