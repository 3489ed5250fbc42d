use serde::{Deserialize, Serialize};

use crate::econ::colony::round_even;
use crate::galaxy::Planet;

/// One mineral on one planet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MineralStock {
    /// Mined and stored on the surface.
    pub orbital: i32,
    /// Still in the ground.
    pub ground: i32,
    /// Percentage extracted per mine per turn.
    pub density: i32,
}

impl MineralStock {
    /// Mine for one turn. Extraction never exceeds what is left in the
    /// ground; the host then trickles ceil(density / 20) back into it.
    fn mined(self, mines: i32) -> MineralStock {
        let extracted = self
            .ground
            .min(round_even(self.density as f64 / 100.0 * mines as f64))
            .max(0);
        let regenerated = (self.density as f64 / 20.0).ceil() as i32;
        MineralStock {
            orbital: self.orbital + extracted,
            ground: self.ground - extracted + regenerated,
            density: self.density,
        }
    }
}

/// Mineral stocks of a planet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanetResources {
    pub neutronium: MineralStock,
    pub duranium: MineralStock,
    pub tritanium: MineralStock,
    pub molybdenum: MineralStock,
}

impl PlanetResources {
    pub fn from_planet(planet: &Planet) -> Self {
        PlanetResources {
            neutronium: MineralStock {
                orbital: planet.neutronium,
                ground: planet.groundneutronium,
                density: planet.densityneutronium,
            },
            duranium: MineralStock {
                orbital: planet.duranium,
                ground: planet.groundduranium,
                density: planet.densityduranium,
            },
            tritanium: MineralStock {
                orbital: planet.tritanium,
                ground: planet.groundtritanium,
                density: planet.densitytritanium,
            },
            molybdenum: MineralStock {
                orbital: planet.molybdenum,
                ground: planet.groundmolybdenum,
                density: planet.densitymolybdenum,
            },
        }
    }

    /// Stocks after one turn of mining with `mines` mines.
    pub fn update_mining(&self, mines: i32) -> PlanetResources {
        PlanetResources {
            neutronium: self.neutronium.mined(mines),
            duranium: self.duranium.mined(mines),
            tritanium: self.tritanium.mined(mines),
            molybdenum: self.molybdenum.mined(mines),
        }
    }

    pub fn stocks(&self) -> [(&'static str, MineralStock); 4] {
        [
            ("Neutronium", self.neutronium),
            ("Duranium", self.duranium),
            ("Tritanium", self.tritanium),
            ("Molybdenum", self.molybdenum),
        ]
    }
}
