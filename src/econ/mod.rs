//! Colony economy: the host's per-turn population, happiness, taxation and
//! mining formulas.

pub mod autotax;
pub mod colony;
pub mod race;
pub mod resources;

pub use autotax::{
    calc_auto_tax, calc_native_tax_for_happiness_change, calc_native_tax_rate_for_income,
    AutoTaxPolicy,
};
pub use colony::{advance, get_taxation_warnings, Colony, MaxPopulation, TaxationWarning};
pub use race::{ColonistRace, NativeRace};
pub use resources::{MineralStock, PlanetResources};
