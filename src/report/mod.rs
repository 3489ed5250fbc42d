pub mod econ;
pub mod freighters;
pub mod milint;
pub mod overlay;

pub use econ::{build_econ_report, build_forecast, EconRow, ForecastRow};
pub use freighters::{
    build_freighter_report, freighter_layer, freighter_sightings, short_hull_name, FreighterRow,
    FreighterSighting,
};
pub use milint::{build_milint_report, milint_layer, MilintQuery, MilintRow};
pub use overlay::{minefield_layer, owner_colour, sector_layer, Layer, Markup};
