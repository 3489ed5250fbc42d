use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::minefield::engine::MinefieldSet;

/// Per-turn aggregate metrics of the reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnStatistics {
    pub turn: u32,
    pub live_fields: u32,
    pub web_fields: u32,
    pub total_units: i64,
    pub units_by_owner: BTreeMap<u32, i64>,
    pub largest_radius: i32,
    /// Events that changed a minefield this turn.
    pub events_applied: u32,
    /// Events dropped because they could not be decoded or matched a field.
    pub events_skipped: u32,
    pub units_countermined: i64,
    pub sanity_evictions: u32,
}

/// Compute state statistics for the minefields alive after a turn. Event
/// counters are filled in by the tracker.
pub fn compute_statistics(turn: u32, fields: &MinefieldSet) -> TurnStatistics {
    let mut units_by_owner: BTreeMap<u32, i64> = BTreeMap::new();
    let mut total_units = 0_i64;
    let mut web_fields = 0;
    let mut largest_radius = 0;

    for field in fields.values() {
        *units_by_owner.entry(field.owner_id).or_insert(0) += field.mine_units as i64;
        total_units += field.mine_units as i64;
        if field.is_web {
            web_fields += 1;
        }
        largest_radius = largest_radius.max(field.radius);
    }

    TurnStatistics {
        turn,
        live_fields: fields.len() as u32,
        web_fields,
        total_units,
        units_by_owner,
        largest_radius,
        ..TurnStatistics::default()
    }
}
