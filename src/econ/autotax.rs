use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::econ::colony::{round_even, Colony};
use crate::econ::race::{ColonistRace, NativeRace};
use crate::error::StarfoldError;

/// Named native tax policies offered by the game client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AutoTaxPolicy {
    Growth,
    GrowthPlus,
    Flat70,
    Flat40,
}

/// Happiness band a policy aims for. Offsets scale the happiness change at
/// zero tax into the band edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoTaxTargets {
    pub min_happy: i32,
    pub max_happy: i32,
    pub min_offset: i32,
    pub max_offset: i32,
    /// Floor used once natives have reached their population ceiling.
    pub max_pop_happy: i32,
}

impl AutoTaxPolicy {
    pub const ALL: [AutoTaxPolicy; 4] = [
        AutoTaxPolicy::Growth,
        AutoTaxPolicy::GrowthPlus,
        AutoTaxPolicy::Flat70,
        AutoTaxPolicy::Flat40,
    ];

    pub fn targets(self) -> AutoTaxTargets {
        match self {
            AutoTaxPolicy::Growth => AutoTaxTargets {
                min_happy: 70,
                max_happy: 100,
                min_offset: 0,
                max_offset: 0,
                max_pop_happy: 70,
            },
            AutoTaxPolicy::GrowthPlus => AutoTaxTargets {
                min_happy: 70,
                max_happy: 100,
                min_offset: -1,
                max_offset: 0,
                max_pop_happy: 40,
            },
            AutoTaxPolicy::Flat70 => AutoTaxTargets {
                min_happy: 70,
                max_happy: 70,
                min_offset: 0,
                max_offset: 0,
                max_pop_happy: 70,
            },
            AutoTaxPolicy::Flat40 => AutoTaxTargets {
                min_happy: 40,
                max_happy: 40,
                min_offset: 0,
                max_offset: 0,
                max_pop_happy: 40,
            },
        }
    }
}

impl FromStr for AutoTaxPolicy {
    type Err = StarfoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Growth" => Ok(AutoTaxPolicy::Growth),
            "Growth+" => Ok(AutoTaxPolicy::GrowthPlus),
            "Flat 70" => Ok(AutoTaxPolicy::Flat70),
            "Flat 40" => Ok(AutoTaxPolicy::Flat40),
            other => Err(StarfoldError::UnknownPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for AutoTaxPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AutoTaxPolicy::Growth => "Growth",
            AutoTaxPolicy::GrowthPlus => "Growth+",
            AutoTaxPolicy::Flat70 => "Flat 70",
            AutoTaxPolicy::Flat40 => "Flat 40",
        })
    }
}

/// Native tax rate that changes native happiness by `desired_change` this turn.
///
/// Inverts the happiness formula for an estimate, then settles on the highest
/// rate whose change is still at least `desired_change`.
pub fn calc_native_tax_for_happiness_change(
    colony: &Colony,
    nebula_bonus: bool,
    desired_change: i32,
) -> i32 {
    let change = |rate: i32| colony.native_happiness_change_at(rate, 0, nebula_bonus);
    let pop_penalty = (colony.native_clans as f64).sqrt();
    let dev_penalty = ((colony.factories + colony.mines) as f64 / 2.0).trunc();
    let gov_penalty = 50.0 * (10 - colony.native_government) as f64;

    let mut effective = desired_change;
    if colony.native_race == NativeRace::Avian {
        effective -= 10;
    }
    if nebula_bonus {
        effective -= 5;
    }

    let mut rate = round_even(
        (1000.0 - pop_penalty - dev_penalty - gov_penalty - 100.0 * effective as f64) / 85.0,
    )
    .clamp(0, 100);
    while rate > 0 && change(rate) < desired_change {
        rate -= 1;
    }
    while rate < 100 && change(rate + 1) >= desired_change {
        rate += 1;
    }
    rate
}

/// Smallest native tax rate yielding at least `full_income` megacredits.
pub fn calc_native_tax_rate_for_income(colony: &Colony, full_income: i32) -> i32 {
    let mut income = full_income as f64;
    if colony.native_race == NativeRace::Insectoid {
        income /= 2.0;
    }
    if colony.colonist_race == ColonistRace::Fed {
        income /= 2.0;
    }
    let denom = colony.native_clans as f64 * colony.native_government as f64;
    if denom == 0.0 {
        return 0;
    }
    let mut rate = round_even(income * 5000.0 / denom);
    if colony.native_tax_income_at(rate - 1) >= full_income {
        rate -= 1;
    }
    if colony.native_tax_income_at(rate) < full_income {
        rate += 1;
    }
    rate
}

/// Native tax rate chosen by an auto-tax policy.
pub fn calc_auto_tax(colony: &Colony, policy: AutoTaxPolicy) -> i32 {
    let targets = policy.targets();

    if colony.native_race.is_untaxable() || colony.native_clans == 0 {
        return 0;
    }

    let max_income = colony.native_tax_income_at(100);
    let max_income_rate = calc_native_tax_rate_for_income(colony, max_income);
    let max_income_delta = colony.native_happiness_change_at(max_income_rate, 0, false);
    let happy = colony.native_happiness;

    if colony.native_clans >= colony.native_max_population() {
        if happy + max_income_delta >= targets.max_pop_happy {
            return max_income_rate;
        }
        return calc_native_tax_for_happiness_change(colony, false, targets.max_pop_happy - happy);
    }

    let max_happy_change = colony.native_happiness_change_at(0, 0, false);
    let min_target = targets.min_happy + targets.min_offset * max_happy_change;
    if happy + max_income_delta >= min_target {
        return max_income_rate;
    }

    let max_target = targets.max_happy + targets.max_offset * max_happy_change;
    if happy + max_happy_change <= max_target {
        return 0;
    }

    calc_native_tax_for_happiness_change(colony, false, min_target - happy)
}
