use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::econ::race::{ColonistRace, NativeRace};
use crate::galaxy::Planet;

/// Clans the host kills per turn of civil war, on top of 30% of the population.
const CIVIL_WAR_BASE_LOSS: i32 = 100;
/// Natives above this population grow at half speed.
const CROWDED_NATIVES: i32 = 66_000;
/// Share of the population lost per turn on planets outside the habitable band.
const CLIMATE_DEATH_RATE: f64 = 0.1;
/// Happiness at or below which a population riots and pays no taxes.
const RIOT_HAPPINESS: i32 = 30;
pub const MAX_TAX_INCOME: i32 = 5000;

/// Round half to even, matching the reference figures the host publishes.
pub(crate) fn round_even(v: f64) -> i32 {
    v.round_ties_even() as i32
}

/// The sine growth curve, peaking at 50 degrees.
fn climate_curve(temperature: i32) -> f64 {
    (PI * ((100 - temperature) as f64 / 100.0)).sin()
}

/// State of a planetary colony for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colony {
    pub megacredits: i32,
    pub supplies: i32,
    pub factories: i32,
    pub mines: i32,
    pub clans: i32,
    pub native_clans: i32,
    /// Planet temperature, 0-100.
    pub temperature: i32,
    pub colonist_tax_rate: i32,
    pub native_tax_rate: i32,
    pub colonist_happiness: i32,
    pub native_happiness: i32,
    pub colonist_race: ColonistRace,
    pub native_race: NativeRace,
    /// Native government level, 0-10.
    pub native_government: i32,
}

/// Colonist population ceilings: `current` may sit below `absolute` on
/// planets outside the habitable band, where a share of the clans dies each turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxPopulation {
    pub current: i32,
    pub absolute: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxationWarning {
    CivilWar,
    ColonistsRioting,
    NativesRioting,
    Overpopulated,
    OverpopulationDeaths,
}

impl fmt::Display for TaxationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TaxationWarning::CivilWar => "Civil war! Large population losses expected.",
            TaxationWarning::ColonistsRioting => {
                "Colonists are rioting! Economic and population growth halted."
            }
            TaxationWarning::NativesRioting => {
                "Natives are rioting! Economic and population growth halted."
            }
            TaxationWarning::Overpopulated => {
                "Colonist population exceeds maximum planetary capacity."
            }
            TaxationWarning::OverpopulationDeaths => {
                "Overpopulated colonists will die due to lack of supplies."
            }
        };
        f.write_str(text)
    }
}

impl Colony {
    /// Map a planet record onto a colony. The colonist race is not part of the
    /// planet record; it comes from the viewing player's race.
    pub fn from_planet(planet: &Planet, colonist_race: ColonistRace) -> Self {
        Colony {
            megacredits: planet.megacredits,
            supplies: planet.supplies,
            factories: planet.factories,
            mines: planet.mines,
            clans: planet.clans,
            native_clans: planet.nativeclans,
            temperature: planet.temp,
            colonist_tax_rate: planet.colonisttaxrate,
            native_tax_rate: planet.nativetaxrate,
            colonist_happiness: planet.colonisthappypoints,
            native_happiness: planet.nativehappypoints,
            colonist_race,
            native_race: NativeRace::from_name(&planet.nativeracename),
            native_government: planet.nativegovernment,
        }
    }

    pub fn has_natives(&self) -> bool {
        self.native_clans > 0 && self.native_race != NativeRace::None
    }

    fn development(&self) -> f64 {
        (self.factories + self.mines) as f64
    }

    /// Happiness change of the colonists for this turn.
    pub fn colonist_happiness_change(&self, hiss_effect: i32) -> i32 {
        let temp_base = self.colonist_race.base_temperature();
        let raw = 1000.0
            - (self.clans as f64).sqrt()
            - 80.0 * self.colonist_tax_rate as f64
            - 3.0 * (temp_base - self.temperature).abs() as f64
            - self.development() / 3.0;
        (raw / 100.0).floor() as i32 + hiss_effect
    }

    /// Happiness change of the natives at their current tax rate.
    pub fn native_happiness_change(&self, hiss_effect: i32, nebula_bonus: bool) -> i32 {
        self.native_happiness_change_at(self.native_tax_rate, hiss_effect, nebula_bonus)
    }

    /// Happiness change of the natives if they were taxed at `tax_rate`.
    pub fn native_happiness_change_at(
        &self,
        tax_rate: i32,
        hiss_effect: i32,
        nebula_bonus: bool,
    ) -> i32 {
        let raw = 1000.0
            - (self.native_clans as f64).sqrt()
            - 85.0 * tax_rate as f64
            - self.development() / 2.0
            - 50.0 * (10 - self.native_government) as f64;
        let mut delta = (raw / 100.0).floor() as i32;
        if self.native_race == NativeRace::Avian {
            delta += 10;
        }
        if nebula_bonus {
            delta += 5;
        }
        delta + hiss_effect
    }

    /// Colonist tax income before riots are taken into account.
    pub fn colonist_tax_income(&self) -> i32 {
        let mut income =
            round_even(self.clans as f64 / 100.0 * self.colonist_tax_rate as f64 / 10.0);
        if self.colonist_race == ColonistRace::Fed {
            income *= 2;
        }
        income
    }

    pub fn native_tax_income(&self) -> i32 {
        self.native_tax_income_at(self.native_tax_rate)
    }

    /// Native tax income at a hypothetical tax rate.
    ///
    /// Natives can never pay more than the colonists present can collect.
    pub fn native_tax_income_at(&self, tax_rate: i32) -> i32 {
        if self.native_race.is_untaxable() {
            return 0;
        }
        let rate = if self.colonist_race == ColonistRace::Cyborg {
            tax_rate.min(20)
        } else {
            tax_rate
        };
        let mut income = round_even(
            self.native_clans as f64 / 100.0 * rate as f64 / 10.0
                * self.native_government as f64
                / 5.0,
        );
        if self.native_race == NativeRace::Insectoid {
            income *= 2;
        }
        if self.colonist_race == ColonistRace::Fed {
            income *= 2;
        }
        MAX_TAX_INCOME.min(self.clans.min(income))
    }

    /// Expected total tax income if nobody riots.
    pub fn income(&self) -> i32 {
        MAX_TAX_INCOME.min(self.colonist_tax_income() + self.native_tax_income())
    }

    /// Colonist growth before population limits and civil war.
    pub fn colonist_growth(&self) -> i32 {
        let mut growth = 0;

        if self.colonist_race == ColonistRace::Cyborg && self.native_race != NativeRace::Amorphous
        {
            growth = self.clans.min(self.native_clans);
        }

        let rate = if self.colonist_race == ColonistRace::Crystalline {
            (self.temperature * self.temperature) as f64 / 4000.0
        } else if (15..=84).contains(&self.temperature) {
            climate_curve(self.temperature)
        } else {
            0.0
        };
        let pop = self.clans as f64 / 20.0;
        let tax = 5.0 / (self.colonist_tax_rate + 5) as f64;
        growth += round_even(rate * pop * tax);

        if self.native_race == NativeRace::Amorphous && self.native_clans > 0 {
            growth -= 5.max(100 - self.native_happiness);
        }

        growth
    }

    pub fn native_max_population(&self) -> i32 {
        if self.native_race == NativeRace::Siliconoid {
            return self.temperature * 1000;
        }
        round_even(climate_curve(self.temperature) * 150_000.0)
    }

    pub fn native_growth(&self) -> i32 {
        let ceiling = self.native_max_population();
        let mut growth = 0;

        if self.colonist_race == ColonistRace::Cyborg && self.native_race != NativeRace::Amorphous
        {
            growth = -self.clans.min(self.native_clans);
        }

        let rate = if self.native_race == NativeRace::Siliconoid {
            self.temperature as f64 / 100.0
        } else {
            climate_curve(self.temperature)
        };
        let pop = self.native_clans as f64 / 20.0;
        let tax = 5.0 / (self.native_tax_rate + 5) as f64;
        growth += round_even(rate * pop * tax);

        if self.native_clans > CROWDED_NATIVES && growth > 0 {
            growth = round_even(growth as f64 / 2.0);
        }

        growth = growth.min(ceiling - self.native_clans);

        if self.colonist_race != ColonistRace::Cyborg {
            growth = growth.max(0);
        }
        growth
    }

    /// Colonist population ceilings, excluding clans kept alive by supplies.
    pub fn colonist_max_population(&self) -> MaxPopulation {
        let temp = self.temperature;
        let mut current = -1;
        let mut absolute;

        if self.colonist_race == ColonistRace::Crystalline {
            absolute = round_even(temp as f64 * 1000.0);
        } else {
            absolute = round_even(climate_curve(temp) * 100_000.0);
            let dying = (self.clans as f64 * CLIMATE_DEATH_RATE).trunc() as i32;
            if temp > 84 {
                absolute = ((20099.9 - 200.0 * temp as f64) * CLIMATE_DEATH_RATE).trunc() as i32;
                current = self.clans - dying - 2 * (100 - temp);
            } else if temp < 15 {
                absolute = ((299.9 + 200.0 * temp as f64) * CLIMATE_DEATH_RATE).trunc() as i32;
                current = self.clans - dying - 2 * (1 + temp);
            }
        }

        if temp <= 19 && self.colonist_race == ColonistRace::Rebels {
            absolute = absolute.max(90_000);
        }
        current = current.max(absolute);
        if self.colonist_race.survives_anywhere() {
            absolute = absolute.max(60);
        }
        MaxPopulation { current, absolute }
    }

    /// Advance the colony by one turn.
    ///
    /// `hiss_effect` is the happiness bonus of ships on a hiss mission, capped
    /// per population so it never lifts happiness past 100 on its own.
    pub fn advance(&self, hiss_effect: i32, nebula_bonus: bool) -> (Colony, Vec<TaxationWarning>) {
        let colonist_hiss = hiss_effect.min(100 - self.colonist_happiness);
        let native_hiss = hiss_effect.min(100 - self.native_happiness);

        let colonist_happiness =
            100.min(self.colonist_happiness + self.colonist_happiness_change(colonist_hiss));
        let native_happiness = if self.has_natives() {
            100.min(self.native_happiness + self.native_happiness_change(native_hiss, nebula_bonus))
        } else {
            100.min(self.native_happiness)
        };

        let mut colonist_income = self.colonist_tax_income();
        let mut native_income = self.native_tax_income();
        if colonist_happiness <= RIOT_HAPPINESS {
            colonist_income = 0;
        }
        if native_happiness <= RIOT_HAPPINESS {
            native_income = 0;
        }
        let tax_income = MAX_TAX_INCOME.min(colonist_income + native_income);

        let mut colonist_growth = self.colonist_growth();
        let mut native_growth = self.native_growth();
        let max_pop = self.colonist_max_population();

        let mut produced = self.factories;
        if self.native_race == NativeRace::Bovinoid {
            produced += self.clans.min(self.native_clans / 100);
        }

        // Clans above the ceiling survive only while supplies feed them.
        let supported = max_pop.current + self.supplies.max(0) / 4;
        let mut consumed = 0;
        if self.clans > supported {
            let excess = self.clans - supported;
            colonist_growth = -((excess + 9) / 10);
            consumed = 1 + excess / 400;
        } else if colonist_growth > 0 && self.clans > max_pop.absolute {
            colonist_growth = 0;
        }

        let native_war = self.has_natives() && native_happiness < 0;
        if colonist_happiness < 0 || native_war {
            colonist_growth -= round_even(self.clans as f64 * 0.3) + CIVIL_WAR_BASE_LOSS;
            if self.native_race != NativeRace::Amorphous && self.native_clans > 0 {
                native_growth -= round_even(self.native_clans as f64 * 0.3) + CIVIL_WAR_BASE_LOSS;
            }
        }

        let next = Colony {
            megacredits: 0.max(self.megacredits + tax_income),
            supplies: 0.max(self.supplies + produced - consumed),
            clans: 0.max(self.clans + colonist_growth),
            native_clans: 0.max(self.native_clans + native_growth),
            colonist_happiness,
            native_happiness,
            ..self.clone()
        };

        let ceiling = next.colonist_max_population().absolute;
        let warnings = get_taxation_warnings(&next, ceiling);
        (next, warnings)
    }

    /// Repeatedly advance the colony, returning one state per future turn.
    pub fn project(
        &self,
        turns: usize,
        hiss_effect: i32,
        nebula_bonus: bool,
    ) -> Vec<(Colony, Vec<TaxationWarning>)> {
        let mut out = Vec::with_capacity(turns);
        let mut current = self.clone();
        for _ in 0..turns {
            let (next, warnings) = current.advance(hiss_effect, nebula_bonus);
            out.push((next.clone(), warnings));
            current = next;
        }
        out
    }
}

/// Free function form of [`Colony::advance`].
pub fn advance(
    colony: &Colony,
    hiss_effect: i32,
    nebula_bonus: bool,
) -> (Colony, Vec<TaxationWarning>) {
    colony.advance(hiss_effect, nebula_bonus)
}

/// Warnings about the consequences of the current tax settings.
///
/// Rioting warnings are reported alongside a civil war warning, not instead of it.
pub fn get_taxation_warnings(colony: &Colony, max_colonist_population: i32) -> Vec<TaxationWarning> {
    let mut warnings = Vec::new();
    let natives = colony.has_natives();

    if colony.colonist_happiness < 0 || (natives && colony.native_happiness < 0) {
        warnings.push(TaxationWarning::CivilWar);
    }
    if colony.colonist_happiness < RIOT_HAPPINESS {
        warnings.push(TaxationWarning::ColonistsRioting);
    }
    if natives && colony.native_happiness < RIOT_HAPPINESS {
        warnings.push(TaxationWarning::NativesRioting);
    }
    if colony.clans > max_colonist_population {
        warnings.push(TaxationWarning::Overpopulated);
        if colony.supplies == 0 {
            warnings.push(TaxationWarning::OverpopulationDeaths);
        }
    }
    warnings
}
