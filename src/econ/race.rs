use serde::{Deserialize, Serialize};

/// The player race owning a colony, parsed from the race adjective.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColonistRace {
    Fed,
    Lizard,
    BirdMan,
    Fascist,
    Privateer,
    Cyborg,
    Crystalline,
    Empire,
    Robots,
    Rebels,
    Colonies,
    Horwasp,
    Fury,
    Other(String),
}

impl ColonistRace {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Fed" => ColonistRace::Fed,
            "Lizard" => ColonistRace::Lizard,
            "Bird Man" => ColonistRace::BirdMan,
            "Fascist" => ColonistRace::Fascist,
            "Privateer" => ColonistRace::Privateer,
            "Cyborg" => ColonistRace::Cyborg,
            "Crystal" | "Crystalline" => ColonistRace::Crystalline,
            "Empire" => ColonistRace::Empire,
            "Robots" | "Robotic" => ColonistRace::Robots,
            "Rebels" | "Rebel" => ColonistRace::Rebels,
            "Colonies" | "Colonial" => ColonistRace::Colonies,
            "Horwasp" => ColonistRace::Horwasp,
            "Fury" => ColonistRace::Fury,
            other => ColonistRace::Other(other.to_string()),
        }
    }

    /// Temperature the race is happiest at.
    pub fn base_temperature(&self) -> i32 {
        match self {
            ColonistRace::Crystalline => 100,
            _ => 50,
        }
    }

    /// Races that can hold at least 60 clans on any planet.
    pub fn survives_anywhere(&self) -> bool {
        matches!(
            self,
            ColonistRace::Fury | ColonistRace::Robots | ColonistRace::Rebels | ColonistRace::Colonies
        )
    }
}

/// The native population of a planet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NativeRace {
    None,
    Humanoid,
    Bovinoid,
    Reptilian,
    Avian,
    Amorphous,
    Insectoid,
    Amphibian,
    Ghipsoldal,
    Siliconoid,
    Other(String),
}

impl NativeRace {
    pub fn from_name(name: &str) -> Self {
        match name {
            "" | "none" | "None" => NativeRace::None,
            "Humanoid" => NativeRace::Humanoid,
            "Bovinoid" => NativeRace::Bovinoid,
            "Reptilian" => NativeRace::Reptilian,
            "Avian" => NativeRace::Avian,
            "Amorphous" => NativeRace::Amorphous,
            "Insectoid" => NativeRace::Insectoid,
            "Amphibian" => NativeRace::Amphibian,
            "Ghipsoldal" => NativeRace::Ghipsoldal,
            "Siliconoid" => NativeRace::Siliconoid,
            other => NativeRace::Other(other.to_string()),
        }
    }

    /// Natives that never pay taxes.
    pub fn is_untaxable(&self) -> bool {
        matches!(self, NativeRace::None | NativeRace::Amorphous)
    }
}
