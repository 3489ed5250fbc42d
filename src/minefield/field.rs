use std::fmt;

use serde::{Deserialize, Serialize};

use crate::econ::colony::round_even;
use crate::space::geometry::distance;

pub const MAX_RADIUS: i32 = 150;
/// Robot minefields spread each unit over four times the area.
pub const ROBOT_SCALE: i32 = 4;

/// A minefield as reconstructed from messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Minefield {
    pub id: u32,
    pub owner_id: u32,
    pub x: i32,
    pub y: i32,
    pub is_web: bool,
    pub is_robot_owned: bool,
    pub mine_units: i32,
    /// Always `min(150, floor(sqrt(mine_units * scale)))`.
    pub radius: i32,
}

pub fn calc_radius(mine_units: i32, scale: i32) -> i32 {
    let r = ((mine_units.max(0) as f64) * scale as f64).sqrt().floor() as i32;
    r.min(MAX_RADIUS)
}

impl Minefield {
    pub fn new(
        id: u32,
        owner_id: u32,
        position: (i32, i32),
        is_web: bool,
        is_robot_owned: bool,
        mine_units: i32,
    ) -> Self {
        let mut field = Minefield {
            id,
            owner_id,
            x: position.0,
            y: position.1,
            is_web,
            is_robot_owned,
            mine_units: 0,
            radius: 0,
        };
        field.set_mines(mine_units);
        field
    }

    pub fn scale(&self) -> i32 {
        if self.is_robot_owned { ROBOT_SCALE } else { 1 }
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn distance_to(&self, other: &Minefield) -> f64 {
        distance(self.position(), other.position())
    }

    /// Add `delta` units, never dropping below zero.
    pub fn update(&mut self, delta: i32) {
        self.set_mines(self.mine_units.saturating_add(delta));
    }

    pub fn set_mines(&mut self, mine_units: i32) {
        self.mine_units = mine_units.max(0);
        self.radius = calc_radius(self.mine_units, self.scale());
    }

    /// Set the field from a reported radius, deriving the unit count.
    pub fn set_radius(&mut self, radius: i32) {
        let units = round_even(radius.saturating_mul(radius) as f64 / self.scale() as f64);
        self.set_mines(units);
    }

    /// One turn of natural decay: `round(units * rate)` plus one more unit.
    pub fn decay(&mut self, decay_rate: f64) {
        self.update(-round_even(self.mine_units as f64 * decay_rate) - 1);
    }

    /// Remove mines scooped into torpedoes.
    pub fn scoop(&mut self, scooped: i32) {
        self.update(scooped.saturating_mul(self.scale()).saturating_neg());
    }

    pub fn is_empty(&self) -> bool {
        self.mine_units == 0
    }
}

impl fmt::Display for Minefield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_web { "W" } else { "M" };
        write!(
            f,
            "{}{},{},{},{},{},{}",
            kind, self.id, self.x, self.y, self.owner_id, self.mine_units, self.radius
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_consistent(field: &Minefield) {
        let expected = ((field.mine_units * field.scale()) as f64).sqrt().floor() as i32;
        assert_eq!(field.radius, expected.min(MAX_RADIUS), "{}", field);
        assert!(field.mine_units >= 0);
    }

    #[test]
    fn decay_from_4900() {
        let mut field = Minefield::new(1, 2, (100, 100), false, false, 4900);
        assert_eq!(field.radius, 70);
        field.decay(0.05);
        assert_eq!(field.mine_units, 4654);
        assert_eq!(field.radius, 68);
    }

    #[test]
    fn radius_consistent_after_every_mutation() {
        for robot in [false, true] {
            let mut field = Minefield::new(1, 2, (0, 0), false, robot, 30_000);
            assert_consistent(&field);
            field.decay(0.05);
            assert_consistent(&field);
            field.scoop(100);
            assert_consistent(&field);
            field.set_mines(777);
            assert_consistent(&field);
            field.set_radius(33);
            assert_consistent(&field);
            field.update(-5000);
            assert_consistent(&field);
            assert!(field.is_empty());
        }
    }

    #[test]
    fn radius_capped_at_150() {
        let field = Minefield::new(1, 2, (0, 0), false, false, 40_000);
        assert_eq!(field.radius, 150);
    }

    #[test]
    fn robot_fields_scale_by_four() {
        let mut field = Minefield::new(1, 9, (0, 0), false, true, 100);
        assert_eq!(field.radius, 20);
        field.set_radius(10);
        assert_eq!(field.mine_units, 25);
        assert_eq!(field.radius, 10);
        field.scoop(5);
        assert_eq!(field.mine_units, 5);
    }

    #[test]
    fn oversized_reports_saturate() {
        let mut field = Minefield::new(1, 9, (0, 0), false, true, 100);
        field.set_radius(i32::MAX);
        assert_eq!(field.radius, MAX_RADIUS);
        assert!(field.mine_units > 0);
        field.update(i32::MAX);
        assert_eq!(field.mine_units, i32::MAX);
        field.scoop(i32::MAX);
        assert!(field.is_empty());
        assert_eq!(field.radius, 0);
    }

    #[test]
    fn decay_removes_at_least_one_unit() {
        let mut field = Minefield::new(1, 2, (0, 0), false, false, 1);
        field.decay(0.05);
        assert!(field.is_empty());
        field.decay(0.05);
        assert_eq!(field.mine_units, 0);
    }

    #[test]
    fn display_line() {
        let field = Minefield::new(12, 3, (1500, 1720), true, false, 400);
        assert_eq!(field.to_string(), "W12,1500,1720,3,400,20");
    }
}
