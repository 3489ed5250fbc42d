//! Decoding of host narration messages into minefield events.
//!
//! The host reports minefield activity only as English prose. The body
//! fragments matched here are the wire format and must stay verbatim,
//! including the host's spelling ("accross", "torpedos").

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::galaxy::Message;

pub const MSG_MINELAYING: i32 = 3;
pub const MSG_MINE_SWEEP: i32 = 4;
pub const MSG_SHIP: i32 = 8;
pub const MSG_ENEMY_DISTRESS: i32 = 9;
pub const MSG_DISTRESS: i32 = 16;
pub const MSG_MINE_SCAN: i32 = 19;

const LAY_MINES: &str = "We have converted our torpedoes into deep space mines";
const LAY_WEB: &str = "They are web style mines";
const LAY_UNITS: &str = "now contains ";
const LAY_RADIUS: &str = " mine units and is ";
const LAY_TAIL: &str = " light years in radius";
const COLLISION: &str = "has come in contact with the";
const COLLISION_DAMAGE: &str = "and has been partly destroyed";
const COLLISION_RADIUS: &str = "It is now ";
const COLLISION_TAIL: &str = " light years accross";
const SWEEP: &str = "Firing beam weapons at random, wide setting to clear mines.";
const SWEEP_REMAIN: &str = " mines remain.";
const SCOOP: &str = "We have scooped up mines from our minefield";
const SCOOP_ID: &str = "minefield #";
const SCOOP_UNITS: &str = ". ";
const SCOOP_TAIL: &str = " units have been converted into ";
const DETONATIONS: &str = "We are detecting minefield detonations";
const DETONATIONS_COUNT: &str = "Explosions detected: ";
const SCAN_OWN: &str = "We have scanned our minefield";
const SCAN_ENEMY: &str = "We have detected an enemy minefield";
const SCAN_UNITS: &str = "contains ";
const SCAN_TAIL: &str = " mine units";
const STRUCK_MINE: &str = "struck a mine";
const STRUCK_WEB: &str = "struck a web mine";
const GLORY: &str = "shockwave";

/// Classified minefield narration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MineEvent {
    /// Mines laid; `units` is the field's new total.
    LayMines {
        minefield_id: u32,
        owner_id: u32,
        x: i32,
        y: i32,
        is_web: bool,
        units: i32,
        radius: i32,
    },
    /// Star cluster or debris disk contact; the field shrank to `radius`.
    Collision { minefield_id: u32, radius: i32 },
    /// Beam sweep; `remaining` units survived.
    Sweep { minefield_id: u32, remaining: i32 },
    /// Mines converted back into torpedoes.
    Scoop { minefield_id: u32, scooped: i32 },
    ScanEnemy { minefield_id: u32, units: i32 },
    ScanOwn { minefield_id: u32, units: i32 },
    Detonations { count: i32 },
    Strike { web: bool },
    Glory,
    Unknown,
}

impl MineEvent {
    /// Events that report an authoritative unit count for their minefield.
    pub fn is_authoritative(&self) -> bool {
        matches!(
            self,
            MineEvent::LayMines { .. }
                | MineEvent::Collision { .. }
                | MineEvent::Sweep { .. }
                | MineEvent::ScanEnemy { .. }
                | MineEvent::ScanOwn { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Lay,
    Collision,
    Sweep,
    Scoop,
    Scan,
    Detonations,
}

impl EventKind {
    /// Lay and collision messages construct state; a malformed one means the
    /// input cannot be trusted. The rest only adjust existing fields.
    pub fn is_fatal(self) -> bool {
        matches!(self, EventKind::Lay | EventKind::Collision)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventKind::Lay => "mine laying",
            EventKind::Collision => "minefield collision",
            EventKind::Sweep => "mine sweep",
            EventKind::Scoop => "mine scoop",
            EventKind::Scan => "mine scan",
            EventKind::Detonations => "minefield detonation",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("message {message_id}: malformed {kind} report: {detail}")]
pub struct MessageParseError {
    pub message_id: u32,
    pub kind: EventKind,
    pub detail: String,
}

impl MessageParseError {
    fn new(msg: &Message, kind: EventKind, detail: &str) -> Self {
        MessageParseError {
            message_id: msg.id,
            kind,
            detail: detail.to_string(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

/// Leading unsigned integer of `s` and the rest of the string.
fn split_int(s: &str) -> Option<(i32, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let value = s[..end].parse().ok()?;
    Some((value, &s[end..]))
}

/// Integer immediately after the first `prefix`, followed by `suffix`.
fn int_between(body: &str, prefix: &str, suffix: &str) -> Option<i32> {
    let start = body.find(prefix)? + prefix.len();
    let (value, rest) = split_int(&body[start..])?;
    rest.starts_with(suffix).then_some(value)
}

/// Integer immediately before the first `suffix`.
fn int_before(body: &str, suffix: &str) -> Option<i32> {
    let end = body.find(suffix)?;
    let head = &body[..end];
    let digits = head.len() - head.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    head[end - digits..].parse().ok()
}

fn target_id(msg: &Message, kind: EventKind) -> Result<u32, MessageParseError> {
    u32::try_from(msg.target)
        .map_err(|_| MessageParseError::new(msg, kind, "target is not a minefield id"))
}

fn parse_lay(body: &str) -> Option<(i32, i32)> {
    let start = body.find(LAY_UNITS)? + LAY_UNITS.len();
    let (units, rest) = split_int(&body[start..])?;
    let (radius, rest) = split_int(rest.strip_prefix(LAY_RADIUS)?)?;
    rest.starts_with(LAY_TAIL).then_some((units, radius))
}

fn parse_scoop(body: &str) -> Option<(u32, i32)> {
    let start = body.find(SCOOP)?;
    let after = &body[start..];
    let id_start = after.find(SCOOP_ID)? + SCOOP_ID.len();
    let (id, rest) = split_int(&after[id_start..])?;
    let (scooped, rest) = split_int(rest.strip_prefix(SCOOP_UNITS)?)?;
    rest.starts_with(SCOOP_TAIL)
        .then(|| u32::try_from(id).ok().map(|id| (id, scooped)))
        .flatten()
}

/// Classify one message. Messages unrelated to minefields decode to
/// [`MineEvent::Unknown`].
pub fn decode(msg: &Message) -> Result<MineEvent, MessageParseError> {
    let body = msg.body.as_str();
    match msg.messagetype {
        MSG_MINELAYING if body.contains(LAY_MINES) => {
            let minefield_id = target_id(msg, EventKind::Lay)?;
            let (units, radius) = parse_lay(body).ok_or_else(|| {
                MessageParseError::new(msg, EventKind::Lay, "no mine unit count and radius")
            })?;
            Ok(MineEvent::LayMines {
                minefield_id,
                owner_id: msg.ownerid,
                x: msg.x,
                y: msg.y,
                is_web: body.contains(LAY_WEB),
                units,
                radius,
            })
        }
        MSG_MINELAYING if body.contains(COLLISION) && body.contains(COLLISION_DAMAGE) => {
            let minefield_id = target_id(msg, EventKind::Collision)?;
            let radius = int_between(body, COLLISION_RADIUS, COLLISION_TAIL).ok_or_else(|| {
                MessageParseError::new(msg, EventKind::Collision, "no remaining radius")
            })?;
            Ok(MineEvent::Collision {
                minefield_id,
                radius,
            })
        }
        MSG_MINE_SWEEP if body.contains(SWEEP) => {
            let minefield_id = target_id(msg, EventKind::Sweep)?;
            let remaining = int_before(body, SWEEP_REMAIN).ok_or_else(|| {
                MessageParseError::new(msg, EventKind::Sweep, "no remaining mine count")
            })?;
            Ok(MineEvent::Sweep {
                minefield_id,
                remaining,
            })
        }
        MSG_MINE_SWEEP if body.contains(SCOOP) => {
            let (minefield_id, scooped) = parse_scoop(body).ok_or_else(|| {
                MessageParseError::new(msg, EventKind::Scoop, "no minefield id and scooped units")
            })?;
            Ok(MineEvent::Scoop {
                minefield_id,
                scooped,
            })
        }
        MSG_MINE_SWEEP if body.contains(DETONATIONS) => {
            let count = int_between(body, DETONATIONS_COUNT, "").ok_or_else(|| {
                MessageParseError::new(msg, EventKind::Detonations, "no explosion count")
            })?;
            Ok(MineEvent::Detonations { count })
        }
        MSG_MINE_SCAN if body.contains(SCAN_OWN) || body.contains(SCAN_ENEMY) => {
            let minefield_id = target_id(msg, EventKind::Scan)?;
            let units = int_between(body, SCAN_UNITS, SCAN_TAIL).ok_or_else(|| {
                MessageParseError::new(msg, EventKind::Scan, "no mine unit count")
            })?;
            if body.contains(SCAN_OWN) {
                Ok(MineEvent::ScanOwn {
                    minefield_id,
                    units,
                })
            } else {
                Ok(MineEvent::ScanEnemy {
                    minefield_id,
                    units,
                })
            }
        }
        MSG_DISTRESS if body.contains(STRUCK_WEB) => Ok(MineEvent::Strike { web: true }),
        MSG_DISTRESS if body.contains(STRUCK_MINE) => Ok(MineEvent::Strike { web: false }),
        MSG_SHIP | MSG_ENEMY_DISTRESS if body.contains(GLORY) => Ok(MineEvent::Glory),
        _ => Ok(MineEvent::Unknown),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::fixtures::message;

    #[test]
    fn lay_mines() {
        let msg = message(
            10,
            3,
            5,
            42,
            "We have converted our torpedoes into deep space mines and laid them in a field. \
             The minefield now contains 4900 mine units and is 70 light years in radius.",
        );
        assert_eq!(
            decode(&msg).unwrap(),
            MineEvent::LayMines {
                minefield_id: 42,
                owner_id: 1,
                x: 1000,
                y: 1000,
                is_web: false,
                units: 4900,
                radius: 70,
            }
        );
    }

    #[test]
    fn lay_web_mines() {
        let msg = message(
            10,
            3,
            5,
            7,
            "We have converted our torpedoes into deep space mines. They are web style mines. \
             Minefield 7 now contains 400 mine units and is 20 light years in radius.",
        );
        assert!(matches!(
            decode(&msg).unwrap(),
            MineEvent::LayMines { is_web: true, units: 400, .. }
        ));
    }

    #[test]
    fn malformed_lay_is_fatal() {
        let msg = message(
            11,
            3,
            5,
            42,
            "We have converted our torpedoes into deep space mines. The minefield now contains many mine units.",
        );
        let err = decode(&msg).unwrap_err();
        assert_eq!(err.kind, EventKind::Lay);
        assert!(err.is_fatal());
        assert_eq!(err.message_id, 11);
    }

    #[test]
    fn collision_keeps_host_spelling() {
        let msg = message(
            12,
            3,
            5,
            42,
            "Minefield 42 has come in contact with the Omega Star Cluster and has been partly destroyed. \
             It is now 31 light years accross.",
        );
        assert_eq!(
            decode(&msg).unwrap(),
            MineEvent::Collision { minefield_id: 42, radius: 31 }
        );
        let fixed = message(13, 3, 5, 42, &msg.body.replace("accross", "across"));
        assert!(decode(&fixed).unwrap_err().is_fatal());
    }

    #[test]
    fn sweep_reports_remaining() {
        let msg = message(
            14,
            4,
            6,
            42,
            "Firing beam weapons at random, wide setting to clear mines. 120 mines destroyed. 380 mines remain.",
        );
        assert_eq!(
            decode(&msg).unwrap(),
            MineEvent::Sweep { minefield_id: 42, remaining: 380 }
        );
    }

    #[test]
    fn malformed_sweep_is_not_fatal() {
        let msg = message(
            15,
            4,
            6,
            42,
            "Firing beam weapons at random, wide setting to clear mines. The field is gone.",
        );
        let err = decode(&msg).unwrap_err();
        assert_eq!(err.kind, EventKind::Sweep);
        assert!(!err.is_fatal());
    }

    #[test]
    fn scoop_reads_field_from_body() {
        let msg = message(
            16,
            4,
            6,
            -1,
            "We have scooped up mines from our minefield #17. 40 units have been converted into 10 torpedos.",
        );
        assert_eq!(
            decode(&msg).unwrap(),
            MineEvent::Scoop { minefield_id: 17, scooped: 40 }
        );
    }

    #[test]
    fn scans_and_misc() {
        let own = message(17, 19, 6, 42, "We have scanned our minefield. It contains 812 mine units.");
        assert_eq!(decode(&own).unwrap(), MineEvent::ScanOwn { minefield_id: 42, units: 812 });
        let enemy = message(
            18,
            19,
            6,
            9,
            "We have detected an enemy minefield. It contains 77 mine units.",
        );
        assert_eq!(decode(&enemy).unwrap(), MineEvent::ScanEnemy { minefield_id: 9, units: 77 });

        let det = message(19, 4, 6, 0, "We are detecting minefield detonations. Explosions detected: 3");
        assert_eq!(decode(&det).unwrap(), MineEvent::Detonations { count: 3 });
        let strike = message(20, 16, 6, 0, "Our ship has struck a web mine!");
        assert_eq!(decode(&strike).unwrap(), MineEvent::Strike { web: true });
        let glory = message(21, 9, 6, 0, "A massive shockwave was detected.");
        assert_eq!(decode(&glory).unwrap(), MineEvent::Glory);
        let other = message(22, 3, 6, 0, "Nothing to see here.");
        assert_eq!(decode(&other).unwrap(), MineEvent::Unknown);
    }

    #[test]
    fn overflowing_counts_are_parse_errors() {
        let lay = message(
            23,
            3,
            5,
            42,
            "We have converted our torpedoes into deep space mines. \
             The minefield now contains 99999999999 mine units and is 20 light years in radius.",
        );
        let err = decode(&lay).unwrap_err();
        assert_eq!(err.kind, EventKind::Lay);
        assert!(err.is_fatal());

        let sweep = message(
            24,
            4,
            6,
            42,
            "Firing beam weapons at random, wide setting to clear mines. 99999999999 mines remain.",
        );
        let err = decode(&sweep).unwrap_err();
        assert_eq!(err.kind, EventKind::Sweep);
        assert!(!err.is_fatal());

        let scan = message(
            25,
            19,
            6,
            42,
            "We have scanned our minefield. It contains 99999999999 mine units.",
        );
        assert!(!decode(&scan).unwrap_err().is_fatal());
    }

    #[test]
    fn number_helpers() {
        assert_eq!(split_int("42 rest"), Some((42, " rest")));
        assert_eq!(split_int("x"), None);
        assert_eq!(split_int("2147483648 units"), None);
        assert_eq!(split_int("2147483647 units"), Some((i32::MAX, " units")));
        assert_eq!(int_before("380 mines remain.", " mines remain."), Some(380));
        assert_eq!(int_before("no mines remain.", " mines remain."), None);
    }
}
