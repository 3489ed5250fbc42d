//! Drawing layers for the game client's starmap notes.
//!
//! A layer is a named list of markups (`point`, `circle`, `line`) that the
//! client draws on top of the map. Layers serialize with `serde_json` into
//! the shape the client imports.
use serde::Serialize;

use crate::minefield::MinefieldSet;
use crate::space::geometry::distance;
use crate::space::Cluster;

const PALETTE: [&str; 12] = [
    "#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231", "#911eb4", "#46f0f0", "#f032e6",
    "#bcf60c", "#fabebe", "#008080", "#e6beff",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attr {
    pub stroke: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Xy {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Markup {
    Point {
        x: i32,
        y: i32,
        text: String,
        snapto: bool,
        attr: Attr,
        color: String,
        zmin: i32,
        zmax: i32,
    },
    Circle {
        x: i32,
        y: i32,
        r: i32,
        attr: Attr,
        color: String,
        zmin: i32,
        zmax: i32,
    },
    Line {
        points: [Xy; 2],
        attr: Attr,
        color: String,
        zmin: i32,
        zmax: i32,
    },
}

impl Markup {
    pub fn point(x: i32, y: i32, text: impl Into<String>, color: &str) -> Self {
        Markup::Point {
            x,
            y,
            text: text.into(),
            snapto: true,
            attr: Attr { stroke: color.to_string() },
            color: color.to_string(),
            zmin: 0,
            zmax: 0,
        }
    }

    pub fn circle(x: i32, y: i32, r: i32, color: &str) -> Self {
        Markup::Circle {
            x,
            y,
            r,
            attr: Attr { stroke: color.to_string() },
            color: color.to_string(),
            zmin: 0,
            zmax: 0,
        }
    }

    pub fn line(from: (i32, i32), to: (i32, i32), color: &str) -> Self {
        Markup::Line {
            points: [Xy { x: from.0, y: from.1 }, Xy { x: to.0, y: to.1 }],
            attr: Attr { stroke: color.to_string() },
            color: color.to_string(),
            zmin: 0,
            zmax: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub name: String,
    pub active: bool,
    pub markups: Vec<Markup>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Layer {
            name: name.into(),
            active: true,
            markups: Vec::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

pub fn owner_colour(owner_id: u32) -> &'static str {
    PALETTE[owner_id as usize % PALETTE.len()]
}

/// Lighten (positive `percent`) or darken a `#rrggbb` colour. Malformed input
/// is returned unchanged.
pub fn shade(hex: &str, percent: f64) -> String {
    let digits = hex.trim_start_matches('#');
    let channel = |i: usize| {
        digits
            .get(i..i + 2)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
    };
    match (digits.len(), channel(0), channel(2), channel(4)) {
        (6, Some(r), Some(g), Some(b)) => {
            let adjust = |c: u8| (c as f64 * (1.0 + percent)).clamp(0.0, 255.0) as u8;
            format!("#{:02x}{:02x}{:02x}", adjust(r), adjust(g), adjust(b))
        }
        _ => hex.to_string(),
    }
}

/// One circle per minefield in its owner's colour, webs drawn darker, with a
/// labelled centre point.
pub fn minefield_layer(name: &str, fields: &MinefieldSet) -> Layer {
    let mut layer = Layer::new(name);
    for field in fields.values() {
        let base = owner_colour(field.owner_id);
        let colour = if field.is_web {
            shade(base, -0.25)
        } else {
            base.to_string()
        };
        layer
            .markups
            .push(Markup::circle(field.x, field.y, field.radius, &colour));
        layer
            .markups
            .push(Markup::point(field.x, field.y, field.to_string(), &colour));
    }
    layer
}

/// Lines between one-hop neighbours, one colour per sector. Jumps that cross
/// the map seam are left out since a straight line would span the map.
pub fn sector_layer(name: &str, cluster: &Cluster) -> Layer {
    let turn = cluster.turn();
    let mut layer = Layer::new(name);
    for (index, sector) in cluster.cliques.iter().enumerate().skip(1) {
        let colour = PALETTE[index % PALETTE.len()];
        for &from in sector {
            let Some(a) = turn.planet(from) else { continue };
            let reachable = cluster.neighbours.get(&from).map(Vec::as_slice).unwrap_or(&[]);
            for &(jump, to) in reachable {
                if to <= from {
                    continue;
                }
                let Some(b) = turn.planet(to) else { continue };
                if distance((a.x, a.y), (b.x, b.y)) > jump + 5.0 {
                    continue;
                }
                layer.markups.push(Markup::line((a.x, a.y), (b.x, b.y), colour));
            }
        }
    }
    layer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::fixtures::{planet, snapshot};
    use crate::minefield::Minefield;

    #[test]
    fn markup_serializes_with_type_tag() {
        let json = serde_json::to_value(Markup::circle(10, 20, 30, "#ffffff")).unwrap();
        assert_eq!(json["type"], "circle");
        assert_eq!(json["r"], 30);
        assert_eq!(json["attr"]["stroke"], "#ffffff");

        let json = serde_json::to_value(Markup::line((1, 2), (3, 4), "#000000")).unwrap();
        assert_eq!(json["type"], "line");
        assert_eq!(json["points"][1]["x"], 3);
        assert_eq!(json["points"][1]["y"], 4);
    }

    #[test]
    fn shade_lightens_and_darkens() {
        assert_eq!(shade("#808080", 0.5), "#c0c0c0");
        assert_eq!(shade("#808080", -0.5), "#404040");
        assert_eq!(shade("#ffffff", 0.5), "#ffffff");
        assert_eq!(shade("nonsense", 0.1), "nonsense");
    }

    #[test]
    fn minefield_layer_circles_per_field() {
        let mut fields = MinefieldSet::new();
        for field in [
            Minefield::new(1, 2, (100, 100), false, false, 400),
            Minefield::new(2, 3, (500, 500), true, false, 900),
        ] {
            fields.insert(field.id, field);
        }
        let layer = minefield_layer("Minefields", &fields);
        assert_eq!(layer.markups.len(), 4);
        assert!(matches!(
            &layer.markups[0],
            Markup::Circle { r: 20, color, .. } if color == owner_colour(2)
        ));
        assert!(matches!(
            &layer.markups[2],
            Markup::Circle { r: 30, color, .. } if *color == shade(owner_colour(3), -0.25)
        ));

        let json = layer.to_json().unwrap();
        assert!(json.contains("\"name\":\"Minefields\""));
        assert!(json.contains("\"active\":true"));
    }

    #[test]
    fn sector_layer_draws_each_jump_once() {
        let mut turn = snapshot(1, 5);
        turn.planets = vec![
            planet(1, 1000, 1000, 1),
            planet(2, 1050, 1000, 1),
            planet(3, 1100, 1000, 0),
            planet(4, 1900, 1900, 0),
        ];
        let cluster = Cluster::from_turn(&turn, 81.5).unwrap();
        let layer = sector_layer("Sectors", &cluster);
        // 1-2 and 2-3; 1-3 is 100 ly apart
        assert_eq!(layer.markups.len(), 2);
        assert!(layer.markups.iter().all(|m| matches!(m, Markup::Line { .. })));
    }

    #[test]
    fn sector_layer_skips_seam_crossings() {
        let mut turn = snapshot(1, 5);
        let map = crate::space::SphericalMap::new(2000, 2000);
        let left = map.bottom_left.0 + 10;
        let right = map.top_right.0 - 10;
        turn.planets = vec![planet(1, left, 1000, 1), planet(2, right, 1000, 1)];
        let cluster = Cluster::from_turn(&turn, 81.5).unwrap();
        assert_eq!(cluster.cliques.len(), 2);
        let layer = sector_layer("Sectors", &cluster);
        assert!(layer.markups.is_empty());
    }
}
