use std::fmt;

use crate::galaxy::MapSettings;
use crate::space::geometry::toroidal_distance;
use crate::{Result, StarfoldError};

/// Host coordinate offset of the wrapped map origin.
pub const MAP_OFFSET: i32 = 149;
/// Extra light years the host adds to each map dimension when wrapping.
pub const MAP_PADDING: i32 = 20;

/// Geometry of a wrap-around ("spherical") map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SphericalMap {
    pub bottom_left: (i32, i32),
    pub top_right: (i32, i32),
    pub width: i32,
    pub height: i32,
}

impl SphericalMap {
    pub fn new(map_width: i32, map_height: i32) -> Self {
        let true_width = map_width + MAP_PADDING;
        let true_height = map_height + MAP_PADDING;
        let bottom_left = (true_width + MAP_OFFSET, true_height + MAP_OFFSET);
        let top_right = (bottom_left.0 + true_width, bottom_left.1 + true_height);
        SphericalMap {
            bottom_left,
            top_right,
            width: top_right.0 - bottom_left.0,
            height: top_right.1 - bottom_left.1,
        }
    }

    /// Only `mapshape == 1` wraps; every other shape is rejected.
    pub fn from_settings(settings: &MapSettings) -> Result<Self> {
        if !settings.is_spherical() {
            return Err(StarfoldError::UnsupportedMapShape(settings.mapshape));
        }
        Ok(Self::new(settings.mapwidth, settings.mapheight))
    }

    /// The point itself followed by its four mirror images across the wrap.
    pub fn project(&self, p: (i32, i32)) -> [(i32, i32); 5] {
        let (x, y) = p;
        [
            (x, y),
            (x + self.width, y),
            (x - self.width, y),
            (x, y + self.height),
            (x, y - self.height),
        ]
    }

    pub fn distance(&self, a: (i32, i32), b: (i32, i32)) -> f64 {
        toroidal_distance(a, b, self.width, self.height)
    }
}

impl fmt::Display for SphericalMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "spherical map {}x{} ({},{})-({},{})",
            self.width,
            self.height,
            self.bottom_left.0,
            self.bottom_left.1,
            self.top_right.0,
            self.top_right.1
        )
    }
}
