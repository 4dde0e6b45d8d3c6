//! # Pose
//!
//! Planar poses (position and heading) and the geometry helpers used to compare them.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use util::maths::abs_ang_diff;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A position and heading in the map frame.
///
/// The heading is not wrapped on storage, comparisons between poses account for wrapping.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose2d {
    /// Position in the map frame
    pub position_m: Point2<f64>,

    /// Heading, the angle to the positive map X axis
    pub heading_rad: f64,
}

/// Unit direction between two points, along with its heading.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Direction {
    pub unit: Vector2<f64>,
    pub heading_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pose2d {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Point2::new(x_m, y_m),
            heading_rad,
        }
    }

    pub fn from_position(position_m: Point2<f64>, heading_rad: f64) -> Self {
        Self {
            position_m,
            heading_rad,
        }
    }

    /// Returns true if `other` is closer than `dist_eps_m` and its heading is within
    /// `angle_eps_rad` of this pose's heading.
    pub fn is_near(&self, other: &Pose2d, dist_eps_m: f64, angle_eps_rad: f64) -> bool {
        let (dist_m, angle_rad) = pose_delta(self, other);
        dist_m < dist_eps_m && angle_rad < angle_eps_rad
    }
}

impl Default for Pose2d {
    fn default() -> Self {
        Self {
            position_m: Point2::origin(),
            heading_rad: 0.0,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Get the distance between the positions of two poses and the absolute difference between their
/// headings.
///
/// The heading difference is always in the range [0, pi], whatever the wrapping of the inputs.
pub fn pose_delta(p: &Pose2d, q: &Pose2d) -> (f64, f64) {
    (
        (p.position_m - q.position_m).norm(),
        abs_ang_diff(p.heading_rad, q.heading_rad),
    )
}

/// Get the unit direction from `from` to `to`.
///
/// Returns `None` if the two points are coincident, since no heading can be derived.
pub fn normalized_direction(from: &Point2<f64>, to: &Point2<f64>) -> Option<Direction> {
    let delta = *to - *from;
    let length = delta.norm();

    if length <= std::f64::EPSILON {
        return None;
    }

    Some(Direction {
        unit: delta / length,
        heading_rad: delta.y.atan2(delta.x),
    })
}
