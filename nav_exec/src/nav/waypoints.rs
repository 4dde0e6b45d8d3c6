//! Converts a dense global path into a sparse sequence of waypoints for the local planner.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use nalgebra::Point2;
use serde::Deserialize;

use crate::pose::{normalized_direction, Direction, Pose2d};

use super::PlannerError;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Tolerance on reaching the minimum spacing, absorbs rounding in the travelled distance.
const SPACING_TOL_M: f64 = 1e-9;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WaypointParams {
    /// Minimum distance along the path between two consecutive waypoints.
    pub min_spacing_m: f64,

    /// Maximum distance along the path between two consecutive waypoints.
    pub max_spacing_m: f64,
}

#[derive(Debug, Clone)]
pub struct WaypointDiscretiser {
    params: WaypointParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for WaypointParams {
    fn default() -> Self {
        Self {
            min_spacing_m: 0.50,
            max_spacing_m: 0.75,
        }
    }
}

impl WaypointDiscretiser {
    /// Create a new discretiser, the spacings must satisfy `0 < min_spacing_m <= max_spacing_m`.
    pub fn new(params: WaypointParams) -> Result<Self, PlannerError> {
        if !(params.min_spacing_m > 0.0 && params.min_spacing_m <= params.max_spacing_m) {
            return Err(PlannerError::InvalidParams(format!(
                "waypoint spacing must satisfy 0 < min <= max, got min = {}, max = {}",
                params.min_spacing_m, params.max_spacing_m
            )));
        }

        Ok(Self { params })
    }

    pub fn params(&self) -> &WaypointParams {
        &self.params
    }

    /// Compute the waypoints along the given global path.
    ///
    /// The path is walked from its first point, with a cursor following the path samples. A
    /// sample becomes a waypoint once the distance travelled since the last waypoint is at least
    /// the minimum spacing. If reaching the next sample would take the cursor beyond the maximum
    /// spacing a waypoint is instead interpolated towards that sample, exactly the minimum
    /// spacing from the last waypoint. Distance short of the minimum spacing carries over between
    /// samples, so waypoints don't bunch up where the path changes direction.
    ///
    /// Each waypoint's heading is the direction of the path leaving it. Neither the first nor the
    /// last point of the path is ever a waypoint, the goal is given to the local planner
    /// separately.
    ///
    /// Paths with less than two points produce no waypoints.
    pub fn discretise(&self, path: &[Point2<f64>]) -> Vec<Pose2d> {
        let mut waypoints = Vec::new();

        // Path too short? We need at least a start and an end point
        if path.len() < 2 {
            return waypoints;
        }

        let min_m = self.params.min_spacing_m;
        let max_m = self.params.max_spacing_m;

        // Cursor walking along the path, and the distance along the path since the last waypoint
        let mut cursor = path[0];
        let mut travelled_m = 0.0;

        // Direction of the last non-degenerate segment, heading along +X if there is none yet
        let mut dir = first_direction(path).unwrap_or(Direction {
            unit: nalgebra::Vector2::x(),
            heading_rad: 0.0,
        });

        let mut i = 1;
        while i < path.len() {
            let seg_m = (path[i] - cursor).norm();

            if let Some(d) = normalized_direction(&cursor, &path[i]) {
                dir = d;
            }

            // Next sample still short of the minimum, carry the distance over
            if travelled_m + seg_m < min_m - SPACING_TOL_M {
                cursor = path[i];
                travelled_m += seg_m;
                i += 1;
            }
            // Next sample within the spacing band, it becomes a waypoint unless it's the end
            else if travelled_m + seg_m <= max_m {
                if i == path.len() - 1 {
                    break;
                }

                if let Some(d) = normalized_direction(&path[i], &path[i + 1]) {
                    dir = d;
                }

                cursor = path[i];
                travelled_m = 0.0;
                i += 1;

                waypoints.push(Pose2d::from_position(cursor, dir.heading_rad));
            }
            // Next sample too far away, interpolate towards it
            else {
                cursor += dir.unit * (min_m - travelled_m);
                travelled_m = 0.0;

                waypoints.push(Pose2d::from_position(cursor, dir.heading_rad));
            }
        }

        trace!(
            "Discretised path of {} points into {} waypoints",
            path.len(),
            waypoints.len()
        );

        waypoints
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn first_direction(path: &[Point2<f64>]) -> Option<Direction> {
    path.windows(2)
        .find_map(|pair| normalized_direction(&pair[0], &pair[1]))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-6;

    fn discretiser() -> WaypointDiscretiser {
        WaypointDiscretiser::new(WaypointParams::default()).unwrap()
    }

    fn line(from: Point2<f64>, to: Point2<f64>, num: usize) -> Vec<Point2<f64>> {
        (0..num)
            .map(|i| from + (to - from) * (i as f64 / (num - 1) as f64))
            .collect()
    }

    /// Distances along the path between consecutive waypoints, for waypoints all lying on a
    /// straight line.
    fn spacings(waypoints: &[Pose2d]) -> Vec<f64> {
        waypoints
            .windows(2)
            .map(|w| (w[1].position_m - w[0].position_m).norm())
            .collect()
    }

    #[test]
    fn test_invalid_params() {
        for (min, max) in [(0.0, 0.75), (-0.5, 0.75), (0.8, 0.75), (std::f64::NAN, 1.0)].iter() {
            assert!(matches!(
                WaypointDiscretiser::new(WaypointParams {
                    min_spacing_m: *min,
                    max_spacing_m: *max,
                }),
                Err(PlannerError::InvalidParams(_))
            ));
        }

        assert!(WaypointDiscretiser::new(WaypointParams {
            min_spacing_m: 0.5,
            max_spacing_m: 0.5,
        })
        .is_ok());
    }

    #[test]
    fn test_short_paths() {
        assert!(discretiser().discretise(&[]).is_empty());
        assert!(discretiser().discretise(&[Point2::new(1.0, 1.0)]).is_empty());

        // Two points closer than the maximum spacing, only the end which is never a waypoint
        assert!(discretiser()
            .discretise(&[Point2::new(0.0, 0.0), Point2::new(0.6, 0.0)])
            .is_empty());
    }

    #[test]
    fn test_straight_line_half_metre_samples() {
        // 21 samples from (0, 0) to (10, 0)
        let path = line(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), 21);

        let waypoints = discretiser().discretise(&path);

        assert_eq!(waypoints.len(), 19);
        for (i, wp) in waypoints.iter().enumerate() {
            assert!((wp.position_m.x - 0.5 * (i + 1) as f64).abs() < EPS);
            assert!(wp.position_m.y.abs() < EPS);
            assert!(wp.heading_rad.abs() < EPS);
        }

        // Goal is never a waypoint
        assert!(waypoints.last().unwrap().position_m.x < 10.0 - 0.4);
    }

    #[test]
    fn test_sparse_path_is_interpolated() {
        // Only the start and end of a 5 m line
        let path = vec![Point2::new(0.0, 0.0), Point2::new(0.0, 5.0)];

        let waypoints = discretiser().discretise(&path);

        // Waypoints every min spacing until the end is within the band
        assert_eq!(waypoints.len(), 9);
        for s in spacings(&waypoints) {
            assert!((s - 0.5).abs() < EPS);
        }
        for wp in waypoints.iter() {
            assert!((wp.heading_rad - FRAC_PI_2).abs() < EPS);
        }
        let last = waypoints.last().unwrap();
        assert!((5.0 - last.position_m.y) <= 0.75 + EPS);
    }

    #[test]
    fn test_dense_path_spacing() {
        // Dense sampling which doesn't divide the spacing evenly
        let path = line(Point2::new(-2.0, 1.0), Point2::new(7.0, 1.0), 301);

        let waypoints = discretiser().discretise(&path);

        assert!(!waypoints.is_empty());
        assert!((waypoints[0].position_m.x + 2.0) >= 0.5 - EPS);
        for s in spacings(&waypoints) {
            assert!(s >= 0.5 - EPS && s <= 0.75 + EPS, "spacing {}", s);
        }
    }

    #[test]
    fn test_spacing_property_over_samplings() {
        for num in 2..60 {
            let path = line(Point2::new(0.0, 0.0), Point2::new(6.0, 8.0), num);
            let waypoints = discretiser().discretise(&path);

            for s in spacings(&waypoints) {
                assert!(
                    s >= 0.5 - EPS && s <= 0.75 + EPS,
                    "{} samples gave spacing {}",
                    num,
                    s
                );
            }
        }
    }

    #[test]
    fn test_corner_heading() {
        // L shaped path, along X then up Y
        let mut path = line(Point2::new(0.0, 0.0), Point2::new(3.0, 0.0), 31);
        path.extend(line(Point2::new(3.0, 0.0), Point2::new(3.0, 3.0), 31).into_iter().skip(1));

        let waypoints = discretiser().discretise(&path);

        for wp in waypoints.iter() {
            if wp.position_m.x < 3.0 - EPS {
                assert!(wp.heading_rad.abs() < EPS);
            } else if wp.position_m.y > EPS {
                assert!((wp.heading_rad - FRAC_PI_2).abs() < EPS);
            }
        }

        // Arc length between waypoints stays in the band
        let arc = |p: &Point2<f64>| p.x + p.y;
        for pair in waypoints.windows(2) {
            let s = arc(&pair[1].position_m) - arc(&pair[0].position_m);
            assert!(s >= 0.5 - EPS && s <= 0.75 + EPS, "spacing {}", s);
        }
    }

    #[test]
    fn test_duplicate_samples() {
        let path = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ];

        let waypoints = discretiser().discretise(&path);

        assert!(!waypoints.is_empty());
        for wp in waypoints.iter() {
            assert!(wp.heading_rad.is_finite());
            assert!(wp.position_m.x.is_finite());
        }
        for s in spacings(&waypoints) {
            assert!(s >= 0.5 - EPS && s <= 0.75 + EPS, "spacing {}", s);
        }
    }

    #[test]
    fn test_deterministic() {
        let path = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.3, 0.1),
            Point2::new(1.7, 0.4),
            Point2::new(1.9, 2.2),
            Point2::new(4.0, 2.5),
        ];
        let d = discretiser();

        let first = d.discretise(&path);
        let second = d.discretise(&path);
        let fresh = discretiser().discretise(&path);

        assert_eq!(first, second);
        assert_eq!(first, fresh);
    }
}
