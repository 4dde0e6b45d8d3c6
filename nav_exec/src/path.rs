//! # Path
//!
//! This module defines the local path produced by the local planner, and the logic used to drop
//! poses from the front of a pose sequence as the robot moves along it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::pose::Pose2d;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// The committed short horizon path, as a sequence of poses from the robot outwards.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct LocalPath {
    pub poses: Vec<Pose2d>,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl LocalPath {
    /// Create a new empty path
    pub fn new_empty() -> Self {
        Self { poses: Vec::new() }
    }

    pub fn from_poses(poses: Vec<Pose2d>) -> Self {
        Self { poses }
    }

    /// Remove all poses from the path.
    pub fn reset(&mut self) {
        self.poses.clear();
    }

    /// Get the number of poses still to be reached
    pub fn get_num_waypoints(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// The last pose of the path, or `None` if the path is empty.
    pub fn get_end(&self) -> Option<&Pose2d> {
        self.poses.last()
    }

    /// Remove the poses at the start of the path which the robot has already reached or passed.
    ///
    /// Returns the number of poses removed.
    pub fn update_waypoints(&mut self, tolerance_m: f64, robot_pose: &Pose2d) -> usize {
        drop_passed_waypoints(&mut self.poses, None, robot_pose, tolerance_m)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Remove the leading waypoints of `waypoints` which the robot has reached or passed.
///
/// A waypoint is reached if the robot is closer than `tolerance_m` to it. It is passed if the
/// robot is beyond it in the direction of the following waypoint and closer to that following
/// waypoint than to the waypoint itself. For the final waypoint the following position is
/// `final_target`, if there is one, otherwise the final waypoint can only be reached.
///
/// Removal stops at the first waypoint which is neither reached nor passed. Returns the number of
/// waypoints removed.
pub fn drop_passed_waypoints(
    waypoints: &mut Vec<Pose2d>,
    final_target: Option<&Pose2d>,
    robot_pose: &Pose2d,
    tolerance_m: f64,
) -> usize {
    let mut num_passed = 0;

    while num_passed < waypoints.len() {
        let next = match waypoints.get(num_passed + 1) {
            Some(n) => Some(&n.position_m),
            None => final_target.map(|t| &t.position_m),
        };

        if !is_passed(&waypoints[num_passed], next, robot_pose, tolerance_m) {
            break;
        }

        num_passed += 1;
    }

    waypoints.drain(..num_passed);

    num_passed
}

fn is_passed(
    waypoint: &Pose2d,
    next: Option<&Point2<f64>>,
    robot_pose: &Pose2d,
    tolerance_m: f64,
) -> bool {
    let to_robot = robot_pose.position_m - waypoint.position_m;

    if to_robot.norm() < tolerance_m {
        return true;
    }

    match next {
        Some(next) => {
            let to_next = *next - waypoint.position_m;
            to_robot.dot(&to_next) > 0.0
                && (*next - robot_pose.position_m).norm() < to_robot.norm()
        }
        None => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn straight_path(num: usize, sep_m: f64) -> LocalPath {
        LocalPath::from_poses(
            (0..num)
                .map(|i| Pose2d::new(i as f64 * sep_m, 0.0, 0.0))
                .collect(),
        )
    }

    #[test]
    fn test_update_waypoints() {
        let mut path = straight_path(5, 0.5);

        // Robot at the start reaches the first pose only
        assert_eq!(path.update_waypoints(0.25, &Pose2d::new(0.1, 0.0, 0.0)), 1);
        assert_eq!(path.get_num_waypoints(), 4);

        // Robot part way down the path, slightly off to one side
        assert_eq!(path.update_waypoints(0.25, &Pose2d::new(0.6, 0.05, 0.0)), 1);
        assert_eq!(path.poses[0], Pose2d::new(1.0, 0.0, 0.0));

        // Robot far away doesn't remove anything
        assert_eq!(path.update_waypoints(0.25, &Pose2d::new(-5.0, 3.0, 0.0)), 0);
        assert_eq!(path.get_num_waypoints(), 3);

        // Robot beyond the end of the path only removes the last pose once within tolerance
        assert_eq!(path.update_waypoints(0.25, &Pose2d::new(2.5, 0.0, 0.0)), 2);
        assert_eq!(path.get_end(), Some(&Pose2d::new(2.0, 0.0, 0.0)));
        assert_eq!(path.update_waypoints(0.25, &Pose2d::new(2.1, 0.0, 0.0)), 1);
        assert!(path.is_empty());
        assert_eq!(path.get_end(), None);
    }

    #[test]
    fn test_drop_passed_with_final_target() {
        let mut waypoints = vec![Pose2d::new(1.0, 0.0, 0.0), Pose2d::new(2.0, 0.0, 0.0)];
        let goal = Pose2d::new(2.7, 0.0, 0.0);

        // At the goal, both waypoints have been passed even though the last one is not within
        // tolerance
        assert_eq!(
            drop_passed_waypoints(&mut waypoints, Some(&goal), &Pose2d::new(2.7, 0.0, 0.0), 0.5),
            2
        );
        assert!(waypoints.is_empty());

        // Without the goal the last waypoint is kept
        let mut waypoints = vec![Pose2d::new(1.0, 0.0, 0.0), Pose2d::new(2.0, 0.0, 0.0)];
        assert_eq!(
            drop_passed_waypoints(&mut waypoints, None, &Pose2d::new(2.7, 0.0, 0.0), 0.5),
            1
        );
        assert_eq!(waypoints, vec![Pose2d::new(2.0, 0.0, 0.0)]);
    }

    #[test]
    fn test_reset() {
        let mut path = straight_path(3, 1.0);
        path.reset();
        assert!(path.is_empty());
        assert_eq!(path, LocalPath::new_empty());
    }
}
