//! Interfaces to the global and local path search algorithms.
//!
//! The search algorithms and the occupancy grids they work on are provided by the user of the
//! [`CombPlanner`](super::CombPlanner). Maps are only ever borrowed: the planners are handed a
//! reference which must outlive the combined planner, and the combined planner never looks inside
//! a map itself.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Point2;

use crate::{path::LocalPath, pose::Pose2d};

use super::PlannerError;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A coarse planner searching over the whole static map.
pub trait GlobalPlanner<'m>: Sized {
    /// The global occupancy grid.
    type Map: ?Sized;

    /// Parameters needed to build the planner. The combined planner holds on to these until the
    /// first global map arrives.
    type Params;

    /// Build a new planner bound to the given map.
    fn new(params: &Self::Params, map: &'m Self::Map) -> Self;

    /// Rebind the planner to a new map.
    fn set_map(&mut self, map: &'m Self::Map);

    /// Search for a path between the two positions.
    ///
    /// Must return [`PlannerError::NoPath`] if no route exists, the result is then read with
    /// [`GlobalPlanner::latest_path`].
    fn plan_path(&mut self, start: Point2<f64>, goal: Point2<f64>) -> Result<(), PlannerError>;

    /// The path found by the last successful call to [`GlobalPlanner::plan_path`].
    fn latest_path(&self) -> &[Point2<f64>];
}

/// A short horizon planner searching over a map centred on the robot.
pub trait LocalPlanner<'m> {
    /// The local occupancy grid.
    type Map: ?Sized;

    /// Rebind the planner to a new map.
    fn set_map(&mut self, map: &'m Self::Map);

    /// Search for a path from the robot towards the waypoints, or towards the goal if there are no
    /// waypoints left.
    ///
    /// Must return [`PlannerError::NoPath`] if no path can be found in the local map. This is
    /// expected to happen often and is handled by the combined planner.
    fn plan_path(
        &mut self,
        robot_pose: &Pose2d,
        waypoints: &[Pose2d],
        goal: &Pose2d,
    ) -> Result<(), PlannerError>;

    /// The path found by the last successful call to [`LocalPlanner::plan_path`].
    fn path(&self) -> LocalPath;

    /// Check that the remainder of the given path is still free in the current local map.
    ///
    /// Only used for diagnostics. Planners which can't check paths may leave the default.
    fn is_path_free(&self, _path: &LocalPath, _robot_pose: &Pose2d) -> bool {
        true
    }
}
