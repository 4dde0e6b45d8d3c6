//! Parameters for the combined planner

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::nav::waypoints::WaypointParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CombPlannerParams {
    /// Maximum distance to the goal for it to be reached
    pub goal_dist_eps_m: f64,

    /// Maximum heading error to the goal for it to be reached
    pub goal_angle_eps_rad: f64,

    /// Distance to the end of the local path at which a new local path is planned, if there are
    /// still global waypoints left
    pub wp_dist_eps_m: f64,

    /// Heading error to the end of the local path at which a new local path is planned
    pub wp_angle_eps_rad: f64,

    /// Distance within which poses of the local path are considered reached
    pub local_path_tolerance_m: f64,

    /// Distance within which global waypoints are considered reached
    pub waypoint_reached_dist_m: f64,

    /// If a local plan fails within this distance of where the last global plan started, and no
    /// new global map has arrived, a global replan isn't attempted
    pub replan_guard_dist_m: f64,

    /// Heading component of the replan guard
    pub replan_guard_angle_rad: f64,

    /// Save a report of each global plan into the session directory
    pub archive_global_plans: bool,

    /// Spacing of the waypoints generated from the global path
    pub waypoints: WaypointParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for CombPlannerParams {
    fn default() -> Self {
        Self {
            goal_dist_eps_m: 0.5,
            goal_angle_eps_rad: 30f64.to_radians(),
            wp_dist_eps_m: 1.0,
            wp_angle_eps_rad: 0.6,
            local_path_tolerance_m: 0.25,
            waypoint_reached_dist_m: 0.5,
            replan_guard_dist_m: 0.5,
            replan_guard_angle_rad: 0.5,
            archive_global_plans: false,
            waypoints: WaypointParams::default(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_toml() {
        let params: CombPlannerParams = util::params::from_str(
            r#"
            goal_dist_eps_m = 0.2
            archive_global_plans = true

            [waypoints]
            min_spacing_m = 1.0
            max_spacing_m = 1.5
            "#,
        )
        .unwrap();

        assert_eq!(params.goal_dist_eps_m, 0.2);
        assert!(params.archive_global_plans);
        assert_eq!(params.waypoints.min_spacing_m, 1.0);
        assert_eq!(params.waypoints.max_spacing_m, 1.5);

        // Unset values keep their defaults
        assert_eq!(params.wp_dist_eps_m, 1.0);
        assert_eq!(params.local_path_tolerance_m, 0.25);
    }
}
