//! # Navigation
//!
//! This module provides the two tier planning used to keep the robot on a valid route to its goal:
//! - [`WaypointDiscretiser`] - converts a dense global path into spaced, heading bearing waypoints.
//! - [`GlobalPlanner`] and [`LocalPlanner`] - the interfaces to the path search algorithms, which
//!   live outside this crate.
//! - [`CombPlanner`] - the state machine deciding each cycle whether to keep the current local
//!   path, replan locally, replan globally, or wait for a new global map.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use util::params::LoadError;

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod comb_planner;
pub mod planner;
pub mod waypoints;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use comb_planner::{
    params::CombPlannerParams, CombPlanner, GlobalPlanReport, PlannerState,
};
pub use planner::{GlobalPlanner, LocalPlanner};
pub use waypoints::{WaypointDiscretiser, WaypointParams};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("Got no global map")]
    NoMap,

    /// A single planner invocation found no route. Recoverable by escalating to the next planning
    /// tier.
    #[error("No path found: {0}")]
    NoPath(String),

    #[error("Got no local map or no global map on planner update")]
    MissingMap,

    #[error("Didn't find a local path and global replanning is not allowed")]
    NoLocalPath,

    #[error("The goal is not reachable: {0}")]
    Unreachable(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Couldn't load parameters: {0}")]
    ParamLoadError(LoadError),
}

impl From<LoadError> for PlannerError {
    fn from(e: LoadError) -> Self {
        Self::ParamLoadError(e)
    }
}
