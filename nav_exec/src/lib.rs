//! # Navigation library.
//!
//! This library provides the combined global/local planner used to keep a valid route between the
//! robot and its goal, along with the pose and path types it works on.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Planar poses and pose comparison helpers
pub mod pose;

/// Path types - the local path and the waypoint advancement shared with the global waypoints
pub mod path;

/// Navigation module - waypoint generation, planner interfaces and the combined planner
pub mod nav;
