//! # Combined Planner
//!
//! Keeps a valid local path between the robot and its goal by combining a global planner, run
//! rarely over the static map, with a local planner, run every cycle over the map centred on the
//! robot.
//!
//! Failures cascade through the planning tiers. A failed local plan triggers a global replan from
//! the current pose, and a failed global plan puts the planner into
//! [`PlannerState::WaitingForGmap`] until the user provides a new global map. Only when there is no
//! tier left to escalate to is an error returned to the user.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, trace, warn};
use nalgebra::Point2;
use serde::Serialize;
use util::{params::load as load_params, session};

use crate::{
    path::{drop_passed_waypoints, LocalPath},
    pose::Pose2d,
};

use self::params::CombPlannerParams;

use super::{
    planner::{GlobalPlanner, LocalPlanner},
    waypoints::WaypointDiscretiser,
    PlannerError,
};

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod params;


// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Maximum number of passes through the update logic in one call to [`CombPlanner::update`].
///
/// A second pass only happens straight after a successful global replan.
const MAX_UPDATE_PASSES: usize = 2;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The combined global and local planner.
///
/// Maps are borrowed for `'m` and are never modified by the planner.
pub struct CombPlanner<'m, G, L>
where
    G: GlobalPlanner<'m>,
    L: LocalPlanner<'m>,
{
    params: CombPlannerParams,
    discretiser: WaypointDiscretiser,

    /// Parameters to build the global planner with once the first global map arrives
    global_params: G::Params,
    global_planner: Option<G>,
    local_planner: L,

    global_map: Option<&'m G::Map>,
    local_map: Option<&'m L::Map>,

    /// True if a global map has been set since the last successful global plan
    new_global_map: bool,

    state: PlannerState,

    local_path: LocalPath,
    new_local_path: bool,

    /// Waypoints still to be reached along the current global path
    global_waypoints: Vec<Pose2d>,

    /// Start of the last successful global plan
    global_start: Option<Pose2d>,

    /// Goal of the last successful global plan
    global_goal: Option<Pose2d>,
}

/// Record of a successful global plan, saved into the session.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalPlanReport {
    pub start: Pose2d,
    pub goal: Pose2d,
    pub path: Vec<Point2<f64>>,
    pub waypoints: Vec<Pose2d>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlannerState {
    /// The goal has been reached, or there is no goal. Updates do nothing.
    GoalReached,

    /// The local path is valid and may be followed.
    ValidPath,

    /// Both the local and the global planner failed, nothing will be planned until a new global
    /// map is set.
    WaitingForGmap,
}

/// What to do after one pass through the update logic
enum PassResult {
    Done,

    /// A new global path was found, run another pass forcing a local replan
    Replan,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<'m, G, L> CombPlanner<'m, G, L>
where
    G: GlobalPlanner<'m>,
    L: LocalPlanner<'m>,
{
    /// Create a new combined planner.
    ///
    /// The global planner is only built once the first global map is set.
    pub fn new(
        params: CombPlannerParams,
        global_params: G::Params,
        local_planner: L,
    ) -> Result<Self, PlannerError> {
        let discretiser = WaypointDiscretiser::new(params.waypoints)?;

        Ok(Self {
            params,
            discretiser,
            global_params,
            global_planner: None,
            local_planner,
            global_map: None,
            local_map: None,
            new_global_map: false,
            state: PlannerState::GoalReached,
            local_path: LocalPath::new_empty(),
            new_local_path: false,
            global_waypoints: Vec::new(),
            global_start: None,
            global_goal: None,
        })
    }

    /// Create a new combined planner, loading its parameters from the given parameter file.
    pub fn init(
        params_path: &str,
        global_params: G::Params,
        local_planner: L,
    ) -> Result<Self, PlannerError> {
        let params: CombPlannerParams = load_params(params_path)?;

        Self::new(params, global_params, local_planner)
    }

    /// Set a new global map.
    ///
    /// The first map builds the global planner, later maps are passed to the existing one. Either
    /// way a planner waiting for a new global map will attempt a global replan on its next update.
    pub fn set_global_map(&mut self, map: &'m G::Map) {
        self.global_map = Some(map);

        match self.global_planner {
            Some(ref mut planner) => planner.set_map(map),
            None => {
                debug!("First global map received, creating the global planner");
                self.global_planner = Some(G::new(&self.global_params, map));
            }
        }

        self.new_global_map = true;
    }

    /// Set a new local map, which is passed straight to the local planner.
    pub fn set_local_map(&mut self, map: &'m L::Map) {
        self.local_map = Some(map);
        self.local_planner.set_map(map);
    }

    /// Drop the current goal and local path.
    pub fn reset(&mut self) {
        self.state = PlannerState::GoalReached;
        self.local_path.reset();
    }

    /// Start planning towards a new goal.
    ///
    /// A global path is planned straight away, followed by a local path. Failing to find the
    /// global path is returned to the caller without any recovery, leaving the planner in
    /// [`PlannerState::GoalReached`].
    pub fn set_goal(&mut self, robot_pose: &Pose2d, goal: &Pose2d) -> Result<(), PlannerError> {
        self.reset();

        info!(
            "New goal at ({:.2}, {:.2}) heading {:.2} rad",
            goal.position_m.x, goal.position_m.y, goal.heading_rad
        );

        self.find_global_path(robot_pose, goal)?;

        // Try to find a local path to the first waypoints
        self.state = PlannerState::ValidPath;
        self.local_path.reset();
        self.update(robot_pose, true)
    }

    /// Update the planner with the current pose of the robot.
    ///
    /// Keeps the current local path if it is still usable, otherwise plans a new one, escalating to
    /// the global planner if no local path can be found. Use
    /// [`CombPlanner::has_new_local_path`] afterwards to check whether the local path changed.
    ///
    /// Errors are only returned once every recovery option is exhausted:
    /// - [`PlannerError::MissingMap`] if the local or global map was never set.
    /// - [`PlannerError::NoLocalPath`] if there is no local path and the robot hasn't moved since
    ///   the last global plan, so a global replan would give the same result.
    /// - [`PlannerError::Unreachable`] if no global path exists even on a fresh global map.
    pub fn update(&mut self, robot_pose: &Pose2d, force_replan: bool) -> Result<(), PlannerError> {
        let mut force_replan = force_replan;

        for _ in 0..MAX_UPDATE_PASSES {
            match self.update_pass(robot_pose, force_replan)? {
                PassResult::Done => return Ok(()),
                PassResult::Replan => force_replan = true,
            }
        }

        warn!(
            "Planner didn't settle on a local path within {} passes",
            MAX_UPDATE_PASSES
        );
        Ok(())
    }

    pub fn state(&self) -> PlannerState {
        self.state
    }

    /// The current local path. Only valid to follow in [`PlannerState::ValidPath`].
    pub fn local_path(&self) -> &LocalPath {
        &self.local_path
    }

    /// True if the last update produced a new local path.
    pub fn has_new_local_path(&self) -> bool {
        self.new_local_path
    }

    /// Global waypoints not yet reached.
    pub fn waypoints(&self) -> &[Pose2d] {
        &self.global_waypoints
    }

    pub fn global_start(&self) -> Option<&Pose2d> {
        self.global_start.as_ref()
    }

    pub fn global_goal(&self) -> Option<&Pose2d> {
        self.global_goal.as_ref()
    }

    pub fn has_new_global_map(&self) -> bool {
        self.new_global_map
    }

    pub fn params(&self) -> &CombPlannerParams {
        &self.params
    }

    /// The global planner, or `None` if no global map has been set yet.
    pub fn global_planner(&self) -> Option<&G> {
        self.global_planner.as_ref()
    }

    pub fn local_planner(&self) -> &L {
        &self.local_planner
    }

    /// One pass through the update logic.
    fn update_pass(
        &mut self,
        robot_pose: &Pose2d,
        force_replan: bool,
    ) -> Result<PassResult, PlannerError> {
        self.new_local_path = false;

        // Reached the goal or we don't have a goal?
        let goal = match self.global_goal {
            Some(goal) if self.state != PlannerState::GoalReached => goal,
            _ => {
                self.state = PlannerState::GoalReached;
                return Ok(PassResult::Done);
            }
        };
        if self.is_goal_reached(robot_pose) {
            info!("Goal reached");
            self.state = PlannerState::GoalReached;
            return Ok(PassResult::Done);
        }

        // Waiting for a new global map?
        if self.state == PlannerState::WaitingForGmap {
            if !self.new_global_map {
                trace!("Still waiting for a new global map");
                return Ok(PassResult::Done);
            }

            info!("Got a new global map, trying to find a new global path");
            self.find_global_path(robot_pose, &goal)
                .map_err(|e| match e {
                    PlannerError::NoPath(reason) => PlannerError::Unreachable(reason),
                    e => e,
                })?;
            self.local_path.reset();
            self.state = PlannerState::ValidPath;
        }

        if self.local_map.is_none() || self.global_map.is_none() {
            return Err(PlannerError::MissingMap);
        }

        // Remove the parts of the local path and the global waypoints which are already reached
        self.local_path
            .update_waypoints(self.params.local_path_tolerance_m, robot_pose);
        let num_passed = drop_passed_waypoints(
            &mut self.global_waypoints,
            Some(&goal),
            robot_pose,
            self.params.waypoint_reached_dist_m,
        );
        if num_passed > 0 {
            trace!(
                "Passed {} global waypoints, {} remaining",
                num_passed,
                self.global_waypoints.len()
            );
        }

        if !self.local_path.is_empty()
            && !self.local_planner.is_path_free(&self.local_path, robot_pose)
        {
            warn!("Local path is not free");
        }

        let force_replan =
            force_replan || self.local_path.is_empty() || self.is_local_path_end_reached(robot_pose);

        if !force_replan {
            trace!("Keeping current local path");
            return Ok(PassResult::Done);
        }

        match self
            .local_planner
            .plan_path(robot_pose, &self.global_waypoints, &goal)
        {
            Ok(()) => {
                self.local_path = self.local_planner.path();
                self.new_local_path = true;
                self.state = PlannerState::ValidPath;

                debug!(
                    "New local path with {} poses",
                    self.local_path.get_num_waypoints()
                );

                Ok(PassResult::Done)
            }
            Err(PlannerError::NoPath(reason)) => {
                self.recover_local_failure(robot_pose, &goal, &reason)
            }
            Err(e) => Err(e),
        }
    }

    /// Escalate a failed local plan to the global planner, falling back to waiting for a new
    /// global map if there's no global path either.
    fn recover_local_failure(
        &mut self,
        robot_pose: &Pose2d,
        goal: &Pose2d,
        reason: &str,
    ) -> Result<PassResult, PlannerError> {
        // Replanning from where the last global plan started, on the same map, would just
        // reproduce that plan
        let at_global_start = self.global_start.map_or(false, |start| {
            start.is_near(
                robot_pose,
                self.params.replan_guard_dist_m,
                self.params.replan_guard_angle_rad,
            )
        });
        if at_global_start && !self.new_global_map {
            return Err(PlannerError::NoLocalPath);
        }

        warn!(
            "Searching a new global path because there is no local one. Reason: {}",
            reason
        );

        match self.find_global_path(robot_pose, goal) {
            Ok(()) => {
                info!("Found a new global path");
                self.local_path.reset();
                self.state = PlannerState::ValidPath;

                Ok(PassResult::Replan)
            }
            Err(PlannerError::NoPath(reason)) => {
                // A stale global map might be the cause, so wait for a new one
                if !self.new_global_map {
                    warn!("Waiting for new global map. Reason: {}", reason);
                    self.state = PlannerState::WaitingForGmap;

                    Ok(PassResult::Done)
                } else {
                    Err(PlannerError::Unreachable(reason))
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Plan a global path, and on success replace the waypoints and record the start and goal.
    fn find_global_path(&mut self, start: &Pose2d, goal: &Pose2d) -> Result<(), PlannerError> {
        self.global_waypoints.clear();

        let planner = self.global_planner.as_mut().ok_or(PlannerError::NoMap)?;

        planner.plan_path(start.position_m, goal.position_m)?;

        let path = planner.latest_path();
        self.global_waypoints = self.discretiser.discretise(path);

        debug!(
            "Global path of {} points gave {} waypoints",
            path.len(),
            self.global_waypoints.len()
        );

        if self.params.archive_global_plans {
            session::save_with_timestamp(
                "comb_planner/global_plan.json",
                GlobalPlanReport {
                    start: *start,
                    goal: *goal,
                    path: path.to_vec(),
                    waypoints: self.global_waypoints.clone(),
                },
            );
        }

        self.global_start = Some(*start);
        self.global_goal = Some(*goal);
        self.new_global_map = false;

        Ok(())
    }

    /// The goal is reached once all waypoints are passed and the robot is at the goal pose.
    fn is_goal_reached(&self, robot_pose: &Pose2d) -> bool {
        if !self.global_waypoints.is_empty() {
            return false;
        }

        match self.global_goal {
            Some(goal) => goal.is_near(
                robot_pose,
                self.params.goal_dist_eps_m,
                self.params.goal_angle_eps_rad,
            ),
            None => false,
        }
    }

    /// The robot is at the end of the local path but the journey isn't over.
    fn is_local_path_end_reached(&self, robot_pose: &Pose2d) -> bool {
        !self.global_waypoints.is_empty()
            && self.local_path.get_end().map_or(false, |end| {
                robot_pose.is_near(
                    end,
                    self.params.wp_dist_eps_m,
                    self.params.wp_angle_eps_rad,
                )
            })
    }
}
