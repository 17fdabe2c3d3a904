//! ballistics-pointmass
//!
//! Planar point-mass trajectory solver with fixed-step explicit Euler integration.
//! - Drag comes from a **reference curve** `c(M)` where `M` is Mach, scaled by the
//!   projectile's ballistic/drag coefficient `k`.
//! - Air density is recomputed from altitude every step (ISA, see `ballistics-core`).
//! - Angle search for a desired range by halving the remaining angle bracket.
//!
//! Maths, per step of `dt` with `K = rho * c(M) * k * A / (2 m)`:
//!   x  += vx dt,  y += vy dt
//!   vx -= K vx² dt
//!   vy -= K vy² dt + g dt        (ascent: drag and gravity both pull vy down)
//!   vy -= -K vy² dt + g dt       (descent: drag opposes the fall)
//!
//! Conventions:
//! - x downrange, y up, both in meters; launch point is `(0, initial_height)`.
//! - Angles in degrees above the horizon.
//!
//! You can pass any drag function. `Solver::default()` uses
//! `ballistics_models::g7_reference`.

use ballistics_core::{
    air_density, ensure_below_ceiling, ensure_finite, ensure_non_negative, ensure_positive,
    frontal_area, mach_number, to_components, to_speed, BallisticsError, Result, G,
};
use ballistics_models::g7_reference;
use log::{debug, trace, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Generic drag function type: mach -> reference curve value c(M)
pub type DragFn = dyn Fn(f64) -> f64 + Send + Sync;

/// Integration time step (s)
pub const DEFAULT_DT: f64 = 0.001;
/// Upper bound on integration steps per trajectory (10 000 s of flight at the default dt)
pub const DEFAULT_MAX_STEPS: usize = 10_000_000;

/// Launch inputs shared by every angle tried for the same shot.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Shot {
    pub speed_mps: f64,        // muzzle speed (m/s)
    pub initial_height_m: f64, // launch height above ground (m)
    pub drag_coefficient: f64, // scales the reference curve (0 => vacuum)
    pub frontal_area_m2: f64,  // cross-section (m²)
    pub mass_kg: f64,          // projectile mass (kg)
}

impl Shot {
    /// Build a shot for a round projectile of `diameter_m`.
    pub fn from_diameter(
        speed_mps: f64,
        initial_height_m: f64,
        drag_coefficient: f64,
        diameter_m: f64,
        mass_kg: f64,
    ) -> Self {
        Self {
            speed_mps,
            initial_height_m,
            drag_coefficient,
            frontal_area_m2: frontal_area(diameter_m),
            mass_kg,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("speed_mps", self.speed_mps)?;
        ensure_below_ceiling("initial_height_m", self.initial_height_m)?;
        ensure_non_negative("drag_coefficient", self.drag_coefficient)?;
        ensure_non_negative("frontal_area_m2", self.frontal_area_m2)?;
        ensure_positive("mass_kg", self.mass_kg)?;
        Ok(())
    }
}

/// Integrator settings.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolverConfig {
    pub dt: f64,          // time step (s)
    pub max_steps: usize, // give up if the ground is not reached by then
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { dt: DEFAULT_DT, max_steps: DEFAULT_MAX_STEPS }
    }
}

/// Parameters of the launch-angle search.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AngleSearch {
    pub initial_angle_deg: f64,
    pub min_angle_deg: f64,
    pub max_angle_deg: f64,
    /// Accept a range within `tolerance * target` of the target.
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for AngleSearch {
    fn default() -> Self {
        Self {
            initial_angle_deg: 27.5,
            min_angle_deg: -10.0,
            max_angle_deg: 45.0,
            tolerance: 0.01,
            max_iterations: 20,
        }
    }
}

impl AngleSearch {
    pub fn validate(&self) -> Result<()> {
        ensure_finite("initial_angle_deg", self.initial_angle_deg)?;
        ensure_finite("min_angle_deg", self.min_angle_deg)?;
        ensure_finite("max_angle_deg", self.max_angle_deg)?;
        ensure_positive("tolerance", self.tolerance)?;
        if self.min_angle_deg >= self.max_angle_deg {
            return Err(BallisticsError::InvalidParameter {
                name: "max_angle_deg",
                value: self.max_angle_deg,
                reason: "must be greater than min_angle_deg",
            });
        }
        Ok(())
    }
}

/// A sampled position (m).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Result of one integration run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trajectory {
    pub launch_angle_deg: f64,
    /// One sample per step, launch point first, ground impact (y <= 0) last.
    pub positions: Vec<Position>,
    /// Sample where vy first became non-positive.
    pub apex: Position,
    pub apex_index: usize,
    pub flight_time_s: f64,
}

impl Trajectory {
    pub fn launch_point(&self) -> Position {
        self.positions[0]
    }

    pub fn impact(&self) -> Position {
        self.positions[self.positions.len() - 1]
    }

    /// Horizontal distance covered at impact (m).
    pub fn range(&self) -> f64 {
        self.impact().x
    }

    pub fn max_height(&self) -> f64 {
        self.apex.y
    }

    /// False when the shot left the muzzle with vy <= 0 and never climbed.
    pub fn ascended(&self) -> bool {
        self.apex_index > 0
    }

    /// Every `stride`-th sample, always ending on the impact sample.
    pub fn downsample(&self, stride: usize) -> Vec<Position> {
        let stride = stride.max(1);
        let mut out: Vec<Position> = self.positions.iter().step_by(stride).copied().collect();
        if (self.positions.len() - 1) % stride != 0 {
            out.push(self.impact());
        }
        out
    }
}

/// Integrator plus the drag curve it evaluates.
#[derive(Clone, Copy)]
pub struct Solver<'a> {
    pub config: SolverConfig,
    pub drag_fn: &'a DragFn,
}

impl Default for Solver<'static> {
    fn default() -> Self {
        Self { config: SolverConfig::default(), drag_fn: &g7_reference }
    }
}

impl std::fmt::Debug for Solver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solver").field("config", &self.config).finish_non_exhaustive()
    }
}

/// Simulate one shot with the G7 curve and default settings.
pub fn simulate(angle_deg: f64, shot: &Shot) -> Result<Trajectory> {
    Solver::default().simulate(angle_deg, shot)
}

/// Find a launch angle (deg) reaching `target_range_m` with the default search.
pub fn find_angle(target_range_m: f64, shot: &Shot) -> Result<f64> {
    Solver::default().find_angle(target_range_m, shot, &AngleSearch::default())
}

impl<'a> Solver<'a> {
    pub fn new(config: SolverConfig, drag_fn: &'a DragFn) -> Self {
        Self { config, drag_fn }
    }

    /// Integrate from launch to ground impact.
    ///
    /// The ascent phase runs while vy > 0 and ends on the apex sample; the
    /// descent phase runs while y > 0, so the last sample may sit up to one
    /// step below the ground.
    pub fn simulate(&self, angle_deg: f64, shot: &Shot) -> Result<Trajectory> {
        ensure_finite("angle_deg", angle_deg)?;
        shot.validate()?;
        ensure_positive("dt", self.config.dt)?;

        let (vx, vy) = to_components(shot.speed_mps, angle_deg);
        let mut s = State { t: 0.0, x: 0.0, y: shot.initial_height_m, vx, vy };
        let mut positions = vec![s.position()];
        let mut steps = 0usize;

        while s.vy > 0.0 {
            self.step(&mut s, shot, Phase::Ascent, &mut steps)?;
            positions.push(s.position());
        }

        let apex = s.position();
        let apex_index = positions.len() - 1;

        while s.y > 0.0 {
            self.step(&mut s, shot, Phase::Descent, &mut steps)?;
            positions.push(s.position());
        }

        let traj = Trajectory {
            launch_angle_deg: angle_deg,
            positions,
            apex,
            apex_index,
            flight_time_s: s.t,
        };
        trace!(
            "simulated {:.3} deg: {} samples, range {:.3} m, apex {:.3} m, {:.3} s",
            angle_deg,
            traj.positions.len(),
            traj.range(),
            traj.apex.y,
            traj.flight_time_s
        );
        Ok(traj)
    }

    /// Search `[min_angle_deg, max_angle_deg]` for an angle whose range lands
    /// within `tolerance` (relative) of `target_range_m`.
    ///
    /// Each miss moves the attempt by half of the current bracket width, after
    /// pulling the bracket edge in to the angle just tried. When the iteration
    /// budget runs out the last angle is accepted if it overshoots the target,
    /// otherwise the target is reported out of range.
    pub fn find_angle(
        &self,
        target_range_m: f64,
        shot: &Shot,
        search: &AngleSearch,
    ) -> Result<f64> {
        ensure_positive("target_range_m", target_range_m)?;
        search.validate()?;

        let mut try_angle = search.initial_angle_deg;
        let mut min = search.min_angle_deg;
        let mut max = search.max_angle_deg;
        let mut remaining = search.max_iterations;

        loop {
            let achieved = self.simulate(try_angle, shot)?.range();
            debug!(
                "angle search: {:.4} deg -> {:.3} m (target {:.3} m, {} left)",
                try_angle, achieved, target_range_m, remaining
            );

            if remaining == 0 && achieved < target_range_m {
                warn!("target range {target_range_m:.3} m not reachable (last {achieved:.3} m)");
                return Err(BallisticsError::OutOfRange {
                    target_m: target_range_m,
                    achieved_m: achieved,
                    iterations: search.max_iterations,
                });
            }
            if remaining == 0 || (target_range_m - achieved).abs() < target_range_m * search.tolerance {
                debug!("angle search settled on {try_angle:.4} deg");
                return Ok(try_angle);
            }

            if achieved < target_range_m {
                min = try_angle;
                try_angle += (max - min) / 2.0;
            } else {
                max = try_angle;
                try_angle -= (max - min) / 2.0;
            }
            remaining -= 1;
        }
    }

    fn step(&self, s: &mut State, shot: &Shot, phase: Phase, steps: &mut usize) -> Result<()> {
        if *steps >= self.config.max_steps {
            warn!("step limit of {} reached at t = {:.3} s, y = {:.3} m", self.config.max_steps, s.t, s.y);
            return Err(BallisticsError::StepLimit { max_steps: self.config.max_steps });
        }
        *steps += 1;

        let dt = self.config.dt;
        s.x += s.vx * dt;
        s.y += s.vy * dt;

        // Coefficients are frozen for the step, taken at the new altitude and the old speed.
        let rho = air_density(s.y);
        let cd = (self.drag_fn)(mach_number(to_speed(s.vx, s.vy))) * shot.drag_coefficient;
        let k = rho * cd * shot.frontal_area_m2 / (2.0 * shot.mass_kg);

        let drag_x = k * s.vx * s.vx * dt;
        let drag_y = match phase {
            Phase::Ascent => k * s.vy * s.vy * dt,
            Phase::Descent => -(k * s.vy * s.vy * dt),
        };
        s.vx -= drag_x;
        s.vy -= drag_y + G * dt;
        s.t += dt;
        Ok(())
    }
}

/* ------------------------------- internals ------------------------------- */

#[derive(Clone, Copy, Debug)]
enum Phase {
    Ascent,
    Descent,
}

#[derive(Clone, Copy, Debug)]
struct State {
    t: f64,          // time (s)
    x: f64, y: f64,   // position (m)
    vx: f64, vy: f64, // velocity (m/s)
}

impl State {
    fn position(&self) -> Position {
        Position { x: self.x, y: self.y }
    }
}

/* ----------------------------------- tests ---------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ballistics_core::{vacuum_flight_time, vacuum_range};

    fn vacuum_shot(speed: f64, height: f64) -> Shot {
        Shot {
            speed_mps: speed,
            initial_height_m: height,
            drag_coefficient: 0.0,
            frontal_area_m2: 0.0,
            mass_kg: 1.0,
        }
    }

    // Simple toy drag: c(M) = 0.5 for all M (NOT a real curve).
    fn flat_drag(_: f64) -> f64 {
        0.5
    }

    #[test]
    fn starts_at_launch_point_and_ends_on_the_ground() {
        let shot = Shot::from_diameter(50.0, 2.0, 0.5, 0.05, 0.02);
        for &angle in &[1.0, 15.0, 45.0, 70.0, 89.0] {
            let traj = simulate(angle, &shot).unwrap();
            assert_eq!(traj.launch_point(), Position { x: 0.0, y: 2.0 });
            assert!(traj.impact().y <= 0.0);
            assert!(traj.apex.y >= 2.0);
            assert!(traj.ascended());
            assert_abs_diff_eq!(traj.launch_angle_deg, angle);
            assert_eq!(traj.positions[traj.apex_index], traj.apex);
        }
    }

    #[test]
    fn x_never_decreases_and_time_matches_sample_count() {
        let shot = Shot::from_diameter(300.0, 0.0, 1.0, 0.01, 0.01);
        let traj = simulate(30.0, &shot).unwrap();
        for w in traj.positions.windows(2) {
            assert!(w[1].x >= w[0].x);
        }
        let steps = (traj.positions.len() - 1) as f64;
        assert_relative_eq!(traj.flight_time_s, steps * DEFAULT_DT, max_relative = 1e-9);
    }

    #[test]
    fn apex_is_the_highest_sample() {
        let shot = Shot::from_diameter(120.0, 5.0, 0.8, 0.03, 0.05);
        let traj = simulate(55.0, &shot).unwrap();
        let highest = traj.positions.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        assert_abs_diff_eq!(traj.max_height(), highest, epsilon = 1e-3);
        assert!(traj.apex.y >= traj.impact().y);
    }

    #[test]
    fn drag_free_run_matches_closed_form() {
        for &angle in &[15.0, 30.0, 45.0, 60.0] {
            let traj = simulate(angle, &vacuum_shot(100.0, 0.0)).unwrap();
            assert_relative_eq!(traj.range(), vacuum_range(100.0, angle), max_relative = 1e-3);
            assert_abs_diff_eq!(traj.flight_time_s, vacuum_flight_time(100.0, angle), epsilon = 0.01);
        }
    }

    #[test]
    fn zero_area_behaves_like_vacuum() {
        let shot = Shot { drag_coefficient: 0.7, ..vacuum_shot(80.0, 0.0) };
        let traj = simulate(40.0, &shot).unwrap();
        let vac = simulate(40.0, &vacuum_shot(80.0, 0.0)).unwrap();
        assert_eq!(traj, vac);
    }

    #[test]
    fn downward_launch_skips_ascent() {
        let traj = simulate(-30.0, &vacuum_shot(100.0, 10.0)).unwrap();
        assert!(!traj.ascended());
        assert_eq!(traj.apex, traj.launch_point());
        assert!(traj.impact().y <= 0.0);
        assert!(traj.range() > 0.0);
    }

    #[test]
    fn level_launch_from_the_ground_is_a_single_sample() {
        let traj = simulate(0.0, &vacuum_shot(100.0, 0.0)).unwrap();
        assert_eq!(traj.positions, vec![Position { x: 0.0, y: 0.0 }]);
        assert_abs_diff_eq!(traj.flight_time_s, 0.0);
        assert_abs_diff_eq!(traj.range(), 0.0);
    }

    #[test]
    fn climbing_past_the_ceiling_stays_finite() {
        // Vacuum shot straight up to ~115 km; density must not turn into NaN.
        let traj = simulate(89.0, &vacuum_shot(1_500.0, 0.0)).unwrap();
        assert!(traj.apex.y > 100_000.0);
        assert!(traj.range().is_finite());
        assert!(traj.impact().y <= 0.0);
    }

    #[test]
    fn custom_drag_function_and_step() {
        let solver = Solver::new(SolverConfig { dt: 0.002, ..SolverConfig::default() }, &flat_drag);
        let shot = Shot::from_diameter(60.0, 0.0, 1.0, 0.05, 0.02);
        let traj = solver.simulate(45.0, &shot).unwrap();
        let steps = (traj.positions.len() - 1) as f64;
        assert_relative_eq!(traj.flight_time_s, steps * 0.002, max_relative = 1e-9);
        assert!(traj.range() < vacuum_range(60.0, 45.0));
    }

    #[test]
    fn rejects_invalid_inputs() {
        let good = Shot::from_diameter(50.0, 0.0, 0.5, 0.05, 0.02);
        let cases = [
            (Shot { mass_kg: 0.0, ..good }, "mass_kg"),
            (Shot { mass_kg: -1.0, ..good }, "mass_kg"),
            (Shot { speed_mps: 0.0, ..good }, "speed_mps"),
            (Shot { speed_mps: f64::NAN, ..good }, "speed_mps"),
            (Shot { frontal_area_m2: -0.1, ..good }, "frontal_area_m2"),
            (Shot { drag_coefficient: -0.5, ..good }, "drag_coefficient"),
            (Shot { initial_height_m: 50_000.0, ..good }, "initial_height_m"),
        ];
        for (shot, expected) in cases {
            match simulate(45.0, &shot) {
                Err(BallisticsError::InvalidParameter { name, .. }) => assert_eq!(name, expected),
                other => panic!("expected {expected} to be rejected, got {other:?}"),
            }
        }
        assert!(simulate(f64::INFINITY, &good).is_err());

        let bad_dt = Solver::new(SolverConfig { dt: 0.0, ..SolverConfig::default() }, &g7_reference);
        assert!(bad_dt.simulate(45.0, &good).is_err());
    }

    #[test]
    fn step_limit_is_reported() {
        let solver = Solver::new(SolverConfig { dt: DEFAULT_DT, max_steps: 100 }, &g7_reference);
        let err = solver.simulate(45.0, &vacuum_shot(100.0, 0.0)).unwrap_err();
        assert_eq!(err, BallisticsError::StepLimit { max_steps: 100 });
    }

    #[test]
    fn downsample_keeps_the_impact_sample() {
        let traj = simulate(45.0, &vacuum_shot(20.0, 0.0)).unwrap();
        let n = traj.positions.len();

        let every_tenth = traj.downsample(10);
        assert_eq!(every_tenth[0], traj.launch_point());
        assert_eq!(*every_tenth.last().unwrap(), traj.impact());
        assert_eq!(every_tenth.len(), (n - 1) / 10 + 1 + usize::from((n - 1) % 10 != 0));

        assert_eq!(traj.downsample(0), traj.positions);
        assert_eq!(traj.downsample(1), traj.positions);
        assert_eq!(traj.downsample(n + 5), vec![traj.launch_point(), traj.impact()]);
    }

    #[test]
    fn search_validation() {
        let shot = vacuum_shot(100.0, 0.0);
        let solver = Solver::default();
        let inverted = AngleSearch { min_angle_deg: 45.0, max_angle_deg: -10.0, ..AngleSearch::default() };
        assert!(solver.find_angle(500.0, &shot, &inverted).is_err());
        let no_tol = AngleSearch { tolerance: 0.0, ..AngleSearch::default() };
        assert!(solver.find_angle(500.0, &shot, &no_tol).is_err());
        assert!(find_angle(0.0, &shot).is_err());
        assert!(find_angle(-5.0, &shot).is_err());
    }

    #[test]
    fn zero_iterations_judges_the_first_attempt() {
        let shot = vacuum_shot(100.0, 0.0);
        let solver = Solver::default();
        let once = AngleSearch { max_iterations: 0, ..AngleSearch::default() };
        // 27.5 deg carries ~835 m: overshooting a 100 m target is accepted as-is.
        assert_abs_diff_eq!(solver.find_angle(100.0, &shot, &once).unwrap(), 27.5);
        assert!(matches!(
            solver.find_angle(900.0, &shot, &once),
            Err(BallisticsError::OutOfRange { iterations: 0, .. })
        ));
    }
}
