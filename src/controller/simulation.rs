use crate::controller::InputState;
use crate::model::vehicle::clamp_dt;
use crate::model::{BoundaryConfig, LapConfig, LapState, TrackGeometry, VehicleParams, VehicleState};

/// All tuning for one session
///
/// Usage:
///   let sim = Simulation::new();
///   // or tweak:
///   let mut config = SimConfig::default();
///   config.vehicle.engine_accel = 15.0;
///   let sim = Simulation::with_config(config);
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimConfig {
    pub vehicle: VehicleParams,
    pub track: TrackGeometry,
    pub boundary: BoundaryConfig,
    pub lap: LapConfig,
}

/// Read-only projection of the simulation for the HUD
#[derive(Clone, Debug, PartialEq)]
pub struct HudReadout {
    /// |speed| in m/s, rounded
    pub speed: i32,
    /// Current lap time, seconds with two decimals
    pub lap_time: String,
    pub lap: u32,
    pub last_lap: Option<String>,
    pub best_lap: Option<String>,
    pub off_track: bool,
    /// Frames per second from the unclamped frame delta; None before a real frame
    pub fps: Option<u32>,
}

/// Explicit simulation context: owns the car, the lap state and the session clock
pub struct Simulation {
    pub config: SimConfig,
    pub vehicle: VehicleState,
    pub laps: LapState,
    /// Seconds of simulated time since the session started
    pub clock: f64,
    off_track: bool,
    frame_dt: f32,
}

impl Simulation {
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    pub fn with_config(config: SimConfig) -> Self {
        let start = config.track.start_point();
        Self {
            config,
            vehicle: VehicleState::at_rest(start),
            laps: LapState::new(start, 0.0),
            clock: 0.0,
            off_track: false,
            frame_dt: 0.0,
        }
    }

    /// One frame: vehicle model, reset, soft boundary, lap detection.
    /// Returns the clamped dt actually integrated.
    pub fn step(&mut self, input: &InputState, dt: f32) -> f32 {
        self.frame_dt = dt;
        let dt = clamp_dt(dt);
        self.clock += dt as f64;

        self.vehicle = self.vehicle.step(input, dt, &self.config.vehicle);

        if input.reset {
            self.reset();
        }

        let cfg = &self.config;
        self.vehicle.speed = cfg.track.apply_boundary(self.vehicle.position, self.vehicle.speed, &cfg.boundary, &cfg.vehicle);

        let off_track = cfg.track.is_off_track(self.vehicle.position, &cfg.boundary);
        if off_track != self.off_track {
            tracing::debug!(off_track, x = self.vehicle.position.x, z = self.vehicle.position.y, "track limits");
            self.off_track = off_track;
        }

        let start = cfg.track.start_point();
        self.laps.update(self.vehicle.position, self.vehicle.speed, start, self.clock, &cfg.lap);

        dt
    }

    /// Back to the grid: car at rest on the start point, lap count and lap clock restarted
    pub fn reset(&mut self) {
        let start = self.config.track.start_point();
        self.vehicle = VehicleState::at_rest(start);
        let best_lap = self.laps.best_lap;
        self.laps = LapState::new(start, self.clock);
        self.laps.best_lap = best_lap;
        self.off_track = false;
        tracing::debug!("car reset to start");
    }

    pub fn hud(&self) -> HudReadout {
        HudReadout {
            speed: self.vehicle.speed.abs().round() as i32,
            lap_time: format!("{:.2}", self.laps.elapsed(self.clock)),
            lap: self.laps.lap,
            last_lap: self.laps.last_lap.map(|t| format!("{t:.2}")),
            best_lap: self.laps.best_lap.map(|t| format!("{t:.2}")),
            off_track: self.off_track,
            fps: frames_per_second(self.frame_dt),
        }
    }
}

fn frames_per_second(frame_dt: f32) -> Option<u32> {
    if frame_dt.is_finite() && frame_dt > 0.0 {
        Some((1.0 / frame_dt).round() as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_starts_on_grid() {
        let sim = Simulation::new();
        assert_eq!(sim.vehicle.position, Vec2::new(0.0, 16.0));
        assert_eq!(sim.vehicle.speed, 0.0);
        let hud = sim.hud();
        assert_eq!(hud.speed, 0);
        assert_eq!(hud.lap_time, "0.00");
        assert_eq!(hud.lap, 0);
        assert_eq!(hud.best_lap, None);
    }

    #[test]
    fn test_reset_restores_start() {
        let mut sim = Simulation::new();
        // along the bottom straight; the grid heading points straight off track
        sim.vehicle.heading = FRAC_PI_2;
        let drive = InputState { forward: true, ..InputState::default() };
        for _ in 0..60 {
            sim.step(&drive, 1.0 / 60.0);
        }
        sim.laps.lap = 3;
        assert!(!sim.hud().off_track);
        assert!(sim.vehicle.speed > 5.0, "speed {}", sim.vehicle.speed);
        assert!(sim.vehicle.position.x > 3.0, "x {}", sim.vehicle.position.x);

        let reset = InputState { reset: true, forward: true, ..InputState::default() };
        sim.step(&reset, 1.0 / 60.0);
        assert_eq!(sim.vehicle, VehicleState::at_rest(Vec2::new(0.0, 16.0)));
        assert_eq!(sim.laps.lap, 0);
        assert_eq!(sim.hud().lap_time, "0.00");
    }

    #[test]
    fn test_clock_uses_clamped_dt() {
        let mut sim = Simulation::new();
        assert_eq!(sim.step(&InputState::default(), 5.0), 0.1);
        assert_eq!(sim.step(&InputState::default(), -1.0), 0.0);
        assert!((sim.clock - 0.1).abs() < 1e-6);
        assert_eq!(sim.hud().lap_time, "0.10");
    }

    #[test]
    fn test_invariants_hold_off_track() {
        let mut sim = Simulation::new();
        let params = sim.config.vehicle;
        let input = InputState { forward: true, right: true, ..InputState::default() };
        for i in 0..3000 {
            let dt = [0.016, 0.05, 0.1, 0.001][i % 4];
            sim.step(&input, dt);
            assert!(sim.vehicle.speed <= params.max_speed && sim.vehicle.speed >= -params.max_reverse);
            assert!(sim.vehicle.steer_angle.abs() <= params.max_steer);
        }
    }

    #[test]
    fn test_boundary_slows_car_off_track() {
        let mut sim = Simulation::new();
        sim.vehicle.position = Vec2::new(45.0, 0.0);
        sim.vehicle.speed = 15.0;
        sim.vehicle.heading = FRAC_PI_2;
        let coast = InputState::default();

        let free = sim.vehicle.step(&coast, 0.016, &sim.config.vehicle);
        sim.step(&coast, 0.016);
        assert!(sim.vehicle.speed < free.speed);
        assert!(sim.vehicle.speed > 0.0);
        assert!(sim.hud().off_track);
    }

    #[test]
    fn test_fps_uses_real_frame_time() {
        let mut sim = Simulation::new();
        assert_eq!(sim.hud().fps, None);

        sim.step(&InputState::default(), 1.0 / 60.0);
        assert_eq!(sim.hud().fps, Some(60));

        // a stall is integrated as 0.1 s but still reported as it happened
        sim.step(&InputState::default(), 0.5);
        assert_eq!(sim.hud().fps, Some(2));

        sim.step(&InputState::default(), 0.0);
        assert_eq!(sim.hud().fps, None);
    }

    #[test]
    fn test_hud_rounds_absolute_speed() {
        let mut sim = Simulation::new();
        sim.vehicle.speed = -5.6;
        assert_eq!(sim.hud().speed, 6);
        sim.vehicle.speed = 12.4;
        assert_eq!(sim.hud().speed, 12);
    }
}
