use glam::{Vec2, Vec3};

use crate::controller::InputState;

/// Largest frame step the simulation accepts, in seconds.
/// Longer gaps (tab suspended, debugger pause) are integrated as this.
pub const MAX_FRAME_DT: f32 = 0.1;

/// Tuning for the kinematic bicycle model (SI units)
///
/// Usage:
///   let params = VehicleParams::default();
///   let next = state.step(&input, dt, &params);
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VehicleParams {
    /// Distance between front and rear axle (m)
    pub wheelbase: f32,
    /// Top forward speed (m/s)
    pub max_speed: f32,
    /// Top reverse speed, positive (m/s)
    pub max_reverse: f32,
    /// Effective engine acceleration (m/s²)
    pub engine_accel: f32,
    /// Braking / reversing deceleration (m/s²)
    pub brake_decel: f32,
    /// Constant rolling resistance when coasting (m/s²)
    pub rolling_drag: f32,
    /// Quadratic aerodynamic drag coefficient (1/m)
    pub aero_drag: f32,
    /// Steering lock (rad)
    pub max_steer: f32,
    /// How fast the driver turns the wheel (rad/s)
    pub steering_speed: f32,
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            wheelbase: 2.2,
            max_speed: 220.0 / 3.6,
            max_reverse: 25.0 / 3.6,
            engine_accel: 12.0,
            brake_decel: 30.0,
            rolling_drag: 0.5,
            aero_drag: 0.045,
            max_steer: std::f32::consts::PI / 8.0,
            steering_speed: 3.5,
        }
    }
}

/// Dynamic state of the car on the ground plane.
///
/// `position.x` is world X and `position.y` is world Z; the car always sits at Y = 0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VehicleState {
    pub speed: f32,
    pub heading: f32,
    pub steer_angle: f32,
    pub position: Vec2,
}

impl VehicleState {
    /// Car at rest at `position`, facing +Z
    pub fn at_rest(position: Vec2) -> Self {
        Self {
            speed: 0.0,
            heading: 0.0,
            steer_angle: 0.0,
            position,
        }
    }

    pub fn world_position(&self) -> Vec3 {
        Vec3::new(self.position.x, 0.0, self.position.y)
    }

    /// Unit vector the nose points to on the ground plane (x, z)
    pub fn forward(&self) -> Vec2 {
        Vec2::new(self.heading.sin(), self.heading.cos())
    }

    /// Advance one frame. Pure: the receiver is left untouched.
    pub fn step(&self, input: &InputState, dt: f32, params: &VehicleParams) -> Self {
        let dt = clamp_dt(dt);
        let mut next = *self;

        // longitudinal: engine / brake / rolling, then aero
        if input.forward {
            next.speed += params.engine_accel * dt;
        } else if input.backward {
            next.speed -= params.brake_decel * dt;
        } else {
            next.speed = apply_rolling_resistance(next.speed, params.rolling_drag * dt);
        }
        let drag = params.aero_drag * next.speed * next.speed.abs();
        next.speed -= drag * dt;
        next.speed = clamp_speed(next.speed, params);

        let steer_dir = input.left as i32 as f32 - input.right as i32 as f32;
        next.steer_angle += steer_dir * params.steering_speed * dt;
        next.steer_angle = next.steer_angle.clamp(-params.max_steer, params.max_steer);

        // bicycle model: yaw rate = v / L * tan(delta)
        let yaw_rate = (next.speed / params.wheelbase) * next.steer_angle.tan();
        next.heading += yaw_rate * dt;

        next.position.x += next.heading.sin() * next.speed * dt;
        next.position.y += next.heading.cos() * next.speed * dt;

        next
    }
}

pub fn clamp_dt(dt: f32) -> f32 {
    if dt.is_nan() {
        return 0.0;
    }
    dt.clamp(0.0, MAX_FRAME_DT)
}

pub fn clamp_speed(speed: f32, params: &VehicleParams) -> f32 {
    speed.min(params.max_speed).max(-params.max_reverse)
}

/// Rolling resistance opposes motion and stops at zero instead of pushing the car backwards.
fn apply_rolling_resistance(speed: f32, loss: f32) -> f32 {
    if speed.abs() <= loss {
        0.0
    } else {
        speed - speed.signum() * loss
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forward_only() -> InputState {
        InputState { forward: true, ..InputState::default() }
    }

    fn start() -> VehicleState {
        VehicleState::at_rest(Vec2::new(0.0, 16.0))
    }

    #[test]
    fn test_speed_stays_in_bounds_for_any_dt() {
        let params = VehicleParams::default();
        let inputs = [
            forward_only(),
            InputState { backward: true, ..InputState::default() },
            InputState::default(),
        ];
        for input in inputs.iter() {
            for dt in [0.0, 0.001, 0.016, 0.05, 0.1, 0.5, 10.0, f32::MAX] {
                let mut state = start();
                for _ in 0..500 {
                    state = state.step(input, dt, &params);
                    assert!(state.speed <= params.max_speed, "speed {} above max", state.speed);
                    assert!(state.speed >= -params.max_reverse, "speed {} below reverse", state.speed);
                }
            }
        }
    }

    #[test]
    fn test_forward_accelerates_monotonically() {
        let params = VehicleParams::default();
        let mut state = start();
        let mut previous = state.speed;
        for _ in 0..2000 {
            state = state.step(&forward_only(), 1.0 / 60.0, &params);
            assert!(state.speed >= previous, "speed dropped from {} to {}", previous, state.speed);
            assert!(state.speed <= params.max_speed);
            previous = state.speed;
        }
        // aero drag balances the engine well below the clamp
        let terminal = (params.engine_accel / params.aero_drag).sqrt();
        assert!((state.speed - terminal).abs() < 0.5, "speed {} terminal {}", state.speed, terminal);
    }

    #[test]
    fn test_coasting_decays_to_zero() {
        let params = VehicleParams::default();
        for initial in [15.0, -6.0] {
            let mut state = VehicleState { speed: initial, ..start() };
            let mut previous = state.speed.abs();
            for _ in 0..5000 {
                state = state.step(&InputState::default(), 1.0 / 60.0, &params);
                assert!(state.speed.abs() <= previous);
                previous = state.speed.abs();
            }
            assert_eq!(state.speed, 0.0);
        }
    }

    #[test]
    fn test_steer_angle_is_bounded() {
        let params = VehicleParams::default();
        let left = InputState { left: true, forward: true, ..InputState::default() };
        let right = InputState { right: true, ..InputState::default() };
        let mut state = start();
        for i in 0..600 {
            let input = if (i / 100) % 2 == 0 { &left } else { &right };
            state = state.step(input, 0.03, &params);
            assert!(state.steer_angle.abs() <= params.max_steer);
        }
    }

    #[test]
    fn test_no_steer_keys_keeps_angle() {
        let params = VehicleParams::default();
        let state = VehicleState { steer_angle: 0.2, ..start() };
        let next = state.step(&InputState::default(), 0.05, &params);
        assert_eq!(next.steer_angle, 0.2);
    }

    #[test]
    fn test_two_seconds_forward_matches_resimulation() {
        let params = VehicleParams::default();
        let dts = [0.016_f32, 0.017, 0.0165, 0.02, 0.033, 0.008, 0.1];
        let mut state = start();
        let mut speed = 0.0_f32;
        let mut z = 16.0_f32;
        let mut elapsed = 0.0_f32;
        let mut i = 0;
        while elapsed < 2.0 {
            let dt = dts[i % dts.len()];
            state = state.step(&forward_only(), dt, &params);

            speed += params.engine_accel * dt;
            let drag = params.aero_drag * speed * speed.abs();
            speed -= drag * dt;
            speed = speed.min(params.max_speed).max(-params.max_reverse);
            z += 0.0_f32.cos() * speed * dt;

            elapsed += dt;
            i += 1;
        }
        assert_eq!(state.speed, speed);
        assert_eq!(state.position.y, z);
        assert_eq!(state.position.x, 0.0);
        assert_eq!(state.heading, 0.0);
        // well below the drag-free 24 m/s
        assert!(state.speed > 10.0 && state.speed < 24.0);
    }

    #[test]
    fn test_heading_follows_bicycle_model() {
        let params = VehicleParams::default();
        let state = VehicleState { speed: 10.0, steer_angle: params.max_steer, ..start() };
        let next = state.step(&InputState::default(), 0.01, &params);
        assert!(next.heading > 0.0, "positive steer turns toward +heading");
        let expected = (next.speed / params.wheelbase) * params.max_steer.tan() * 0.01;
        assert!((next.heading - expected).abs() < 1e-6);
    }

    #[test]
    fn test_negative_and_nan_dt_are_ignored() {
        let params = VehicleParams::default();
        let state = VehicleState { speed: 5.0, ..start() };
        assert_eq!(state.step(&forward_only(), -1.0, &params), state);
        assert_eq!(state.step(&forward_only(), f32::NAN, &params), state);
    }
}
