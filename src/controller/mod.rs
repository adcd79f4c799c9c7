// CONTROLLER: Input, game logic, and update loop
pub mod input;
pub mod camera_controller;
pub mod simulation;
pub mod frame_loop;

pub use input::{InputState, InputEvent, KeyBindings};
pub use camera_controller::{CameraController, ChaseCameraConfig};
pub use simulation::{Simulation, SimConfig, HudReadout};
pub use frame_loop::FrameLoopContext;
