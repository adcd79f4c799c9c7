// MODEL: Simulation state and procedural geometry
pub mod vehicle;
pub mod track;
pub mod lap;
pub mod car;
pub mod camera;

pub use vehicle::{VehicleState, VehicleParams, MAX_FRAME_DT};
pub use track::{TrackGeometry, BoundaryConfig};
pub use lap::{LapState, LapConfig};
pub use car::{CarPose, WheelVisuals};
pub use camera::Camera;
