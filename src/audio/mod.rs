pub mod bluetooth;
pub mod device;
pub mod permission;
pub mod route;
pub mod wired;

pub use bluetooth::{BluetoothHeadsetTracker, ScoState};
pub use device::{AudioDevice, DeviceKind};
pub use permission::PermissionGate;
pub use route::RouteController;
pub use wired::WiredHeadsetTracker;
