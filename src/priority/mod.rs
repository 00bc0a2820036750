pub mod manager;

pub use manager::{DevicePriorityManager, PreferredOrder};
