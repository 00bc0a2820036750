pub mod adapters;
pub mod simulated;
pub mod traits;

#[cfg(any(test, feature = "test-mocks"))]
pub mod mocks;

pub use adapters::*;
pub use simulated::*;
pub use traits::*;

#[cfg(any(test, feature = "test-mocks"))]
pub use mocks::*;
