//! Rate limiting logic and state management.

mod gate;
mod window;

pub use gate::{GateClosed, RateGate};
pub use window::TimeWindow;
