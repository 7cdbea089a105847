//! Output Driver Adapters

mod simulated_driver;

pub use simulated_driver::{SimulatedDriverConfig, SimulatedDriverFactory, SimulatedOutputDriver};
