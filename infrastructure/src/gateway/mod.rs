//! Provider gateway adapters

mod simulated;

pub use simulated::SimulatedGateway;
