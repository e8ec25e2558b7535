//! Event broadcast port.

pub mod ports;

pub use ports::EventPublisher;
