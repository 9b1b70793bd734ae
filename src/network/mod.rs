//! Network layer - endpoint calls, profile fetches and document loading
//!
//! The Network actor receives call commands and sends back responses.

pub mod actor;
pub mod client;

pub use actor::NetworkActor;
