//! Flood Transit Library
//!
//! Simulates bus services that must keep running while a flood rises,
//! rerouting around inundated roads or abandoning routes that cannot be served.

pub mod simulation;
