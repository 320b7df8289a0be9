//! Lane Flow Library
//!
//! A two-lane cellular-automaton traffic simulation. The `simulation` module
//! is the self-contained core; `display` renders its snapshots as text.

pub mod display;
pub mod simulation;
