//! Force layout simulator and camera.
//!
//! [`LayoutEngine`] owns a [`Simulation`] built from a
//! [`GraphSnapshot`](crate::graph::GraphSnapshot) and a [`Camera`]. Node ids
//! are resolved to arena indices inside the simulation only.

mod camera;
mod engine;
mod forces;
pub mod scale;
mod simulation;

pub use camera::{Camera, ViewTransform, ease_in_out_cubic};
pub use engine::{EngineState, LayoutEngine};
pub use scale::PhysicsParams;
pub use simulation::{Body, Simulation, Spring, bubble_radius};
