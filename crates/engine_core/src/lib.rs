//! Core engine types and utilities shared by the simulation crates.
//!
//! This crate provides the foundational types used across all systems:
//! - Transform and parent/child pose composition
//! - Frame and fixed-step time management
//! - Delayed actions keyed by purpose
//! - Frame-rate independent smoothing
//! - Common component types for ECS

pub mod components;
pub mod smoothing;
pub mod time;
pub mod timers;
pub mod transform;

pub use components::*;
pub use smoothing::*;
pub use time::*;
pub use timers::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Quat, Vec2, Vec3};
pub use hecs::{Entity, World};
