//! Physics collaborator for the player-action core, backed by Rapier3D.
//!
//! The simulation only talks to physics through [`PhysicsBody`] and
//! [`RayCaster`]; [`PhysicsWorld`] is the Rapier implementation of both.

pub mod body;
pub mod collision;
pub mod physics_world;
pub mod raycast;

pub use body::*;
pub use collision::*;
pub use physics_world::*;
pub use raycast::*;

// Re-export Rapier for downstream crates
pub use rapier3d;

// Re-export common Rapier types
pub use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};
