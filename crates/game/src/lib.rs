//! First-person player-action core: locomotion, fire control, recoil and
//! weapon possession over a Rapier physics world.
//!
//! [`Simulation`] wires the subsystems together; each one can also be driven
//! on its own against the [`physics::PhysicsBody`] and [`physics::RayCaster`]
//! seams.

pub mod config;
pub mod damage;
pub mod error;
pub mod feedback;
pub mod locomotion;
pub mod look;
pub mod possession;
pub mod recoil;
pub mod simulation;
pub mod sway;
pub mod weapons;

#[cfg(test)]
mod test_support;

pub use config::{default_config_path, GameConfig};
pub use damage::{Damageable, DamageableWorld, Target, TargetRegistry};
pub use error::{ConfigError, SetupError};
pub use feedback::{
    AnimatorId, AudioCue, EffectKind, FeedbackEvent, FeedbackLog, FeedbackSink, LogFeedback,
};
pub use locomotion::{Locomotion, MovementConfig, MovementState};
pub use look::{LookConfig, PlayerLook};
pub use possession::{EquipSlot, PickupConfig, Possession, PossessionState, WeaponId};
pub use recoil::{RecoilConfig, RecoilIntegrator, RecoilPose};
pub use simulation::{Simulation, SimulationBuilder, WeaponEntity};
pub use sway::{SwayConfig, WeaponSway};
pub use weapons::{AnimationEvent, FireControl, FireState, ShotOutcome, WeaponConfig};
