//! Collision groups, body handle bundles, and contact points.

use engine_core::Vec3;
use rapier3d::prelude::*;

use crate::PhysicsWorld;

/// Collision groups for different object types.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionGroup {
    /// Static environment (ground, walls)
    Environment = 1 << 0,
    /// Player character
    Player = 1 << 1,
    /// Weapons, both lying in the world and thrown
    Weapon = 1 << 2,
    /// Shootable targets
    Target = 1 << 3,
}

impl CollisionGroup {
    fn bits(groups: &[CollisionGroup]) -> Group {
        Group::from_bits_retain(groups.iter().fold(0, |acc, g| acc | *g as u32))
    }

    /// Create a collision group for environment.
    pub fn environment() -> InteractionGroups {
        InteractionGroups::new(Self::bits(&[Self::Environment]), Group::ALL)
    }

    /// Create a collision group for the player capsule.
    pub fn player() -> InteractionGroups {
        InteractionGroups::new(
            Self::bits(&[Self::Player]),
            Self::bits(&[Self::Environment, Self::Target]),
        )
    }

    /// Create a collision group for weapons. They never push the player around.
    pub fn weapon() -> InteractionGroups {
        InteractionGroups::new(
            Self::bits(&[Self::Weapon]),
            Self::bits(&[Self::Environment, Self::Target, Self::Weapon]),
        )
    }

    /// Create a collision group for targets.
    pub fn target() -> InteractionGroups {
        InteractionGroups::new(
            Self::bits(&[Self::Target]),
            Self::bits(&[Self::Environment, Self::Player, Self::Weapon]),
        )
    }

    /// Query groups that only see environment geometry (ground probes).
    pub fn environment_query() -> InteractionGroups {
        InteractionGroups::new(Group::ALL, Self::bits(&[Self::Environment]))
    }
}

/// Links a simulated object to its physics handles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyHandles {
    pub rigid_body: RigidBodyHandle,
    pub collider: ColliderHandle,
}

impl BodyHandles {
    pub fn new(rigid_body: RigidBodyHandle, collider: ColliderHandle) -> Self {
        Self {
            rigid_body,
            collider,
        }
    }
}

/// One point of an active contact between two colliders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    /// The collider that was touched.
    pub other: ColliderHandle,
    /// World position of the contact.
    pub point: Vec3,
    /// Surface normal of `other` at the contact, pointing back toward the queried collider.
    pub normal: Vec3,
}

impl PhysicsWorld {
    /// All active contact points involving `collider` after the last step.
    pub fn contacts_with(&self, collider: ColliderHandle) -> Vec<ContactPoint> {
        let mut contacts = Vec::new();
        for pair in self.narrow_phase.contact_pairs_with(collider) {
            if !pair.has_any_active_contact {
                continue;
            }
            let (other, flip) = if pair.collider1 == collider {
                (pair.collider2, true)
            } else {
                (pair.collider1, false)
            };
            for manifold in &pair.manifolds {
                // The manifold normal points from collider1 toward collider2.
                let n = manifold.data.normal;
                let normal = if flip {
                    Vec3::new(-n.x, -n.y, -n.z)
                } else {
                    Vec3::new(n.x, n.y, n.z)
                };
                for contact in &manifold.data.solver_contacts {
                    contacts.push(ContactPoint {
                        other,
                        point: Vec3::new(contact.point.x, contact.point.y, contact.point.z),
                        normal,
                    });
                }
            }
        }
        contacts
    }
}
