//! Common ECS components used across the engine.

/// Health component for damageable entities.
#[derive(Debug, Clone, Copy)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Subtract damage. Health may go negative; death is `current <= 0`.
    pub fn take_damage(&mut self, amount: f32) {
        self.current -= amount;
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// Lifetime component for temporary entities (transient effects, thrown objects).
#[derive(Debug, Clone, Copy)]
pub struct Lifetime {
    pub remaining: f32,
}

impl Lifetime {
    pub fn new(seconds: f32) -> Self {
        Self { remaining: seconds }
    }

    /// Count down; returns true once expired.
    pub fn update(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining <= 0.0
    }
}
