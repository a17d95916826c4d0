//! Input handling for keyboard and mouse, and the per-tick snapshot the simulation reads.

use glam::Vec2;
use std::collections::HashSet;

/// Manages input state for the current frame.
#[derive(Debug, Default)]
pub struct InputState {
    /// Keys currently held down.
    keys_held: HashSet<KeyCode>,
    /// Keys pressed this frame.
    keys_pressed: HashSet<KeyCode>,
    /// Keys released this frame.
    keys_released: HashSet<KeyCode>,

    /// Mouse buttons currently held.
    mouse_held: HashSet<MouseButton>,
    /// Mouse buttons pressed this frame.
    mouse_pressed: HashSet<MouseButton>,
    /// Mouse buttons released this frame.
    mouse_released: HashSet<MouseButton>,

    /// Mouse movement delta this frame.
    mouse_delta: Vec2,
    /// Accumulated mouse delta (for when cursor is locked).
    accumulated_delta: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame state. Call at the start of each frame.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.mouse_pressed.clear();
        self.mouse_released.clear();
        self.mouse_delta = self.accumulated_delta;
        self.accumulated_delta = Vec2::ZERO;
    }

    /// Process a keyboard event.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.keys_held.contains(&key) {
                    self.keys_pressed.insert(key);
                }
                self.keys_held.insert(key);
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
                self.keys_released.insert(key);
            }
        }
    }

    /// Process a mouse button event.
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.mouse_held.contains(&button) {
                    self.mouse_pressed.insert(button);
                }
                self.mouse_held.insert(button);
            }
            ElementState::Released => {
                self.mouse_held.remove(&button);
                self.mouse_released.insert(button);
            }
        }
    }

    /// Process mouse movement.
    pub fn process_mouse_motion(&mut self, delta: (f64, f64)) {
        self.accumulated_delta.x += delta.0 as f32;
        self.accumulated_delta.y += delta.1 as f32;
    }

    // Query methods

    /// Check if a key is currently held.
    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Check if a key was pressed this frame.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Check if a key was released this frame.
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    /// Check if a mouse button is held.
    pub fn is_mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    /// Check if a mouse button was pressed this frame.
    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed.contains(&button)
    }

    /// Check if a mouse button was released this frame.
    pub fn is_mouse_released(&self, button: MouseButton) -> bool {
        self.mouse_released.contains(&button)
    }

    /// Get the mouse movement delta for this frame.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    fn held(&self, binding: Binding) -> bool {
        match binding {
            Binding::Key(key) => self.is_key_held(key),
            Binding::Mouse(button) => self.is_mouse_held(button),
        }
    }

    fn pressed(&self, binding: Binding) -> bool {
        match binding {
            Binding::Key(key) => self.is_key_pressed(key),
            Binding::Mouse(button) => self.is_mouse_pressed(button),
        }
    }

    fn released(&self, binding: Binding) -> bool {
        match binding {
            Binding::Key(key) => self.is_key_released(key),
            Binding::Mouse(button) => self.is_mouse_released(button),
        }
    }

    /// Raw axis value in [-1, 1] from a negative/positive key pair (no smoothing).
    fn axis(&self, negative: KeyCode, positive: KeyCode) -> f32 {
        let mut value = 0.0;
        if self.is_key_held(positive) {
            value += 1.0;
        }
        if self.is_key_held(negative) {
            value -= 1.0;
        }
        value
    }

    /// Build this frame's read-only snapshot for the simulation.
    pub fn snapshot(&self, binds: &Keybinds) -> InputSnapshot {
        InputSnapshot {
            fire_held: self.held(binds.fire),
            fire_pressed: self.pressed(binds.fire),
            aim_held: self.held(binds.aim),
            reload_pressed: self.pressed(binds.reload),
            jump_held: self.held(binds.jump),
            crouch_pressed: self.pressed(binds.crouch),
            crouch_released: self.released(binds.crouch),
            crouch_held: self.held(binds.crouch),
            pickup_pressed: self.pressed(binds.pickup),
            drop_pressed: self.pressed(binds.drop),
            horizontal: self.axis(binds.left, binds.right),
            vertical: self.axis(binds.back, binds.forward),
            look_delta: self.mouse_delta,
        }
    }
}

/// A key or mouse button bound to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Key(KeyCode),
    Mouse(MouseButton),
}

/// Action bindings.
#[derive(Debug, Clone)]
pub struct Keybinds {
    pub forward: KeyCode,
    pub back: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
    pub fire: Binding,
    pub aim: Binding,
    pub reload: Binding,
    pub jump: Binding,
    pub crouch: Binding,
    pub pickup: Binding,
    pub drop: Binding,
}

impl Default for Keybinds {
    fn default() -> Self {
        Self {
            forward: KeyCode::KeyW,
            back: KeyCode::KeyS,
            left: KeyCode::KeyA,
            right: KeyCode::KeyD,
            fire: Binding::Mouse(MouseButton::Left),
            aim: Binding::Mouse(MouseButton::Right),
            reload: Binding::Key(KeyCode::KeyR),
            jump: Binding::Key(KeyCode::Space),
            crouch: Binding::Key(KeyCode::ControlLeft),
            pickup: Binding::Key(KeyCode::KeyE),
            drop: Binding::Key(KeyCode::KeyQ),
        }
    }
}

/// Everything the simulation may ask about input during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    pub fire_held: bool,
    /// Fire went down this tick.
    pub fire_pressed: bool,
    pub aim_held: bool,
    pub reload_pressed: bool,
    pub jump_held: bool,
    pub crouch_pressed: bool,
    pub crouch_released: bool,
    pub crouch_held: bool,
    pub pickup_pressed: bool,
    pub drop_pressed: bool,
    /// Strafe axis, -1 (left) to 1 (right).
    pub horizontal: f32,
    /// Forward axis, -1 (back) to 1 (forward).
    pub vertical: f32,
    /// Mouse movement this tick.
    pub look_delta: Vec2,
}

impl InputSnapshot {
    /// No movement keys held.
    pub fn has_no_move_input(&self) -> bool {
        self.horizontal == 0.0 && self.vertical == 0.0
    }
}

// Re-export for convenience
pub use winit::event::{ElementState, MouseButton};
pub use winit::keyboard::KeyCode;
