//! Audio, animation and effect cues raised by the simulation.
//!
//! The core never plays sounds, drives animators or spawns particles itself;
//! it describes what should happen through a [`FeedbackSink`].

use engine_core::Transform;

/// Which sound to play. Clip selection within a category is up to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCue {
    Gunshot,
    DryFire,
    Reload,
}

/// Transient effect prefabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    MuzzleFlash,
    BulletImpact,
    Blood,
    ThrownImpact,
}

/// Identifies one animator (each weapon carries its own).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimatorId(pub u32);

/// Output side of the simulation.
pub trait FeedbackSink {
    fn play_audio(&mut self, cue: AudioCue);
    fn set_animation_bool(&mut self, animator: AnimatorId, name: &'static str, value: bool);
    fn set_animation_float(&mut self, animator: AnimatorId, name: &'static str, value: f32);
    fn spawn_effect(&mut self, effect: EffectKind, pose: Transform, lifetime: f32);
}

/// One recorded cue.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackEvent {
    Audio(AudioCue),
    AnimBool(AnimatorId, &'static str, bool),
    AnimFloat(AnimatorId, &'static str, f32),
    Effect(EffectKind, Transform, f32),
}

/// A sink that keeps every cue in order. Drained by the host each frame.
#[derive(Debug, Default)]
pub struct FeedbackLog {
    pub events: Vec<FeedbackEvent>,
}

impl FeedbackLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> Vec<FeedbackEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn count_audio(&self, cue: AudioCue) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, FeedbackEvent::Audio(c) if *c == cue))
            .count()
    }

    pub fn count_effects(&self, kind: EffectKind) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, FeedbackEvent::Effect(k, _, _) if *k == kind))
            .count()
    }

    /// Most recent value written to a bool animation parameter.
    pub fn last_bool(&self, animator: AnimatorId, name: &str) -> Option<bool> {
        self.events.iter().rev().find_map(|e| match e {
            FeedbackEvent::AnimBool(a, n, v) if *a == animator && *n == name => Some(*v),
            _ => None,
        })
    }

    /// Most recent value written to a float animation parameter.
    pub fn last_float(&self, animator: AnimatorId, name: &str) -> Option<f32> {
        self.events.iter().rev().find_map(|e| match e {
            FeedbackEvent::AnimFloat(a, n, v) if *a == animator && *n == name => Some(*v),
            _ => None,
        })
    }
}

impl FeedbackSink for FeedbackLog {
    fn play_audio(&mut self, cue: AudioCue) {
        self.events.push(FeedbackEvent::Audio(cue));
    }

    fn set_animation_bool(&mut self, animator: AnimatorId, name: &'static str, value: bool) {
        self.events.push(FeedbackEvent::AnimBool(animator, name, value));
    }

    fn set_animation_float(&mut self, animator: AnimatorId, name: &'static str, value: f32) {
        self.events.push(FeedbackEvent::AnimFloat(animator, name, value));
    }

    fn spawn_effect(&mut self, effect: EffectKind, pose: Transform, lifetime: f32) {
        self.events.push(FeedbackEvent::Effect(effect, pose, lifetime));
    }
}

/// A sink that only logs. Handy for headless runs.
#[derive(Debug, Default)]
pub struct LogFeedback;

impl FeedbackSink for LogFeedback {
    fn play_audio(&mut self, cue: AudioCue) {
        log::debug!("audio: {:?}", cue);
    }

    fn set_animation_bool(&mut self, animator: AnimatorId, name: &'static str, value: bool) {
        log::trace!("anim {:?} {} = {}", animator, name, value);
    }

    fn set_animation_float(&mut self, animator: AnimatorId, name: &'static str, value: f32) {
        log::trace!("anim {:?} {} = {:.2}", animator, name, value);
    }

    fn spawn_effect(&mut self, effect: EffectKind, pose: Transform, lifetime: f32) {
        log::debug!(
            "effect: {:?} at {:?} for {:.1}s",
            effect,
            pose.position,
            lifetime
        );
    }
}
