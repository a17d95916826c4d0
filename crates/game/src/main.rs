//! Headless demo: a scripted player walks, picks up a rifle, empties part of
//! a magazine into a target, reloads and throws the rifle at it.

use anyhow::Result;
use engine_core::{Transform, Vec3};
use game::{
    default_config_path, AnimationEvent, AudioCue, EffectKind, FeedbackLog, FeedbackSink,
    GameConfig, LogFeedback, Simulation, SimulationBuilder,
};
use input::{ElementState, InputState, KeyCode, Keybinds, MouseButton};
use physics::PhysicsWorld;

const FRAME_DT: f32 = 1.0 / 60.0;

/// One input change at a point in the script.
#[derive(Debug, Clone, Copy)]
enum Action {
    Key(KeyCode, ElementState),
    Mouse(MouseButton, ElementState),
    Look(f64, f64),
    ReloadAnimationDone,
}

/// `(time in seconds, action)`, sorted by time.
fn script() -> Vec<(f32, Action)> {
    use Action::*;
    use ElementState::{Pressed, Released};
    vec![
        (0.5, Key(KeyCode::KeyE, Pressed)),
        (0.55, Key(KeyCode::KeyE, Released)),
        (1.0, Mouse(MouseButton::Left, Pressed)),
        (1.8, Mouse(MouseButton::Left, Released)),
        (2.0, Key(KeyCode::KeyR, Pressed)),
        (2.05, Key(KeyCode::KeyR, Released)),
        (4.1, ReloadAnimationDone),
        (4.5, Key(KeyCode::KeyW, Pressed)),
        (5.5, Key(KeyCode::KeyW, Released)),
        (5.6, Look(0.0, 4.0)),
        (6.0, Key(KeyCode::KeyQ, Pressed)),
        (6.05, Key(KeyCode::KeyQ, Released)),
    ]
}

fn build_scene(config: GameConfig) -> Result<Simulation> {
    let mut physics = PhysicsWorld::new();
    physics.add_ground_plane();
    physics.add_static_cuboid(Vec3::new(0.0, 2.0, -20.0), Vec3::new(10.0, 2.0, 0.5));

    let player = physics.add_player_body(
        Vec3::new(0.0, 1.0, 0.0),
        config.movement.player_height,
        0.4,
    );
    let rifle = physics.add_weapon_body(Vec3::new(0.0, 0.3, -1.0), Vec3::new(0.05, 0.1, 0.35));
    let target = physics.add_target_body(Vec3::new(0.0, 1.5, -12.0), Vec3::new(0.5, 1.5, 0.3));

    let sim = SimulationBuilder::new(config)
        .physics(physics)
        .player_body(player)
        .camera(Vec3::new(0.0, 0.5, 0.0))
        .carry_frame(Transform::from_position(Vec3::new(0.25, -0.2, -0.5)))
        .throw_point(Transform::from_position(Vec3::new(0.0, 0.0, -0.8)))
        .weapon(rifle, None)
        .target(target, 50.0)
        .build()?;
    Ok(sim)
}

/// Forward every cue to the log sink and keep a copy for the summary.
struct DemoFeedback {
    log: LogFeedback,
    record: FeedbackLog,
}

impl FeedbackSink for DemoFeedback {
    fn play_audio(&mut self, cue: AudioCue) {
        self.log.play_audio(cue);
        self.record.play_audio(cue);
    }

    fn set_animation_bool(&mut self, animator: game::AnimatorId, name: &'static str, value: bool) {
        self.log.set_animation_bool(animator, name, value);
        self.record.set_animation_bool(animator, name, value);
    }

    fn set_animation_float(&mut self, animator: game::AnimatorId, name: &'static str, value: f32) {
        self.log.set_animation_float(animator, name, value);
        self.record.set_animation_float(animator, name, value);
    }

    fn spawn_effect(&mut self, effect: EffectKind, pose: Transform, lifetime: f32) {
        self.log.spawn_effect(effect, pose, lifetime);
        self.record.spawn_effect(effect, pose, lifetime);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = default_config_path();
    let config = GameConfig::load(&config_path);
    log::info!("Config: {:?}", config_path);

    let mut sim = build_scene(config)?;
    let binds = Keybinds::default();
    let mut input = InputState::new();
    let mut feedback = DemoFeedback {
        log: LogFeedback,
        record: FeedbackLog::new(),
    };

    let script = script();
    let mut next = 0;
    let end = 10.0;
    let mut last_ammo = None;
    let mut last_state = sim.locomotion().state();

    while sim.time().elapsed_seconds() < end {
        let t = sim.time().elapsed_seconds();
        while next < script.len() && script[next].0 <= t {
            match script[next].1 {
                Action::Key(key, state) => input.process_keyboard(key, state),
                Action::Mouse(button, state) => input.process_mouse_button(button, state),
                Action::Look(dx, dy) => input.process_mouse_motion((dx, dy)),
                Action::ReloadAnimationDone => {
                    if let Some(id) = sim.carried().map(|w| w.id()) {
                        sim.animation_event(id, AnimationEvent::ReloadFinished, &mut feedback);
                    }
                }
            }
            next += 1;
        }

        let snapshot = input.snapshot(&binds);
        sim.tick(FRAME_DT, &snapshot, &mut feedback);
        input.begin_frame();
        let t = sim.time().elapsed_seconds();

        let ammo = sim.carried().map(|w| w.fire.ammo_display());
        if ammo != last_ammo {
            if let Some(ammo) = &ammo {
                log::info!("[{:5.2}s] ammo {}", t, ammo);
            }
            last_ammo = ammo;
        }
        let state = sim.locomotion().state();
        if state != last_state {
            log::info!(
                "[{:5.2}s] {:?} -> {:?} at {:.2?}",
                t,
                last_state,
                state,
                sim.player_position()
            );
            last_state = state;
        }
    }

    let record = &feedback.record;
    log::info!(
        "Done: {} shot(s), {} dry fire(s), {} reload(s), {} impact(s), {} thrown impact(s)",
        record.count_audio(AudioCue::Gunshot),
        record.count_audio(AudioCue::DryFire),
        record.count_audio(AudioCue::Reload),
        record.count_effects(EffectKind::BulletImpact) + record.count_effects(EffectKind::Blood),
        record.count_effects(EffectKind::ThrownImpact),
    );
    for weapon in sim.weapons() {
        log::info!(
            "Weapon {:?}: {:?}, {}",
            weapon.id(),
            weapon.possession.state(),
            weapon.fire.ammo_display()
        );
    }
    log::info!("Targets left: {}", sim.targets().len());

    Ok(())
}
