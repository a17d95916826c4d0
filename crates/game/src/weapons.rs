//! Per-weapon fire control: ammo, reload, trigger gating and hit-scan resolution.

use engine_core::{DelayedActions, Transform, Vec3};
use input::InputSnapshot;
use physics::{RayCaster, RayFilter, RaycastHit, RigidBodyHandle};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::damage::{rotation_from_up, DamageableWorld};
use crate::error::{non_negative, positive, ConfigError};
use crate::feedback::{AnimatorId, AudioCue, EffectKind, FeedbackSink};
use crate::recoil::RecoilIntegrator;

/// How long recoil keeps being driven after a shot.
pub const RECOIL_BURST_WINDOW: f32 = 0.1;
/// Delay between an empty trigger pull and its click.
pub const DRY_FIRE_DELAY: f32 = 0.045;
/// Impact effects sit this far off the struck surface.
const IMPACT_SURFACE_OFFSET: f32 = 0.02;
const MUZZLE_FLASH_LIFETIME: f32 = 1.0;

pub const ANIM_IS_SHOOTING: &str = "IsShooting";
pub const ANIM_IS_RELOADING: &str = "IsReloading";

/// Static weapon stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    pub damage: f32,
    pub magazine_size: u32,
    /// Rounds carried outside the magazine at spawn.
    pub spare_ammo: u32,
    pub rounds_per_minute: f32,
    /// Seconds from reload start to a refilled magazine.
    pub reload_time: f32,
    /// Fire while held rather than once per press.
    pub automatic: bool,
    pub shotgun: bool,
    pub pellets_per_shot: u32,
    /// Per-axis offset added to the aim direction of each pellet.
    pub spread: f32,
    pub range: f32,
    pub hit_effect_lifetime: f32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            damage: 10.0,
            magazine_size: 30,
            spare_ammo: 90,
            rounds_per_minute: 600.0,
            reload_time: 2.0,
            automatic: true,
            shotgun: false,
            pellets_per_shot: 5,
            spread: 0.1,
            range: 1000.0,
            hit_effect_lifetime: 2.0,
        }
    }
}

impl WeaponConfig {
    /// A pump shotgun preset.
    pub fn shotgun() -> Self {
        Self {
            damage: 8.0,
            magazine_size: 6,
            spare_ammo: 24,
            rounds_per_minute: 70.0,
            reload_time: 2.5,
            automatic: false,
            shotgun: true,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rounds_per_minute.is_finite() || self.rounds_per_minute <= 0.0 {
            return Err(ConfigError::NonPositiveRpm(self.rounds_per_minute));
        }
        if self.magazine_size == 0 {
            return Err(ConfigError::EmptyMagazine);
        }
        if self.shotgun && self.pellets_per_shot == 0 {
            return Err(ConfigError::NoPellets);
        }
        non_negative("weapon.damage", self.damage)?;
        non_negative("weapon.reload_time", self.reload_time)?;
        non_negative("weapon.spread", self.spread)?;
        non_negative("weapon.hit_effect_lifetime", self.hit_effect_lifetime)?;
        positive("weapon.range", self.range)?;
        Ok(())
    }

    /// Seconds between rounds.
    pub fn fire_interval(&self) -> f32 {
        60.0 / self.rounds_per_minute
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireState {
    Idle,
    Reloading,
}

/// Purposes a weapon keeps delayed actions for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WeaponTimer {
    Reload,
    RecoilBurst,
    DryFire,
}

/// Animation clip events routed back from the weapon animator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationEvent {
    ShootingFinished,
    ReloadFinished,
}

/// Result of one trigger pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotOutcome {
    /// A round left the barrel; `rays` hit-scan resolutions were made.
    Fired { rays: u32 },
    /// Magazine empty; a click is queued.
    DryFire,
}

/// Everything a shot touches outside the weapon itself.
pub struct FireContext<'a> {
    pub rays: &'a dyn RayCaster,
    pub targets: &'a mut dyn DamageableWorld,
    pub feedback: &'a mut dyn FeedbackSink,
    pub recoil: &'a mut RecoilIntegrator,
    pub rng: &'a mut StdRng,
    /// Shots leave from here along its forward axis.
    pub aim: Transform,
    /// Muzzle flash spawn point.
    pub muzzle: Transform,
    /// Never hit by our own rays.
    pub shooter: Option<RigidBodyHandle>,
    pub animator: Option<AnimatorId>,
}

/// Ammo and reload state machine for one weapon.
#[derive(Debug, Clone)]
pub struct FireControl {
    config: WeaponConfig,
    fire_interval: f32,
    current_ammo: u32,
    spare_ammo: u32,
    state: FireState,
    clock: f32,
    last_fire_time: f32,
    timers: DelayedActions<WeaponTimer>,
}

impl FireControl {
    /// Build from stats. The magazine starts full.
    pub fn new(config: WeaponConfig) -> Result<Self, ConfigError> {
        if let Err(e) = config.validate() {
            log::error!("Refusing weapon config: {}", e);
            return Err(e);
        }
        let fire_interval = config.fire_interval();
        log::debug!(
            "Fire interval set: {:.4}s (RPM: {})",
            fire_interval,
            config.rounds_per_minute
        );
        Ok(Self {
            current_ammo: config.magazine_size,
            spare_ammo: config.spare_ammo,
            fire_interval,
            config,
            state: FireState::Idle,
            clock: 0.0,
            last_fire_time: f32::NEG_INFINITY,
            timers: DelayedActions::new(),
        })
    }

    pub fn config(&self) -> &WeaponConfig {
        &self.config
    }

    pub fn fire_interval(&self) -> f32 {
        self.fire_interval
    }

    pub fn current_ammo(&self) -> u32 {
        self.current_ammo
    }

    pub fn spare_ammo(&self) -> u32 {
        self.spare_ammo
    }

    pub fn state(&self) -> FireState {
        self.state
    }

    pub fn is_reloading(&self) -> bool {
        self.state == FireState::Reloading
    }

    /// Recoil is still being driven by the last shot.
    pub fn recoil_burst_active(&self) -> bool {
        self.timers.is_pending(WeaponTimer::RecoilBurst)
    }

    pub fn dry_fire_pending(&self) -> bool {
        self.timers.is_pending(WeaponTimer::DryFire)
    }

    /// Seconds until the pending reload completes.
    pub fn reload_remaining(&self) -> Option<f32> {
        self.timers.remaining(WeaponTimer::Reload)
    }

    /// `"current / spare"`, or a reloading notice.
    pub fn ammo_display(&self) -> String {
        if self.is_reloading() {
            format!("RELOADING... {}", self.spare_ammo)
        } else {
            format!("{} / {}", self.current_ammo, self.spare_ammo)
        }
    }

    fn cooled_down(&self) -> bool {
        self.clock - self.last_fire_time >= self.fire_interval
    }

    /// One frame of trigger and reload handling. Returns the shot taken, if any.
    pub fn update(
        &mut self,
        dt: f32,
        input: &InputSnapshot,
        ctx: &mut FireContext<'_>,
    ) -> Option<ShotOutcome> {
        self.clock += dt;
        for due in self.timers.tick(dt) {
            match due {
                WeaponTimer::Reload => self.finish_reload(),
                WeaponTimer::DryFire => ctx.feedback.play_audio(AudioCue::DryFire),
                WeaponTimer::RecoilBurst => {}
            }
        }

        let mut outcome = None;
        if !self.is_reloading() {
            let trigger = if self.config.automatic {
                input.fire_held
            } else {
                input.fire_pressed
            };
            if trigger && self.cooled_down() {
                outcome = Some(self.shoot(ctx));
            }
            if input.reload_pressed {
                self.reload(ctx.feedback, ctx.animator);
            }
        }

        if self.recoil_burst_active() {
            ctx.recoil.kick(ctx.rng);
        }
        outcome
    }

    /// Fire one round, or queue a dry-fire click on an empty magazine.
    /// Cooldown and reload gating happen in [`FireControl::update`].
    pub fn shoot(&mut self, ctx: &mut FireContext<'_>) -> ShotOutcome {
        if self.current_ammo == 0 {
            self.timers.arm(WeaponTimer::DryFire, DRY_FIRE_DELAY);
            return ShotOutcome::DryFire;
        }

        self.current_ammo -= 1;
        self.last_fire_time = self.clock;
        if let Some(animator) = ctx.animator {
            ctx.feedback.set_animation_bool(animator, ANIM_IS_SHOOTING, true);
        }
        ctx.feedback.play_audio(AudioCue::Gunshot);
        self.timers.arm(WeaponTimer::RecoilBurst, RECOIL_BURST_WINDOW);
        ctx.feedback
            .spawn_effect(EffectKind::MuzzleFlash, ctx.muzzle, MUZZLE_FLASH_LIFETIME);

        let rays = self.resolve_shot(ctx);
        if self.config.shotgun {
            ctx.recoil.kick(ctx.rng);
        }
        ctx.recoil.kick(ctx.rng);
        ShotOutcome::Fired { rays }
    }

    /// Cast this shot's rays and apply their hits. Returns the number of rays cast.
    fn resolve_shot(&self, ctx: &mut FireContext<'_>) -> u32 {
        let forward = ctx.aim.forward();
        if !self.config.shotgun {
            self.fire_ray(ctx, forward);
            return 1;
        }

        let s = self.config.spread;
        for _ in 0..self.config.pellets_per_shot {
            // Per-axis offset on the unnormalized forward.
            let direction = forward
                + Vec3::new(
                    ctx.rng.gen_range(-s..=s),
                    ctx.rng.gen_range(-s..=s),
                    ctx.rng.gen_range(-s..=s),
                );
            self.fire_ray(ctx, direction);
        }
        self.config.pellets_per_shot
    }

    fn fire_ray(&self, ctx: &mut FireContext<'_>, direction: Vec3) {
        let filter = RayFilter {
            exclude_body: ctx.shooter,
            environment_only: false,
        };
        let Some(hit) = ctx
            .rays
            .cast_ray(ctx.aim.position, direction, self.config.range, filter)
        else {
            return;
        };
        self.apply_hit(ctx, &hit);
    }

    fn apply_hit(&self, ctx: &mut FireContext<'_>, hit: &RaycastHit) {
        let rotation = rotation_from_up(hit.normal);
        if let Some(target) = ctx.targets.damageable(hit.collider) {
            target.apply_damage(self.config.damage, hit.point, rotation);
            return;
        }
        let pose = Transform::from_position_rotation(
            hit.point + hit.normal * IMPACT_SURFACE_OFFSET,
            rotation,
        );
        ctx.feedback.spawn_effect(
            EffectKind::BulletImpact,
            pose,
            self.config.hit_effect_lifetime,
        );
    }

    /// Start a reload. Refused while reloading or with a full magazine.
    pub fn reload(
        &mut self,
        feedback: &mut dyn FeedbackSink,
        animator: Option<AnimatorId>,
    ) -> bool {
        if self.is_reloading() || self.current_ammo >= self.config.magazine_size {
            return false;
        }
        self.state = FireState::Reloading;
        if let Some(animator) = animator {
            feedback.set_animation_bool(animator, ANIM_IS_RELOADING, true);
        }
        feedback.play_audio(AudioCue::Reload);
        self.timers.arm(WeaponTimer::Reload, self.config.reload_time);
        true
    }

    fn finish_reload(&mut self) {
        let needed = self.config.magazine_size - self.current_ammo;
        let loaded = needed.min(self.spare_ammo);
        self.current_ammo += loaded;
        self.spare_ammo -= loaded;
        self.state = FireState::Idle;
    }

    /// Clear the bool a finished animation clip was holding up.
    pub fn animation_event(
        &mut self,
        event: AnimationEvent,
        feedback: &mut dyn FeedbackSink,
        animator: AnimatorId,
    ) {
        let name = match event {
            AnimationEvent::ShootingFinished => ANIM_IS_SHOOTING,
            AnimationEvent::ReloadFinished => ANIM_IS_RELOADING,
        };
        feedback.set_animation_bool(animator, name, false);
    }

    /// Put the weapon away: pending reload, recoil burst and dry-fire click are
    /// dropped, and the animator stops shooting and reloading.
    pub fn holster(&mut self, feedback: &mut dyn FeedbackSink, animator: Option<AnimatorId>) {
        self.timers.clear();
        self.state = FireState::Idle;
        if let Some(animator) = animator {
            feedback.set_animation_bool(animator, ANIM_IS_SHOOTING, false);
            feedback.set_animation_bool(animator, ANIM_IS_RELOADING, false);
        }
    }
}
