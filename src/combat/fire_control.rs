//! Per-weapon fire control
//!
//! A `WeaponInstance` is created on equip and owns its magazine, fire mode
//! and timing. Fire attempts pass three gates (not reloading, rounds in the
//! magazine, fire-rate interval elapsed) and produce a `Volley` that the
//! world turns into hitscan queries or projectiles. Waiting is never done
//! inline: reloads and burst follow-up shots are scheduled on the timer queue.
//!
//! ```text
//! Idle ──fire(Single/Auto)──> Idle
//! Idle ──fire(Burst)──> Firing ──last burst shot / empty──> Idle
//! Idle|Firing ──reload──> Reloading ──timer──> Idle
//! ```

use crate::combat::damage_kind::DamageKind;
use crate::combat::weapons::{FireMode, ProjectileDefinition, WeaponDefinition, WeaponKind};
use crate::core::clock::{Deferred, TimerId, TimerQueue};
use crate::core::config::WeaponConfig;
use crate::core::error::{Conflict, Result, Shortage, SimError};
use crate::core::types::{EntityId, Seconds, Vec2, WeaponId};
use crate::simulation::events::SimulationEvent;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirePhase {
    Idle,
    /// A burst sequence is still producing shots
    Firing,
    Reloading,
}

/// Where a shot leaves from and where it points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aim {
    pub origin: Vec2,
    pub direction: Vec2,
}

impl Aim {
    pub fn new(origin: Vec2, direction: Vec2) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn at(origin: Vec2, target: Vec2) -> Self {
        Self::new(origin, target - origin)
    }
}

/// How a volley reaches its targets
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Hitscan,
    Projectile(ProjectileDefinition),
    /// Short directional sweep at weapon range
    Melee,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pellet {
    pub direction: Vec2,
    pub damage: f32,
}

/// Everything one accepted shot produced
#[derive(Debug, Clone, PartialEq)]
pub struct Volley {
    pub weapon: WeaponId,
    pub owner: EntityId,
    pub origin: Vec2,
    pub pellets: Vec<Pellet>,
    pub range: f32,
    pub kind: DamageKind,
    pub delivery: Delivery,
}

/// Shared state the fire control needs while running an operation
pub struct FireContext<'a> {
    pub now: Seconds,
    pub timers: &'a mut TimerQueue<Deferred>,
    pub events: &'a mut Vec<SimulationEvent>,
    pub config: &'a WeaponConfig,
    pub rng: &'a mut ChaCha8Rng,
}

/// Magazine state, present only for guns
#[derive(Debug, Clone, PartialEq)]
struct Magazine {
    current: u32,
    reserve: u32,
    mode_index: usize,
    reload_elapsed: Seconds,
    reload_timer: Option<TimerId>,
}

#[derive(Debug, Clone)]
pub struct WeaponInstance {
    id: WeaponId,
    owner: EntityId,
    definition: WeaponDefinition,
    phase: FirePhase,
    last_fire: Option<Seconds>,
    magazine: Option<Magazine>,
    burst_remaining: u32,
    burst_aim: Option<Aim>,
    burst_timer: Option<TimerId>,
}

impl WeaponInstance {
    /// Equip: full magazine, reserve from the definition (clamped to max)
    pub fn equip(id: WeaponId, owner: EntityId, definition: WeaponDefinition) -> Self {
        let magazine = definition.gun().map(|gun| Magazine {
            current: gun.magazine_size,
            reserve: gun.starting_reserve.min(gun.max_ammo),
            mode_index: 0,
            reload_elapsed: 0.0,
            reload_timer: None,
        });
        Self {
            id,
            owner,
            definition,
            phase: FirePhase::Idle,
            last_fire: None,
            magazine,
            burst_remaining: 0,
            burst_aim: None,
            burst_timer: None,
        }
    }

    /// Override the loaded ammo, clamped into bounds
    pub fn with_ammo(mut self, current: u32, reserve: u32) -> Self {
        if let (Some(mag), Some(gun)) = (self.magazine.as_mut(), self.definition.gun()) {
            mag.current = current.min(gun.magazine_size);
            mag.reserve = reserve.min(gun.max_ammo);
        }
        self
    }

    pub fn id(&self) -> WeaponId {
        self.id
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn definition(&self) -> &WeaponDefinition {
        &self.definition
    }

    pub fn phase(&self) -> FirePhase {
        self.phase
    }

    pub fn is_reloading(&self) -> bool {
        self.phase == FirePhase::Reloading
    }

    pub fn last_fire(&self) -> Option<Seconds> {
        self.last_fire
    }

    /// Rounds in the magazine; melee weapons report 0
    pub fn current_ammo(&self) -> u32 {
        self.magazine.as_ref().map(|m| m.current).unwrap_or(0)
    }

    pub fn reserve_ammo(&self) -> u32 {
        self.magazine.as_ref().map(|m| m.reserve).unwrap_or(0)
    }

    pub fn fire_mode(&self) -> FireMode {
        match (&self.definition.kind, &self.magazine) {
            (WeaponKind::Gun(gun), Some(mag)) => gun.fire_modes[mag.mode_index],
            _ => FireMode::Single,
        }
    }

    /// Fraction of the current reload done, 0 when not reloading
    pub fn reload_progress(&self) -> f32 {
        match (&self.magazine, self.definition.gun()) {
            (Some(mag), Some(gun)) if self.phase == FirePhase::Reloading => {
                if gun.reload_time <= 0.0 {
                    1.0
                } else {
                    (mag.reload_elapsed / gun.reload_time).clamp(0.0, 1.0) as f32
                }
            }
            _ => 0.0,
        }
    }

    /// Seconds until the fire-rate gate opens
    pub fn cooldown_remaining(&self, now: Seconds) -> Seconds {
        self.last_fire
            .map(|last| (last + self.definition.fire_interval() - now).max(0.0))
            .unwrap_or(0.0)
    }

    /// Accumulate reload time for progress reporting
    pub fn advance(&mut self, dt: Seconds) {
        if self.phase != FirePhase::Reloading {
            return;
        }
        if let (Some(mag), Some(gun)) = (self.magazine.as_mut(), self.definition.gun()) {
            mag.reload_elapsed = (mag.reload_elapsed + dt.max(0.0)).min(gun.reload_time);
        }
    }

    /// Attempt one attack. On an empty magazine the attempt fails and a
    /// reload is started if possible.
    pub fn try_fire(&mut self, ctx: &mut FireContext<'_>, aim: Aim) -> Result<Volley> {
        match self.phase {
            FirePhase::Reloading => return Err(SimError::StateConflict(Conflict::Reloading)),
            FirePhase::Firing => return Err(SimError::StateConflict(Conflict::BurstInProgress)),
            FirePhase::Idle => {}
        }
        if self.current_ammo() == 0 && self.magazine.is_some() {
            if let Err(e) = self.try_reload(ctx) {
                tracing::trace!("Weapon {:?} empty, no reload: {}", self.id, e);
            }
            return Err(SimError::ResourceUnavailable(Shortage::MagazineEmpty));
        }
        if self.cooldown_remaining(ctx.now) > 0.0 {
            return Err(SimError::StateConflict(Conflict::CoolingDown));
        }

        self.last_fire = Some(ctx.now);

        if self.magazine.is_none() {
            let volley = self.melee_volley(aim);
            self.emit_fired(ctx, FireMode::Single, 1);
            return Ok(volley);
        }

        let mode = self.fire_mode();
        let volley = self.discharge(ctx, aim, mode);

        match mode {
            FireMode::Single | FireMode::Auto => {
                if self.current_ammo() == 0 {
                    // Auto-reload; a missing reserve just leaves the magazine empty
                    if let Err(e) = self.try_reload(ctx) {
                        tracing::trace!("Weapon {:?} ran dry, no reload: {}", self.id, e);
                    }
                }
            }
            FireMode::Burst => {
                self.burst_remaining = ctx.config.burst_count.saturating_sub(1);
                if self.burst_remaining > 0 && self.current_ammo() > 0 {
                    self.phase = FirePhase::Firing;
                    self.burst_aim = Some(aim);
                    self.burst_timer = Some(
                        ctx.timers
                            .schedule(ctx.now + ctx.config.burst_interval, Deferred::BurstShot(self.id)),
                    );
                } else {
                    self.end_burst();
                }
            }
        }

        Ok(volley)
    }

    /// Produce the next shot of a running burst, fired from `origin`.
    /// Returns `None` once the burst is over (count reached, ammo out,
    /// or a reload took over).
    pub fn continue_burst(&mut self, ctx: &mut FireContext<'_>, origin: Vec2) -> Option<Volley> {
        self.burst_timer = None;
        if self.phase != FirePhase::Firing {
            return None;
        }
        if self.current_ammo() == 0 || self.burst_remaining == 0 {
            tracing::trace!("Burst on {:?} ended early", self.id);
            self.end_burst();
            return None;
        }
        let aim = Aim {
            origin,
            direction: self.burst_aim.map(|a| a.direction).unwrap_or(Vec2::new(1.0, 0.0)),
        };

        let volley = self.discharge(ctx, aim, FireMode::Burst);
        self.burst_remaining -= 1;

        if self.burst_remaining > 0 && self.current_ammo() > 0 {
            self.burst_timer = Some(
                ctx.timers
                    .schedule(ctx.now + ctx.config.burst_interval, Deferred::BurstShot(self.id)),
            );
        } else {
            self.end_burst();
        }
        Some(volley)
    }

    fn end_burst(&mut self) {
        self.burst_remaining = 0;
        self.burst_aim = None;
        if self.phase == FirePhase::Firing {
            self.phase = FirePhase::Idle;
        }
    }

    /// Consume one round and build the volley for it
    fn discharge(&mut self, ctx: &mut FireContext<'_>, aim: Aim, mode: FireMode) -> Volley {
        let Some(gun) = self.definition.gun() else {
            return self.melee_volley(aim);
        };
        let pellet_count = gun.projectiles_per_shot.max(1);
        let spread = if pellet_count > 1 {
            gun.spread_angle * ctx.config.pellet_spread_multiplier
        } else {
            gun.spread_angle
        };
        let damage = self.definition.damage / pellet_count as f32;

        let pellets = (0..pellet_count)
            .map(|_| {
                let jitter = if spread > 0.0 {
                    ctx.rng.gen_range(-spread..=spread)
                } else {
                    0.0
                };
                Pellet {
                    direction: aim.direction.rotated(jitter),
                    damage,
                }
            })
            .collect();

        let delivery = match &gun.projectile {
            Some(projectile) => Delivery::Projectile(projectile.clone()),
            None => Delivery::Hitscan,
        };

        if let Some(mag) = self.magazine.as_mut() {
            mag.current = mag.current.saturating_sub(1);
        }

        self.emit_fired(ctx, mode, pellet_count);
        self.emit_ammo(ctx);

        Volley {
            weapon: self.id,
            owner: self.owner,
            origin: aim.origin,
            pellets,
            range: self.definition.range,
            kind: self.definition.damage_kind,
            delivery,
        }
    }

    fn melee_volley(&self, aim: Aim) -> Volley {
        Volley {
            weapon: self.id,
            owner: self.owner,
            origin: aim.origin,
            pellets: vec![Pellet {
                direction: aim.direction,
                damage: self.definition.damage,
            }],
            range: self.definition.range,
            kind: self.definition.damage_kind,
            delivery: Delivery::Melee,
        }
    }

    /// Start a reload. Fails while reloading, with a full magazine, or
    /// with no reserve. Not cancellable by fire attempts.
    pub fn try_reload(&mut self, ctx: &mut FireContext<'_>) -> Result<()> {
        let reload_time = match self.definition.gun() {
            Some(gun) => gun.reload_time,
            None => return Err(SimError::StateConflict(Conflict::NotAGun)),
        };
        let magazine_size = self.definition.gun().map(|g| g.magazine_size).unwrap_or(0);
        if self.phase == FirePhase::Reloading {
            return Err(SimError::StateConflict(Conflict::Reloading));
        }
        let Some(mag) = self.magazine.as_mut() else {
            return Err(SimError::StateConflict(Conflict::NotAGun));
        };
        if mag.current >= magazine_size {
            return Err(SimError::StateConflict(Conflict::MagazineFull));
        }
        if mag.reserve == 0 {
            return Err(SimError::ResourceUnavailable(Shortage::ReserveEmpty));
        }

        mag.reload_elapsed = 0.0;
        mag.reload_timer = Some(
            ctx.timers
                .schedule(ctx.now + reload_time, Deferred::ReloadComplete(self.id)),
        );
        if let Some(timer) = self.burst_timer.take() {
            ctx.timers.cancel(timer);
        }
        self.burst_remaining = 0;
        self.burst_aim = None;
        self.phase = FirePhase::Reloading;

        tracing::debug!("Weapon {:?} reloading for {:.2}s", self.id, reload_time);
        ctx.events.push(SimulationEvent::ReloadStarted {
            weapon: self.id,
            owner: self.owner,
            duration: reload_time,
        });
        Ok(())
    }

    /// Timer callback: move rounds from reserve into the magazine.
    /// Returns false when no reload was running.
    pub fn finish_reload(&mut self, ctx: &mut FireContext<'_>) -> bool {
        if self.phase != FirePhase::Reloading {
            return false;
        }
        let Some(gun) = self.definition.gun() else {
            return false;
        };
        let magazine_size = gun.magazine_size;
        let reload_time = gun.reload_time;
        let Some(mag) = self.magazine.as_mut() else {
            return false;
        };

        let moved = magazine_size.saturating_sub(mag.current).min(mag.reserve);
        mag.current += moved;
        mag.reserve -= moved;
        mag.reload_elapsed = reload_time;
        mag.reload_timer = None;
        self.phase = FirePhase::Idle;

        tracing::debug!("Weapon {:?} reloaded {} rounds", self.id, moved);
        ctx.events.push(SimulationEvent::WeaponReloaded {
            weapon: self.id,
            owner: self.owner,
            current: mag.current,
            reserve: mag.reserve,
        });
        self.emit_ammo(ctx);
        true
    }

    /// Cycle to the next declared fire mode, wrapping around
    pub fn cycle_fire_mode(&mut self) -> Result<FireMode> {
        let mode_count = self.definition.gun().map(|g| g.fire_modes.len()).unwrap_or(0);
        if mode_count <= 1 {
            return Err(SimError::StateConflict(Conflict::SingleFireMode));
        }
        if let Some(mag) = self.magazine.as_mut() {
            mag.mode_index = (mag.mode_index + 1) % mode_count;
        }
        Ok(self.fire_mode())
    }

    /// Top up the reserve (pickups, resupply); returns rounds accepted
    pub fn add_reserve(&mut self, rounds: u32) -> u32 {
        let max_ammo = self.definition.gun().map(|g| g.max_ammo).unwrap_or(0);
        match self.magazine.as_mut() {
            Some(mag) => {
                let accepted = rounds.min(max_ammo.saturating_sub(mag.reserve));
                mag.reserve += accepted;
                accepted
            }
            None => 0,
        }
    }

    /// Drop every timer this weapon still has pending (unequip / despawn)
    pub fn cancel_pending(&mut self, timers: &mut TimerQueue<Deferred>) {
        if let Some(timer) = self.burst_timer.take() {
            timers.cancel(timer);
        }
        if let Some(timer) = self.magazine.as_mut().and_then(|m| m.reload_timer.take()) {
            timers.cancel(timer);
        }
        self.phase = FirePhase::Idle;
    }

    fn emit_fired(&self, ctx: &mut FireContext<'_>, mode: FireMode, pellets: u32) {
        ctx.events.push(SimulationEvent::WeaponFired {
            weapon: self.id,
            owner: self.owner,
            mode,
            pellets,
        });
    }

    fn emit_ammo(&self, ctx: &mut FireContext<'_>) {
        if let Some(mag) = &self.magazine {
            ctx.events.push(SimulationEvent::AmmoChanged {
                weapon: self.id,
                owner: self.owner,
                current: mag.current,
                reserve: mag.reserve,
            });
        }
    }
}
