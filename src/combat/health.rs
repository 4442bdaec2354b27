//! Health component for anything that can take damage
//!
//! Death is one-way: once health reaches zero from a positive value the
//! entity is dead and rejects every further damage or heal.

use serde::{Deserialize, Serialize};

/// Why an intake request did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeRejection {
    Dead,
    Invulnerable,
    NonPositiveAmount,
    AtMaxHealth,
}

/// Result of a damage or heal request against a `HealthState`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intake {
    Applied {
        /// Health actually removed (or restored), after multiplier and clamping
        delta: f32,
        /// True exactly once: the call that took health from >0 to 0
        killed: bool,
    },
    Rejected(IntakeRejection),
}

impl Intake {
    pub fn is_applied(&self) -> bool {
        matches!(self, Intake::Applied { .. })
    }

    pub fn killed(&self) -> bool {
        matches!(self, Intake::Applied { killed: true, .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthState {
    current: f32,
    max: f32,
    pub invulnerable: bool,
    damage_multiplier: f32,
    dead: bool,
}

impl HealthState {
    /// Full health; a non-positive `max` is raised to 1
    pub fn new(max: f32) -> Self {
        let max = if max > 0.0 { max } else { 1.0 };
        Self {
            current: max,
            max,
            invulnerable: false,
            damage_multiplier: 1.0,
            dead: false,
        }
    }

    pub fn with_current(mut self, current: f32) -> Self {
        self.current = current.clamp(0.0, self.max);
        self.dead = self.current <= 0.0;
        self
    }

    pub fn with_damage_multiplier(mut self, multiplier: f32) -> Self {
        self.set_damage_multiplier(multiplier);
        self
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn damage_multiplier(&self) -> f32 {
        self.damage_multiplier
    }

    /// Negative multipliers clamp to 0
    pub fn set_damage_multiplier(&mut self, multiplier: f32) {
        self.damage_multiplier = multiplier.max(0.0);
    }

    pub fn fraction(&self) -> f32 {
        self.current / self.max
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    pub fn take_damage(&mut self, amount: f32) -> Intake {
        if self.dead {
            return Intake::Rejected(IntakeRejection::Dead);
        }
        if self.invulnerable {
            return Intake::Rejected(IntakeRejection::Invulnerable);
        }
        if amount.is_nan() || amount <= 0.0 {
            return Intake::Rejected(IntakeRejection::NonPositiveAmount);
        }

        let before = self.current;
        self.current = (before - amount * self.damage_multiplier).clamp(0.0, self.max);
        let killed = before > 0.0 && self.current <= 0.0;
        if killed {
            self.dead = true;
        }
        Intake::Applied {
            delta: before - self.current,
            killed,
        }
    }

    pub fn heal(&mut self, amount: f32) -> Intake {
        if self.dead {
            return Intake::Rejected(IntakeRejection::Dead);
        }
        if self.current >= self.max {
            return Intake::Rejected(IntakeRejection::AtMaxHealth);
        }
        if amount.is_nan() || amount <= 0.0 {
            return Intake::Rejected(IntakeRejection::NonPositiveAmount);
        }

        let before = self.current;
        self.current = (before + amount).min(self.max);
        Intake::Applied {
            delta: self.current - before,
            killed: false,
        }
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new(100.0)
    }
}
