//! Cooldown timer that can fire several times per substep

use crate::error::{CombatError, Result};
use log::trace;

/// Fires an action every `period` seconds while enabled.
///
/// `cooldown` goes negative when the period elapses partway through an
/// advance; the overshoot is handed to the action so it can catch up (for
/// example by stepping a fresh projectile by that much).
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicTrigger {
    period: f32,
    /// Seconds until the next firing; negative when overdue
    pub cooldown: f32,
    pub enabled: bool,
}

fn checked_period(period: f32, substep: f32) -> Result<f32> {
    if !period.is_finite() || period <= 0.0 {
        return Err(CombatError::InvalidPeriod(period));
    }
    if period < substep {
        trace!("Raising trigger period {period} to substep {substep}");
        Ok(substep)
    } else {
        Ok(period)
    }
}

impl PeriodicTrigger {
    /// New trigger, ready and disabled. Periods shorter than `substep` are raised to it.
    pub fn new(period: f32, substep: f32) -> Result<Self> {
        Ok(Self {
            period: checked_period(period, substep)?,
            cooldown: 0.0,
            enabled: false,
        })
    }

    pub fn period(&self) -> f32 {
        self.period
    }

    pub fn set_period(&mut self, period: f32, substep: f32) -> Result<()> {
        self.period = checked_period(period, substep)?;
        Ok(())
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Take elapsed time off the cooldown
    pub fn elapse(&mut self, dt: f32) {
        self.cooldown -= dt;
    }

    /// Whether the period has run out
    pub fn ready(&self) -> bool {
        self.cooldown <= 0.0
    }

    /// Consume one firing; returns how long it has been overdue
    pub fn trigger(&mut self) -> f32 {
        let overdue = -self.cooldown;
        self.cooldown += self.period;
        overdue
    }

    /// Drop pending firings
    pub fn reset(&mut self) {
        self.cooldown = 0.0;
    }

    /// Advance by `dt`, calling `on_fire(overdue)` for every firing due.
    ///
    /// A disabled trigger never fires and is left ready. Returns the number
    /// of firings.
    pub fn advance(&mut self, dt: f32, mut on_fire: impl FnMut(f32)) -> u32 {
        if !dt.is_finite() {
            return 0;
        }
        self.elapse(dt);
        let mut fired = 0;
        while self.ready() {
            if !self.enabled {
                self.reset();
                break;
            }
            on_fire(self.trigger());
            fired += 1;
        }
        fired
    }
}
