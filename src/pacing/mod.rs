//! Contrôleur de cadencement
//!
//! Convertit le temps réel écoulé entre deux ticks de la boucle hôte en
//! budget de cycles émulés, et cadence deux tâches plus lentes sur la même
//! ligne de temps: le rafraîchissement de l'affichage et la mesure de vitesse.

pub mod speed;
pub mod trigger;

pub use speed::{SpeedMeter, SpeedReport};
pub use trigger::PeriodicTrigger;

use std::time::Instant;

use crate::config::PacingConfig;

/// Contrôleur de cadencement (état de planification d'une session)
#[derive(Debug, Clone)]
pub struct PacingController {
    last_timestamp: Option<Instant>,
    cycle_budget: u32,
    cycle_floor: u32,
    cycle_ceiling: u32,
    baseline_cycles_per_second: u32,
    refresh: PeriodicTrigger,
    speed_trigger: PeriodicTrigger,
    speed_meter: SpeedMeter,
}

impl PacingController {
    pub fn new(config: &PacingConfig) -> Self {
        Self {
            last_timestamp: None,
            cycle_budget: config.cycle_floor,
            cycle_floor: config.cycle_floor,
            cycle_ceiling: config.cycle_ceiling.max(config.cycle_floor),
            baseline_cycles_per_second: config.baseline_cycles_per_second,
            refresh: PeriodicTrigger::new(config.refresh_period_ms),
            speed_trigger: PeriodicTrigger::new(config.speed_report_period_ms),
            speed_meter: SpeedMeter::new(),
        }
    }

    /// Enregistre le tick courant et renvoie le temps écoulé en ms
    /// (0 au premier appel, ou si l'horloge recule).
    pub fn on_frame(&mut self, now: Instant) -> f64 {
        let elapsed_ms = match self.last_timestamp {
            Some(last) => now.saturating_duration_since(last).as_secs_f64() * 1000.0,
            None => 0.0,
        };
        self.last_timestamp = Some(now);
        elapsed_ms
    }

    /// Calcule le budget de cycles du prochain tick, borné à [plancher, plafond]
    pub fn next_cycle_budget(&mut self, elapsed_ms: f64, baseline_cycles_per_second: u32) -> u32 {
        let elapsed_ms = if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
            elapsed_ms
        } else {
            0.0
        };
        let raw = (f64::from(baseline_cycles_per_second) * elapsed_ms / 1000.0).round();
        // `as` sature les valeurs hors bornes
        let budget = (raw as u32).clamp(self.cycle_floor, self.cycle_ceiling);
        self.cycle_budget = budget;
        budget
    }

    pub fn should_refresh_frame(&mut self, elapsed_ms: f64) -> bool {
        self.refresh.advance(elapsed_ms)
    }

    pub fn should_report_speed(&mut self, elapsed_ms: f64) -> bool {
        self.speed_trigger.advance(elapsed_ms)
    }

    /// Comptabilise les cycles exécutés pour la mesure de vitesse
    pub fn record_executed(&mut self, executed: u32, elapsed_ms: f64) {
        self.speed_meter.record(executed, elapsed_ms);
    }

    pub fn speed_report(&mut self) -> SpeedReport {
        self.speed_meter.report(self.baseline_cycles_per_second)
    }

    pub fn reset(&mut self) {
        self.last_timestamp = None;
        self.cycle_budget = self.cycle_floor;
        self.refresh.reset();
        self.speed_trigger.reset();
        self.speed_meter.reset();
    }

    pub fn cycle_budget(&self) -> u32 {
        self.cycle_budget
    }

    pub fn baseline_cycles_per_second(&self) -> u32 {
        self.baseline_cycles_per_second
    }

    pub fn last_timestamp(&self) -> Option<Instant> {
        self.last_timestamp
    }

    pub fn refresh_accumulated_ms(&self) -> f64 {
        self.refresh.accumulated_ms()
    }

    pub fn speed_accumulated_ms(&self) -> f64 {
        self.speed_trigger.accumulated_ms()
    }
}
