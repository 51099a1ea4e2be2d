//! Déclencheur périodique à accumulateur

/// Accumulateur "qui fuit": chaque appel ajoute le temps écoulé et
/// déclenche au plus une fois, en retirant exactement une période.
/// L'excédent est reporté sur les appels suivants.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicTrigger {
    period_ms: f64,
    accumulated_ms: f64,
}

impl PeriodicTrigger {
    pub fn new(period_ms: f64) -> Self {
        Self {
            period_ms,
            accumulated_ms: 0.0,
        }
    }

    /// Avance le temps et indique si la période est atteinte
    pub fn advance(&mut self, elapsed_ms: f64) -> bool {
        if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
            self.accumulated_ms += elapsed_ms;
        }
        if self.accumulated_ms >= self.period_ms {
            self.accumulated_ms -= self.period_ms;
            true
        } else {
            false
        }
    }

    /// Temps accumulé non encore consommé
    pub fn accumulated_ms(&self) -> f64 {
        self.accumulated_ms
    }

    pub fn reset(&mut self) {
        self.accumulated_ms = 0.0;
    }
}
