//! Mesure de la vitesse d'émulation relative au temps réel

/// Rapport de vitesse sur une fenêtre de mesure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedReport {
    /// 100 % = exactement le temps réel
    pub percent: f64,
    pub executed_cycles: u64,
    pub window_ms: f64,
}

impl SpeedReport {
    /// Libellé à 4 chiffres significatifs, ex. "99.87 %"
    pub fn label(&self) -> String {
        format!("{} %", format_significant(self.percent, 4))
    }
}

/// Compteur de cycles exécutés depuis le dernier rapport
#[derive(Debug, Clone, Default)]
pub struct SpeedMeter {
    executed_cycles: u64,
    window_ms: f64,
}

impl SpeedMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, executed: u32, elapsed_ms: f64) {
        self.executed_cycles += u64::from(executed);
        if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
            self.window_ms += elapsed_ms;
        }
    }

    /// Produit un rapport et ouvre une nouvelle fenêtre
    pub fn report(&mut self, baseline_cycles_per_second: u32) -> SpeedReport {
        let expected = f64::from(baseline_cycles_per_second) * self.window_ms / 1000.0;
        let percent = if expected > 0.0 {
            100.0 * self.executed_cycles as f64 / expected
        } else {
            0.0
        };
        let report = SpeedReport {
            percent,
            executed_cycles: self.executed_cycles,
            window_ms: self.window_ms,
        };
        self.reset();
        report
    }

    pub fn reset(&mut self) {
        self.executed_cycles = 0;
        self.window_ms = 0.0;
    }
}

/// Formate avec `digits` chiffres significatifs
pub(crate) fn format_significant(value: f64, digits: usize) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{:.*}", digits.saturating_sub(1), 0.0);
    }
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (digits as i32 - 1 - magnitude).max(0) as usize;
    format!("{:.*}", decimals, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_time_is_100_percent() {
        let mut meter = SpeedMeter::new();
        for _ in 0..300 {
            meter.record(1000, 10.0);
        }
        let report = meter.report(100_000);
        assert!((report.percent - 100.0).abs() < 1e-9);
        assert_eq!(report.executed_cycles, 300_000);
        assert_eq!(report.window_ms, 3000.0);
    }

    #[test]
    fn test_report_restarts_window() {
        let mut meter = SpeedMeter::new();
        meter.record(500, 10.0);
        let _ = meter.report(100_000);
        let report = meter.report(100_000);
        assert_eq!(report.executed_cycles, 0);
        assert_eq!(report.percent, 0.0);
    }

    #[test]
    fn test_label_significant_digits() {
        let report = SpeedReport { percent: 99.8712, executed_cycles: 0, window_ms: 0.0 };
        assert_eq!(report.label(), "99.87 %");
        let report = SpeedReport { percent: 100.0, executed_cycles: 0, window_ms: 0.0 };
        assert_eq!(report.label(), "100.0 %");
        let report = SpeedReport { percent: 0.0, executed_cycles: 0, window_ms: 0.0 };
        assert_eq!(report.label(), "0.000 %");
    }
}
