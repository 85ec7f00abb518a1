//! Stagnation triggers and genome-swap rate limiting,
//! grounded on `ReflectionEngine.cpp`'s trend-based stagnation check.

use super::metrics::Metrics;
use crate::genome::ParameterGenome;

#[derive(Debug, Clone, Default)]
pub struct StagnationReport {
    pub stagnating: bool,
    pub reason: String,
}

/// Any one of the threshold triggers, or a sustained negative confidence
/// trend with 8+ samples, fires stagnation.
pub fn check_stagnation(metrics: &Metrics, genome: &ParameterGenome) -> StagnationReport {
    let entropy_trigger = genome.get("evolution.entropy_trigger");
    let success_trigger = genome.get("evolution.success_trigger");
    let drift_trigger = genome.get("evolution.drift_trigger");
    let slope_threshold = genome.get("evolution.slope_threshold");
    let confidence_threshold = genome.get("evolution.confidence_threshold");

    let mut reasons = Vec::new();
    if metrics.entropy_ema > entropy_trigger {
        reasons.push(format!("entropy_ema={:.3} > {entropy_trigger:.3}", metrics.entropy_ema));
    }
    if metrics.success_rate_ema < success_trigger {
        reasons.push(format!(
            "success_rate_ema={:.3} < {success_trigger:.3}",
            metrics.success_rate_ema
        ));
    }
    if metrics.coherence_drift_ema > drift_trigger {
        reasons.push(format!(
            "coherence_drift_ema={:.3} > {drift_trigger:.3}",
            metrics.coherence_drift_ema
        ));
    }
    if metrics.confidence_sample_count() >= 8 {
        let slope = metrics.confidence_trend();
        let mean = metrics.confidence_mean();
        if slope < slope_threshold && mean < confidence_threshold {
            reasons.push(format!(
                "confidence regression slope={slope:.4} while mean={mean:.3}"
            ));
        }
    }

    StagnationReport {
        stagnating: !reasons.is_empty(),
        reason: reasons.join("; "),
    }
}

/// At most one genome swap per `evolution.rate_limit_ticks` ticks.
#[derive(Debug, Clone, Default)]
pub struct RateLimiter {
    ticks_since_swap: u64,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self) {
        self.ticks_since_swap += 1;
    }

    pub fn allows_swap(&self, genome: &ParameterGenome) -> bool {
        self.ticks_since_swap >= genome.get("evolution.rate_limit_ticks") as u64
    }

    pub fn record_swap(&mut self) {
        self.ticks_since_swap = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_entropy_triggers_stagnation() {
        let genome = ParameterGenome::default_genome();
        let mut metrics = Metrics::new();
        metrics.entropy_ema = 2.0;
        let report = check_stagnation(&metrics, &genome);
        assert!(report.stagnating);
    }

    #[test]
    fn healthy_metrics_do_not_stagnate() {
        let genome = ParameterGenome::default_genome();
        let mut metrics = Metrics::new();
        metrics.entropy_ema = 0.2;
        metrics.success_rate_ema = 0.9;
        metrics.coherence_drift_ema = 0.05;
        assert!(!check_stagnation(&metrics, &genome).stagnating);
    }

    #[test]
    fn rate_limiter_blocks_until_enough_ticks_pass() {
        let genome = ParameterGenome::default_genome();
        let mut limiter = RateLimiter::new();
        assert!(!limiter.allows_swap(&genome));
        for _ in 0..genome.get("evolution.rate_limit_ticks") as u32 {
            limiter.tick();
        }
        assert!(limiter.allows_swap(&genome));
        limiter.record_swap();
        assert!(!limiter.allows_swap(&genome));
    }
}
