mod metrics;
mod mutate;
mod stagnation;

pub use metrics::Metrics;
pub use mutate::{
    micro_evolve, retire_stale_parameters, spawn_parameter, update_contrib_ema, UcbStats,
};
pub use stagnation::{check_stagnation, RateLimiter, StagnationReport};
