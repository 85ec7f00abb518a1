mod dynamics;
mod state;

pub use dynamics::EmergentDynamics;
pub use state::{EdgeStateMap, EmergentEdgeState, EnergyBudget};
