pub mod engine;
pub mod kpi;
pub mod policy;
pub mod types;

pub use engine::{Engine, run};
pub use kpi::{EconomicSummary, PolicyComparison};
pub use policy::{DispatchPolicy, GreedyPolicy, LookaheadPolicy, Policy};
pub use types::{Action, LedgerEntry, SimConfig, SimulationResult};
