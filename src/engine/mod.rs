mod context;
mod events;
mod policy;
mod runner;
mod signals;
mod state;

pub use context::{ExecutionContext, SharedExecutionContext, shared};
pub use events::ReplayEvent;
pub use policy::{BatchPlan, plan_batch, should_bundle, should_skip};
pub use runner::ReplayEngine;
pub use signals::{HostMonitor, HostSignals, SharedSignals};
pub use state::{ReplayState, RunStatus, ScenarioResult};
