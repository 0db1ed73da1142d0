pub mod fixture;
pub mod metrics;
pub mod runner;
pub mod scenarios;
pub mod state;

pub use fixture::Deployment;
pub use metrics::HarnessMetrics;
pub use runner::{all_passed, Harness};
pub use scenarios::run_scenario;
pub use state::{ScenarioReport, ScenarioState};
