//! Availability monitoring: dedup registry, state machines, and the polling
//! runner that ties them to the upstream clients.

pub mod machine;
pub mod registry;
pub mod runner;

pub use machine::{Action, Monitor, MonitorState, MovieMonitor, MovieObservation, SeasonMonitor};
pub use registry::{acquire, InMemoryRegistry, RegistryGuard, RequestRegistry};
pub use runner::{drive, spawn, MonitorOutput, MovieProbe, Probe, SeasonProbe};

use std::time::Duration;

const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Poll cadence and attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}
