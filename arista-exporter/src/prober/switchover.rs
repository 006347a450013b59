//! Stateful switchover count.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::{ModuleKind, Prober};
use crate::collection::{Gauge, MetricsCollection, MetricsError};

pub const COMMAND: &str = "show redundancy switchover sso";

/// Decoded `show redundancy switchover sso` output.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SwitchoverState {
    pub switchover_count: f64,
}

#[derive(Debug, Default)]
pub struct SwitchoverProber {
    pub state: SwitchoverState,
    count: Option<Gauge>,
}

impl Prober for SwitchoverProber {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Switchover
    }

    fn register(&mut self, metrics: &mut MetricsCollection) -> Result<(), MetricsError> {
        self.count = Some(metrics.gauge(
            "redundancy_switchover_count",
            "Contains redundancy switchover count",
        )?);
        Ok(())
    }

    fn decode(&mut self, output: Value) -> Result<(), serde_json::Error> {
        self.state = serde_json::from_value(output)?;
        Ok(())
    }

    fn emit(&self) {
        match &self.count {
            Some(count) => {
                count.set(self.state.switchover_count);
            }
            None => warn!(module = %self.kind(), "Emit called before register, skipping"),
        }
    }
}
