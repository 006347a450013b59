//! Port-channel membership.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{trace, warn};

use super::{ModuleKind, Prober};
use crate::collection::{GaugeVec, MetricsCollection, MetricsError};

pub const COMMAND: &str = "show port-channel detailed";

/// LACP detail of one member port.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LagPort {
    pub lacp_mode: String,
    pub protocol: String,
    pub time_became_active: f64,
    pub weight: f64,
    pub time_became_inactive: f64,
    pub reason_unconfigured: String,
}

/// Members of one port-channel, split by bundling state.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortChannel {
    pub active_ports: BTreeMap<String, LagPort>,
    pub inactive_ports: BTreeMap<String, LagPort>,
}

/// Decoded `show port-channel detailed` output.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortChannelState {
    /// Keyed by interface name (`Port-Channel1`, ...).
    pub port_channels: BTreeMap<String, PortChannel>,
}

/// Emits active and inactive member counts per port-channel.
#[derive(Debug, Default)]
pub struct PortChannelProber {
    pub state: PortChannelState,
    ports: Option<GaugeVec<2>>,
}

impl Prober for PortChannelProber {
    fn kind(&self) -> ModuleKind {
        ModuleKind::PortChannel
    }

    fn register(&mut self, metrics: &mut MetricsCollection) -> Result<(), MetricsError> {
        self.ports = Some(metrics.gauge_vec(
            "portchannel_ports",
            "Contains port channel ports by state",
            ["interface", "state"],
        )?);
        Ok(())
    }

    fn decode(&mut self, output: Value) -> Result<(), serde_json::Error> {
        self.state = serde_json::from_value(output)?;
        Ok(())
    }

    fn emit(&self) {
        let Some(ports) = &self.ports else {
            warn!(module = %self.kind(), "Emit called before register, skipping");
            return;
        };

        for (id, pc) in &self.state.port_channels {
            trace!(
                interface = %id,
                active = pc.active_ports.len(),
                inactive = pc.inactive_ports.len(),
                "Port-channel"
            );
            ports
                .with_label_values([id.as_str(), "active"])
                .set(pc.active_ports.len() as f64);
            ports
                .with_label_values([id.as_str(), "inactive"])
                .set(pc.inactive_ports.len() as f64);
        }
    }
}
