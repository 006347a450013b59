//! MLAG (multi-chassis link aggregation) status.

use serde::Deserialize;
use serde_json::Value;
use tracing::{trace, warn};

use super::{ModuleKind, Prober};
use crate::collection::{Gauge, GaugeVec, MetricsCollection, MetricsError};
use crate::mapping::{flag_value, health_value};

pub const COMMAND: &str = "show mlag detail";

/// Label values of the port breakdown gauge, always all present.
pub const PORT_STATES: [&str; 5] = [
    "disabled",
    "configured",
    "inactive",
    "activePartial",
    "activeFull",
];

/// MLAG port counts by state.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MlagPorts {
    #[serde(rename = "Disabled")]
    pub disabled: u64,
    #[serde(rename = "Configured")]
    pub configured: u64,
    #[serde(rename = "Inactive")]
    pub inactive: u64,
    #[serde(rename = "Active-partial")]
    pub active_partial: u64,
    #[serde(rename = "Active-full")]
    pub active_full: u64,
}

impl MlagPorts {
    /// Counts paired with their [`PORT_STATES`] label.
    pub fn by_state(&self) -> [(&'static str, u64); 5] {
        [
            (PORT_STATES[0], self.disabled),
            (PORT_STATES[1], self.configured),
            (PORT_STATES[2], self.inactive),
            (PORT_STATES[3], self.active_partial),
            (PORT_STATES[4], self.active_full),
        ]
    }
}

/// The `detail` block of `show mlag detail`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MlagDetail {
    pub mlag_state: String,
    pub peer_mlag_state: String,
    pub state_changes: f64,
    pub last_state_change_time: f64,
    pub mlag_hw_ready: bool,
    pub failover: bool,
    pub failover_cause_list: Vec<String>,
    pub failover_initiated: bool,
    pub secondary_from_failover: bool,
    pub udp_heartbeat_alive: bool,
}

/// Decoded `show mlag detail` output.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MlagState {
    pub neg_status: String,
    pub state: String,
    pub config_sanity: String,
    pub peer_link_status: String,
    pub local_intf_status: String,
    pub mlag_ports: MlagPorts,
    pub detail: MlagDetail,
}

#[derive(Debug)]
struct MlagGauges {
    detail: GaugeVec<2>,
    state: GaugeVec<1>,
    state_changes: Gauge,
    last_state_change: Gauge,
    config_sanity: GaugeVec<1>,
    neg_status: GaugeVec<1>,
    peer_link: GaugeVec<1>,
    local_intf_status: GaugeVec<1>,
    failover: GaugeVec<1>,
    ports: GaugeVec<1>,
}

/// Emits MLAG health, failover and port breakdown.
#[derive(Debug, Default)]
pub struct MlagProber {
    pub state: MlagState,
    gauges: Option<MlagGauges>,
}

impl Prober for MlagProber {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Mlag
    }

    fn register(&mut self, metrics: &mut MetricsCollection) -> Result<(), MetricsError> {
        let gauges = MlagGauges {
            detail: metrics.gauge_vec(
                "mlag_detail",
                "Contains MLAG state detail",
                ["mlagState", "peerMlagState"],
            )?,
            state: metrics.gauge_vec("mlag_state", "Contains MLAG state", ["state"])?,
            state_changes: metrics.gauge("mlag_state_changes", "Contains MLAG state changes")?,
            last_state_change: metrics.gauge(
                "mlag_last_state_change",
                "Contains MLAG last state change",
            )?,
            config_sanity: metrics.gauge_vec(
                "mlag_config_sanity",
                "Contains MLAG config sanity",
                ["status"],
            )?,
            neg_status: metrics.gauge_vec(
                "mlag_neg_status",
                "Contains MLAG neg status",
                ["status"],
            )?,
            peer_link: metrics.gauge_vec(
                "mlag_peer_link",
                "Contains MLAG peer link",
                ["status"],
            )?,
            local_intf_status: metrics.gauge_vec(
                "mlag_local_inf_status",
                "Contains MLAG local inf status",
                ["status"],
            )?,
            failover: metrics.gauge_vec("mlag_failover", "Contains MLAG failover", ["cause"])?,
            ports: metrics.gauge_vec(
                "mlag_ports",
                "Contains MLAG port information by state",
                ["state"],
            )?,
        };

        // Fixed cardinality: every state is exposed even at zero
        for state in PORT_STATES {
            gauges.ports.with_label_values([state]);
        }

        self.gauges = Some(gauges);
        Ok(())
    }

    fn decode(&mut self, output: Value) -> Result<(), serde_json::Error> {
        self.state = serde_json::from_value(output)?;
        Ok(())
    }

    fn emit(&self) {
        let Some(g) = &self.gauges else {
            warn!(module = %self.kind(), "Emit called before register, skipping");
            return;
        };
        let state = &self.state;
        let detail = &state.detail;

        trace!(
            state = %state.state,
            mlag_state = %detail.mlag_state,
            peer_mlag_state = %detail.peer_mlag_state,
            failover = detail.failover,
            "MLAG"
        );

        // Presence marker for the role pair
        g.detail
            .with_label_values([detail.mlag_state.as_str(), detail.peer_mlag_state.as_str()])
            .set(1.0);

        g.state
            .with_label_values([state.state.as_str()])
            .set(health_value(&state.state, "active"));
        g.state_changes.set(detail.state_changes);
        g.last_state_change.set(detail.last_state_change_time);

        g.config_sanity
            .with_label_values([state.config_sanity.as_str()])
            .set(health_value(&state.config_sanity, "consistent"));
        g.neg_status
            .with_label_values([state.neg_status.as_str()])
            .set(health_value(&state.neg_status, "connected"));
        g.peer_link
            .with_label_values([state.peer_link_status.as_str()])
            .set(health_value(&state.peer_link_status, "up"));
        g.local_intf_status
            .with_label_values([state.local_intf_status.as_str()])
            .set(health_value(&state.local_intf_status, "up"));

        let causes = if detail.failover {
            detail.failover_cause_list.join(",")
        } else {
            String::new()
        };
        g.failover
            .with_label_values([causes.as_str()])
            .set(flag_value(detail.failover));

        for (label, count) in state.mlag_ports.by_state() {
            g.ports.with_label_values([label]).set(count as f64);
        }
    }
}
