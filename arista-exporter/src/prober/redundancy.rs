//! Supervisor redundancy status.

use serde::Deserialize;
use serde_json::Value;
use tracing::{trace, warn};

use super::{ModuleKind, Prober};
use crate::collection::{Gauge, GaugeVec, MetricsCollection, MetricsError};
use crate::mapping::health_value;

pub const COMMAND: &str = "show redundancy status";

/// Decoded `show redundancy status` output.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RedundancyState {
    pub slot_id: f64,
    pub my_mode: String,
    pub peer_mode: String,
    pub unit_desc: String,
    pub communication_desc: String,
    pub peer_state: String,
    pub switchover_ready: bool,
    pub all_agent_sso_ready: bool,
    pub last_redundancy_mode_change_time: f64,
    pub last_redundancy_mode_change_reason: String,
}

#[derive(Debug)]
struct RedundancyGauges {
    slot_id: GaugeVec<1>,
    my_mode: GaugeVec<1>,
    peer_mode: GaugeVec<1>,
    communication_desc: GaugeVec<1>,
    switchover_ready: Gauge,
    all_agent_sso_ready: Gauge,
    last_mode_change_time: GaugeVec<1>,
}

/// Emits supervisor roles, peer communication and SSO readiness.
#[derive(Debug, Default)]
pub struct RedundancyProber {
    pub state: RedundancyState,
    gauges: Option<RedundancyGauges>,
}

impl Prober for RedundancyProber {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Redundancy
    }

    fn register(&mut self, metrics: &mut MetricsCollection) -> Result<(), MetricsError> {
        self.gauges = Some(RedundancyGauges {
            slot_id: metrics.gauge_vec(
                "redundancy_slot_id",
                "Contains redundancy slot id",
                ["unitDesc"],
            )?,
            my_mode: metrics.gauge_vec(
                "redundancy_mode",
                "Contains redundancy mode",
                ["status"],
            )?,
            peer_mode: metrics.gauge_vec(
                "redundancy_peer_mode",
                "Contains redundancy peer mode",
                ["status"],
            )?,
            communication_desc: metrics.gauge_vec(
                "redundancy_communication_desc",
                "Contains redundancy communication desc",
                ["status"],
            )?,
            switchover_ready: metrics.gauge(
                "redundancy_switchover_ready",
                "Contains redundancy switchover ready",
            )?,
            all_agent_sso_ready: metrics.gauge(
                "redundancy_all_agent_sso_ready",
                "Contains redundancy all Agent SSO Ready",
            )?,
            last_mode_change_time: metrics.gauge_vec(
                "redundancy_last_mode_change_time",
                "Contains redundancy last mode change time",
                ["reason"],
            )?,
        });
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
        let s = &self.state;

        trace!(
            my_mode = %s.my_mode,
            peer_mode = %s.peer_mode,
            communication = %s.communication_desc,
            switchover_ready = s.switchover_ready,
            "Redundancy"
        );

        g.slot_id
            .with_label_values([s.unit_desc.as_str()])
            .set(s.slot_id);

        g.my_mode
            .with_label_values([s.my_mode.as_str()])
            .set(health_value(&s.my_mode, "active"));
        g.peer_mode
            .with_label_values([s.peer_mode.as_str()])
            .set(health_value(&s.peer_mode, "standby"));
        g.communication_desc
            .with_label_values([s.communication_desc.as_str()])
            .set(health_value(&s.communication_desc, "Up"));

        // Only ever raised; a fresh collection starts both at 0
        if s.switchover_ready {
            g.switchover_ready.set(1.0);
        }
        if s.all_agent_sso_ready {
            g.all_agent_sso_ready.set(1.0);
        }

        g.last_mode_change_time
            .with_label_values([s.last_redundancy_mode_change_reason.as_str()])
            .set(s.last_redundancy_mode_change_time);
    }
}
