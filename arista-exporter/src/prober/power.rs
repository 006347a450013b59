//! Power supply status.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{trace, warn};

use super::{ModuleKind, Prober};
use crate::collection::{GaugeVec, MetricsCollection, MetricsError};
use crate::mapping::health_value;

pub const COMMAND: &str = "show system environment power";

/// Power supply state that counts as healthy.
const HEALTHY_STATE: &str = "ok";

/// One power supply as reported by the device.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PowerSupply {
    pub model_name: String,
    pub capacity: f64,
    pub dominant: bool,
    pub input_current: f64,
    pub output_current: f64,
    pub input_voltage: f64,
    pub output_power: f64,
    /// `ok` when healthy; anything else (`powerLoss`, `failed`, ...) is not.
    pub state: String,
}

/// Decoded `show system environment power` output.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerState {
    /// Keyed by power supply slot. Required: a response without it is
    /// malformed, not a chassis without power supplies.
    pub power_supplies: BTreeMap<String, PowerSupply>,
}

/// Emits one health series per power supply.
#[derive(Debug, Default)]
pub struct PowerProber {
    pub state: PowerState,
    supply_state: Option<GaugeVec<2>>,
}

impl Prober for PowerProber {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Power
    }

    fn register(&mut self, metrics: &mut MetricsCollection) -> Result<(), MetricsError> {
        self.supply_state = Some(metrics.gauge_vec(
            "power_supply_state",
            "Contains Power Supply state",
            ["powerSupply", "state"],
        )?);
        Ok(())
    }

    fn decode(&mut self, output: Value) -> Result<(), serde_json::Error> {
        self.state = serde_json::from_value(output)?;
        Ok(())
    }

    fn emit(&self) {
        let Some(supply_state) = &self.supply_state else {
            warn!(module = %self.kind(), "Emit called before register, skipping");
            return;
        };

        for (id, supply) in &self.state.power_supplies {
            trace!(power_supply = %id, state = %supply.state, "Power supply");
            supply_state
                .with_label_values([id.as_str(), supply.state.as_str()])
                .set(health_value(&supply.state, HEALTHY_STATE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::sample_value;
    use serde_json::json;

    fn scrape(output: Value) -> String {
        let mut metrics = MetricsCollection::new("arista");
        let mut prober = PowerProber::default();
        prober.register(&mut metrics).unwrap();
        prober.decode(output).unwrap();
        prober.emit();
        metrics.render().unwrap()
    }

    #[test]
    fn test_decode_device_output() {
        let mut prober = PowerProber::default();
        prober
            .decode(json!({
                "powerSupplies": {
                    "1": {
                        "modelName": "PWR-500AC-R",
                        "capacity": 500.0,
                        "dominant": false,
                        "inputCurrent": 0.65,
                        "outputCurrent": 9.5,
                        "inputVoltage": 208.5,
                        "outputPower": 114.0,
                        "state": "ok",
                        "uptime": 1718000000.0,
                        "fans": {},
                        "tempSensors": {}
                    }
                }
            }))
            .unwrap();

        let supply = &prober.state.power_supplies["1"];
        assert_eq!(supply.model_name, "PWR-500AC-R");
        assert_eq!(supply.capacity, 500.0);
        assert_eq!(supply.output_power, 114.0);
        assert_eq!(supply.state, "ok");
    }

    #[test]
    fn test_emit_health_per_supply() {
        let output = scrape(json!({
            "powerSupplies": {
                "1": {"state": "ok"},
                "2": {"state": "powerLoss"}
            }
        }));

        assert_eq!(
            sample_value(&output, "arista_power_supply_state{powerSupply=\"1\",state=\"ok\"}"),
            Some(1.0)
        );
        assert_eq!(
            sample_value(
                &output,
                "arista_power_supply_state{powerSupply=\"2\",state=\"powerLoss\"}"
            ),
            Some(0.0)
        );
    }

    #[test]
    fn test_no_aggregate_series() {
        let output = scrape(json!({"powerSupplies": {"1": {"state": "ok"}}}));

        let samples: Vec<_> = output
            .lines()
            .filter(|l| l.starts_with("arista_power_supply_state"))
            .collect();
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_empty_chassis_has_no_series() {
        let output = scrape(json!({"powerSupplies": {}}));
        assert!(!output.contains("arista_power_supply_state{"));
    }

    #[test]
    fn test_missing_power_supplies_is_decode_error() {
        let mut prober = PowerProber::default();
        assert!(prober.decode(json!({})).is_err());
    }

    #[test]
    fn test_emit_without_register_is_noop() {
        let mut prober = PowerProber::default();
        prober
            .decode(json!({"powerSupplies": {"1": {"state": "ok"}}}))
            .unwrap();
        prober.emit();
    }
}
