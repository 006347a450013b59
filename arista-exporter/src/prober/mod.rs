//! Telemetry modules.
//!
//! A prober owns the decoded output of one show command and knows how to
//! flatten it into gauges. The set of probers is closed: [`ModuleKind`] is
//! the lookup table from a module name to a fresh prober.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

use crate::collection::{MetricsCollection, MetricsError};

pub mod mlag;
pub mod port_channel;
pub mod power;
pub mod redundancy;
pub mod switchover;

pub use mlag::MlagProber;
pub use port_channel::PortChannelProber;
pub use power::PowerProber;
pub use redundancy::RedundancyProber;
pub use switchover::SwitchoverProber;

/// One telemetry module, scoped to a single scrape of a single target.
///
/// The orchestrator drives every prober through the same sequence:
/// [`register`](Prober::register), then [`decode`](Prober::decode) with the
/// device's answer to [`command`](Prober::command), then
/// [`emit`](Prober::emit).
pub trait Prober: Send {
    /// Which module this is.
    fn kind(&self) -> ModuleKind;

    /// The show command whose JSON output this prober consumes.
    fn command(&self) -> &'static str {
        self.kind().command()
    }

    /// Declare every metric this prober emits.
    fn register(&mut self, metrics: &mut MetricsCollection) -> Result<(), MetricsError>;

    /// Replace the device state with the decoded command output.
    fn decode(&mut self, output: Value) -> Result<(), serde_json::Error>;

    /// Write the current device state into the registered metrics.
    fn emit(&self);
}

/// Requested module name that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown module {0:?}")]
pub struct UnknownModule(pub String);

/// The closed set of telemetry modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Power,
    Mlag,
    PortChannel,
    Redundancy,
    Switchover,
}

impl ModuleKind {
    /// Every module, in documentation order.
    pub const ALL: [ModuleKind; 5] = [
        ModuleKind::Power,
        ModuleKind::Mlag,
        ModuleKind::PortChannel,
        ModuleKind::Redundancy,
        ModuleKind::Switchover,
    ];

    /// Module scraped when the request names none.
    pub const DEFAULT: ModuleKind = ModuleKind::Power;

    /// Name used in the `module` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Power => "power",
            ModuleKind::Mlag => "mlag",
            ModuleKind::PortChannel => "portchannel",
            ModuleKind::Redundancy => "redundancy",
            ModuleKind::Switchover => "switchover",
        }
    }

    /// Device command for this module.
    pub fn command(&self) -> &'static str {
        match self {
            ModuleKind::Power => power::COMMAND,
            ModuleKind::Mlag => mlag::COMMAND,
            ModuleKind::PortChannel => port_channel::COMMAND,
            ModuleKind::Redundancy => redundancy::COMMAND,
            ModuleKind::Switchover => switchover::COMMAND,
        }
    }

    /// Build a fresh, unregistered prober for this module.
    pub fn prober(&self) -> Box<dyn Prober> {
        match self {
            ModuleKind::Power => Box::new(PowerProber::default()),
            ModuleKind::Mlag => Box::new(MlagProber::default()),
            ModuleKind::PortChannel => Box::new(PortChannelProber::default()),
            ModuleKind::Redundancy => Box::new(RedundancyProber::default()),
            ModuleKind::Switchover => Box::new(SwitchoverProber::default()),
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleKind {
    type Err = UnknownModule;

    /// Exact, case-sensitive match on the module name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModuleKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownModule(s.to_string()))
    }
}

/// Resolve module names in order. The first unknown name fails the whole
/// list.
pub fn resolve<'a, I>(names: I) -> Result<Vec<ModuleKind>, UnknownModule>
where
    I: IntoIterator<Item = &'a str>,
{
    names.into_iter().map(str::parse).collect()
}
