//! Connection profiles and target resolution.

use std::collections::HashMap;
use std::fmt;
use std::net::Ipv6Addr;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{EapiError, Result};

/// eAPI transport scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// HTTPS (default, what switches enable out of the box).
    #[default]
    Https,
    /// Plain HTTP.
    Http,
}

impl Transport {
    /// URL scheme for this transport.
    pub fn scheme(&self) -> &'static str {
        match self {
            Transport::Https => "https",
            Transport::Http => "http",
        }
    }

    /// Port used when a profile does not set one.
    pub fn default_port(&self) -> u16 {
        match self {
            Transport::Https => 443,
            Transport::Http => 80,
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// How to reach and authenticate against one device.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    /// Hostname or address; defaults to the profile name.
    #[serde(default)]
    pub host: Option<String>,

    /// Port; defaults to the transport's well-known port.
    #[serde(default)]
    pub port: Option<u16>,

    /// Transport: "https" or "http".
    #[serde(default)]
    pub transport: Transport,

    /// eAPI username.
    #[serde(default = "default_username")]
    pub username: String,

    /// eAPI password.
    #[serde(default)]
    pub password: String,

    /// Password for the `enable` command, if the device requires one.
    #[serde(default)]
    pub enable_password: Option<String>,

    /// Verify the device TLS certificate.
    #[serde(default)]
    pub verify_tls: bool,

    /// Request timeout in seconds. No timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_username() -> String {
    "admin".to_string()
}

impl Default for ConnectionProfile {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            transport: Transport::default(),
            username: default_username(),
            password: String::new(),
            enable_password: None,
            verify_tls: false,
            timeout_secs: None,
        }
    }
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("transport", &self.transport)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field(
                "enable_password",
                &self.enable_password.as_ref().map(|_| "<redacted>"),
            )
            .field("verify_tls", &self.verify_tls)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ConnectionProfile {
    /// Effective port for this profile.
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.transport.default_port())
    }

    /// Command API URL for `host`, reached on behalf of `target`.
    ///
    /// `host` must be a bare name or address. Ports, paths, userinfo and
    /// the like are rejected rather than spliced into the URL. IPv6
    /// literals are accepted with or without brackets.
    pub fn endpoint(&self, target: &str, host: &str) -> Result<Url> {
        let invalid = |message: String| EapiError::InvalidEndpoint {
            target: target.to_string(),
            message,
        };

        let unbracketed = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        let host = match unbracketed.parse::<Ipv6Addr>() {
            Ok(addr) => format!("[{}]", addr),
            Err(_) if is_bare_host(host) => host.to_string(),
            Err(_) => return Err(invalid(format!("{:?} is not a host name or address", host))),
        };

        let mut url = Url::parse(&format!("{}://{}/command-api", self.transport.scheme(), host))
            .map_err(|e| invalid(e.to_string()))?;
        url.set_port(Some(self.effective_port()))
            .map_err(|_| invalid("URL does not accept a port".to_string()))?;
        Ok(url)
    }
}

/// Letters, digits, `-`, `_` and `.` only.
fn is_bare_host(host: &str) -> bool {
    !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Connection profiles keyed by target name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EapiConfig {
    /// Profile used for targets that have no entry in `connections`.
    /// Unlisted targets are rejected when unset.
    #[serde(default)]
    pub defaults: Option<ConnectionProfile>,

    /// Named profiles. The scrape `target` is looked up here first.
    #[serde(default)]
    pub connections: HashMap<String, ConnectionProfile>,
}

impl EapiConfig {
    /// Resolve the profile and host for a target name.
    pub fn resolve(&self, target: &str) -> Option<(String, &ConnectionProfile)> {
        if let Some(profile) = self.connections.get(target) {
            let host = profile.host.clone().unwrap_or_else(|| target.to_string());
            return Some((host, profile));
        }

        self.defaults
            .as_ref()
            .map(|profile| (target.to_string(), profile))
    }

    /// Check profiles for values that can never work.
    pub fn validate(&self) -> Result<()> {
        let mut profiles: Vec<(&str, &ConnectionProfile)> = self
            .connections
            .iter()
            .map(|(name, profile)| (name.as_str(), profile))
            .collect();
        if let Some(defaults) = &self.defaults {
            profiles.push(("defaults", defaults));
        }

        for (name, profile) in profiles {
            let invalid = |problem: String| EapiError::InvalidProfile {
                profile: name.to_string(),
                problem,
            };

            if profile.port == Some(0) {
                return Err(invalid("has port 0".to_string()));
            }
            if let Some(host) = &profile.host {
                if host.trim().is_empty() {
                    return Err(invalid("has an empty host".to_string()));
                }
                if let Err(EapiError::InvalidEndpoint { message, .. }) =
                    profile.endpoint(name, host)
                {
                    return Err(invalid(format!("has an invalid host: {}", message)));
                }
            }
        }
        Ok(())
    }
}
