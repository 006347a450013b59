//! Scrape orchestration: one probe request, one device round trip.

use std::sync::Arc;
use std::time::Instant;

use arista_eapi::{DeviceClient, EapiError};
use tracing::{debug, error, info};

use crate::collection::MetricsCollection;
use crate::error::ScrapeError;
use crate::prober::{self, ModuleKind, Prober};
use crate::stats::{ExporterMetrics, Outcome};

/// A validated probe request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    pub target: String,
    /// Never empty, no duplicates, in request order.
    pub modules: Vec<ModuleKind>,
}

impl ScrapeRequest {
    /// Validate the raw `target` and `module` query parameters.
    ///
    /// An absent or empty module list means [`ModuleKind::DEFAULT`]. Names
    /// are comma separated and trimmed; a name listed twice is scraped once.
    pub fn parse(target: Option<&str>, modules: Option<&str>) -> Result<Self, ScrapeError> {
        let target = match target {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => return Err(ScrapeError::MissingTarget),
        };

        let modules = match modules {
            None | Some("") => vec![ModuleKind::DEFAULT],
            Some(list) => {
                let mut kinds = prober::resolve(list.split(',').map(str::trim))?;
                let mut seen = Vec::with_capacity(kinds.len());
                kinds.retain(|kind| {
                    if seen.contains(kind) {
                        false
                    } else {
                        seen.push(*kind);
                        true
                    }
                });
                kinds
            }
        };

        Ok(Self { target, modules })
    }

    /// Module names joined with `,`, for logging.
    pub fn module_names(&self) -> String {
        self.modules
            .iter()
            .map(ModuleKind::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Serves probe requests against devices reached through a [`DeviceClient`].
///
/// Cloning is cheap; clones share the client and the self-metrics.
#[derive(Clone)]
pub struct Scraper {
    client: Arc<dyn DeviceClient>,
    prefix: String,
    stats: Arc<ExporterMetrics>,
}

impl Scraper {
    /// Create a scraper whose metric names get `prefix_` in front.
    pub fn new(client: Arc<dyn DeviceClient>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
            stats: Arc::new(ExporterMetrics::new()),
        }
    }

    pub fn stats(&self) -> &ExporterMetrics {
        &self.stats
    }

    /// Parse the raw query parameters and scrape.
    pub async fn serve(
        &self,
        target: Option<&str>,
        modules: Option<&str>,
    ) -> Result<String, ScrapeError> {
        let started = Instant::now();

        match ScrapeRequest::parse(target, modules) {
            Ok(request) => self.scrape(&request).await,
            Err(e) => {
                debug!(
                    target = target.unwrap_or_default(),
                    modules = modules.unwrap_or_default(),
                    error = %e,
                    "Rejected probe request"
                );
                self.stats.observe(e.outcome(), &[], started.elapsed());
                Err(e)
            }
        }
    }

    /// Scrape the requested modules from the target and render them.
    pub async fn scrape(&self, request: &ScrapeRequest) -> Result<String, ScrapeError> {
        let started = Instant::now();
        let modules = request.module_names();

        debug!(target = %request.target, modules = %modules, "Starting scrape");

        let result = self.run(request).await;
        let elapsed = started.elapsed();

        match &result {
            Ok(body) => {
                self.stats
                    .observe(Outcome::Success, &request.modules, elapsed);
                info!(
                    target = %request.target,
                    modules = %modules,
                    duration_ms = elapsed.as_millis() as u64,
                    bytes = body.len(),
                    "Scrape completed"
                );
            }
            Err(e) => {
                self.stats.observe(e.outcome(), &request.modules, elapsed);
                error!(
                    target = %request.target,
                    modules = %modules,
                    duration_ms = elapsed.as_millis() as u64,
                    error = %e,
                    cause = %source_chain(e),
                    "Scrape failed"
                );
            }
        }

        result
    }

    async fn run(&self, request: &ScrapeRequest) -> Result<String, ScrapeError> {
        let target = request.target.as_str();

        let conn = self
            .client
            .connect(target)
            .await
            .map_err(|source| ScrapeError::Connection {
                target: target.to_string(),
                source,
            })?;

        let mut probers: Vec<Box<dyn Prober>> =
            request.modules.iter().map(ModuleKind::prober).collect();
        let commands: Vec<&'static str> = probers.iter().map(|p| p.command()).collect();

        let mut metrics = MetricsCollection::new(&self.prefix);
        for prober in probers.iter_mut() {
            prober.register(&mut metrics)?;
        }

        let outputs = conn
            .run_commands(&commands)
            .await
            .map_err(|source| ScrapeError::from_device(target, source))?;

        if outputs.len() != probers.len() {
            return Err(ScrapeError::Execution {
                source: EapiError::Protocol(format!(
                    "expected {} results from {}, got {}",
                    probers.len(),
                    conn.endpoint(),
                    outputs.len()
                )),
            });
        }

        for (prober, output) in probers.iter_mut().zip(outputs) {
            let module = prober.kind();
            prober
                .decode(output)
                .map_err(|source| ScrapeError::Decode { module, source })?;
        }

        for prober in &probers {
            prober.emit();
        }

        Ok(metrics.render()?)
    }
}

/// Underlying causes of `err`, innermost last.
fn source_chain(err: &dyn std::error::Error) -> String {
    let mut causes = Vec::new();
    let mut current = err.source();
    while let Some(cause) = current {
        causes.push(cause.to_string());
        current = cause.source();
    }
    causes.join(": ")
}
