//! Scenario runner for batch projections
//!
//! Holds a base configuration, runs variations of it (in parallel for
//! batches) and offers a cached snapshot that only re-projects when the
//! configuration actually changes.

use log::info;
use rayon::prelude::*;

use crate::config::{PropertyConfig, ScenarioOverride};
use crate::error::Result;
use crate::projection::{ProjectionEngine, ProjectionResult};

/// Scenario runner over a base configuration
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::with_base(load_config("deal.json")?);
///
/// let configs: Vec<_> = [0.05, 0.06, 0.07]
///     .iter()
///     .map(|&rate| runner.base_with(|c| c.initial_mortgage.annual_rate = rate))
///     .collect();
/// let results = runner.run_batch(&configs);
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    base: PropertyConfig,
}

impl ScenarioRunner {
    /// Create runner with the default configuration as base
    pub fn new() -> Self {
        Self {
            base: PropertyConfig::default(),
        }
    }

    pub fn with_base(base: PropertyConfig) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &PropertyConfig {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut PropertyConfig {
        &mut self.base
    }

    /// Copy of the base configuration with `edit` applied
    pub fn base_with<F: FnOnce(&mut PropertyConfig)>(&self, edit: F) -> PropertyConfig {
        let mut config = self.base.clone();
        edit(&mut config);
        config
    }

    /// Run a single projection
    pub fn run(&self, config: &PropertyConfig) -> Result<ProjectionResult> {
        ProjectionEngine::new(config.clone()).run()
    }

    pub fn run_base(&self) -> Result<ProjectionResult> {
        self.run(&self.base)
    }

    /// Run many configurations in parallel. Results keep the input order;
    /// a solver failure on one configuration does not affect the others.
    pub fn run_batch(&self, configs: &[PropertyConfig]) -> Vec<Result<ProjectionResult>> {
        info!("Running {} scenarios", configs.len());
        let results: Vec<_> = configs.par_iter().map(|config| self.run(config)).collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            info!("{} of {} scenarios failed to solve", failed, results.len());
        }
        results
    }

    /// Apply each named override to the base and run them in parallel
    pub fn run_overrides(&self, overrides: &[ScenarioOverride]) -> Vec<(String, Result<ProjectionResult>)> {
        let configs: Vec<PropertyConfig> = overrides.iter().map(|o| o.apply(&self.base)).collect();
        overrides
            .iter()
            .map(|o| o.name.clone())
            .zip(self.run_batch(&configs))
            .collect()
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Last projection and the configuration snapshot it was computed from
///
/// Callers that re-render on every input event can ask for the projection each
/// time; the engine only runs when the snapshot differs.
#[derive(Debug, Default)]
pub struct CachedProjection {
    latest: Option<ProjectionResult>,
    runs: u64,
}

impl CachedProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Projection for `config`, re-running the engine only on change.
    /// A failed run clears the cache.
    pub fn get(&mut self, config: &PropertyConfig) -> Result<&ProjectionResult> {
        let result = match self.latest.take() {
            Some(result) if result.config == *config => result,
            _ => {
                let result = ProjectionEngine::new(config.clone()).run()?;
                self.runs += 1;
                result
            }
        };
        let result: &ProjectionResult = self.latest.insert(result);
        Ok(result)
    }

    pub fn latest(&self) -> Option<&ProjectionResult> {
        self.latest.as_ref()
    }

    /// Number of engine runs performed so far
    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub fn invalidate(&mut self) {
        self.latest = None;
    }
}
