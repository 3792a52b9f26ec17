//! Conversion of CLI arguments into library configuration

use crate::cli::main_impl::{Cli, CliMaskFilter};
use crate::{
    config::{BenchmarkConfig, MaskResizeFilter},
    strategy::{BackgroundRemovalStrategy, StrategyRegistry},
};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::time::Duration;

impl From<CliMaskFilter> for MaskResizeFilter {
    fn from(filter: CliMaskFilter) -> Self {
        match filter {
            CliMaskFilter::Nearest => Self::Nearest,
            CliMaskFilter::Bilinear => Self::Bilinear,
            CliMaskFilter::Lanczos3 => Self::Lanczos3,
        }
    }
}

pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build a validated `BenchmarkConfig` from CLI arguments
    pub(crate) fn from_cli(cli: &Cli) -> Result<BenchmarkConfig> {
        let call_timeout = (cli.timeout_secs > 0).then(|| Duration::from_secs(cli.timeout_secs));

        BenchmarkConfig::builder()
            .iterations(cli.iterations)
            .quality_threshold(cli.threshold)
            .call_timeout(call_timeout)
            .cleanup_after_failed_init(!cli.no_cleanup_on_failed_init)
            .mask_resize_filter(cli.mask_filter.into())
            // the CLI prints the summary itself
            .log_summary(false)
            .build()
            .context("Invalid benchmark configuration")
    }

    /// Instantiate the requested strategies, rejecting duplicate names
    pub(crate) fn strategies(
        cli: &Cli,
        registry: &StrategyRegistry,
    ) -> Result<Vec<Box<dyn BackgroundRemovalStrategy>>> {
        let mut names = HashSet::new();
        let mut strategies = Vec::with_capacity(cli.strategies.len());

        for spec in &cli.strategies {
            let strategy = registry
                .create(spec)
                .with_context(|| format!("Invalid strategy '{}'", spec))?;
            if !names.insert(strategy.name().to_string()) {
                anyhow::bail!(
                    "Strategy '{}' is listed more than once; results would be indistinguishable",
                    strategy.name()
                );
            }
            strategies.push(strategy);
        }

        Ok(strategies)
    }
}
