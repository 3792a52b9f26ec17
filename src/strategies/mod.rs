//! Background removal strategies bundled with the harness
//!
//! Real segmentation backends (native vision APIs, bundled networks, remote
//! models) live outside this crate and plug in through
//! [`BackgroundRemovalStrategy`](crate::strategy::BackgroundRemovalStrategy).
//! This module only ships a model-free reference backend.

pub mod border_color;

// Test utilities for strategy testing
#[cfg(test)]
pub mod test_utils;

pub use self::border_color::BorderColorStrategy;

use crate::strategy::{BackgroundRemovalStrategy, StrategyRegistry};

/// Register the bundled strategies under their specifier names
pub fn register_builtin(registry: &mut StrategyRegistry) {
    registry.register("border-color", |parameter| {
        BorderColorStrategy::from_parameter(parameter)
            .map(|strategy| Box::new(strategy) as Box<dyn BackgroundRemovalStrategy>)
    });
}
