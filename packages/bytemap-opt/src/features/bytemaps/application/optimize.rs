//! The bytemap optimization pipeline
//!
//! inline -> cone of influence -> scalarize -> cone of influence, or the
//! inliner alone in cheap mode. Expects bytemap commands already unfolded.

use crate::config::BytemapConfig;
use crate::errors::Result;
use crate::features::bytemaps::domain::PassOutput;
use crate::features::bytemaps::infrastructure::{BytemapConeOfInf, BytemapInliner};
use crate::features::bytemaps::ports::{Erasability, NoScalarization, PreservedVars, Scalarizer};
use crate::features::patching::RewriteStats;
use crate::shared::models::Program;

/// Run the bytemap passes configured by `config`
pub fn optimize_bytemaps(
    program: &Program,
    config: &BytemapConfig,
    erasability: &dyn Erasability,
) -> Result<PassOutput> {
    optimize_bytemaps_with(program, config, erasability, &NoScalarization)
}

/// Same as [`optimize_bytemaps`], with a scalarization pass between the two
/// cone-of-influence runs
pub fn optimize_bytemaps_with(
    program: &Program,
    config: &BytemapConfig,
    erasability: &dyn Erasability,
    scalarizer: &dyn Scalarizer,
) -> Result<PassOutput> {
    if !config.is_active() {
        tracing::debug!(
            enabled = config.enabled,
            precise_bytemaps = config.precise_bytemaps,
            "bytemap optimizations skipped"
        );
        return Ok(PassOutput::unchanged(program));
    }

    let erasability = PreservedVars::over(erasability, &config.preserved_vars);
    let mut stats = RewriteStats::new();

    tracing::debug!(cheap = config.cheap, "running bytemap inliner");
    let inlined = BytemapInliner::go(program, config, &erasability)?;
    stats.merge(&inlined.stats);
    if config.cheap {
        return Ok(PassOutput {
            program: inlined.program,
            stats,
        });
    }

    tracing::debug!("running bytemap cone of influence");
    let reduced = BytemapConeOfInf::go(&inlined.program, config, &erasability)?;
    stats.merge(&reduced.stats);

    tracing::debug!("running scalarizer");
    let scalarized = scalarizer.scalarize(reduced.program)?;

    tracing::debug!("running bytemap cone of influence again");
    let done = BytemapConeOfInf::go(&scalarized, config, &erasability)?;
    stats.merge(&done.stats);

    tracing::info!(%stats, "bytemap optimizations done");
    Ok(PassOutput {
        program: done.program,
        stats,
    })
}
