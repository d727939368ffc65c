//! Summary statistics: how much of the target genome each identity class
//! covers, once overlapping matches are resolved.
//!
//! - [`intervals`]: sorted disjoint interval partition with class priority
//! - [`engine`]: percentages per class
//! - [`store`]: persisted result guarded by marker files

pub mod engine;
pub mod intervals;
pub mod store;

pub use engine::{compute_summary, Summary};
pub use store::{SummaryStatus, SummaryStore};

use crate::core::config::EngineConfig;
use crate::core::error::Result;
use crate::plot::assembler::Assembler;
use crate::plot::generation::{Generation, JobLayout};

/// Summary store of a job
pub fn job_store(layout: &JobLayout, config: &EngineConfig) -> SummaryStore {
    SummaryStore::new(layout.summary(), config.summary.clone())
}

/// Load or compute the summary of a job.
///
/// Every record counts, regardless of the rendering cap. Sorting only moves
/// query contigs, so either generation gives the same result.
///
/// # Errors
///
/// Returns parse errors of the job files and the store's errors.
pub fn summarize_job(layout: &JobLayout, config: &EngineConfig) -> Result<Summary> {
    job_store(layout, config).get_or_compute(|| {
        let generation = Generation::discover(layout);
        let live = generation.live();
        let parsed = Assembler::new(config.plot.clone()).parse_all(
            &live.alignment,
            &live.query_index,
            &layout.target_index(),
        )?;
        Ok(compute_summary(&parsed))
    })
}
