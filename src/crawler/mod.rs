//! Crawler module for page fetching and harvest coordination
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching with Fibonacci retry backoff
//! - Standard and proxy-rotating fetch strategies
//! - Injectable waits for backoff and politeness delays
//! - Overall harvest coordination

mod backoff;
mod coordinator;
mod fetcher;
mod pause;
mod proxy;

pub use backoff::{backoff_delay, backoff_seconds};
pub use coordinator::{HarvestReport, Harvester};
pub use fetcher::{
    build_http_client, cookie_header, FetchFailure, FetchedPage, Fetcher, RawResponse,
};
pub use pause::{Pause, RecordingPause, TokioPause};
pub use proxy::{ProxyEntry, ProxyPool};

use crate::config::Config;
use crate::HarvestError;

/// Runs a complete harvest with the sinks configured in `[output]`
///
/// This is the main entry point for a harvest. It will:
/// 1. Open the configured sinks
/// 2. Fetch and extract the chart list
/// 3. Enrich each record from its detail page
/// 4. Save the batch to every sink
///
/// # Returns
///
/// * `Ok(HarvestReport)` - The run completed, possibly with partial failures
/// * `Err(HarvestError)` - The configuration could not be used
pub async fn harvest(config: Config) -> Result<HarvestReport, HarvestError> {
    let mut harvester = Harvester::from_config(config).await?;
    Ok(harvester.run().await)
}
