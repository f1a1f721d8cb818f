//! Harvest coordinator - main scraping orchestration logic
//!
//! This module drives one complete harvest:
//! - Fetching and extracting the chart list page
//! - Enriching each record from its detail page, one at a time
//! - Pausing a random interval between detail pages
//! - Handing the final batch to every configured sink independently

use crate::config::Config;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::pause::{Pause, TokioPause};
use crate::output::{build_sinks, Sink, SinkError, SinkOutcome};
use crate::pages::{DetailPage, ListPage, PageExtractor};
use crate::record::MovieRecord;
use crate::HarvestError;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Result of a harvest run
#[derive(Debug, Clone, Default)]
pub struct HarvestReport {
    /// Records assembled, in chart order
    pub movies: Vec<MovieRecord>,

    /// One outcome per configured sink
    pub sinks: Vec<SinkOutcome>,
}

impl HarvestReport {
    /// Number of sinks that saved the batch
    pub fn sinks_succeeded(&self) -> usize {
        self.sinks.iter().filter(|outcome| outcome.success).count()
    }
}

/// Main harvest coordinator structure
pub struct Harvester {
    config: Config,
    fetcher: Fetcher,
    list_page: ListPage,
    detail_page: DetailPage,
    pause: Arc<dyn Pause>,
    sinks: Vec<Box<dyn Sink>>,
    sink_failures: Vec<SinkOutcome>,
}

impl std::fmt::Debug for Harvester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harvester")
            .field("fetcher", &self.fetcher)
            .field("sinks", &self.sinks.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Harvester {
    /// Creates a harvester without sinks
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `pause` - Used for backoff and politeness waits
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Ready to run
    /// * `Err(HarvestError)` - The strategy or selectors are unusable
    pub fn new(config: Config, pause: Arc<dyn Pause>) -> Result<Self, HarvestError> {
        let fetcher = Fetcher::from_config(&config, Arc::clone(&pause))?;
        let list_page = ListPage::from_config(&config.scraper);
        let detail_page = DetailPage::new(&config.selectors, config.scraper.max_actors)?;

        Ok(Self {
            config,
            fetcher,
            list_page,
            detail_page,
            pause,
            sinks: Vec::new(),
            sink_failures: Vec::new(),
        })
    }

    /// Creates a harvester with real sleeps and the sinks from `[output]`
    pub async fn from_config(config: Config) -> Result<Self, HarvestError> {
        let (sinks, failures) = build_sinks(&config.output).await;
        let mut harvester = Self::new(config, Arc::new(TokioPause))?;
        harvester.sinks = sinks;
        harvester.sink_failures = failures;
        Ok(harvester)
    }

    /// Adds a persistence destination
    pub fn with_sink(mut self, sink: Box<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Fetches the chart page and extracts its records
    ///
    /// A failed fetch or an unreadable page yields an empty list.
    pub async fn scrape_list(&mut self) -> Vec<MovieRecord> {
        let url = self.config.scraper.target_url.clone();

        let movies = match self.fetcher.fetch(&url).await {
            Ok(page) => self.list_page.extract(&page.document),
            Err(failure) => {
                tracing::error!("Could not load the chart page: {}", failure);
                return Vec::new();
            }
        };

        tracing::info!("Extracted {} movies from the chart", movies.len());
        movies
    }

    /// Enriches every record from its detail page, in order
    ///
    /// Records without a detail URL or whose page cannot be fetched keep
    /// their list-page fields.
    pub async fn scrape_details(&mut self, movies: &mut [MovieRecord]) {
        let total = movies.len();
        tracing::info!("Found {} movies. Fetching details...", total);

        for (index, movie) in movies.iter_mut().enumerate() {
            tracing::info!("Processing movie {}/{}: {}", index + 1, total, movie.title);

            match movie.detail_url.clone() {
                Some(url) => {
                    let details = match self.fetcher.fetch(&url).await {
                        Ok(page) => Some(self.detail_page.extract(&page.document)),
                        Err(failure) => {
                            tracing::error!("Skipping details for {}: {}", movie.title, failure);
                            None
                        }
                    };

                    if let Some(details) = details {
                        tracing::debug!(
                            "{}: metascore {:?}, {} actors",
                            movie.title,
                            details.metascore,
                            details.actors.len()
                        );
                        movie.enrich(details);
                    }
                }
                None => tracing::error!("No detail URL found for: {}", movie.title),
            }

            let delay = self.politeness_delay();
            if !delay.is_zero() {
                self.pause.pause(delay).await;
            }
        }
    }

    /// Hands the batch to every sink independently
    ///
    /// Database sinks are cleared first so each run replaces the previous
    /// one. A failing sink never prevents the others from saving.
    pub async fn save(&mut self, movies: &[MovieRecord]) -> Vec<SinkOutcome> {
        let mut outcomes = self.sink_failures.clone();

        for sink in &mut self.sinks {
            let name = sink.name();
            tracing::info!("Saving data to {}...", name);

            let result = save_to(sink.as_mut(), movies).await;
            match result {
                Ok(()) => outcomes.push(SinkOutcome::succeeded(name)),
                Err(e) => {
                    tracing::error!("Failed to save data to {}: {}", name, e);
                    outcomes.push(SinkOutcome::failed(name, &e));
                }
            }
        }

        outcomes
    }

    /// Runs the complete harvest
    ///
    /// Only configuration problems are fatal, and those are caught when
    /// the harvester is built; every later failure is reported in the
    /// returned [`HarvestReport`].
    pub async fn run(&mut self) -> HarvestReport {
        let mut movies = self.scrape_list().await;

        if movies.is_empty() {
            tracing::error!("No movies found to process");
            return HarvestReport {
                movies,
                sinks: self.sink_failures.clone(),
            };
        }

        self.scrape_details(&mut movies).await;
        let sinks = self.save(&movies).await;

        let report = HarvestReport { movies, sinks };
        tracing::info!(
            "Harvest complete: {} movies, {}/{} sinks saved",
            report.movies.len(),
            report.sinks_succeeded(),
            report.sinks.len()
        );
        report
    }

    /// Uniform random wait in `[delay_min, delay_max]` seconds
    fn politeness_delay(&self) -> Duration {
        let min = self.config.scraper.delay_min.max(0.0);
        let max = self.config.scraper.delay_max.max(min);

        let seconds = if max > min {
            rand::rng().random_range(min..=max)
        } else {
            min
        };

        Duration::try_from_secs_f64(seconds).unwrap_or_else(|e| {
            tracing::warn!("Politeness delay of {}s is unusable: {}", seconds, e);
            Duration::ZERO
        })
    }
}

async fn save_to(sink: &mut dyn Sink, movies: &[MovieRecord]) -> Result<(), SinkError> {
    if sink.replaces_on_save() {
        sink.clear().await?;
    }
    sink.save(movies).await
}
