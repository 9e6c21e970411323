//! Municipality scrape command implementation.

use crate::commands::Race;
use crate::config::Config;
use crate::navigator::{ChromeNavigatorFactory, NavigatorFactory};
use crate::output;
use crate::scrape::{SessionExecutor, Traverser};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

/// Scrapes one municipality's full result tree and writes it to disk.
pub struct MunicipalityCommand {
    config: Config,
}

impl MunicipalityCommand {
    /// Creates a new municipality command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the scrape against a real browser and returns the output path.
    pub async fn execute(&self, url: &str) -> Result<PathBuf> {
        let factory = ChromeNavigatorFactory::new(self.config.headless);
        self.execute_with_factory(factory, url).await
    }

    /// Runs the scrape with a provided navigator factory (for testing).
    pub async fn execute_with_factory<F: NavigatorFactory>(
        &self,
        factory: F,
        url: &str,
    ) -> Result<PathBuf> {
        info!("Scraping municipality results from {url}");

        let executor = SessionExecutor::new(factory, self.config.retry_policy());
        let traverser = Traverser::new(&executor, &self.config);

        let municipality =
            traverser.scrape_municipality(url).await.context("Traversal failed")?;

        info!(
            municipality = %municipality.name,
            cities = municipality.cities.len(),
            results = municipality.leaf_count(),
            "traversal complete"
        );

        output::write_document(&municipality, Race::Municipality.as_str(), &self.config.output_dir)
            .context("Failed to write results document")
    }
}
