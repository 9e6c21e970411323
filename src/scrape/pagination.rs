//! Forces incremental "load more" listings to completion.

use crate::error::ScrapeError;
use crate::navigator::PageNavigator;
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound on load-more rounds. The affordance disappears once the
/// listing is exhausted, so this only matters if it were to re-appear
/// after a click.
const MAX_ROUNDS: u32 = 512;

/// Clicks the "load more" affordance until it is gone, so the listing
/// holds the full child set before enumeration.
///
/// A wait timeout or an absent affordance is the normal end state: "no
/// more pages" and "this page was never paginated" look identical and
/// both terminate the loop successfully.
pub async fn load_all(
    nav: &dyn PageNavigator,
    listing: &str,
    load_more: &str,
    timeout: Duration,
) -> Result<(), ScrapeError> {
    for round in 0..MAX_ROUNDS {
        match nav.wait_for(listing, timeout).await {
            Ok(()) => {}
            Err(ScrapeError::NavigationTimeout { .. }) => break,
            Err(err) => return Err(err),
        }
        match nav.wait_for(load_more, timeout).await {
            Ok(()) => {}
            Err(ScrapeError::NavigationTimeout { .. }) => break,
            Err(err) => return Err(err),
        }
        let affordance = match nav.find(load_more, None).await {
            Ok(handle) => handle,
            Err(ScrapeError::ElementNotFound { .. }) => break,
            Err(err) => return Err(err),
        };
        nav.trigger(&affordance).await?;
        debug!(round, "triggered load-more");

        if round + 1 == MAX_ROUNDS {
            warn!(listing, "load-more affordance still present after {MAX_ROUNDS} rounds, giving up");
        }
    }
    Ok(())
}
