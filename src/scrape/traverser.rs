//! Depth-first descent through the four levels of the results hierarchy.
//!
//! Each level is one retry-wrapped session operation: open the level's
//! URL, force pagination where the listing has it, enumerate child cards
//! in source order. Children are then visited strictly sequentially and
//! the tree is composed bottom-up; a node is complete only once all of
//! its children are.

use crate::config::Config;
use crate::error::ScrapeError;
use crate::navigator::{NavigatorFactory, PageNavigator};
use crate::scrape::models::{City, Municipality, PartyResult, School, Table};
use crate::scrape::retry::SessionExecutor;
use crate::scrape::{numeric, pagination, selectors};
use futures::FutureExt;
use std::time::Duration;
use tracing::{debug, info};

/// Separator inside the combined "X de Y" voter-count string.
const VOTER_SEPARATOR: &str = " de ";

/// Delimiter for percentages read as raw markup.
const MARKUP_PERCENT_DELIMITER: &str = "&nbsp;";

/// Fields shared by every territory card in a listing.
#[derive(Debug, Clone)]
struct CardRef {
    name: String,
    scrutinized: f64,
    url: String,
}

/// Municipality-only header fields read before descending.
#[derive(Debug, Clone)]
struct MunicipalityHeader {
    name: String,
    voters: u64,
    total_voters: u64,
    scrutinized: f64,
}

/// Walks the hierarchy and assembles the result tree.
pub struct Traverser<'a, F: NavigatorFactory> {
    executor: &'a SessionExecutor<F>,
    wait_timeout: Duration,
    table_timeout: Duration,
    city_delay: Duration,
}

impl<'a, F: NavigatorFactory> Traverser<'a, F> {
    pub fn new(executor: &'a SessionExecutor<F>, config: &Config) -> Self {
        Self {
            executor,
            wait_timeout: config.wait_timeout(),
            table_timeout: config.table_timeout(),
            city_delay: config.city_delay(),
        }
    }

    /// Entry point: scrapes one municipality and everything below it.
    pub async fn scrape_municipality(&self, url: &str) -> Result<Municipality, ScrapeError> {
        let wait = self.wait_timeout;
        let (header, city_cards) = self
            .executor
            .run(url, {
                let url = url.to_string();
                move |nav| {
                    let url = url.clone();
                    async move {
                        nav.open(&url).await?;
                        pagination::load_all(
                            nav.as_ref(),
                            selectors::listing::CONTAINER,
                            selectors::listing::LOAD_MORE,
                            wait,
                        )
                        .await?;
                        let header = read_municipality_header(nav.as_ref()).await?;
                        let cards = collect_cards(nav.as_ref()).await?;
                        Ok((header, cards))
                    }
                    .boxed()
                }
            })
            .await?;

        info!(municipality = %header.name, cities = city_cards.len(), "processing cities");

        let mut cities = Vec::with_capacity(city_cards.len());
        for card in city_cards {
            let schools = self.scrape_city(&card).await?;
            cities.push(City {
                name: card.name,
                scrutinized: card.scrutinized,
                url: card.url,
                schools,
            });
            // Politeness pause between city subtrees.
            tokio::time::sleep(self.city_delay).await;
        }

        Ok(Municipality {
            name: header.name,
            voters: header.voters,
            total_voters: header.total_voters,
            scrutinized: header.scrutinized,
            cities,
        })
    }

    async fn scrape_city(&self, city: &CardRef) -> Result<Vec<School>, ScrapeError> {
        info!(city = %city.name, "processing schools");
        let school_cards = self.listing_cards(&city.url, true).await?;

        let mut schools = Vec::with_capacity(school_cards.len());
        for card in school_cards {
            let tables = self.scrape_school(&card).await?;
            schools.push(School {
                name: card.name,
                scrutinized: card.scrutinized,
                url: card.url,
                tables,
            });
        }
        Ok(schools)
    }

    async fn scrape_school(&self, school: &CardRef) -> Result<Vec<Table>, ScrapeError> {
        debug!(school = %school.name, "processing tables");
        let table_cards = self.listing_cards(&school.url, false).await?;

        let mut tables = Vec::with_capacity(table_cards.len());
        for card in table_cards {
            let results = self.scrape_table(&card.url).await?;
            tables.push(Table {
                number: card.name,
                scrutinized: card.scrutinized,
                url: card.url,
                results,
            });
        }
        Ok(tables)
    }

    async fn scrape_table(&self, url: &str) -> Result<Vec<PartyResult>, ScrapeError> {
        let timeout = self.table_timeout;
        self.executor
            .run(url, {
                let url = url.to_string();
                move |nav| {
                    let url = url.clone();
                    async move {
                        nav.open(&url).await?;
                        nav.wait_for(selectors::table::BODY, timeout).await?;
                        read_result_rows(nav.as_ref()).await
                    }
                    .boxed()
                }
            })
            .await
    }

    /// Enumerates the territory cards at `url`, forcing pagination to
    /// completion first where the listing has it.
    async fn listing_cards(&self, url: &str, paginate: bool) -> Result<Vec<CardRef>, ScrapeError> {
        let wait = self.wait_timeout;
        self.executor
            .run(url, {
                let url = url.to_string();
                move |nav| {
                    let url = url.clone();
                    async move {
                        nav.open(&url).await?;
                        if paginate {
                            pagination::load_all(
                                nav.as_ref(),
                                selectors::listing::CONTAINER,
                                selectors::listing::LOAD_MORE,
                                wait,
                            )
                            .await?;
                        } else {
                            // Unpaginated listing; absence means no children.
                            match nav.wait_for(selectors::listing::CONTAINER, wait).await {
                                Ok(()) | Err(ScrapeError::NavigationTimeout { .. }) => {}
                                Err(err) => return Err(err),
                            }
                        }
                        collect_cards(nav.as_ref()).await
                    }
                    .boxed()
                }
            })
            .await
    }
}

/// Reads the name, scrutinized percentage and card URL of every territory
/// card on the current page, in document order.
async fn collect_cards(nav: &dyn PageNavigator) -> Result<Vec<CardRef>, ScrapeError> {
    let cards = nav.find_all(selectors::listing::CARDS, None).await?;
    let mut refs = Vec::with_capacity(cards.len());
    for card in &cards {
        let name_handle = nav.find(selectors::listing::CARD_NAME, Some(card)).await?;
        let name = nav.text(&name_handle).await?;

        let pct_handle = nav.find(selectors::listing::CARD_SCRUTINIZED, Some(card)).await?;
        let raw_pct = nav.text(&pct_handle).await?;
        let scrutinized = numeric::parse_percentage(&raw_pct, numeric::PERCENT_DELIMITER)?;

        let url = nav
            .attribute(card, "href")
            .await?
            .ok_or_else(|| ScrapeError::not_found("href"))?;

        refs.push(CardRef { name, scrutinized, url });
    }
    debug!(cards = refs.len(), "enumerated listing");
    Ok(refs)
}

/// Reads the municipality header: name, then the scrutinized summary
/// revealed by the detail-panel button, then the "X de Y" voter counts.
async fn read_municipality_header(
    nav: &dyn PageNavigator,
) -> Result<MunicipalityHeader, ScrapeError> {
    let name_handle = nav.find(selectors::municipality::NAME, None).await?;
    let name = nav.text(&name_handle).await?;

    let details = nav.find(selectors::municipality::DETAILS_BUTTON, None).await?;
    nav.trigger(&details).await?;

    let pct_handle = nav.find(selectors::municipality::SCRUTINIZED_VALUE, None).await?;
    let raw_pct = nav
        .attribute(&pct_handle, "innerHTML")
        .await?
        .ok_or_else(|| ScrapeError::not_found(selectors::municipality::SCRUTINIZED_VALUE))?;
    let scrutinized = numeric::parse_percentage(&raw_pct, MARKUP_PERCENT_DELIMITER)?;

    let voters_handle = nav.find(selectors::municipality::VOTERS_BOX, None).await?;
    let raw_voters = nav
        .attribute(&voters_handle, "innerHTML")
        .await?
        .ok_or_else(|| ScrapeError::not_found(selectors::municipality::VOTERS_BOX))?;
    let (voters, total_voters) = split_voters(&raw_voters)?;

    Ok(MunicipalityHeader { name, voters, total_voters, scrutinized })
}

/// Splits `"1.234 de 2.000"` into `(1234, 2000)`.
fn split_voters(raw: &str) -> Result<(u64, u64), ScrapeError> {
    let mut parts = raw.splitn(2, VOTER_SEPARATOR);
    let voters = numeric::parse_integer(parts.next().unwrap_or_default())?;
    let total = numeric::parse_integer(parts.next().unwrap_or_default())?;
    Ok((voters, total))
}

/// Reads the party/votes/percentage rows of the current table page.
/// Rows without text are separators and are skipped.
async fn read_result_rows(nav: &dyn PageNavigator) -> Result<Vec<PartyResult>, ScrapeError> {
    let rows = nav.find_all(selectors::table::ROWS, None).await?;
    let mut results = Vec::new();
    for row in &rows {
        let row_text = nav.text(row).await?;
        if row_text.trim().is_empty() {
            continue;
        }
        let cells = nav.find_all(selectors::table::CELLS, Some(row)).await?;
        if cells.is_empty() {
            // Header rows carry th cells only.
            continue;
        }
        if cells.len() < 3 {
            return Err(ScrapeError::not_found(selectors::table::CELLS));
        }

        // The party cell stacks the alliance above the party name.
        let party_text = nav.text(&cells[0]).await?;
        let party = party_text.rsplit('\n').next().unwrap_or_default().to_string();

        let votes = numeric::parse_integer(&nav.text(&cells[1]).await?)?;
        let raw_pct = nav.text(&cells[2]).await?;
        let percentage = numeric::parse_percentage(&raw_pct, numeric::PERCENT_DELIMITER)?;

        results.push(PartyResult { party, votes, percentage });
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::ElementHandle;
    use crate::scrape::retry::RetryPolicy;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct FakeElement {
        text: String,
        attrs: HashMap<String, String>,
        children: HashMap<String, Vec<FakeElement>>,
    }

    impl FakeElement {
        fn with_text(text: &str) -> Self {
            Self { text: text.to_string(), ..Default::default() }
        }

        fn with_markup(markup: &str) -> Self {
            let mut el = Self::default();
            el.attrs.insert("innerHTML".to_string(), markup.to_string());
            el
        }
    }

    #[derive(Default)]
    struct FakeSite {
        pages: HashMap<String, HashMap<String, Vec<FakeElement>>>,
    }

    struct FakeNavigator {
        site: Arc<FakeSite>,
        current: Mutex<Option<String>>,
        elements: Mutex<HashMap<u64, FakeElement>>,
        next_id: AtomicU64,
    }

    impl FakeNavigator {
        async fn page_elements(&self, selector: &str) -> Vec<FakeElement> {
            let current = self.current.lock().await;
            let Some(url) = current.as_ref() else { return Vec::new() };
            self.site
                .pages
                .get(url)
                .and_then(|page| page.get(selector))
                .cloned()
                .unwrap_or_default()
        }

        async fn register(&self, element: FakeElement) -> ElementHandle {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.elements.lock().await.insert(id, element);
            ElementHandle::new(id)
        }

        async fn lookup(&self, handle: &ElementHandle) -> Result<FakeElement, ScrapeError> {
            self.elements
                .lock()
                .await
                .get(&handle.id())
                .cloned()
                .ok_or_else(|| ScrapeError::not_found("<handle>"))
        }
    }

    #[async_trait]
    impl PageNavigator for FakeNavigator {
        async fn open(&self, url: &str) -> Result<(), ScrapeError> {
            if !self.site.pages.contains_key(url) {
                return Err(ScrapeError::Session(format!("unknown url {url}")));
            }
            *self.current.lock().await = Some(url.to_string());
            Ok(())
        }

        async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<(), ScrapeError> {
            if self.page_elements(selector).await.is_empty() {
                Err(ScrapeError::timeout(selector))
            } else {
                Ok(())
            }
        }

        async fn find(
            &self,
            selector: &str,
            within: Option<&ElementHandle>,
        ) -> Result<ElementHandle, ScrapeError> {
            let element = match within {
                Some(scope) => {
                    let parent = self.lookup(scope).await?;
                    parent
                        .children
                        .get(selector)
                        .and_then(|v| v.first())
                        .cloned()
                        .ok_or_else(|| ScrapeError::not_found(selector))?
                }
                None => self
                    .page_elements(selector)
                    .await
                    .into_iter()
                    .next()
                    .ok_or_else(|| ScrapeError::not_found(selector))?,
            };
            Ok(self.register(element).await)
        }

        async fn find_all(
            &self,
            selector: &str,
            within: Option<&ElementHandle>,
        ) -> Result<Vec<ElementHandle>, ScrapeError> {
            let found = match within {
                Some(scope) => {
                    let parent = self.lookup(scope).await?;
                    parent.children.get(selector).cloned().unwrap_or_default()
                }
                None => self.page_elements(selector).await,
            };
            let mut handles = Vec::with_capacity(found.len());
            for element in found {
                handles.push(self.register(element).await);
            }
            Ok(handles)
        }

        async fn text(&self, handle: &ElementHandle) -> Result<String, ScrapeError> {
            Ok(self.lookup(handle).await?.text)
        }

        async fn attribute(
            &self,
            handle: &ElementHandle,
            name: &str,
        ) -> Result<Option<String>, ScrapeError> {
            Ok(self.lookup(handle).await?.attrs.get(name).cloned())
        }

        async fn trigger(&self, _handle: &ElementHandle) -> Result<(), ScrapeError> {
            Ok(())
        }

        async fn close(&self) {}
    }

    struct FakeFactory {
        site: Arc<FakeSite>,
    }

    #[async_trait]
    impl NavigatorFactory for FakeFactory {
        type Navigator = FakeNavigator;

        async fn acquire(&self) -> Result<Arc<FakeNavigator>, ScrapeError> {
            Ok(Arc::new(FakeNavigator {
                site: Arc::clone(&self.site),
                current: Mutex::new(None),
                elements: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }))
        }
    }

    fn card(name: &str, pct: &str, href: &str) -> FakeElement {
        let mut el = FakeElement::default();
        el.attrs.insert("href".to_string(), href.to_string());
        el.children
            .insert(selectors::listing::CARD_NAME.to_string(), vec![FakeElement::with_text(name)]);
        el.children.insert(
            selectors::listing::CARD_SCRUTINIZED.to_string(),
            vec![FakeElement::with_text(pct)],
        );
        el
    }

    fn listing_page(cards: Vec<FakeElement>) -> HashMap<String, Vec<FakeElement>> {
        let mut page = HashMap::new();
        page.insert(selectors::listing::CONTAINER.to_string(), vec![FakeElement::default()]);
        page.insert(selectors::listing::CARDS.to_string(), cards);
        page
    }

    fn municipality_page(
        name: &str,
        pct_markup: &str,
        voters_markup: &str,
        cards: Vec<FakeElement>,
    ) -> HashMap<String, Vec<FakeElement>> {
        let mut page = listing_page(cards);
        page.insert(
            selectors::municipality::NAME.to_string(),
            vec![FakeElement::with_text(name)],
        );
        page.insert(
            selectors::municipality::DETAILS_BUTTON.to_string(),
            vec![FakeElement::default()],
        );
        page.insert(
            selectors::municipality::SCRUTINIZED_VALUE.to_string(),
            vec![FakeElement::with_markup(pct_markup)],
        );
        page.insert(
            selectors::municipality::VOTERS_BOX.to_string(),
            vec![FakeElement::with_markup(voters_markup)],
        );
        page
    }

    fn result_row(party_cell: &str, votes: &str, pct: &str) -> FakeElement {
        let mut row = FakeElement::with_text(&format!("{party_cell} {votes} {pct}"));
        row.children.insert(
            selectors::table::CELLS.to_string(),
            vec![
                FakeElement::with_text(party_cell),
                FakeElement::with_text(votes),
                FakeElement::with_text(pct),
            ],
        );
        row
    }

    fn table_page(rows: Vec<FakeElement>) -> HashMap<String, Vec<FakeElement>> {
        let mut page = HashMap::new();
        page.insert(selectors::table::BODY.to_string(), vec![FakeElement::default()]);
        page.insert(selectors::table::ROWS.to_string(), rows);
        page
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.retry_delay_ms = 0;
        config.city_delay_ms = 0;
        config.wait_timeout_ms = 10;
        config.table_timeout_ms = 10;
        config
    }

    /// Synthetic site: N1 cities x N2 schools x N3 tables x N4 results.
    fn synthetic_site(n1: usize, n2: usize, n3: usize, n4: usize) -> FakeSite {
        let mut site = FakeSite::default();

        let city_cards = (0..n1)
            .map(|c| card(&format!("City {c}"), "90,0 %", &format!("https://t/city/{c}")))
            .collect();
        site.pages.insert(
            "https://t/muni".to_string(),
            municipality_page("Muni", "97,69&nbsp;%", "1.234 de 2.000", city_cards),
        );

        for c in 0..n1 {
            let school_cards = (0..n2)
                .map(|s| {
                    card(&format!("School {c}.{s}"), "91,0 %", &format!("https://t/school/{c}/{s}"))
                })
                .collect();
            site.pages.insert(format!("https://t/city/{c}"), listing_page(school_cards));

            for s in 0..n2 {
                let table_cards = (0..n3)
                    .map(|t| {
                        card(
                            &format!("{c}{s}{t:04}"),
                            "100,0 %",
                            &format!("https://t/table/{c}/{s}/{t}"),
                        )
                    })
                    .collect();
                site.pages.insert(format!("https://t/school/{c}/{s}"), listing_page(table_cards));

                for t in 0..n3 {
                    let rows = (0..n4)
                        .map(|r| {
                            result_row(
                                &format!("Alianza\nParty {r}"),
                                &format!("{}", 100 + r),
                                "50,0 %",
                            )
                        })
                        .collect();
                    site.pages.insert(format!("https://t/table/{c}/{s}/{t}"), table_page(rows));
                }
            }
        }
        site
    }

    async fn scrape(site: FakeSite) -> Result<Municipality, ScrapeError> {
        let config = test_config();
        let factory = FakeFactory { site: Arc::new(site) };
        let executor = SessionExecutor::new(factory, RetryPolicy::new(2, Duration::from_millis(0)));
        Traverser::new(&executor, &config).scrape_municipality("https://t/muni").await
    }

    #[tokio::test]
    async fn test_leaf_count_and_order_over_synthetic_tree() {
        let tree = scrape(synthetic_site(2, 3, 2, 4)).await.unwrap();

        assert_eq!(tree.leaf_count(), 2 * 3 * 2 * 4);
        assert_eq!(tree.cities.len(), 2);

        // Enumeration order is preserved at every level.
        for (c, city) in tree.cities.iter().enumerate() {
            assert_eq!(city.name, format!("City {c}"));
            for (s, school) in city.schools.iter().enumerate() {
                assert_eq!(school.name, format!("School {c}.{s}"));
                for table in &school.tables {
                    for (r, result) in table.results.iter().enumerate() {
                        assert_eq!(result.party, format!("Party {r}"));
                        assert_eq!(result.votes, 100 + r as u64);
                    }
                }
            }
        }
    }

    #[tokio::test]
    async fn test_municipality_header_fields() {
        let tree = scrape(synthetic_site(1, 1, 1, 1)).await.unwrap();

        assert_eq!(tree.name, "Muni");
        assert_eq!(tree.voters, 1234);
        assert_eq!(tree.total_voters, 2000);
        assert_eq!(tree.scrutinized, 97.69);
        assert_eq!(tree.cities[0].scrutinized, 90.0);
    }

    #[tokio::test]
    async fn test_zero_children_yield_empty_sequences() {
        let tree = scrape(synthetic_site(1, 0, 0, 0)).await.unwrap();
        assert_eq!(tree.cities.len(), 1);
        assert!(tree.cities[0].schools.is_empty());

        let tree = scrape(synthetic_site(0, 0, 0, 0)).await.unwrap();
        assert!(tree.cities.is_empty());
    }

    #[tokio::test]
    async fn test_textless_rows_are_skipped() {
        let mut site = synthetic_site(1, 1, 1, 0);
        let rows = vec![
            FakeElement::default(), // separator row, no text
            result_row("Frente\nParty A", "1.200", "55,5 %"),
            FakeElement::with_text("   "),
            result_row("Party B", "80", "44,5 %"),
        ];
        site.pages.insert("https://t/table/0/0/0".to_string(), table_page(rows));

        let tree = scrape(site).await.unwrap();
        let results = &tree.cities[0].schools[0].tables[0].results;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].party, "Party A");
        assert_eq!(results[0].votes, 1200);
        assert_eq!(results[1].party, "Party B");
    }

    #[tokio::test]
    async fn test_malformed_percentage_aborts_traversal() {
        let mut site = synthetic_site(1, 1, 1, 0);
        site.pages.insert(
            "https://t/table/0/0/0".to_string(),
            table_page(vec![result_row("Party A", "100", "not a number")]),
        );

        let err = scrape(site).await.unwrap_err();
        assert!(matches!(err, ScrapeError::MalformedNumber { .. }));
    }

    #[test]
    fn test_split_voters() {
        assert_eq!(split_voters("1.234 de 2.000").unwrap(), (1234, 2000));
        assert_eq!(split_voters("0 de 0").unwrap(), (0, 0));
        assert!(split_voters("1.234").is_err());
        assert!(split_voters("").is_err());
    }
}
