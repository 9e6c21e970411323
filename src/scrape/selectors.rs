//! Selectors for the election-results site.
//!
//! Everything the traversal knows about the page structure lives here.
//! Selectors starting with `/` are XPath (the navigator dispatches on the
//! prefix), the rest are CSS. Scoped lookups are CSS only.
//!
//! **Update process**: when extraction fails on a structural mismatch,
//! capture the page, fix the selector here and extend the fixtures.

/// Territory listings (cities, schools and table cards all share the
/// same card markup).
pub mod listing {
    /// Listing container, present once the cards have rendered.
    pub const CONTAINER: &str = "ol[aria-label='Territorios']";

    /// One card per child territory; the anchor carries the child URL.
    pub const CARDS: &str = "ol[aria-label='Territorios'] li a";

    /// Display name inside a card.
    pub const CARD_NAME: &str = "span[id^='territoryCard']";

    /// Scrutinized percentage inside a card (third span of the badge).
    pub const CARD_SCRUTINIZED: &str =
        "div[id='territorios-card-agrupacion-text-esccrutado'] span:nth-of-type(3)";

    /// Incremental pagination affordance.
    pub const LOAD_MORE: &str = "//button[contains(text(), 'Cargar más')]";
}

/// Municipality-only header fields.
pub mod municipality {
    /// Municipality display name in the header breadcrumb.
    pub const NAME: &str =
        "/html/body/div/div/div[1]/div/header/div/div[2]/div/div/div/div[1]/div/div/div/div[2]/a/span";

    /// Button revealing the hidden scrutinized-detail panel.
    pub const DETAILS_BUTTON: &str = "button[aria-label='Ver detalles de escrutados']";

    /// Overall scrutinized percentage, read as raw markup.
    pub const SCRUTINIZED_VALUE: &str =
        "//*[@id='app']/div/div[1]/header/div/div[3]/div/div/div/div/div/div[1]/span[2]";

    /// Box holding the combined "X de Y" voter-count string.
    pub const VOTERS_BOX: &str =
        "//*[@id='app']/div/div[1]/header/div/div[3]/div/div/div/div/div/div[1]/span[2]/../following-sibling::*[2]//div[contains(@class, 'rt-Box')]";
}

/// Ballot-table result rows.
pub mod table {
    /// Present once the results table has rendered.
    pub const BODY: &str = "tbody";

    /// Result rows; separator rows have no text and are skipped.
    pub const ROWS: &str = "tr";

    /// Cells within a row: party, votes, percentage.
    pub const CELLS: &str = "td";
}
