//! Page navigation capability the traversal is written against.
//!
//! The core never talks to a browser directly; it sees only this trait.
//! Production uses the CDP-backed [`chrome::ChromeNavigator`], tests use
//! in-crate fakes.

pub mod chrome;

use crate::error::ScrapeError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use chrome::{ChromeNavigator, ChromeNavigatorFactory};

/// Opaque reference to a located element.
///
/// Handles are only meaningful to the navigator that issued them; the
/// newtype keeps them from being confused with any other id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(u64);

impl ElementHandle {
    /// Wraps a navigator-issued id. Only the issuing navigator can
    /// resolve the handle back to an element.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Abstract capability to drive one live page session.
///
/// Selectors starting with `//` are evaluated as XPath, everything else
/// as CSS. Scoped lookups (`within` set) accept CSS only.
#[async_trait]
pub trait PageNavigator: Send + Sync {
    /// Loads the given URL in the session's page.
    async fn open(&self, url: &str) -> Result<(), ScrapeError>;

    /// Blocks until the selector matches at least one element, failing
    /// with [`ScrapeError::NavigationTimeout`] once `timeout` elapses.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), ScrapeError>;

    /// Locates the first element matching `selector`, optionally scoped
    /// to a previously located element.
    async fn find(
        &self,
        selector: &str,
        within: Option<&ElementHandle>,
    ) -> Result<ElementHandle, ScrapeError>;

    /// Locates every element matching `selector` in document order.
    async fn find_all(
        &self,
        selector: &str,
        within: Option<&ElementHandle>,
    ) -> Result<Vec<ElementHandle>, ScrapeError>;

    /// Returns the rendered text of an element ("" when it has none).
    async fn text(&self, handle: &ElementHandle) -> Result<String, ScrapeError>;

    /// Returns an attribute value, or `None` when absent. The pseudo
    /// attribute `"innerHTML"` reads the element's raw markup.
    async fn attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, ScrapeError>;

    /// Simulates a client-side activation of the element (click).
    async fn trigger(&self, handle: &ElementHandle) -> Result<(), ScrapeError>;

    /// Releases the session. Idempotent; never surfaces an error.
    async fn close(&self);
}

/// Produces a fresh navigator session per acquisition.
///
/// The retry executor acquires one session per attempt and guarantees it
/// is closed before the next acquisition.
#[async_trait]
pub trait NavigatorFactory: Send + Sync {
    type Navigator: PageNavigator + 'static;

    async fn acquire(&self) -> Result<Arc<Self::Navigator>, ScrapeError>;
}
