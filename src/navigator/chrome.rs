//! CDP-backed navigator driving a local Chromium instance.

use crate::error::ScrapeError;
use crate::navigator::{ElementHandle, NavigatorFactory, PageNavigator};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How often `wait_for` re-checks the page for its selector.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One live Chromium session: browser process, CDP event pump, one page.
pub struct ChromeNavigator {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler_task: JoinHandle<()>,
    elements: Mutex<HashMap<u64, Element>>,
    next_id: AtomicU64,
}

impl ChromeNavigator {
    /// Launches a fresh Chromium instance with a single blank page.
    pub async fn launch(headless: bool) -> Result<Self, ScrapeError> {
        let mut builder = BrowserConfig::builder()
            .args(vec!["--no-sandbox", "--disable-dev-shm-usage", "--start-maximized"]);
        if !headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(ScrapeError::Session)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::Session(format!("browser launch failed: {e}")))?;

        // The handler must be pumped for the CDP connection to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    warn!("cdp handler error: {err}");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::Session(format!("failed to open page: {e}")))?;

        debug!("chromium session started (headless: {headless})");

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler_task,
            elements: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        })
    }

    async fn register(&self, element: Element) -> ElementHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.elements.lock().await.insert(id, element);
        ElementHandle::new(id)
    }

    /// Page-scope lookup, dispatching `/`-prefixed selectors to XPath.
    async fn locate_all(&self, selector: &str) -> Result<Vec<Element>, ScrapeError> {
        let found = if selector.starts_with('/') {
            self.page.find_xpaths(selector).await
        } else {
            self.page.find_elements(selector).await
        };
        found.map_err(|_| ScrapeError::not_found(selector))
    }
}

#[async_trait]
impl PageNavigator for ChromeNavigator {
    async fn open(&self, url: &str) -> Result<(), ScrapeError> {
        debug!("GET {url}");
        // Handles from the previous document would be stale anyway.
        self.elements.lock().await.clear();
        self.page
            .goto(url)
            .await
            .map_err(|e| ScrapeError::Session(format!("navigation to {url} failed: {e}")))?;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), ScrapeError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if !self.locate_all(selector).await.unwrap_or_default().is_empty() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ScrapeError::timeout(selector));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn find(
        &self,
        selector: &str,
        within: Option<&ElementHandle>,
    ) -> Result<ElementHandle, ScrapeError> {
        let element = match within {
            Some(scope) => {
                let elements = self.elements.lock().await;
                let parent = elements.get(&scope.id()).ok_or_else(|| ScrapeError::not_found(selector))?;
                parent.find_element(selector).await.map_err(|_| ScrapeError::not_found(selector))?
            }
            None => {
                let mut found = self.locate_all(selector).await?;
                if found.is_empty() {
                    return Err(ScrapeError::not_found(selector));
                }
                found.remove(0)
            }
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
                let elements = self.elements.lock().await;
                let parent = elements.get(&scope.id()).ok_or_else(|| ScrapeError::not_found(selector))?;
                parent.find_elements(selector).await.unwrap_or_default()
            }
            None => self.locate_all(selector).await.unwrap_or_default(),
        };

        let mut handles = Vec::with_capacity(found.len());
        for element in found {
            handles.push(self.register(element).await);
        }
        Ok(handles)
    }

    async fn text(&self, handle: &ElementHandle) -> Result<String, ScrapeError> {
        let elements = self.elements.lock().await;
        let element = elements.get(&handle.id()).ok_or_else(|| ScrapeError::not_found("<handle>"))?;
        let text = element
            .inner_text()
            .await
            .map_err(|e| ScrapeError::Session(format!("text read failed: {e}")))?;
        Ok(text.unwrap_or_default())
    }

    async fn attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, ScrapeError> {
        let elements = self.elements.lock().await;
        let element = elements.get(&handle.id()).ok_or_else(|| ScrapeError::not_found("<handle>"))?;
        let value = if name == "innerHTML" {
            element.inner_html().await
        } else {
            element.attribute(name).await
        };
        value.map_err(|e| ScrapeError::Session(format!("attribute read failed: {e}")))
    }

    async fn trigger(&self, handle: &ElementHandle) -> Result<(), ScrapeError> {
        let elements = self.elements.lock().await;
        let element = elements.get(&handle.id()).ok_or_else(|| ScrapeError::not_found("<handle>"))?;
        element
            .click()
            .await
            .map_err(|e| ScrapeError::Session(format!("click failed: {e}")))?;
        Ok(())
    }

    async fn close(&self) {
        let mut guard = self.browser.lock().await;
        if let Some(mut browser) = guard.take() {
            if let Err(err) = browser.close().await {
                warn!("error closing browser: {err}");
            }
            if let Err(err) = browser.wait().await {
                warn!("error awaiting browser shutdown: {err}");
            }
            self.handler_task.abort();
            debug!("chromium session closed");
        }
    }
}

/// Launches one fresh [`ChromeNavigator`] per acquisition.
pub struct ChromeNavigatorFactory {
    headless: bool,
}

impl ChromeNavigatorFactory {
    pub fn new(headless: bool) -> Self {
        Self { headless }
    }
}

#[async_trait]
impl NavigatorFactory for ChromeNavigatorFactory {
    type Navigator = ChromeNavigator;

    async fn acquire(&self) -> Result<Arc<ChromeNavigator>, ScrapeError> {
        ChromeNavigator::launch(self.headless).await.map(Arc::new)
    }
}
