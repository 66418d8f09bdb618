pub mod chrome;

pub use chrome::ChromeDriver;

use crate::errors::Result;
use crate::locator::Locator;
use async_trait::async_trait;

/// Handle to one matched element: the locator it was found by and its index
/// among the matches. Implementations re-resolve the handle per interaction,
/// so a handle never goes stale across page updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub locator: Locator,
    pub index: usize,
}

impl ElementHandle {
    pub fn new(locator: Locator, index: usize) -> Self {
        Self { locator, index }
    }
}

/// The browser capability the harness consumes.
///
/// Everything above this trait (waits, pages, scenarios) is driver-agnostic;
/// [`ChromeDriver`] is the production implementation and the test suite
/// substitutes a scripted fake.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Navigate the session to a URL and wait for the load to settle.
    async fn goto(&self, url: &str) -> Result<()>;

    /// All elements currently matching the locator. An empty page state is
    /// `Ok(vec![])`, not an error; waiting for presence is the caller's job.
    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>>;

    /// Clear an input element's current value.
    async fn clear(&self, element: &ElementHandle) -> Result<()>;

    /// Type text into an element.
    async fn type_into(&self, element: &ElementHandle, text: &str) -> Result<()>;

    /// Single click, no retry.
    async fn click(&self, element: &ElementHandle) -> Result<()>;

    /// Rendered text content of an element.
    async fn text_of(&self, element: &ElementHandle) -> Result<String>;

    async fn current_url(&self) -> Result<String>;

    /// PNG screenshot of the current viewport.
    async fn screenshot(&self) -> Result<Vec<u8>>;

    /// Terminate the browser session. Idempotent.
    async fn quit(&mut self) -> Result<()>;
}
