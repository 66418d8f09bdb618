//! Test support: a scripted, in-memory [`Driver`] so pages and scenarios can
//! be exercised without a browser.

use crate::driver::{Driver, ElementHandle};
use crate::errors::{FlowError, Result};
use crate::locator::Locator;
use crate::pages;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
struct FakeElement {
    text: String,
    value: String,
}

/// Declarative state of one rendered page: which elements exist, their
/// texts, and how many presence probes each locator stays hidden for.
#[derive(Debug, Clone, Default)]
pub struct PageState {
    url: String,
    elements: HashMap<Locator, Vec<FakeElement>>,
    appear_after: HashMap<Locator, usize>,
}

impl PageState {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// A post-action state that keeps whatever URL the session already had.
    pub fn outcome() -> Self {
        Self::default()
    }

    /// One empty input element.
    pub fn with_input(self, locator: Locator) -> Self {
        self.with_texts(locator, vec![String::new()])
    }

    /// One element carrying the given text.
    pub fn with_element(self, locator: Locator, text: impl Into<String>) -> Self {
        self.with_texts(locator, vec![text.into()])
    }

    /// Several elements matching one locator, in order.
    pub fn with_texts(mut self, locator: Locator, texts: Vec<String>) -> Self {
        let elements = texts
            .into_iter()
            .map(|text| FakeElement {
                text,
                value: String::new(),
            })
            .collect();
        self.elements.insert(locator, elements);
        self
    }

    /// Keep `locator` invisible for the first `polls` presence probes after
    /// the page is entered.
    pub fn appearing_after(mut self, locator: Locator, polls: usize) -> Self {
        self.appear_after.insert(locator, polls);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Navigated(String),
    Cleared(Locator),
    Typed(Locator, String),
    Clicked(Locator),
}

#[derive(Debug, Default)]
struct FakeState {
    page: PageState,
    routes: HashMap<String, PageState>,
    click_scripts: HashMap<Locator, Vec<PageState>>,
    clicks_seen: HashMap<Locator, usize>,
    probes: HashMap<Locator, usize>,
    journal: Vec<Interaction>,
    screenshots: usize,
    quits: usize,
}

/// Scripted driver: navigation serves registered routes, clicks replay a
/// per-locator sequence of page transitions, and every interaction lands in
/// a journal the tests inspect. Clones share state, so a test can keep a
/// probe handle while the suite owns the driver.
#[derive(Debug, Clone, Default)]
pub struct FakeDriver {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the state the session starts on, without navigating.
    pub fn with_page(self, page: PageState) -> Self {
        self.state.lock().expect("fake driver state poisoned").page = page;
        self
    }

    /// Serve `page` whenever the session navigates to `url`.
    pub fn route(self, url: impl Into<String>, page: PageState) -> Self {
        self.state
            .lock()
            .expect("fake driver state poisoned")
            .routes
            .insert(url.into(), page);
        self
    }

    /// Append a page transition for clicks on `locator`: the first click
    /// yields the first queued state, and the final state repeats thereafter.
    pub fn on_click(self, locator: Locator, next: PageState) -> Self {
        self.state
            .lock()
            .expect("fake driver state poisoned")
            .click_scripts
            .entry(locator)
            .or_default()
            .push(next);
        self
    }

    pub fn journal(&self) -> Vec<Interaction> {
        self.state
            .lock()
            .expect("fake driver state poisoned")
            .journal
            .clone()
    }

    /// Current value of the first element matching `locator`.
    pub fn value_of(&self, locator: &Locator) -> Option<String> {
        let state = self.state.lock().expect("fake driver state poisoned");
        state
            .page
            .elements
            .get(locator)
            .and_then(|elements| elements.first())
            .map(|element| element.value.clone())
    }

    pub fn screenshot_count(&self) -> usize {
        self.state
            .lock()
            .expect("fake driver state poisoned")
            .screenshots
    }

    pub fn quit_count(&self) -> usize {
        self.state.lock().expect("fake driver state poisoned").quits
    }

    pub fn clicks_on(&self, locator: &Locator) -> usize {
        self.state
            .lock()
            .expect("fake driver state poisoned")
            .clicks_seen
            .get(locator)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Driver for FakeDriver {
    async fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().expect("fake driver state poisoned");
        state.journal.push(Interaction::Navigated(url.to_string()));
        let page = state
            .routes
            .get(url)
            .cloned()
            .unwrap_or_else(|| PageState::new(url));
        state.page = page;
        state.probes.clear();
        Ok(())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>> {
        let mut state = self.state.lock().expect("fake driver state poisoned");
        let seen = state.probes.entry(locator.clone()).or_insert(0);
        *seen += 1;
        let seen = *seen;
        if seen <= state.page.appear_after.get(locator).copied().unwrap_or(0) {
            return Ok(vec![]);
        }
        let count = state
            .page
            .elements
            .get(locator)
            .map(|elements| elements.len())
            .unwrap_or(0);
        Ok((0..count)
            .map(|index| ElementHandle::new(locator.clone(), index))
            .collect())
    }

    async fn clear(&self, element: &ElementHandle) -> Result<()> {
        let mut state = self.state.lock().expect("fake driver state poisoned");
        state
            .journal
            .push(Interaction::Cleared(element.locator.clone()));
        let slot = state
            .page
            .elements
            .get_mut(&element.locator)
            .and_then(|elements| elements.get_mut(element.index))
            .ok_or_else(|| FlowError::ElementNotFound(element.locator.to_string()))?;
        slot.value.clear();
        Ok(())
    }

    async fn type_into(&self, element: &ElementHandle, text: &str) -> Result<()> {
        let mut state = self.state.lock().expect("fake driver state poisoned");
        state
            .journal
            .push(Interaction::Typed(element.locator.clone(), text.to_string()));
        let slot = state
            .page
            .elements
            .get_mut(&element.locator)
            .and_then(|elements| elements.get_mut(element.index))
            .ok_or_else(|| FlowError::ElementNotFound(element.locator.to_string()))?;
        slot.value.push_str(text);
        Ok(())
    }

    async fn click(&self, element: &ElementHandle) -> Result<()> {
        let mut state = self.state.lock().expect("fake driver state poisoned");
        state
            .journal
            .push(Interaction::Clicked(element.locator.clone()));
        if !state.page.elements.contains_key(&element.locator) {
            return Err(FlowError::ElementNotFound(element.locator.to_string()));
        }

        let position = state
            .clicks_seen
            .entry(element.locator.clone())
            .or_insert(0);
        let position_now = *position;
        *position += 1;

        let next = state
            .click_scripts
            .get(&element.locator)
            .and_then(|script| script.get(position_now.min(script.len() - 1)))
            .cloned();
        if let Some(mut next) = next {
            if next.url.is_empty() {
                next.url = state.page.url.clone();
            }
            state.page = next;
            state.probes.clear();
        }
        Ok(())
    }

    async fn text_of(&self, element: &ElementHandle) -> Result<String> {
        let state = self.state.lock().expect("fake driver state poisoned");
        state
            .page
            .elements
            .get(&element.locator)
            .and_then(|elements| elements.get(element.index))
            .map(|found| found.text.clone())
            .ok_or_else(|| FlowError::ElementNotFound(element.locator.to_string()))
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self
            .state
            .lock()
            .expect("fake driver state poisoned")
            .page
            .url
            .clone())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let mut state = self.state.lock().expect("fake driver state poisoned");
        state.screenshots += 1;
        // Just the PNG signature; enough for artifact tests.
        Ok(vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A])
    }

    async fn quit(&mut self) -> Result<()> {
        let mut state = self.state.lock().expect("fake driver state poisoned");
        state.quits += 1;
        Ok(())
    }
}

/// Register page with every form field present and empty, ready for a
/// scripted submit transition.
pub fn register_page_state(url: impl Into<String>) -> PageState {
    let fields = pages::register_locators();
    let mut page = PageState::new(url);
    for name in [
        "username",
        "first_name",
        "last_name",
        "email",
        "password",
        "confirm_password",
        "submit",
    ] {
        let locator = fields.get(name).expect("register field set").clone();
        page = page.with_input(locator);
    }
    page
}

/// Login page with both fields and the submit button present and empty.
pub fn login_page_state(url: impl Into<String>) -> PageState {
    let fields = pages::login_locators();
    let mut page = PageState::new(url);
    for name in ["identifier", "password", "submit"] {
        let locator = fields.get(name).expect("login field set").clone();
        page = page.with_input(locator);
    }
    page
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_script_replays_in_order_then_repeats() {
        tokio_test::block_on(async {
            let button = Locator::id("um-submit-btn");
            let first = Locator::css(".first");
            let second = Locator::css(".second");
            let driver = FakeDriver::new()
                .with_page(PageState::new("https://example.com/form").with_input(button.clone()))
                .on_click(
                    button.clone(),
                    PageState::outcome()
                        .with_input(button.clone())
                        .with_element(first.clone(), "one"),
                )
                .on_click(
                    button.clone(),
                    PageState::outcome()
                        .with_input(button.clone())
                        .with_element(second.clone(), "two"),
                );

            let handle = ElementHandle::new(button.clone(), 0);
            driver.click(&handle).await.unwrap();
            assert_eq!(driver.find_all(&first).await.unwrap().len(), 1);

            driver.click(&handle).await.unwrap();
            assert_eq!(driver.find_all(&second).await.unwrap().len(), 1);
            assert!(driver.find_all(&first).await.unwrap().is_empty());

            // The final scripted state repeats for later clicks.
            driver.click(&handle).await.unwrap();
            assert_eq!(driver.find_all(&second).await.unwrap().len(), 1);
            assert_eq!(driver.clicks_on(&button), 3);
        });
    }

    #[test]
    fn outcome_state_keeps_the_current_url() {
        tokio_test::block_on(async {
            let button = Locator::id("go");
            let driver = FakeDriver::new()
                .route(
                    "https://example.com/form",
                    PageState::new("https://example.com/form").with_input(button.clone()),
                )
                .on_click(button.clone(), PageState::outcome());

            driver.goto("https://example.com/form").await.unwrap();
            driver
                .click(&ElementHandle::new(button.clone(), 0))
                .await
                .unwrap();
            assert_eq!(
                driver.current_url().await.unwrap(),
                "https://example.com/form"
            );
        });
    }

    #[test]
    fn unrouted_navigation_yields_an_empty_page() {
        tokio_test::block_on(async {
            let driver = FakeDriver::new();
            driver.goto("https://example.com/nowhere").await.unwrap();
            assert_eq!(
                driver.current_url().await.unwrap(),
                "https://example.com/nowhere"
            );
            assert!(driver
                .find_all(&Locator::css("anything"))
                .await
                .unwrap()
                .is_empty());
        });
    }

    #[test]
    fn typing_appends_and_clear_resets() {
        tokio_test::block_on(async {
            let field = Locator::id("user_login-1204");
            let driver = FakeDriver::new()
                .with_page(PageState::new("https://example.com/").with_input(field.clone()));
            let handle = ElementHandle::new(field.clone(), 0);

            driver.type_into(&handle, "abc").await.unwrap();
            driver.type_into(&handle, "def").await.unwrap();
            assert_eq!(driver.value_of(&field).unwrap(), "abcdef");

            driver.clear(&handle).await.unwrap();
            assert_eq!(driver.value_of(&field).unwrap(), "");
        });
    }
}
