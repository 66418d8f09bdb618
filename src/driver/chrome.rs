use crate::config::BrowserConfig;
use crate::driver::{Driver, ElementHandle};
use crate::errors::{FlowError, Result};
use crate::locator::{By, Locator};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::ffi::OsStr;
use std::sync::Arc;

/// Chrome-backed [`Driver`].
///
/// CSS-addressable elements are driven through the devtools element API so
/// clicks and keystrokes are real input events; XPath locators and field
/// clearing go through JavaScript evaluation.
pub struct ChromeDriver {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
}

impl ChromeDriver {
    /// Launch one browser session with a fixed window size and rendering
    /// options. This is the only place that touches process bootstrapping.
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let window_size_arg = format!(
            "--window-size={},{}",
            config.window.width, config.window.height
        );

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-gpu"),
            OsStr::new(&window_size_arg),
        ];
        for arg in &config.args {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .args(args)
            .build()
            .map_err(|e| FlowError::LaunchFailed(e.to_string()))?;

        let browser =
            Browser::new(launch_options).map_err(|e| FlowError::LaunchFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| FlowError::LaunchFailed(e.to_string()))?;

        Ok(Self {
            browser: Some(browser),
            tab: Some(tab),
        })
    }

    fn tab(&self) -> Result<&Arc<Tab>> {
        self.tab.as_ref().ok_or(FlowError::SessionClosed)
    }

    fn evaluate(&self, script: &str) -> Result<Value> {
        let result = self
            .tab()?
            .evaluate(script, false)
            .map_err(|e| FlowError::JavaScriptFailed(e.to_string()))?;
        Ok(result.value.unwrap_or(Value::Null))
    }

    /// JS expression resolving to the `index`-th match of `locator`, or null.
    fn js_locate(locator: &Locator, index: usize) -> Result<String> {
        Ok(match locator.by {
            By::Id | By::Css => {
                let selector = serde_json::to_string(
                    &locator
                        .as_css()
                        .unwrap_or_else(|| locator.selector.clone()),
                )?;
                format!("(document.querySelectorAll({})[{}] || null)", selector, index)
            }
            By::XPath => {
                let xpath = serde_json::to_string(&locator.selector)?;
                format!(
                    "document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotItem({})",
                    xpath, index
                )
            }
        })
    }

    fn js_count(locator: &Locator) -> Result<String> {
        Ok(match locator.by {
            By::Id | By::Css => {
                let selector = serde_json::to_string(
                    &locator
                        .as_css()
                        .unwrap_or_else(|| locator.selector.clone()),
                )?;
                format!("document.querySelectorAll({}).length", selector)
            }
            By::XPath => {
                let xpath = serde_json::to_string(&locator.selector)?;
                format!(
                    "document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength",
                    xpath
                )
            }
        })
    }

    /// Run an action body against the resolved element; the body must leave a
    /// boolean on the stack indicating whether the element existed.
    fn run_element_js(&self, element: &ElementHandle, body: &str) -> Result<()> {
        let script = format!(
            r#"
            (function() {{
                const el = {};
                if (!el) return false;
                {}
                return true;
            }})()
            "#,
            Self::js_locate(&element.locator, element.index)?,
            body
        );

        let result = self.evaluate(&script)?;
        if result.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(FlowError::ElementNotFound(format!(
                "{} (match {})",
                element.locator, element.index
            )))
        }
    }
}

#[async_trait]
impl Driver for ChromeDriver {
    async fn goto(&self, url: &str) -> Result<()> {
        let tab = self.tab()?;
        tab.navigate_to(url)
            .map_err(|e| FlowError::NavigationFailed(e.to_string()))?;
        tab.wait_until_navigated()
            .map_err(|e| FlowError::NavigationFailed(e.to_string()))?;
        Ok(())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>> {
        let count = self
            .evaluate(&Self::js_count(locator)?)?
            .as_u64()
            .unwrap_or(0) as usize;

        Ok((0..count)
            .map(|index| ElementHandle::new(locator.clone(), index))
            .collect())
    }

    async fn clear(&self, element: &ElementHandle) -> Result<()> {
        self.run_element_js(
            element,
            r#"
                el.value = '';
                el.dispatchEvent(new Event('input', { bubbles: true }));
                el.dispatchEvent(new Event('change', { bubbles: true }));
            "#,
        )
    }

    async fn type_into(&self, element: &ElementHandle, text: &str) -> Result<()> {
        // Real keystrokes for the first CSS match; JS value assignment for
        // the rest (XPath targets, later matches).
        if element.index == 0 {
            if let Some(selector) = element.locator.as_css() {
                let tab = self.tab()?;
                let found = tab
                    .find_element(&selector)
                    .map_err(|e| FlowError::ElementNotFound(format!("{}: {}", element.locator, e)))?;
                found
                    .click()
                    .map_err(|e| FlowError::JavaScriptFailed(e.to_string()))?;
                found
                    .type_into(text)
                    .map_err(|e| FlowError::JavaScriptFailed(e.to_string()))?;
                return Ok(());
            }
        }

        let assignment = format!(
            r#"
                el.focus();
                el.value = el.value + {};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            "#,
            serde_json::to_string(text)?
        );
        self.run_element_js(element, &assignment)
    }

    async fn click(&self, element: &ElementHandle) -> Result<()> {
        if element.index == 0 {
            if let Some(selector) = element.locator.as_css() {
                let tab = self.tab()?;
                return tab
                    .find_element(&selector)
                    .map_err(|e| FlowError::ElementNotFound(format!("{}: {}", element.locator, e)))?
                    .click()
                    .map(|_| ())
                    .map_err(|e| FlowError::JavaScriptFailed(e.to_string()));
            }
        }
        self.run_element_js(element, "el.click();")
    }

    async fn text_of(&self, element: &ElementHandle) -> Result<String> {
        let script = format!(
            r#"
            (function() {{
                const el = {};
                if (!el) return null;
                return el.innerText !== undefined ? el.innerText : (el.textContent || '');
            }})()
            "#,
            Self::js_locate(&element.locator, element.index)?
        );

        match self.evaluate(&script)? {
            Value::String(text) => Ok(text),
            _ => Err(FlowError::ElementNotFound(format!(
                "{} (match {})",
                element.locator, element.index
            ))),
        }
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.tab()?.get_url())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.tab()?
            .capture_screenshot(
                headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption::Png,
                None,
                None,
                true,
            )
            .map_err(|e| FlowError::ScreenshotFailed(e.to_string()))
    }

    async fn quit(&mut self) -> Result<()> {
        // Dropping the Browser tears the process down; clearing both fields
        // makes any later call surface SessionClosed.
        self.tab = None;
        self.browser = None;
        Ok(())
    }
}
