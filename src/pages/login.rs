use crate::config::Config;
use crate::driver::Driver;
use crate::errors::{FlowError, Result};
use crate::locator::{FieldSet, Locator};
use crate::pages::OutcomeText;
use crate::wait::{self, WaitPolicy};
use std::time::Duration;

/// Locator map for the login form, fixed by the target site's markup.
pub fn locators() -> FieldSet {
    FieldSet::new("login")
        .with("identifier", Locator::id("username-1205"))
        .with("password", Locator::id("user_password-1205"))
        .with("submit", Locator::id("um-submit-btn"))
        .with(
            "error",
            Locator::xpath("//div[contains(@class,'um-field-error')]"),
        )
}

/// The login page. Borrows the run's driver session; translates semantic
/// actions into element interactions with no waits beyond [`crate::wait`].
pub struct LoginPage<'a, D: Driver> {
    driver: &'a D,
    fields: FieldSet,
    url: String,
    dashboard_prefix: String,
    explicit_wait: WaitPolicy,
    implicit_wait: WaitPolicy,
}

impl<'a, D: Driver> LoginPage<'a, D> {
    pub fn new(driver: &'a D, config: &Config) -> Result<Self> {
        let interval = Duration::from_millis(config.wait.poll_interval_ms);
        Ok(Self {
            driver,
            fields: locators(),
            url: config.site.login_url()?,
            dashboard_prefix: config.site.dashboard_prefix.clone(),
            explicit_wait: WaitPolicy::new(Duration::from_secs(config.wait.timeout_secs))
                .with_interval(interval),
            implicit_wait: WaitPolicy::new(Duration::from_secs(config.wait.implicit_secs))
                .with_interval(interval),
        })
    }

    pub async fn load(&self) -> Result<()> {
        self.driver.goto(&self.url).await
    }

    pub async fn fill_identifier(&self, value: &str) -> Result<()> {
        self.fill("identifier", value).await
    }

    pub async fn fill_password(&self, value: &str) -> Result<()> {
        self.fill("password", value).await
    }

    pub async fn submit(&self) -> Result<()> {
        let submit = self.interaction_element("submit").await?;
        self.driver.click(&submit).await
    }

    pub async fn login(&self, identifier: &str, password: &str) -> Result<()> {
        self.fill_identifier(identifier).await?;
        self.fill_password(password).await?;
        self.submit().await
    }

    /// All validation errors currently shown, trimmed, in page order. Waits
    /// for at least one to appear; times out if none ever does.
    pub async fn read_errors(&self) -> Result<OutcomeText> {
        let locator = self.fields.get("error")?;
        let elements = wait::elements_present(self.driver, locator, &self.explicit_wait).await?;
        let mut texts = Vec::with_capacity(elements.len());
        for element in &elements {
            texts.push(self.driver.text_of(element).await?.trim().to_string());
        }
        Ok(OutcomeText::new(texts))
    }

    /// Whether the session reaches the authenticated area within the wait
    /// bound. False on timeout, never an error.
    pub async fn await_redirect(&self, timeout: Option<Duration>) -> bool {
        let policy = match timeout {
            Some(timeout) => WaitPolicy::new(timeout).with_interval(self.explicit_wait.interval),
            None => self.explicit_wait,
        };
        wait::url_has_prefix(self.driver, &self.dashboard_prefix, &policy).await
    }

    pub async fn current_url(&self) -> Result<String> {
        self.driver.current_url().await
    }

    /// Clear-before-type: filling twice leaves only the second value.
    async fn fill(&self, field: &str, value: &str) -> Result<()> {
        let element = self.interaction_element(field).await?;
        self.driver.clear(&element).await?;
        self.driver.type_into(&element, value).await
    }

    async fn interaction_element(&self, field: &str) -> Result<crate::driver::ElementHandle> {
        let locator = self.fields.get(field)?;
        wait::first_present(self.driver, locator, &self.implicit_wait)
            .await
            .map_err(|_| {
                FlowError::ElementNotFound(format!(
                    "{}.{} ({})",
                    self.fields.page(),
                    field,
                    locator
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WaitConfig;
    use crate::testing::{login_page_state, FakeDriver, Interaction, PageState};

    fn fast_config() -> Config {
        Config {
            wait: WaitConfig {
                timeout_secs: 1,
                implicit_secs: 1,
                poll_interval_ms: 5,
            },
            ..Config::default()
        }
    }

    fn login_url(config: &Config) -> String {
        config.site.login_url().unwrap()
    }

    #[tokio::test]
    async fn load_navigates_to_the_login_route() {
        let config = fast_config();
        let driver = FakeDriver::new().route(login_url(&config), login_page_state(login_url(&config)));
        let page = LoginPage::new(&driver, &config).unwrap();

        page.load().await.unwrap();
        assert_eq!(
            driver.journal()[0],
            Interaction::Navigated("https://projectnest.io/login-2/".to_string())
        );
    }

    #[tokio::test]
    async fn login_fills_both_fields_then_submits_once() {
        let config = fast_config();
        let driver = FakeDriver::new().with_page(login_page_state(login_url(&config)));
        let page = LoginPage::new(&driver, &config).unwrap();

        page.login("someone@example.com", "hunter2!").await.unwrap();

        let identifier = Locator::id("username-1205");
        let password = Locator::id("user_password-1205");
        let submit = Locator::id("um-submit-btn");
        assert_eq!(driver.value_of(&identifier).unwrap(), "someone@example.com");
        assert_eq!(driver.value_of(&password).unwrap(), "hunter2!");
        assert_eq!(driver.clicks_on(&submit), 1);

        // Each fill clears before typing.
        let journal = driver.journal();
        let cleared_before_typed = journal
            .iter()
            .position(|i| matches!(i, Interaction::Cleared(l) if *l == identifier))
            .unwrap()
            < journal
                .iter()
                .position(|i| matches!(i, Interaction::Typed(l, _) if *l == identifier))
                .unwrap();
        assert!(cleared_before_typed);
    }

    #[tokio::test]
    async fn refilling_a_field_keeps_only_the_second_value() {
        let config = fast_config();
        let driver = FakeDriver::new().with_page(login_page_state(login_url(&config)));
        let page = LoginPage::new(&driver, &config).unwrap();

        page.fill_identifier("first-value").await.unwrap();
        page.fill_identifier("second-value").await.unwrap();
        assert_eq!(
            driver.value_of(&Locator::id("username-1205")).unwrap(),
            "second-value"
        );
    }

    #[tokio::test]
    async fn read_errors_returns_trimmed_texts_in_order() {
        let config = fast_config();
        let error = Locator::xpath("//div[contains(@class,'um-field-error')]");
        let submit = Locator::id("um-submit-btn");
        let driver = FakeDriver::new()
            .with_page(login_page_state(login_url(&config)))
            .on_click(
                submit.clone(),
                PageState::outcome().with_texts(
                    error.clone(),
                    vec![
                        "  Please enter your username or email  ".to_string(),
                        "\nPlease enter your password\n".to_string(),
                    ],
                ),
            );
        let page = LoginPage::new(&driver, &config).unwrap();

        page.login("", "").await.unwrap();
        let errors = page.read_errors().await.unwrap();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains_fragment("please enter your username or email"));
        assert!(errors.contains_fragment("please enter your password"));
        assert_eq!(
            errors.iter().next().unwrap(),
            "Please enter your username or email"
        );
    }

    #[tokio::test]
    async fn read_errors_times_out_when_none_appear() {
        let config = fast_config();
        let driver = FakeDriver::new().with_page(login_page_state(login_url(&config)));
        let page = LoginPage::new(&driver, &config).unwrap();

        let err = page.read_errors().await.unwrap_err();
        assert!(matches!(err, FlowError::TimedOut(_)));
    }

    #[tokio::test]
    async fn missing_field_surfaces_element_not_found() {
        let config = fast_config();
        let driver = FakeDriver::new().with_page(PageState::new(login_url(&config)));
        let page = LoginPage::new(&driver, &config).unwrap();

        let err = page.fill_identifier("anything").await.unwrap_err();
        match err {
            FlowError::ElementNotFound(what) => assert!(what.contains("login.identifier")),
            other => panic!("expected ElementNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn await_redirect_reports_the_authenticated_area() {
        let config = fast_config();
        let submit = Locator::id("um-submit-btn");
        let driver = FakeDriver::new()
            .with_page(login_page_state(login_url(&config)))
            .on_click(
                submit.clone(),
                PageState::new("https://projectnest.io/user/testuser1/"),
            );
        let page = LoginPage::new(&driver, &config).unwrap();

        page.login("user", "pass").await.unwrap();
        assert!(page.await_redirect(None).await);
        assert!(page
            .current_url()
            .await
            .unwrap()
            .starts_with("https://projectnest.io/user/"));
    }

    #[tokio::test]
    async fn await_redirect_is_false_without_a_redirect() {
        let config = fast_config();
        let driver = FakeDriver::new().with_page(login_page_state(login_url(&config)));
        let page = LoginPage::new(&driver, &config).unwrap();

        assert!(!page.await_redirect(Some(Duration::from_millis(30))).await);
    }
}
