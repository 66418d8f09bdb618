use crate::config::Config;
use crate::data::Credentials;
use crate::driver::{Driver, ElementHandle};
use crate::errors::{FlowError, Result};
use crate::locator::{FieldSet, Locator};
use crate::pages::OutcomeText;
use crate::wait::{self, WaitPolicy};
use std::time::Duration;

/// First/last name are not part of the generated identity; the form simply
/// requires them.
pub const FIRST_NAME: &str = "Test";
pub const LAST_NAME: &str = "User";

/// Locator map for the registration form, fixed by the target site's markup.
pub fn locators() -> FieldSet {
    FieldSet::new("register")
        .with("username", Locator::id("user_login-1204"))
        .with("first_name", Locator::id("first_name-1204"))
        .with("last_name", Locator::id("last_name-1204"))
        .with("email", Locator::id("user_email-1204"))
        .with("password", Locator::id("user_password-1204"))
        .with("confirm_password", Locator::id("confirm_user_password-1204"))
        .with("submit", Locator::id("um-submit-btn"))
        .with(
            "success",
            Locator::xpath("//div[contains(text(),'Thank you for registering.')]"),
        )
        .with(
            "error",
            Locator::xpath("//div[contains(@class,'um-field-error')]"),
        )
}

/// The registration page.
pub struct RegisterPage<'a, D: Driver> {
    driver: &'a D,
    fields: FieldSet,
    url: String,
    explicit_wait: WaitPolicy,
    implicit_wait: WaitPolicy,
}

impl<'a, D: Driver> RegisterPage<'a, D> {
    pub fn new(driver: &'a D, config: &Config) -> Result<Self> {
        let interval = Duration::from_millis(config.wait.poll_interval_ms);
        Ok(Self {
            driver,
            fields: locators(),
            url: config.site.register_url()?,
            explicit_wait: WaitPolicy::new(Duration::from_secs(config.wait.timeout_secs))
                .with_interval(interval),
            implicit_wait: WaitPolicy::new(Duration::from_secs(config.wait.implicit_secs))
                .with_interval(interval),
        })
    }

    pub async fn load(&self) -> Result<()> {
        self.driver.goto(&self.url).await
    }

    pub async fn fill_username(&self, value: &str) -> Result<()> {
        self.fill("username", value).await
    }

    pub async fn fill_first_name(&self, value: &str) -> Result<()> {
        self.fill("first_name", value).await
    }

    pub async fn fill_last_name(&self, value: &str) -> Result<()> {
        self.fill("last_name", value).await
    }

    pub async fn fill_email(&self, value: &str) -> Result<()> {
        self.fill("email", value).await
    }

    pub async fn fill_password(&self, value: &str) -> Result<()> {
        self.fill("password", value).await
    }

    pub async fn fill_confirm_password(&self, value: &str) -> Result<()> {
        self.fill("confirm_password", value).await
    }

    pub async fn submit(&self) -> Result<()> {
        let submit = self.interaction_element("submit").await?;
        self.driver.click(&submit).await
    }

    /// Full registration attempt: every field in form order, then one submit.
    pub async fn register(&self, credentials: &Credentials) -> Result<()> {
        self.fill_username(&credentials.username).await?;
        self.fill_first_name(FIRST_NAME).await?;
        self.fill_last_name(LAST_NAME).await?;
        self.fill_email(&credentials.email).await?;
        self.fill_password(&credentials.password).await?;
        self.fill_confirm_password(&credentials.confirm_password)
            .await?;
        self.submit().await
    }

    /// Text of the success banner, trimmed. Waits for the banner; times out
    /// if it never appears.
    pub async fn read_success(&self) -> Result<String> {
        let locator = self.fields.get("success")?;
        let banner = wait::first_present(self.driver, locator, &self.explicit_wait).await?;
        Ok(self.driver.text_of(&banner).await?.trim().to_string())
    }

    /// All validation errors currently shown, trimmed, in page order.
    pub async fn read_errors(&self) -> Result<OutcomeText> {
        let locator = self.fields.get("error")?;
        let elements = wait::elements_present(self.driver, locator, &self.explicit_wait).await?;
        let mut texts = Vec::with_capacity(elements.len());
        for element in &elements {
            texts.push(self.driver.text_of(element).await?.trim().to_string());
        }
        Ok(OutcomeText::new(texts))
    }

    pub async fn current_url(&self) -> Result<String> {
        self.driver.current_url().await
    }

    async fn fill(&self, field: &str, value: &str) -> Result<()> {
        let element = self.interaction_element(field).await?;
        self.driver.clear(&element).await?;
        self.driver.type_into(&element, value).await
    }

    async fn interaction_element(&self, field: &str) -> Result<ElementHandle> {
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
    use crate::data::CredentialFactory;
    use crate::testing::{register_page_state, FakeDriver, Interaction, PageState};

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

    fn register_url(config: &Config) -> String {
        config.site.register_url().unwrap()
    }

    #[tokio::test]
    async fn register_fills_every_field_in_form_order() {
        let config = fast_config();
        let driver = FakeDriver::new().with_page(register_page_state(register_url(&config)));
        let page = RegisterPage::new(&driver, &config).unwrap();
        let creds = CredentialFactory::from_seed(100).credentials("Password123!");

        page.register(&creds).await.unwrap();

        assert_eq!(
            driver.value_of(&Locator::id("user_login-1204")).unwrap(),
            "testuser100"
        );
        assert_eq!(
            driver.value_of(&Locator::id("first_name-1204")).unwrap(),
            "Test"
        );
        assert_eq!(
            driver.value_of(&Locator::id("last_name-1204")).unwrap(),
            "User"
        );
        assert_eq!(
            driver.value_of(&Locator::id("user_email-1204")).unwrap(),
            "testuser100@example.com"
        );
        assert_eq!(
            driver.value_of(&Locator::id("user_password-1204")).unwrap(),
            "Password123!"
        );
        assert_eq!(
            driver
                .value_of(&Locator::id("confirm_user_password-1204"))
                .unwrap(),
            "Password123!"
        );
        assert_eq!(driver.clicks_on(&Locator::id("um-submit-btn")), 1);

        // Username is typed before the password fields.
        let journal = driver.journal();
        let username_at = journal
            .iter()
            .position(|i| matches!(i, Interaction::Typed(l, _) if *l == Locator::id("user_login-1204")))
            .unwrap();
        let password_at = journal
            .iter()
            .position(|i| matches!(i, Interaction::Typed(l, _) if *l == Locator::id("user_password-1204")))
            .unwrap();
        assert!(username_at < password_at);
    }

    #[tokio::test]
    async fn read_success_waits_for_the_banner_and_trims() {
        let config = fast_config();
        let submit = Locator::id("um-submit-btn");
        let banner = Locator::xpath("//div[contains(text(),'Thank you for registering.')]");
        let driver = FakeDriver::new()
            .with_page(register_page_state(register_url(&config)))
            .on_click(
                submit.clone(),
                PageState::outcome()
                    .with_element(
                        banner.clone(),
                        "  Thank you for registering. You are already registered.  ",
                    )
                    .appearing_after(banner.clone(), 2),
            );
        let page = RegisterPage::new(&driver, &config).unwrap();
        let creds = CredentialFactory::from_seed(0).credentials("Password123!");

        page.register(&creds).await.unwrap();
        let text = page.read_success().await.unwrap();
        assert_eq!(
            text,
            "Thank you for registering. You are already registered."
        );
    }

    #[tokio::test]
    async fn read_success_times_out_without_a_banner() {
        let config = fast_config();
        let driver = FakeDriver::new().with_page(register_page_state(register_url(&config)));
        let page = RegisterPage::new(&driver, &config).unwrap();

        assert!(matches!(
            page.read_success().await.unwrap_err(),
            FlowError::TimedOut(_)
        ));
    }

    #[tokio::test]
    async fn refilling_clears_the_previous_value() {
        let config = fast_config();
        let driver = FakeDriver::new().with_page(register_page_state(register_url(&config)));
        let page = RegisterPage::new(&driver, &config).unwrap();

        page.fill_email("first@example.com").await.unwrap();
        page.fill_email("second@example.com").await.unwrap();
        assert_eq!(
            driver.value_of(&Locator::id("user_email-1204")).unwrap(),
            "second@example.com"
        );
    }

    #[tokio::test]
    async fn missing_form_surfaces_element_not_found() {
        let config = fast_config();
        let driver = FakeDriver::new().with_page(PageState::new(register_url(&config)));
        let page = RegisterPage::new(&driver, &config).unwrap();

        let err = page.fill_username("testuser").await.unwrap_err();
        match err {
            FlowError::ElementNotFound(what) => assert!(what.contains("register.username")),
            other => panic!("expected ElementNotFound, got {:?}", other),
        }
    }
}
