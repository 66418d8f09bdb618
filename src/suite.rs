use crate::artifacts;
use crate::config::Config;
use crate::data::{CredentialFactory, Credentials};
use crate::driver::{ChromeDriver, Driver};
use crate::errors::{FlowError, Result};
use crate::pages::{LoginPage, RegisterPage};
use crate::scenario::{Failure, PasswordCase, RunReport, Scenario, ScenarioResult, PASSWORD_CASES};
use chrono::Utc;
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

/// Password that satisfies every site policy; used wherever a scenario needs
/// a valid one.
pub const VALID_PASSWORD: &str = "Password123!";

/// Fragment the site's post-registration banner must contain.
const REGISTRATION_CONFIRMED: &str = "You are already registered.";

/// The run context and orchestrator: owns the single browser session, the
/// credential factory, and the credentials carried between scenarios.
///
/// Scenarios run strictly sequentially; the suite is the only writer of the
/// carried state and the sole layer that converts unmet expectations into
/// recorded failures plus diagnostic artifacts.
pub struct Suite<D: Driver> {
    driver: D,
    config: Config,
    factory: CredentialFactory,
    registered: Option<Credentials>,
    run_id: Uuid,
}

impl Suite<ChromeDriver> {
    /// Create the one browser session for this run.
    pub async fn launch(config: Config) -> Result<Self> {
        let driver = ChromeDriver::launch(&config.browser)?;
        Ok(Self::with_driver(driver, config))
    }
}

impl<D: Driver> Suite<D> {
    /// Run against any driver implementation; tests inject a scripted fake.
    pub fn with_driver(driver: D, config: Config) -> Self {
        Self {
            driver,
            config,
            factory: CredentialFactory::new(),
            registered: None,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Credentials of the most recent successful registration in this run.
    pub fn registered_credentials(&self) -> Option<&Credentials> {
        self.registered.as_ref()
    }

    /// Execute all scenarios, then terminate the session. The session is
    /// quit exactly once, no matter how many scenarios failed.
    pub async fn run(mut self) -> RunReport {
        let started_at = Utc::now();
        info!(run_id = %self.run_id, scenarios = Scenario::ALL.len(), "starting account-flow run");

        let mut results = Vec::with_capacity(Scenario::ALL.len());
        for scenario in Scenario::ALL {
            results.push(self.run_scenario(scenario).await);
        }

        if let Err(error) = self.driver.quit().await {
            warn!(error = %error, "browser session did not shut down cleanly");
        }

        RunReport {
            run_id: self.run_id,
            started_at,
            finished_at: Utc::now(),
            results,
        }
    }

    /// Execute one scenario and convert every unmet expectation (assertion
    /// failures, timeouts, missing elements alike) into a recorded failure
    /// with a screenshot. Failures never propagate past this wrapper.
    pub async fn run_scenario(&mut self, scenario: Scenario) -> ScenarioResult {
        info!(%scenario, "running scenario");
        let mut failures = self.execute(scenario).await;

        for failure in &mut failures {
            if failure.artifact.is_none() {
                failure.artifact = self.capture(&failure.descriptor).await;
            }
            warn!(
                %scenario,
                descriptor = %failure.descriptor,
                artifact = ?failure.artifact,
                "{}",
                failure.message
            );
        }

        if failures.is_empty() {
            info!(%scenario, "scenario passed");
            ScenarioResult::passed(scenario)
        } else {
            ScenarioResult::failed(scenario, failures)
        }
    }

    async fn execute(&mut self, scenario: Scenario) -> Vec<Failure> {
        let outcome = match scenario {
            Scenario::PasswordValidations => return self.password_validations().await,
            Scenario::SuccessfulRegistration => self.successful_registration().await,
            Scenario::RegistrationWithExistingUsername => {
                self.registration_with_existing_username().await
            }
            Scenario::RegistrationWithEmptyPassword => {
                self.registration_with_empty_password().await
            }
            Scenario::LoginWithEmptyFields => self.login_with_empty_fields().await,
            Scenario::LoginWithIncorrectPassword => self.login_with_incorrect_password().await,
            Scenario::SuccessfulLogin => self.successful_login().await,
        };

        match outcome {
            Ok(()) => vec![],
            Err(error) => vec![Failure::new(scenario.descriptor(), error.to_string())],
        }
    }

    async fn successful_registration(&mut self) -> Result<()> {
        let page = RegisterPage::new(&self.driver, &self.config)?;
        page.load().await?;

        let credentials = self.factory.credentials(VALID_PASSWORD);
        page.register(&credentials).await?;

        let banner = page.read_success().await?;
        ensure(
            banner.contains(REGISTRATION_CONFIRMED),
            format!(
                "success banner should contain '{}', got '{}'",
                REGISTRATION_CONFIRMED, banner
            ),
        )?;

        self.registered = Some(credentials);
        Ok(())
    }

    /// Fixture: make sure this run has a successfully registered account,
    /// registering one now if no earlier scenario did. A recovery rule, not
    /// an ordering assumption.
    async fn ensure_registered(&mut self) -> Result<Credentials> {
        if self.registered.is_none() {
            info!("no account registered in this run yet, running the registration fixture");
            self.successful_registration().await?;
        }
        self.registered.clone().ok_or_else(|| {
            FlowError::AssertionFailed(
                "registration fixture completed without recording credentials".to_string(),
            )
        })
    }

    async fn registration_with_existing_username(&mut self) -> Result<()> {
        let existing = self.ensure_registered().await?;

        let page = RegisterPage::new(&self.driver, &self.config)?;
        page.load().await?;

        // Same username, fresh email: only the duplicate check may fire.
        let (_, email) = self.factory.generate();
        let duplicate = Credentials {
            username: existing.username.clone(),
            email,
            password: VALID_PASSWORD.to_string(),
            confirm_password: VALID_PASSWORD.to_string(),
        };
        page.register(&duplicate).await?;

        let errors = page.read_errors().await?;
        ensure(
            errors.contains_fragment("already registered"),
            format!("expected an 'already registered' error, got {}", errors),
        )
    }

    async fn password_validations(&mut self) -> Vec<Failure> {
        let mut failures = Vec::new();
        for case in PASSWORD_CASES {
            if let Err(error) = self.password_case(&case).await {
                // Capture now, while the page still shows this sub-case.
                let descriptor = case.descriptor();
                let artifact = self.capture(&descriptor).await;
                failures.push(Failure {
                    descriptor,
                    message: error.to_string(),
                    artifact,
                });
            }
        }
        failures
    }

    async fn password_case(&mut self, case: &PasswordCase) -> Result<()> {
        let page = RegisterPage::new(&self.driver, &self.config)?;
        page.load().await?;

        let credentials = self.factory.credentials(case.password);
        page.register(&credentials).await?;

        let errors = page.read_errors().await?;
        ensure(
            errors.contains_fragment(case.expected_fragment),
            format!(
                "expected a '{}' error for password '{}', got {}",
                case.expected_fragment, case.password, errors
            ),
        )
    }

    async fn registration_with_empty_password(&mut self) -> Result<()> {
        let page = RegisterPage::new(&self.driver, &self.config)?;
        page.load().await?;

        let credentials = self.factory.credentials("");
        page.register(&credentials).await?;

        let errors = page.read_errors().await?;
        ensure(
            errors.contains_fragment("password is required"),
            format!("expected a 'password is required' error, got {}", errors),
        )
    }

    async fn login_with_empty_fields(&mut self) -> Result<()> {
        let page = LoginPage::new(&self.driver, &self.config)?;
        page.load().await?;
        page.login("", "").await?;

        let errors = page.read_errors().await?;
        ensure(
            errors.contains_fragment("please enter your username or email"),
            format!(
                "expected a 'please enter your username or email' error, got {}",
                errors
            ),
        )?;
        ensure(
            errors.contains_fragment("please enter your password"),
            format!("expected a 'please enter your password' error, got {}", errors),
        )
    }

    async fn login_with_incorrect_password(&mut self) -> Result<()> {
        let page = LoginPage::new(&self.driver, &self.config)?;
        page.load().await?;

        let identifier = self.config.site.known_account.identifier.clone();
        page.login(&identifier, "wrongpassword").await?;

        let errors = page.read_errors().await?;
        ensure(
            errors.contains_fragment("incorrect"),
            format!("expected an 'incorrect' password error, got {}", errors),
        )
    }

    async fn successful_login(&mut self) -> Result<()> {
        let page = LoginPage::new(&self.driver, &self.config)?;
        page.load().await?;

        let account = self.config.site.known_account.clone();
        page.login(&account.identifier, &account.password).await?;

        ensure(
            page.await_redirect(None).await,
            "redirect to the authenticated area did not happen",
        )?;

        let url = page.current_url().await?;
        ensure(
            url.starts_with(&self.config.site.dashboard_prefix),
            format!(
                "expected a url starting with '{}', got '{}'",
                self.config.site.dashboard_prefix, url
            ),
        )
    }

    async fn capture(&self, descriptor: &str) -> Option<PathBuf> {
        match artifacts::capture_failure(&self.driver, &self.config.artifacts.dir, descriptor).await
        {
            Ok(path) => Some(path),
            Err(error) => {
                warn!(error = %error, descriptor, "failed to capture failure screenshot");
                None
            }
        }
    }
}

fn ensure(condition: bool, message: impl Into<String>) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(FlowError::AssertionFailed(message.into()))
    }
}
