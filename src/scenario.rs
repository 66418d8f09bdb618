use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// The end-to-end scenarios of one run, executed strictly in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Scenario {
    SuccessfulRegistration,
    RegistrationWithExistingUsername,
    PasswordValidations,
    RegistrationWithEmptyPassword,
    LoginWithEmptyFields,
    LoginWithIncorrectPassword,
    SuccessfulLogin,
}

impl Scenario {
    pub const ALL: [Scenario; 7] = [
        Scenario::SuccessfulRegistration,
        Scenario::RegistrationWithExistingUsername,
        Scenario::PasswordValidations,
        Scenario::RegistrationWithEmptyPassword,
        Scenario::LoginWithEmptyFields,
        Scenario::LoginWithIncorrectPassword,
        Scenario::SuccessfulLogin,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::SuccessfulRegistration => "successful registration",
            Scenario::RegistrationWithExistingUsername => "registration with existing username",
            Scenario::PasswordValidations => "password validations",
            Scenario::RegistrationWithEmptyPassword => "registration with empty password",
            Scenario::LoginWithEmptyFields => "login with empty fields",
            Scenario::LoginWithIncorrectPassword => "login with incorrect password",
            Scenario::SuccessfulLogin => "successful login",
        }
    }

    /// Stem used for this scenario's failure artifact.
    pub fn descriptor(&self) -> &'static str {
        match self {
            Scenario::SuccessfulRegistration => "successful_registration",
            Scenario::RegistrationWithExistingUsername => "existing_username",
            Scenario::PasswordValidations => "password_validations",
            Scenario::RegistrationWithEmptyPassword => "empty_password",
            Scenario::LoginWithEmptyFields => "login_empty_fields",
            Scenario::LoginWithIncorrectPassword => "login_incorrect_password",
            Scenario::SuccessfulLogin => "successful_login_dummy",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One password-policy violation attempt and the validation fragment the
/// site must answer with.
#[derive(Debug, Clone, Copy)]
pub struct PasswordCase {
    pub password: &'static str,
    pub expected_fragment: &'static str,
}

impl PasswordCase {
    /// Sub-case artifact stem, derived from the expected fragment.
    pub fn descriptor(&self) -> String {
        self.expected_fragment.replace(' ', "_")
    }
}

pub const PASSWORD_CASES: [PasswordCase; 4] = [
    PasswordCase {
        password: "PASSWORD123!",
        expected_fragment: "one lowercase letter",
    },
    PasswordCase {
        password: "password123!",
        expected_fragment: "one capital letter",
    },
    PasswordCase {
        password: "PasswordTest!",
        expected_fragment: "one number",
    },
    PasswordCase {
        password: "Pass1!",
        expected_fragment: "at least 8 characters",
    },
];

/// One unmet expectation within a scenario. `artifact` is filled by whoever
/// captured the diagnostic screenshot.
#[derive(Debug, Clone)]
pub struct Failure {
    pub descriptor: String,
    pub message: String,
    pub artifact: Option<PathBuf>,
}

impl Failure {
    pub fn new(descriptor: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            message: message.into(),
            artifact: None,
        }
    }
}

#[derive(Debug)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub failures: Vec<Failure>,
}

impl ScenarioResult {
    pub fn passed(scenario: Scenario) -> Self {
        Self {
            scenario,
            failures: vec![],
        }
    }

    pub fn failed(scenario: Scenario, failures: Vec<Failure>) -> Self {
        Self { scenario, failures }
    }

    pub fn is_pass(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of one whole run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<ScenarioResult>,
}

impl RunReport {
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(ScenarioResult::is_pass)
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_pass()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_scenarios_have_distinct_descriptors() {
        let mut descriptors: Vec<_> = Scenario::ALL.iter().map(|s| s.descriptor()).collect();
        descriptors.sort_unstable();
        descriptors.dedup();
        assert_eq!(descriptors.len(), Scenario::ALL.len());
    }

    #[test]
    fn password_case_descriptors_match_artifact_naming() {
        assert_eq!(PASSWORD_CASES[0].descriptor(), "one_lowercase_letter");
        assert_eq!(PASSWORD_CASES[3].descriptor(), "at_least_8_characters");
    }

    #[test]
    fn report_pass_fail_accounting() {
        let report = RunReport {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            results: vec![
                ScenarioResult::passed(Scenario::SuccessfulRegistration),
                ScenarioResult::failed(
                    Scenario::LoginWithEmptyFields,
                    vec![Failure::new("login_empty_fields", "expected errors")],
                ),
            ],
        };
        assert!(!report.all_passed());
        assert_eq!(report.failed_count(), 1);
    }
}
