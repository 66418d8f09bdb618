use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Browser session already closed")]
    SessionClosed,

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timed out waiting for {0}")]
    TimedOut(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotFailed(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FlowError>;

impl FlowError {
    /// Whether this error marks an unmet expectation rather than harness
    /// breakage. The suite records these as scenario failures.
    pub fn is_scenario_failure(&self) -> bool {
        matches!(
            self,
            FlowError::ElementNotFound(_) | FlowError::TimedOut(_) | FlowError::AssertionFailed(_)
        )
    }
}
