use crate::driver::{Driver, ElementHandle};
use crate::errors::{FlowError, Result};
use crate::locator::Locator;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::trace;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Bounded polling: block the calling scenario until a predicate over
/// observable browser state holds, or the deadline passes.
///
/// All suspension in the harness flows through here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl WaitPolicy {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Poll `probe` until it yields a value or the deadline passes.
    ///
    /// Absence (`None`) never raises; only exceeding the deadline does, as
    /// [`FlowError::TimedOut`] naming the awaited condition. The probe is
    /// always tried at least once, even with a zero timeout.
    pub async fn until<T, F, Fut>(&self, what: &str, mut probe: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let started = Instant::now();
        loop {
            if let Some(value) = probe().await {
                return Ok(value);
            }
            if started.elapsed() >= self.timeout {
                return Err(FlowError::TimedOut(format!(
                    "{} (within {:?})",
                    what, self.timeout
                )));
            }
            trace!(condition = what, "condition not met yet, polling again");
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// Wait for at least one element matching `locator` to be present.
///
/// Driver errors during a poll are treated as absence; the only failure mode
/// is the deadline.
pub async fn elements_present<D: Driver>(
    driver: &D,
    locator: &Locator,
    policy: &WaitPolicy,
) -> Result<Vec<ElementHandle>> {
    let what = format!("elements matching {}", locator);
    policy
        .until(&what, || async move {
            match driver.find_all(locator).await {
                Ok(found) if !found.is_empty() => Some(found),
                _ => None,
            }
        })
        .await
}

/// Wait for exactly one (the first) element matching `locator`.
pub async fn first_present<D: Driver>(
    driver: &D,
    locator: &Locator,
    policy: &WaitPolicy,
) -> Result<ElementHandle> {
    let mut found = elements_present(driver, locator, policy).await?;
    Ok(found.swap_remove(0))
}

/// Wait for the session URL to gain `prefix`. Returns false on timeout,
/// never an error.
pub async fn url_has_prefix<D: Driver>(driver: &D, prefix: &str, policy: &WaitPolicy) -> bool {
    let what = format!("url starting with {}", prefix);
    policy
        .until(&what, || async move {
            match driver.current_url().await {
                Ok(url) if url.starts_with(prefix) => Some(()),
                _ => None,
            }
        })
        .await
        .is_ok()
}
