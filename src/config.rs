use crate::errors::{FlowError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub browser: BrowserConfig,
    pub wait: WaitConfig,
    pub site: SiteConfig,
    pub artifacts: ArtifactConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,
    pub window: WindowSize,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitConfig {
    /// Bound for outcome reads and redirect waits.
    pub timeout_secs: u64,
    /// Bound for locating interaction elements (fills, submit).
    pub implicit_secs: u64,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub base_url: String,
    pub login_path: String,
    pub register_path: String,
    /// URL prefix of the authenticated area reached after login.
    pub dashboard_prefix: String,
    pub known_account: KnownAccount,
}

/// A pre-existing, known-good account on the target site, used by the login
/// scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownAccount {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Directory failure screenshots are written into.
    pub dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser: BrowserConfig::default(),
            wait: WaitConfig::default(),
            site: SiteConfig::default(),
            artifacts: ArtifactConfig::default(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            window: WindowSize::default(),
            args: vec![],
        }
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            implicit_secs: 5,
            poll_interval_ms: 250,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://projectnest.io".to_string(),
            login_path: "/login-2/".to_string(),
            register_path: "/register/".to_string(),
            dashboard_prefix: "https://projectnest.io/user/".to_string(),
            known_account: KnownAccount::default(),
        }
    }
}

impl Default for KnownAccount {
    fn default() -> Self {
        Self {
            identifier: "nasoyeb579@cctoolz.com".to_string(),
            password: "aA12345678".to_string(),
        }
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}

impl SiteConfig {
    pub fn login_url(&self) -> Result<String> {
        self.join(&self.login_path)
    }

    pub fn register_url(&self) -> Result<String> {
        self.join(&self.register_path)
    }

    fn join(&self, path: &str) -> Result<String> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| FlowError::InvalidConfig(format!("base_url '{}': {}", self.base_url, e)))?;
        let joined = base
            .join(path)
            .map_err(|e| FlowError::InvalidConfig(format!("route '{}': {}", path, e)))?;
        Ok(joined.to_string())
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for WindowSize {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        let parse = |part: Option<&str>| {
            part.and_then(|p| p.parse::<u32>().ok())
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    FlowError::InvalidConfig(format!("window size '{}', expected WIDTHxHEIGHT", s))
                })
        };
        let mut parts = s.splitn(2, 'x');
        let width = parse(parts.next())?;
        let height = parse(parts.next())?;
        Ok(Self { width, height })
    }
}
