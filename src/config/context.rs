use crate::constants::synthetic;

/// Values that configuration files may reference but that never become
/// definitions themselves.
///
/// Built once at startup and passed explicitly to [`build_definitions`],
/// so tests can pin both values.
///
/// [`build_definitions`]: crate::config::build_definitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpolationContext {
    pub username: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
}

impl InterpolationContext {
    pub fn new<S: Into<String>>(username: S, timestamp: i64) -> Self {
        Self { username: username.into(), timestamp }
    }

    /// Current OS user and the current time.
    pub fn from_environment() -> Self {
        Self::new(whoami::username(), chrono::Utc::now().timestamp())
    }

    pub fn pairs(&self) -> [(&'static str, String); 2] {
        [
            (synthetic::USERNAME, self.username.clone()),
            (synthetic::TIMESTAMP, self.timestamp.to_string()),
        ]
    }
}
