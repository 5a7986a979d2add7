//! Application Configuration
//!
//! Configuration for the job coordinator.

use crate::domain::value_objects::MinerId;
use kernel::clock::duration_ms;
use std::path::PathBuf;
use std::time::Duration;

/// Coordinator application configuration
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Lease granted by a claim
    pub lease_duration: Duration,
    /// Heartbeat deadline set by a check
    pub heartbeat_extension: Duration,
    /// Period of the reconciliation loop
    pub reconcile_interval: Duration,
    /// Window of the active-miner set
    pub active_window: Duration,
    /// Window of the interactive-miner set
    pub interactive_window: Duration,
    /// The bot counts as up if heard from within this window
    pub bot_liveness_window: Duration,
    /// Network identity of the trusted bot
    pub bot_identity: Option<MinerId>,
    /// Priority identities, passed through to miner tooling
    pub identity_priority: Vec<MinerId>,
    /// Directory of the msed archive
    pub msed_dir: PathBuf,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            lease_duration: Duration::from_secs(60 * 60),
            heartbeat_extension: Duration::from_secs(60),
            reconcile_interval: Duration::from_secs(15),
            active_window: Duration::from_secs(5 * 60),
            interactive_window: Duration::from_secs(30),
            bot_liveness_window: Duration::from_secs(5 * 60),
            bot_identity: None,
            identity_priority: Vec::new(),
            msed_dir: PathBuf::from("static/mseds"),
        }
    }
}

impl CoordinatorConfig {
    /// Defaults overridden by `BOT_IDENTITY`, `IDENTITY_PRIORITY` and
    /// `MSED_DIR` as read through `var`.
    ///
    /// No identity is trusted as the bot unless `BOT_IDENTITY` names one,
    /// whatever the build profile.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(identity) = var("BOT_IDENTITY") {
            let identity = identity.trim();
            config.bot_identity = (!identity.is_empty()).then(|| MinerId::from(identity));
        }

        if let Some(list) = var("IDENTITY_PRIORITY") {
            config.identity_priority = list
                .split(',')
                .map(str::trim)
                .filter(|identity| !identity.is_empty())
                .map(MinerId::from)
                .collect();
        }

        if let Some(dir) = var("MSED_DIR") {
            config.msed_dir = dir.into();
        }

        config
    }

    /// Whether `identity` is the configured bot. An unknown identity never is.
    pub fn is_trusted_bot(&self, identity: &MinerId) -> bool {
        !identity.is_unknown() && self.bot_identity.as_ref() == Some(identity)
    }

    pub fn lease_duration_ms(&self) -> i64 {
        duration_ms(self.lease_duration)
    }

    pub fn heartbeat_extension_ms(&self) -> i64 {
        duration_ms(self.heartbeat_extension)
    }

    pub fn active_window_ms(&self) -> i64 {
        duration_ms(self.active_window)
    }

    pub fn interactive_window_ms(&self) -> i64 {
        duration_ms(self.interactive_window)
    }

    pub fn bot_liveness_window_ms(&self) -> i64 {
        duration_ms(self.bot_liveness_window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_identity_is_never_the_bot() {
        let config = CoordinatorConfig {
            bot_identity: Some(MinerId::from("")),
            ..Default::default()
        };
        assert!(!config.is_trusted_bot(&MinerId::from("")));

        let config = CoordinatorConfig {
            bot_identity: Some(MinerId::from("192.0.2.1")),
            ..Default::default()
        };
        assert!(config.is_trusted_bot(&MinerId::from("192.0.2.1")));
        assert!(!config.is_trusted_bot(&MinerId::from("10.0.0.1")));
    }

    #[test]
    fn test_bot_is_opt_in() {
        let config = CoordinatorConfig::from_vars(|_| None);
        assert_eq!(config.bot_identity, None);
        assert!(!config.is_trusted_bot(&MinerId::from("127.0.0.1")));

        let config = CoordinatorConfig::from_vars(|key| (key == "BOT_IDENTITY").then(|| "  ".into()));
        assert_eq!(config.bot_identity, None);

        let config =
            CoordinatorConfig::from_vars(|key| (key == "BOT_IDENTITY").then(|| " 192.0.2.1 ".into()));
        assert!(config.is_trusted_bot(&MinerId::from("192.0.2.1")));
        assert!(!config.is_trusted_bot(&MinerId::from("127.0.0.1")));
    }

    #[test]
    fn test_from_vars_lists_and_paths() {
        let config = CoordinatorConfig::from_vars(|key| match key {
            "IDENTITY_PRIORITY" => Some("10.0.0.1, ,10.0.0.2".into()),
            "MSED_DIR" => Some("/srv/mseds".into()),
            _ => None,
        });
        assert_eq!(
            config.identity_priority,
            vec![MinerId::from("10.0.0.1"), MinerId::from("10.0.0.2")]
        );
        assert_eq!(config.msed_dir, PathBuf::from("/srv/mseds"));
    }

    #[test]
    fn test_default_windows() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.lease_duration_ms(), 3_600_000);
        assert_eq!(config.heartbeat_extension_ms(), 60_000);
        assert_eq!(config.interactive_window_ms(), 30_000);
    }
}
