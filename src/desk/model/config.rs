use std::time::Duration;
use anyhow::{Context, Error};
use crate::desk::model::draft::SubmissionPolicy;
use crate::desk::model::UserId;

const DEFAULT_API_URL: &str = "https://dragon-ete4agc5byajakbd.canadacentral-01.azurewebsites.net/api/bills";
const DEFAULT_USER_ID: UserId = 12345;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_APPROVAL_DELAY_MS: u64 = 2000;

/// Client configs
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClientConfig {
    /// base url of the bill service, without trailing slash
    pub base_url: String,
    pub user_id: UserId,
    pub request_timeout: Duration,
    /// how long an approved bill stays on screen before returning to the list
    pub approval_delay: Duration,
    pub policy: SubmissionPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            user_id: DEFAULT_USER_ID,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            approval_delay: Duration::from_millis(DEFAULT_APPROVAL_DELAY_MS),
            policy: SubmissionPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configs from `BILLS_*` variables, falling back to defaults for absent ones
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::default();
        if let Some(url) = lookup("BILLS_API_URL") {
            config = config.with_base_url(url);
        }
        if let Some(raw) = lookup("BILLS_USER_ID") {
            config.user_id = raw
                .trim()
                .parse()
                .with_context(|| format!("failed to parse BILLS_USER_ID={raw}"))?;
        }
        if let Some(raw) = lookup("BILLS_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = raw
                .trim()
                .parse()
                .map(Duration::from_secs)
                .with_context(|| format!("failed to parse BILLS_REQUEST_TIMEOUT_SECS={raw}"))?;
        }
        if let Some(raw) = lookup("BILLS_APPROVAL_DELAY_MS") {
            config.approval_delay = raw
                .trim()
                .parse()
                .map(Duration::from_millis)
                .with_context(|| format!("failed to parse BILLS_APPROVAL_DELAY_MS={raw}"))?;
        }
        if let Some(raw) = lookup("BILLS_SUBMISSION_POLICY") {
            config.policy = raw.trim().parse().map_err(Error::msg)?;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_user_id(mut self, user_id: UserId) -> Self {
        self.user_id = user_id;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_absent() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.user_id, 12345);
        assert_eq!(config.approval_delay, Duration::from_secs(2));
        assert_eq!(config.policy, SubmissionPolicy::Strict);
    }

    #[test]
    fn reads_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("BILLS_API_URL", "http://localhost:8080/api/bills/"),
            ("BILLS_USER_ID", "42"),
            ("BILLS_REQUEST_TIMEOUT_SECS", "3"),
            ("BILLS_APPROVAL_DELAY_MS", "500"),
            ("BILLS_SUBMISSION_POLICY", "lenient"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/api/bills");
        assert_eq!(config.user_id, 42);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.approval_delay, Duration::from_millis(500));
        assert_eq!(config.policy, SubmissionPolicy::Lenient);
    }

    #[test]
    fn malformed_values_abort() {
        assert!(ClientConfig::from_lookup(lookup(&[("BILLS_USER_ID", "me")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[("BILLS_SUBMISSION_POLICY", "yolo")])).is_err());
    }
}
