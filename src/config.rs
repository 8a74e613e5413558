//! Environment-driven configuration

use crate::api::TushareClient;

/// Settings for the Tushare price provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Only needed when a chart has no supplied price data
    pub token: Option<String>,
    pub base_url: String,
}

impl ProviderConfig {
    /// Read `TUSHARE_TOKEN` and `TUSHARE_BASE_URL` from the environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let token = lookup("TUSHARE_TOKEN").filter(|t| !t.trim().is_empty());
        let base_url = lookup("TUSHARE_BASE_URL")
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| TushareClient::DEFAULT_BASE_URL.to_string());
        Self { token, base_url }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = ProviderConfig::from_lookup(|_| None);
        assert_eq!(config.token, None);
        assert_eq!(config.base_url, "http://api.tushare.pro");
    }

    #[test]
    fn test_reads_values_and_ignores_blank_token() {
        let env: HashMap<&str, &str> =
            HashMap::from([("TUSHARE_TOKEN", "  "), ("TUSHARE_BASE_URL", "http://localhost:8080")]);
        let config = ProviderConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.token, None);
        assert_eq!(config.base_url, "http://localhost:8080");
    }
}
