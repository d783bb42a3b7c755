use serde::{Deserialize, Serialize};

/// Where the site is served from, for building absolute URLs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub default_protocol: String,
    pub site_domain: String,
}

impl WebConfig {
    pub fn new(site_domain: impl Into<String>) -> Self {
        Self {
            site_domain: site_domain.into(),
            ..Self::default()
        }
    }

    /// `"{protocol}://{domain}"` using the configured protocol.
    pub fn url_base(&self) -> String {
        format!("{}://{}", self.default_protocol, self.site_domain)
    }

    /// Always `https`.
    pub fn secure_url_base(&self) -> String {
        format!("https://{}", self.site_domain)
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            default_protocol: "http".into(),
            site_domain: "localhost:8000".into(),
        }
    }
}
