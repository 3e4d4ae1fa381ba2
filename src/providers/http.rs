//! # HTTP Registry Provider
//!
//! GET against a URL template with the canonical identifier substituted for
//! `{cnpj}`. Each provider owns its reqwest client, so timeouts are
//! independent per registry.

use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;
use tracing::debug;

use super::{FieldMapping, Provider, ProviderFailure};
use crate::config::{ConfigurationError, ProviderConfig};
use crate::constants::providers::{IDENTIFIER_PLACEHOLDER, USER_AGENT};
use crate::identifier::Cnpj;
use crate::record::CanonicalRecord;

#[derive(Debug, Clone)]
pub struct HttpProvider {
    tag: String,
    url_template: String,
    timeout: Duration,
    mapping: FieldMapping,
    client: Client,
}

impl HttpProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigurationError> {
        if !config.url_template.contains(IDENTIFIER_PLACEHOLDER) {
            return Err(ConfigurationError::invalid_value(
                format!("providers.{}.url_template", config.tag),
                &config.url_template,
                format!("must contain {IDENTIFIER_PLACEHOLDER}"),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                ConfigurationError::invalid_value(
                    format!("providers.{}", config.tag),
                    &config.url_template,
                    format!("failed to create HTTP client: {e}"),
                )
            })?;

        debug!(
            provider = %config.tag,
            timeout_ms = config.timeout_ms,
            "Created registry HTTP client"
        );

        Ok(Self {
            tag: config.tag.clone(),
            url_template: config.url_template.clone(),
            timeout: config.timeout(),
            mapping: config.mapping.clone(),
            client,
        })
    }

    pub fn url_for(&self, identifier: &Cnpj) -> String {
        self.url_template
            .replace(IDENTIFIER_PLACEHOLDER, identifier.as_str())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn classify(&self, error: reqwest::Error) -> ProviderFailure {
        if error.is_timeout() {
            ProviderFailure::Timeout {
                provider: self.tag.clone(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else if error.is_decode() {
            ProviderFailure::MalformedBody {
                provider: self.tag.clone(),
                message: error.to_string(),
            }
        } else {
            ProviderFailure::Network {
                provider: self.tag.clone(),
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn tag(&self) -> &str {
        &self.tag
    }

    async fn fetch(&self, identifier: &Cnpj) -> Result<CanonicalRecord, ProviderFailure> {
        let url = self.url_for(identifier);
        debug!(provider = %self.tag, url = %url, "Querying registry");

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderFailure::Status {
                provider: self.tag.clone(),
                code: status.as_u16(),
            });
        }

        let body: serde_json::Value = response.json().await.map_err(|e| self.classify(e))?;

        self.mapping.map_record(identifier, &self.tag, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url_template: &str) -> ProviderConfig {
        ProviderConfig {
            tag: "local".to_string(),
            url_template: url_template.to_string(),
            timeout_ms: 250,
            mapping: FieldMapping::default(),
        }
    }

    #[test]
    fn test_url_substitution() {
        let provider = HttpProvider::new(&ProviderConfig::brasilapi()).unwrap();
        let cnpj = Cnpj::parse("12.345.678/0001-90").unwrap();
        assert_eq!(
            provider.url_for(&cnpj),
            "https://brasilapi.com.br/api/cnpj/v1/12345678000190"
        );
        assert_eq!(provider.tag(), "brasilapi");
        assert_eq!(provider.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_template_without_placeholder_is_rejected() {
        let err = HttpProvider::new(&config("http://127.0.0.1/cnpj")).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidValue { .. }));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_failure() {
        // bind then drop to get a port nothing listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let provider =
            HttpProvider::new(&config(&format!("http://127.0.0.1:{port}/{{cnpj}}"))).unwrap();

        let err = provider
            .fetch(&Cnpj::parse("12345678000190").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderFailure::Network { .. }), "{err:?}");
        assert_eq!(err.provider(), "local");
    }
}
