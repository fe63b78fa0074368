//! AWS Secrets Manager integration.
//!
//! Secrets are cached for the lifetime of the Lambda sandbox, so warm
//! invocations skip the network round trip.

use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{Error, Result};

static SECRET_CACHE: OnceLock<RwLock<HashMap<String, String>>> = OnceLock::new();

fn cache() -> &'static RwLock<HashMap<String, String>> {
    SECRET_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Database credentials as stored by the RDS-managed secret.
///
/// Host, port and database name are optional; callers fall back to the
/// environment configuration when the secret omits them.
#[derive(Debug, Deserialize)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
}

/// Get a secret value from Secrets Manager, consulting the sandbox cache first.
pub async fn get_secret(client: &SecretsClient, secret_arn: &str) -> Result<String> {
    if let Some(value) = cache().read().await.get(secret_arn) {
        debug!("Secret cache hit for {}", secret_arn);
        return Ok(value.clone());
    }

    let response = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| Error::Aws(format!("Failed to get secret: {}", e)))?;

    let secret_string = response
        .secret_string()
        .ok_or_else(|| Error::Aws("Secret has no string value".to_string()))?
        .to_string();

    cache()
        .write()
        .await
        .insert(secret_arn.to_string(), secret_string.clone());

    Ok(secret_string)
}

/// Get database credentials from Secrets Manager.
pub async fn get_database_credentials(
    client: &SecretsClient,
    secret_arn: &str,
) -> Result<DatabaseCredentials> {
    let secret_string = get_secret(client, secret_arn).await?;

    serde_json::from_str(&secret_string)
        .map_err(|e| Error::Aws(format!("Failed to parse database credentials: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_credentials() {
        let json = r#"{"username":"almanac","password":"secret123","host":"db.example.com","port":5432,"dbname":"almanac"}"#;
        let creds: DatabaseCredentials = serde_json::from_str(json).unwrap();
        assert_eq!(creds.username, "almanac");
        assert_eq!(creds.password, "secret123");
        assert_eq!(creds.host, Some("db.example.com".to_string()));
        assert_eq!(creds.port, Some(5432));
    }

    #[test]
    fn test_parse_credentials_without_endpoint_fields() {
        let json = r#"{"username":"almanac","password":"secret123"}"#;
        let creds: DatabaseCredentials = serde_json::from_str(json).unwrap();
        assert_eq!(creds.host, None);
        assert_eq!(creds.port, None);
        assert_eq!(creds.dbname, None);
    }
}
