//! Configuration management for Lambda functions.

use std::env;

use crate::{Error, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database host
    pub db_host: String,
    /// Database name
    pub db_name: String,
    /// ARN of the secret containing database credentials
    pub db_secret_arn: String,
    /// AWS region
    pub aws_region: String,
    /// ISO 3166-1 alpha-2 country code for public holiday enrichment
    pub holiday_country: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Missing required variables surface as `Error::Config`.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            db_host: env::var("DATABASE_HOST")
                .map_err(|_| Error::Config("DATABASE_HOST is not set".to_string()))?,
            db_name: env::var("DATABASE_NAME").unwrap_or_else(|_| "almanac".to_string()),
            db_secret_arn: env::var("DATABASE_URL_SECRET_ARN")
                .map_err(|_| Error::Config("DATABASE_URL_SECRET_ARN is not set".to_string()))?,
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            holiday_country: env::var("HOLIDAY_COUNTRY").unwrap_or_else(|_| "IN".to_string()),
        })
    }
}
