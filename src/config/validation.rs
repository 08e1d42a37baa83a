use super::models::{Config, StorageProvider};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Storage provider is S3 but no server URL is configured")]
    MissingServer,

    #[error("Invalid server URL '{server}', expected 'http://' or 'https://'")]
    InvalidServerScheme { server: String },

    #[error("Storage provider is S3 but missing credentials (access_key or secret_key)")]
    MissingS3Credentials,

    #[error("Bucket name must not be empty")]
    EmptyBucket,

    #[error("Keep tier '{tier}' has a negative duration")]
    NegativeTier { tier: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_storage(config)?;
    validate_cleanup(config)?;
    Ok(())
}

/// Validate server URL and credentials when provider is S3
fn validate_storage(config: &Config) -> Result<(), ValidationError> {
    if config.storage.bucket.is_empty() {
        return Err(ValidationError::EmptyBucket);
    }

    if config.storage.provider != StorageProvider::S3 {
        return Ok(());
    }

    let server = config
        .storage
        .server
        .as_deref()
        .ok_or(ValidationError::MissingServer)?;

    if !server.starts_with("http://") && !server.starts_with("https://") {
        return Err(ValidationError::InvalidServerScheme {
            server: server.to_string(),
        });
    }

    if config.storage.access_key.is_none() || config.storage.secret_key.is_none() {
        return Err(ValidationError::MissingS3Credentials);
    }

    Ok(())
}

/// Tiers built by hand could carry negative durations; parsed ones never do
fn validate_cleanup(config: &Config) -> Result<(), ValidationError> {
    for tier in &config.cleanup.keep {
        if tier.age < chrono::TimeDelta::zero()
            || tier.interval < chrono::TimeDelta::zero()
            || tier.alignment < chrono::TimeDelta::zero()
        {
            return Err(ValidationError::NegativeTier {
                tier: tier.to_string(),
            });
        }
    }

    Ok(())
}
