//! Configuration validation
//!
//! Runs after parsing; structural errors (types, unknown enum values)
//! are caught by serde, this pass checks cross-field consistency.

use crate::error::{ConfigError, Result};
use crate::Config;

/// Validate a parsed configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_ports(config)?;
    validate_framing(config)?;
    validate_access(config)?;
    validate_limits(config)?;
    Ok(())
}

/// The three endpoints must not share a port
fn validate_ports(config: &Config) -> Result<()> {
    let ports = [
        (config.server.connect_port, "connect"),
        (config.server.token_port, "token"),
        (config.server.logging_port, "logging"),
    ];

    for (i, (port, name)) in ports.iter().enumerate() {
        let clashing: Vec<&str> = ports[i + 1..]
            .iter()
            .filter(|(other, _)| other == port)
            .map(|(_, other_name)| *other_name)
            .collect();
        if !clashing.is_empty() {
            return Err(ConfigError::duplicate_port(
                *port,
                format!("{}, {}", name, clashing.join(", ")),
            ));
        }
    }

    Ok(())
}

/// The frame delimiter must be a single non-digit ASCII byte
fn validate_framing(config: &Config) -> Result<()> {
    let delim = config.server.frame_delimiter;
    if !delim.is_ascii() {
        return Err(ConfigError::invalid_value(
            "server",
            "frame_delimiter",
            "must be an ASCII character",
        ));
    }
    if delim.is_ascii_digit() {
        return Err(ConfigError::invalid_value(
            "server",
            "frame_delimiter",
            "must not be a decimal digit (it terminates the length prefix)",
        ));
    }
    if config.server.max_frame_size == 0 {
        return Err(ConfigError::invalid_value(
            "server",
            "max_frame_size",
            "must be greater than zero",
        ));
    }
    Ok(())
}

/// A logger cannot be both declared and blacklisted
fn validate_access(config: &Config) -> Result<()> {
    for logger in config.access.loggers.keys() {
        if config.access.blacklist.contains(logger) {
            return Err(ConfigError::BlacklistedKnownLogger {
                logger: logger.clone(),
            });
        }
    }
    Ok(())
}

fn validate_limits(config: &Config) -> Result<()> {
    if config.max_items_in_bulk == 0 {
        return Err(ConfigError::invalid_value(
            "config",
            "max_items_in_bulk",
            "must be at least 1",
        ));
    }
    Ok(())
}
