//! Per-logger authorization
//!
//! A record may reach the sink only if every rule passes:
//!
//! 1. the logger is known, or `allow_unknown_loggers` is set;
//! 2. the logger is not the server's internal logger;
//! 3. the logger is not blacklisted;
//! 4. the presented token validates at the record's receive time,
//!    unless the logger is configured as not requiring one.
//!
//! Each denial logs one WARNING naming the reason.

use residue_protocol::{INTERNAL_LOGGER_ID, LogRequest};
use tracing::warn;

use crate::state::ServerState;

/// Evaluate the authorization rules for one record
pub fn is_allowed(state: &ServerState, request: &LogRequest) -> bool {
    let config = &state.config;

    if !config.allow_unknown_loggers && !config.access.is_known_logger(&request.logger_id) {
        warn!(
            logger = %request.logger_id,
            client_id = %request.client_id,
            "ignoring log from unauthorized logger"
        );
        return false;
    }

    if request.logger_id == INTERNAL_LOGGER_ID {
        warn!(
            client_id = %request.client_id,
            "client attempted to write to the internal logger"
        );
        return false;
    }

    if config.access.is_blacklisted(&request.logger_id) {
        warn!(
            logger = %request.logger_id,
            client_id = %request.client_id,
            "logger is blacklisted"
        );
        return false;
    }

    if config.access.logger_requires_token(&request.logger_id)
        && !state.tokens.validate(
            &request.client_id,
            &request.logger_id,
            &request.token,
            request.date_received,
        )
    {
        warn!(
            logger = %request.logger_id,
            client_id = %request.client_id,
            "token expired or invalid"
        );
        return false;
    }

    true
}

#[cfg(test)]
#[path = "policy_test.rs"]
mod tests;
