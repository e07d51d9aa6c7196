//! Shared fixtures for unit tests
//!
//! RSA key generation is slow, so all tests share one key pair.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use residue_auth::Client;
use residue_config::Config;
use residue_crypto::{RsaPadding, ServerKeyPair, SymmetricKey, generate_sym_key};

use crate::state::ServerState;

/// The shared test key pair
pub(crate) fn test_keys() -> &'static ServerKeyPair {
    static KEYS: OnceLock<ServerKeyPair> = OnceLock::new();
    KEYS.get_or_init(|| ServerKeyPair::generate(2048, RsaPadding::Oaep).unwrap())
}

/// Build a state around a config, using the shared key pair
pub(crate) fn make_state(config: Config) -> Arc<ServerState> {
    Arc::new(ServerState::new(
        Arc::new(config),
        test_keys().clone(),
        HashMap::new(),
    ))
}

/// Register a client and return its session key
pub(crate) fn add_client(
    state: &ServerState,
    id: &str,
    date_created: u64,
    age: u64,
) -> SymmetricKey {
    add_client_with(state, id, date_created, age, false, None)
}

/// Register a client with full control over the known/user fields
pub(crate) fn add_client_with(
    state: &ServerState,
    id: &str,
    date_created: u64,
    age: u64,
    is_known: bool,
    user: Option<&str>,
) -> SymmetricKey {
    let key = generate_sym_key();
    state.registry.add(
        Client::new(
            id,
            test_keys().public().clone(),
            key,
            date_created,
            age,
            is_known,
        )
        .with_user(user.map(str::to_string)),
    );
    key
}
