//! Tests for the integrity task

use residue_config::Config;

use crate::integrity::{SweepStats, run_once};
use crate::test_support::{add_client, make_state};

#[test]
fn test_sweep_evicts_expired_clients_and_their_tokens() {
    let state = make_state(Config::default());
    add_client(&state, "dead", 1000, 100);
    add_client(&state, "alive", 1000, 10_000);
    state.tokens.issue("dead", "app", 10_000, 1000);
    state.tokens.issue("alive", "app", 10_000, 1000);

    let stats = run_once(&state, 1200);
    assert_eq!(
        stats,
        SweepStats {
            clients_removed: 1,
            tokens_removed: 1,
        }
    );

    assert!(state.registry.find("dead").is_none());
    assert!(state.registry.find("alive").is_some());
    assert_eq!(state.tokens.len(), 1);
}

#[test]
fn test_sweep_drops_expired_tokens_of_live_clients() {
    let state = make_state(Config::default());
    add_client(&state, "c1", 0, 10_000);
    state.tokens.issue("c1", "app", 60, 0);
    state.tokens.issue("c1", "db", 10_000, 0);

    let stats = run_once(&state, 100);
    assert_eq!(stats.clients_removed, 0);
    assert_eq!(stats.tokens_removed, 1);
    assert_eq!(state.tokens.len(), 1);
}

#[test]
fn test_sweep_advances_clock() {
    let state = make_state(Config::default());
    assert_eq!(state.integrity.last_execution(), 0);

    run_once(&state, 1200);
    assert_eq!(state.integrity.last_execution(), 1200);

    run_once(&state, 1500);
    assert_eq!(state.integrity.last_execution(), 1500);
}

#[test]
fn test_sweep_is_idempotent() {
    let state = make_state(Config::default());
    add_client(&state, "dead", 1000, 100);

    let first = run_once(&state, 1200);
    assert_eq!(first.clients_removed, 1);

    let second = run_once(&state, 1200);
    assert_eq!(second, SweepStats::default());
    assert_eq!(state.registry.len(), 0);
}
