//! Residue client sessions and access tokens
//!
//! Tracks who is allowed to talk to the server:
//!
//! - [`ClientRegistry`]: live client sessions with their symmetric keys
//!   and leases, swept by the integrity task.
//! - [`TokenStore`]: short-lived per-(client, logger) access codes with
//!   constant-time validation.
//!
//! Clients and tokens reference each other by id only; there are no
//! owning handles between the two stores.

mod client;
mod token;

pub use client::{CLIENT_ID_LEN, Client, ClientRegistry, generate_client_id};
pub use token::{TOKEN_LEN, Token, TokenStore};
