//! OAuth 2.0 + PKCE demo service: authorize database provisioning on a
//! user's behalf and surface the resulting connection string.
//!
//! Two routes make up the whole flow. `GET /` issues a per-request PKCE
//! pair and state token and renders the provider's authorization link;
//! `GET /callback` redeems the state, exchanges the code, and walks the
//! provisioning API to a ready-to-use DSN.

pub mod config;
pub mod discovery;
mod error;
pub mod handlers;
pub mod oauth;
mod pkce;
pub mod provision;
pub mod redirect;
pub mod server;
pub mod session;

pub use error::Error;
pub use pkce::{PkcePair, generate_state};
