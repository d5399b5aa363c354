//! Expiring CSRF tokens stored in a satchel session namespace.
//!
//! Tokens live as records in one reserved namespace of a
//! [`NamespacedStore`](satchel_session::NamespacedStore). Each record keeps
//! the token string, its issue time and its lifetime; a token validates
//! strictly before `issued_at + lifetime`.
//!
//! # Components
//!
//! - [`manager`] — create, fetch, validate, consume and delete tokens
//! - [`record`] — the stored record and display info
//! - [`generate`] — random token strings and constant-time comparison
//! - [`clock`] — wall clock and a manual clock for tests

pub mod clock;
pub mod generate;
pub mod manager;
pub mod record;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::TokenManager;
pub use record::{TokenInfo, TokenRecord};
