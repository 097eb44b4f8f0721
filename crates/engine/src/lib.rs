//! Client core of the Shamba farmer console.
//!
//! The engine holds no UI. It owns the typed HTTP client ([`HttpBackend`]),
//! the session and route guard ([`session`]) and the screen controllers:
//! paginated listings with filters ([`listing`]), record editors
//! ([`editor`]), the OTP login ([`auth`]), OTP-gated wallet actions
//! ([`wallet`]), the farm plan wizard ([`planner`]) and the smaller views
//! built on top of them.
//!
//! Controllers are synchronous state machines. An action first calls a
//! `begin_*` method that validates input and returns the request to send,
//! the caller runs the request on its runtime, then hands the result to the
//! matching `finish_*` method. Most controllers also offer an `async`
//! convenience that does all three against a backend trait.

pub use error::{ApiError, EngineError, ErrorKind};
pub use http::HttpBackend;
pub use money::Money;
pub use session::{Route, Session, SessionContext, ThemeChoice};

pub mod admin;
pub mod auth;
pub mod backend;
pub mod dashboard;
pub mod debounce;
pub mod diary;
pub mod editor;
mod error;
pub mod guard;
mod http;
pub mod listing;
pub mod loans;
pub mod market;
pub mod money;
pub mod planner;
pub mod products;
pub mod session;
pub mod wallet;
