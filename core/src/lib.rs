//! Client core for the barbershop booking API.
//!
//! Screens mirror server collections into local caches and change them
//! optimistically: the cache is patched before the request goes out, resynced
//! from the server when it succeeds, and restored when it fails. The API owns
//! every business rule; this crate only keeps the local view honest.

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod api;
pub mod cache;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod models;
pub mod notify;
pub mod record;
pub mod registration;
pub mod retry;
pub mod screens;
pub mod session;
pub mod view;

pub use api::{ApiError, BookingClient};
pub use cache::{EntityCache, RecordSource};
pub use config::{ClientConfig, ConfigLoader};
pub use dispatcher::MutationDispatcher;
pub use error::{BookingError, Result, ValidationError};
pub use notify::{Notice, NoticeBuffer, NoticeLevel, Notifier, TracingNotifier};
pub use record::{Record, RecordId};
pub use screens::ScreenContext;
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
