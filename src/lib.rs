//! At-least-once log stream consumer
//!
//! Messages are received from a [`source::MessageSource`], normalized into
//! [`domain::LogRecord`]s, stored in a [`storage::Sink`] with bounded linear
//! retries, and committed exactly once each. A pool of worker slots bounds
//! concurrent stores, and a [`shutdown::ShutdownCoordinator`] turns
//! termination signals into cancellation plus resource cleanup.

pub mod app;
pub mod config;
pub mod domain;
pub mod engine;
pub mod prelude;
pub mod shutdown;
pub mod source;
pub mod storage;
pub mod streaming;
