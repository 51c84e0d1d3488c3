//! # Observability & Tracing
//!
//! [`setup_tracing`] initializes structured logging with the `tracing` crate.
//! Levels come from `RUST_LOG`; the compact format hides module paths.
//!
//! ## What Gets Traced
//!
//! - **Coordinator**: startup, foreground transitions, teardown
//! - **Sessions**: start, stop, self-termination, each under a `session` span
//!   carrying `order_id`, `role` and `session_id`
//! - **Failures**: publish errors, refused subscriptions, transport errors
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run
//!
//! # Per-event progress and every command sent by the client
//! RUST_LOG=debug cargo run
//! ```
//!
//! With `RUST_LOG=info`:
//!
//! ```text
//! INFO Coordinator started
//! INFO Foreground raised
//! INFO Session started order_id=O1 role=PARTNER session_id=session_1
//! INFO Registered order_id=O1 role=PARTNER session_id=session_1 size=1
//! INFO Session stopped order_id=O1 session_id=session_1 exit=Cancelled
//! INFO Foreground released
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
