//! # Order Tracker
//!
//! > **Real-time location tracking and progress estimation for live orders.**
//!
//! While an order is being delivered, the delivery partner's device publishes its
//! position and the customer's device follows it. Both sides keep an ongoing
//! notification showing how far along the trip is. One process can track several
//! orders at once, each in its own isolated session.
//!
//! ## 🏗️ Design Philosophy
//!
//! - **One session per order**: a [`TrackingSession`](session::TrackingSession)
//!   owns exactly one stream, one progress tracker and one notification.
//! - **One command loop**: the [`TrackingCoordinator`](coordinator::TrackingCoordinator)
//!   processes start and stop commands sequentially, so the foreground
//!   indicator always matches whether any session is live.
//! - **Platform at the edges**: location, remote storage, notifications,
//!   permissions and the foreground host are traits in [`platform`],
//!   [`location`] and [`remote`]. The engine never talks to a device directly.
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Cancellation
//! Every stream is a [`Subscription`](framework::Subscription) with a shared
//! [`CancellationToken`](tokio_util::sync::CancellationToken). Stopping a session
//! cancels the token and joins the task; after `stop` returns no refresh or
//! publish for that order can start.
//!
//! ### 2. Progress
//! The initial distance is fixed once per session, from the partner's start
//! position when known, otherwise from the first observed position. Progress is
//! `100 * (initial - current) / initial`, rounded and clamped to `0..=100`.
//! See [`model::geo`].
//!
//! ### 3. Failure Isolation
//! A failed publish is logged and dropped. A broken remote subscription ends only
//! its own session, which is then reaped so a later start is not blocked.
//!
//! ### 4. Observability
//! `tracing` throughout, with a `session` span per order. See
//! [`lifecycle::tracing`].
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`coordinator`], [`registry`], [`session`])
//! - **Role**: command handling, the live-session table, and the per-order task.
//! - **Key items**: [`CoordinatorClient`](coordinator::CoordinatorClient),
//!   [`SessionRegistry`](registry::SessionRegistry).
//!
//! ### 2. The Orchestrator ([`lifecycle`])
//! - **Role**: spawns the coordinator and shuts it down.
//! - **Key items**: [`TrackingSystem`](lifecycle::TrackingSystem).
//!
//! ### 3. The Edges ([`location`], [`remote`], [`platform`])
//! - **Role**: collaborator traits, plus in-process implementations used by the
//!   demo and the tests.
//!
//! ### 4. The Data ([`model`], [`config`])
//! - **Role**: coordinates, orders, notifications, and tunables.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! RUST_LOG=info cargo run
//! cargo test
//! ```

pub mod config;
pub mod coordinator;
pub mod framework;
pub mod lifecycle;
pub mod location;
pub mod model;
pub mod platform;
pub mod registry;
pub mod remote;
pub mod session;
