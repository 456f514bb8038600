//! Shared test utilities for the project-sync workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`transport`]: [`MockTransport`], a scripted, recording HTTP transport
//! - [`hosting`]: [`FakeHostingRepo`], a consistent fake repository installed onto a mock
//! - [`clock`]: [`ManualClock`] for driving rate limiters
//! - [`dir`]: temporary project directories

pub mod clock;
pub mod dir;
pub mod hosting;
pub mod transport;

pub use clock::ManualClock;
pub use dir::TempProjectDir;
pub use hosting::FakeHostingRepo;
pub use transport::{MockResponse, MockTransport, RecordedRequest};
