//! # syncrepo Testkit
//!
//! Test utilities for syncrepo.
//!
//! This crate provides:
//! - A sample [`Customer`] entity and repository helpers
//! - Property-based generators for offline mutation scripts
//! - A scenario harness that runs a script offline-then-sync and
//!   directly online, for comparing the two
//!
//! ## Usage
//!
//! ```rust,ignore
//! use syncrepo_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn replay_matches_online() {
//!     let script = [Op::Insert { name: "Acme".into() }];
//!     let harness = ScenarioHarness::new(57);
//!     let online = harness.run_online(&script).await.unwrap();
//!     let offline = harness.run_offline_then_sync(&script).await.unwrap();
//!     assert_eq!(offline.remote_rows, online);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod scenario;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::scenario::*;
}

pub use fixtures::*;
pub use generators::*;
pub use scenario::*;
