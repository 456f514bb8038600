//! Command implementations for sync-cli

pub mod pull;
pub mod push;
pub mod status;
pub mod whoami;

pub use pull::run_pull;
pub use push::run_push;
pub use status::run_status;
pub use whoami::run_whoami;
