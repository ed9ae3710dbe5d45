//! Runtime surface: submission API, health and process shutdown.

pub mod api;
pub mod shutdown;

pub use api::{
    health, ApiError, Health, MembershipService, SubmissionReceipt, RESERVED_GID, RESERVED_UID,
};
pub use shutdown::install_shutdown_handler;
