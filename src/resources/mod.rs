//! Resource implementations.

pub mod approle_auth_backend_role;
pub mod audit;
pub mod auth_backend;

/// Registers all built-in resources with the factory.
///
/// Called by [`crate::init`]; calling it again re-registers the same
/// constructors.
pub fn register_all() {
    approle_auth_backend_role::register();
    audit::register();
    auth_backend::register();
}
