//! [`VaultClient`](crate::VaultClient) implementations.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "mock")]
pub mod mock;
