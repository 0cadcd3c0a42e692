pub mod config;
pub mod flags;
pub mod platform;
pub mod provider;
pub mod storage;

// Shared by unit tests and the integration tests under tests/, so it is
// compiled into the library rather than gated behind cfg(test).
pub mod test_utils;
