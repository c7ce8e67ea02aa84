//! Helpers for tests: throw-away SQLite databases and an in-memory payment provider.
pub mod fake_provider;
pub mod prepare_env;
