//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod fake_library;
pub mod plex_server;
