//! Shared fixtures for the Nectar scenario and property tests.

pub mod helpers;
