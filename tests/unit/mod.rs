//! Integration test entry point.

mod invariant_tests;
mod public_api_tests;
