//! Integration test harness
//!
//! The harvest tests run full crawls against a wiremock marketplace.

mod harvest_tests;
