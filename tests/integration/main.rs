//! Integration tests for Sumi-Scribe
//!
//! These tests run the crawl engine against wiremock servers with on-disk
//! ledgers and text artifacts in temporary directories.

mod crawl_tests;
