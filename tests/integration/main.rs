//! Integration tests for id-sweep
//!
//! `crawl_tests` drives whole runs through a scripted fetcher against an
//! on-disk store; `fetcher_tests` exercises the HTTP fetcher against wiremock
//! servers.

mod common;
mod crawl_tests;
mod fetcher_tests;
