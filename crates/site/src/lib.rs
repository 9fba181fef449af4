//! Headless runtime for the WASUI confectionery site: keeps the content
//! stores in sync with the local cache and drives the list pages.

pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod forms;
pub mod pages;
pub mod poller;
pub mod state;
pub mod submit;
