// Library interface for hoaxify (for testing purposes)
pub mod api;
pub mod app;
pub mod config;

#[macro_use]
pub mod logging;

pub mod poller;
pub mod session;
pub mod terminal;
pub mod ui;
