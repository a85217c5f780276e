pub mod api;
pub mod bot;
pub mod commands;
pub mod config;
pub mod dataset;
pub mod handlers;
pub mod quiz;
pub mod session;
pub mod state;
pub mod store;
