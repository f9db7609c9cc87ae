//! Content scheduler for a hotel lobby display

pub mod api;
pub mod clock;
pub mod config;
pub mod content;
pub mod datasource;
pub mod display;
pub mod error;
pub mod featured;
pub mod fetch;
pub mod layout;
pub mod notify;
pub mod refresh;
pub mod rotation;
pub mod settings;
pub mod store;
pub mod weather;
