pub mod app;
pub mod config;
pub mod error;
pub mod password;
pub mod seed;
pub mod state;
