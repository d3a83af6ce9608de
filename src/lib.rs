pub mod classify;
pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod nmap;
pub mod platform;
pub mod ui;
