pub mod adapters;
pub mod app_config;
pub mod commands;
pub mod domain;
pub mod http;
pub mod ports;
pub mod session;
