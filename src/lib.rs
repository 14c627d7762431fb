pub mod config;
pub mod core;
pub mod gateway;
pub mod log;
pub mod store;
pub mod sync;
pub mod ui;
