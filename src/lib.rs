pub mod config;
pub mod decode;
pub mod error;
pub mod identity;
pub mod model;
pub mod security;
pub mod server;
pub mod service;
pub mod storage;
pub mod wire;
