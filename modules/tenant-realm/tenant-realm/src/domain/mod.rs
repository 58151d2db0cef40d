pub mod attributes;
pub mod clients;
pub mod error;
pub mod gateway;
pub mod listeners;
pub mod merge;
pub mod model;
pub mod ports;
pub mod realm;
pub mod roles;
pub mod secrets;
pub mod step;
pub mod token_cache;
