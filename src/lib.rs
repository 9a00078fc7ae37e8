pub mod adapters;
pub mod application;
pub mod client;
pub mod domain;
pub mod services;
