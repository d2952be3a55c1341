// Library for tests to access modules

pub mod analytics_repo;
pub mod config;
pub mod error;
pub mod models;
pub mod panel_repo;
pub mod presence;
pub mod rcon_client;
pub mod routes;
pub mod staff;
pub mod version;
