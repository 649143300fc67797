pub mod config;
pub mod dates;
pub mod db;
pub mod environment;
pub mod errors;
pub mod io;
pub mod routes;
pub mod store;
pub mod story;
pub mod upload;
pub mod urls;
