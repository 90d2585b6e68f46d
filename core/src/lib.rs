pub mod db;
pub mod models;
pub mod profile;
pub mod query;
pub mod remote;
pub mod store;
pub mod sync;
