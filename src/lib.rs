pub mod db;
pub mod middleware;
pub mod orm;
pub mod reconcile;
pub mod session;
pub mod user;
pub mod web;
