pub mod app_config;
pub mod auth;
pub mod complaint;
pub mod constants;
pub mod db;
pub mod error;
pub mod middleware;
pub mod orm;
pub mod pagination;
pub mod permission;
pub mod session;
pub mod user;
pub mod web;
