pub mod app_config;
pub mod catalog;
pub mod comment;
pub mod db;
pub mod lesson;
pub mod middleware;
pub mod orm;
pub mod serializer;
pub mod session;
pub mod user;
pub mod web;
