//! SeaORM entities, one module per table.

pub mod action;
pub mod categories;
pub mod comments;
pub mod courses;
pub mod lesson_tags;
pub mod lessons;
pub mod lifecycle;
pub mod likes;
pub mod ratings;
pub mod sessions;
pub mod tags;
pub mod users;
