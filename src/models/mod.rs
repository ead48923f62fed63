// src/models/mod.rs

pub mod analytics;
pub mod course;
pub mod question;
pub mod submission;
pub mod user;
