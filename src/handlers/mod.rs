// src/handlers/mod.rs

pub mod attempt;
pub mod docs;
pub mod option;
pub mod question;
pub mod quiz;
