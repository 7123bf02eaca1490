//! Coffre server: registration and login, encrypted spreadsheet
//! uploads with a placeholder analysis pass, and an age-based
//! retention sweep over the object store.

pub mod analysis;
pub mod api;
pub mod auth;
pub mod config;
pub mod files;
pub mod registry;
pub mod retention;
