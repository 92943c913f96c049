pub mod autosave;
pub mod config;
pub mod counselor;
pub mod credentials;
pub mod draft;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod models;
pub mod questionnaire;
pub mod routes;
pub mod state;
pub mod validators;
pub mod views;

#[cfg(test)]
mod testing;
