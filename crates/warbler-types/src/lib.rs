//! Wire types shared by the HTTP handlers and their tests: submitted forms,
//! JSON view models and error bodies.

pub mod api;
pub mod models;
