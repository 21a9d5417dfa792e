pub mod auth;
pub mod error;
pub mod feed;
pub mod forms;
pub mod likes;
pub mod messages;
pub mod routes;
pub mod session;
pub mod state;
pub mod users;
mod views;

pub use routes::router;
pub use state::{AppState, AppStateInner};
