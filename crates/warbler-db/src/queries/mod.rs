mod messages;
mod sessions;
mod social;
mod users;

pub use messages::FEED_LIMIT;
