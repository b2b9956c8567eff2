mod feed;
mod geocode;
mod persistence;
mod server;

pub use feed::{WebSocketConnection, WebSocketFeed};
pub use geocode::GoogleGeocoder;
pub use persistence::HttpPersistence;
pub use server::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SECURE, ServerEndpoint};
