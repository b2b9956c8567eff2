use crate::{
    location::{LocationId, Radius},
    prelude::*,
};

/// Path of the nearby feed for a location, relative to the server root
pub fn nearby_path(id: &LocationId, radius: Radius) -> String {
    format!("/location/{id}/nearby?distance={radius}")
}

/// Something that can open a live nearby feed
pub trait FeedTransport: Send + Sync + 'static {
    type Connection: FeedConnection;

    /// Open a connection to the given feed path (see [nearby_path]). Resolving to `Ok`
    /// means the connection is established.
    fn connect(&self, path: &str) -> impl Future<Output = Result<Self::Connection>> + Send;
}

/// A single open feed connection
pub trait FeedConnection: Send + 'static {
    /// Wait for the next text frame.
    /// `None` means the remote closed the connection, `Some(Err(_))` is a transport error,
    /// both end the connection.
    fn next_frame(&mut self) -> impl Future<Output = Option<Result<String>>> + Send;

    /// Close the connection from our side
    fn close(self) -> impl Future<Output = ()> + Send;
}
