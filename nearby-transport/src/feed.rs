use anyhow::anyhow;
use futures::StreamExt;
use log::{debug, warn};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use nearby_logic::{FeedConnection, FeedTransport, prelude::*};

use crate::server::ServerEndpoint;

/// Opens nearby feeds over WebSockets
pub struct WebSocketFeed {
    endpoint: ServerEndpoint,
}

impl WebSocketFeed {
    pub fn new(endpoint: ServerEndpoint) -> Self {
        Self { endpoint }
    }
}

impl FeedTransport for WebSocketFeed {
    type Connection = WebSocketConnection;

    async fn connect(&self, path: &str) -> Result<WebSocketConnection> {
        let url = self.endpoint.ws_url(path);
        let (socket, response) = connect_async(url.as_str())
            .await
            .with_context(|| format!("Failed to connect to {url}"))?;
        debug!("Connected to {url} ({})", response.status());
        Ok(WebSocketConnection { socket })
    }
}

pub struct WebSocketConnection {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl FeedConnection for WebSocketConnection {
    async fn next_frame(&mut self) -> Option<Result<String>> {
        loop {
            let msg = match self.socket.next().await? {
                Ok(msg) => msg,
                Err(why) => return Some(Err(anyhow!("WebSocket error: {why}"))),
            };

            match msg {
                Message::Text(text) => return Some(Ok(text.as_str().to_owned())),
                Message::Close(frame) => {
                    debug!("Server closed nearby feed: {frame:?}");
                    return None;
                }
                Message::Binary(_) => warn!("Ignoring binary frame on nearby feed"),
                // Pings are answered by tungstenite on the next read
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }

    async fn close(mut self) {
        if let Err(why) = self.socket.close(None).await {
            debug!("Error closing nearby feed: {why}");
        }
    }
}
