//! Production [`Connector`] over `tokio-tungstenite`.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message as WsMessage},
    MaybeTlsStream, WebSocketStream,
};

use super::{Connector, FrameStream, InboundFrame, TransportError};

/// Opens plain `ws://` connections.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn FrameStream>, TransportError> {
        let (ws, _response) = connect_async(url).await.map_err(|e| TransportError::Connect {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(WsFrameStream { ws }))
    }
}

struct WsFrameStream {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FrameStream for WsFrameStream {
    async fn next_frame(&mut self) -> Option<Result<InboundFrame, TransportError>> {
        let frame = match self.ws.next().await? {
            Ok(WsMessage::Text(text)) => InboundFrame::Text(text),
            Ok(WsMessage::Binary(data)) => InboundFrame::Binary(data.len()),
            Ok(WsMessage::Close(_)) => InboundFrame::Close,
            Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_)) => InboundFrame::Control,
            Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => return None,
            Err(e) => return Some(Err(TransportError::Io(e.to_string()))),
        };
        Some(Ok(frame))
    }

    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.ws
            .send(WsMessage::Text(text))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.ws.close(None).await;
    }
}
