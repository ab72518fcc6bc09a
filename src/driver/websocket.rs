use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::domain::{BenchmarkConfig, Protocol, Target};
use crate::engine::{CycleBytes, Failure};

use super::{ProtocolDriver, bounded, byte_len};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub(crate) const NOT_CONNECTED: &str = "Not connected to the server or the connection has been closed";

/// WebSocket driver: one upgraded connection per worker, one binary frame
/// pushed and one data frame awaited per cycle.
pub struct WebSocketDriver {
    config: Arc<BenchmarkConfig>,
    url: String,
    stream: Option<WsStream>,
}

impl WebSocketDriver {
    #[must_use]
    pub fn new(config: Arc<BenchmarkConfig>) -> Self {
        let url = config.target.url();
        Self {
            config,
            url,
            stream: None,
        }
    }
}

#[async_trait]
impl ProtocolDriver for WebSocketDriver {
    fn protocol(&self) -> Protocol {
        Protocol::WebSocket
    }

    fn target(&self) -> &Target {
        &self.config.target
    }

    async fn connect(&mut self) -> Result<(), Failure> {
        let (stream, _response) = match bounded(self.config.timeout, connect_async(self.url.as_str())).await {
            Some(Ok(connected)) => connected,
            Some(Err(WsError::Io(err))) => return Err(Failure::from_connect_io(&err)),
            Some(Err(err)) => {
                return Err(Failure::HandshakeFailed {
                    detail: err.to_string(),
                });
            }
            None => return Err(Failure::ConnectTimeout),
        };
        self.stream = Some(stream);
        Ok(())
    }

    async fn cycle(&mut self) -> Result<CycleBytes, Failure> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(Failure::ProtocolViolation {
                detail: NOT_CONNECTED.to_owned(),
            });
        };

        let payload = &self.config.payload;
        stream
            .send(Message::Binary(payload.to_vec()))
            .await
            .map_err(|err| send_failure(&err))?;
        let sent = byte_len(payload.len());

        match bounded(self.config.timeout, next_data_frame(stream)).await {
            Some(Ok(received)) => Ok(CycleBytes::new(sent, received)),
            Some(Err(failure)) => Err(failure),
            None => Err(Failure::RequestTimeout),
        }
    }

    async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            drop(bounded(self.config.timeout, stream.close(None)).await);
        }
    }
}

fn send_failure(err: &WsError) -> Failure {
    protocol_violation(err).unwrap_or_else(|| Failure::SendFailed {
        detail: err.to_string(),
    })
}

fn receive_failure(err: &WsError) -> Failure {
    protocol_violation(err).unwrap_or_else(|| Failure::ReceiveFailed {
        detail: err.to_string(),
    })
}

/// Frame-level errors that end the run, in either direction.
fn protocol_violation(err: &WsError) -> Option<Failure> {
    match err {
        WsError::ConnectionClosed
        | WsError::AlreadyClosed
        | WsError::Protocol(ProtocolError::SendAfterClosing) => Some(Failure::ProtocolViolation {
            detail: NOT_CONNECTED.to_owned(),
        }),
        WsError::Protocol(protocol) => Some(Failure::ProtocolViolation {
            detail: format!("Error OPCODE: {}", protocol),
        }),
        WsError::Io(_)
        | WsError::Tls(_)
        | WsError::Capacity(_)
        | WsError::WriteBufferFull(_)
        | WsError::Utf8
        | WsError::AttackAttempt
        | WsError::Url(_)
        | WsError::Http(_)
        | WsError::HttpFormat(_) => None,
    }
}

/// Reads until the next text or binary frame. Control frames are skipped.
async fn next_data_frame(stream: &mut WsStream) -> Result<u64, Failure> {
    while let Some(message) = stream.next().await {
        match message.map_err(|err| receive_failure(&err))? {
            Message::Text(text) => return Ok(byte_len(text.len())),
            Message::Binary(data) => return Ok(byte_len(data.len())),
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            Message::Close(_) => return Err(Failure::EmptyResponse),
        }
    }
    Err(Failure::EmptyResponse)
}
