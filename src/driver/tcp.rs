use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::domain::{BenchmarkConfig, Protocol, Target, TcpFraming};
use crate::engine::{CycleBytes, Failure};

use super::{ProtocolDriver, bounded, byte_len};

const READ_BUFFER_LEN: usize = 64 * 1024;
pub(crate) const EOF_MARKER: &[u8] = b"\r\n\r\n";
const LENGTH_HEADER_LEN: usize = 4;
/// Length-prefixed responses above this are rejected.
const MAX_FRAME_LEN: u64 = 16 * 1024 * 1024;

pub struct TcpDriver {
    config: Arc<BenchmarkConfig>,
    request: Vec<u8>,
    stream: Option<TcpStream>,
    buffer: Vec<u8>,
}

impl TcpDriver {
    #[must_use]
    pub fn new(config: Arc<BenchmarkConfig>) -> Self {
        let request = frame_request(config.tcp_framing, &config.payload);
        Self {
            config,
            request,
            stream: None,
            buffer: vec![0_u8; READ_BUFFER_LEN],
        }
    }
}

/// Wraps the payload for the configured framing.
pub(crate) fn frame_request(framing: TcpFraming, payload: &[u8]) -> Vec<u8> {
    match framing {
        TcpFraming::Raw => payload.to_vec(),
        TcpFraming::Eof => {
            let mut framed = Vec::with_capacity(payload.len().saturating_add(EOF_MARKER.len()));
            framed.extend_from_slice(payload);
            framed.extend_from_slice(EOF_MARKER);
            framed
        }
        TcpFraming::LengthPrefixed => {
            let len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
            let mut framed =
                Vec::with_capacity(payload.len().saturating_add(LENGTH_HEADER_LEN));
            framed.extend_from_slice(&len.to_be_bytes());
            framed.extend_from_slice(payload);
            framed
        }
    }
}

#[async_trait]
impl ProtocolDriver for TcpDriver {
    fn protocol(&self) -> Protocol {
        Protocol::Tcp
    }

    fn target(&self) -> &Target {
        &self.config.target
    }

    async fn connect(&mut self) -> Result<(), Failure> {
        let authority = self.config.target.authority();
        let stream = bounded(self.config.timeout, TcpStream::connect(authority.as_str()))
            .await
            .ok_or(Failure::ConnectTimeout)?
            .map_err(|err| Failure::from_connect_io(&err))?;
        if let Err(err) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY on {}: {}", authority, err);
        }
        self.stream = Some(stream);
        Ok(())
    }

    async fn cycle(&mut self) -> Result<CycleBytes, Failure> {
        let stream = self.stream.as_mut().ok_or_else(|| Failure::SendFailed {
            detail: "not connected".to_owned(),
        })?;
        stream
            .write_all(&self.request)
            .await
            .map_err(|err| Failure::SendFailed {
                detail: err.to_string(),
            })?;

        let received = match self.config.tcp_framing {
            TcpFraming::Raw => read_once(stream, &mut self.buffer).await?,
            TcpFraming::Eof => read_until_marker(stream, &mut self.buffer).await?,
            TcpFraming::LengthPrefixed => read_length_prefixed(stream).await?,
        };
        Ok(CycleBytes::new(byte_len(self.request.len()), received))
    }

    async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take()
            && let Err(err) = stream.shutdown().await
        {
            debug!("TCP shutdown failed: {}", err);
        }
    }
}

async fn read_once(stream: &mut TcpStream, buffer: &mut [u8]) -> Result<u64, Failure> {
    match stream.read(buffer).await {
        Ok(0) => Err(Failure::EmptyResponse),
        Ok(bytes) => Ok(byte_len(bytes)),
        Err(err) => Err(Failure::ReceiveFailed {
            detail: err.to_string(),
        }),
    }
}

async fn read_until_marker(stream: &mut TcpStream, buffer: &mut [u8]) -> Result<u64, Failure> {
    let mut total: u64 = 0;
    // Last bytes seen, so a marker split across reads is still found.
    let mut tail: Vec<u8> = Vec::with_capacity(EOF_MARKER.len().saturating_mul(2));
    loop {
        let bytes = stream
            .read(buffer)
            .await
            .map_err(|err| Failure::ReceiveFailed {
                detail: err.to_string(),
            })?;
        if bytes == 0 {
            return Err(if total == 0 {
                Failure::EmptyResponse
            } else {
                Failure::ReceiveFailed {
                    detail: "connection closed before end marker".to_owned(),
                }
            });
        }
        total = total.saturating_add(byte_len(bytes));
        if total > MAX_FRAME_LEN {
            return Err(Failure::ReceiveFailed {
                detail: format!("response exceeds {} bytes without end marker", MAX_FRAME_LEN),
            });
        }
        let chunk = buffer.get(..bytes).unwrap_or_default();
        tail.extend_from_slice(chunk);
        if tail.ends_with(EOF_MARKER) {
            return Ok(total);
        }
        let keep_from = tail.len().saturating_sub(EOF_MARKER.len());
        tail.drain(..keep_from);
    }
}

async fn read_length_prefixed(stream: &mut TcpStream) -> Result<u64, Failure> {
    let mut header = [0_u8; LENGTH_HEADER_LEN];
    if let Err(err) = stream.read_exact(&mut header).await {
        return Err(if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Failure::EmptyResponse
        } else {
            Failure::ReceiveFailed {
                detail: err.to_string(),
            }
        });
    }
    let body_len = u64::from(u32::from_be_bytes(header));
    if body_len > MAX_FRAME_LEN {
        return Err(Failure::ReceiveFailed {
            detail: format!("frame of {} bytes exceeds {} byte limit", body_len, MAX_FRAME_LEN),
        });
    }
    let copied = tokio::io::copy(&mut (&mut *stream).take(body_len), &mut tokio::io::sink())
        .await
        .map_err(|err| Failure::ReceiveFailed {
            detail: err.to_string(),
        })?;
    if copied < body_len {
        return Err(Failure::ReceiveFailed {
            detail: format!("connection closed after {} of {} body bytes", copied, body_len),
        });
    }
    Ok(byte_len(LENGTH_HEADER_LEN).saturating_add(body_len))
}
