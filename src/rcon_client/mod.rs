// Remote console (RCON) client: connect -> authenticate -> one command -> close.
// Sessions are never pooled; every request opens and closes its own.

pub mod packet;

use crate::config::ConsoleConfig;
use crate::error::{AggregatorError, Source};
use bytes::BytesMut;
use packet::{
    AUTH_FAILED_ID, Packet, TYPE_AUTH_RESPONSE, TYPE_COMMAND, TYPE_LOGIN, TYPE_RESPONSE,
};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, instrument};

pub struct RconSession {
    stream: TcpStream,
    buf: BytesMut,
    next_id: i32,
    target: String,
    timeout: Duration,
}

impl RconSession {
    /// Open a TCP connection within `timeout`.
    pub async fn connect(
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Self, AggregatorError> {
        let target = format!("{}:{}", host, port);
        let stream = match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(s)) => s,
            Ok(Err(e)) => return Err(AggregatorError::unavailable(Source::Console, target, e)),
            Err(_) => {
                return Err(AggregatorError::Timeout {
                    upstream: Source::Console,
                    target,
                });
            }
        };
        debug!(addr = %target, "console connected");
        Ok(Self {
            stream,
            buf: BytesMut::with_capacity(packet::MAX_LEN),
            next_id: 1,
            target,
            timeout,
        })
    }

    pub async fn authenticate(&mut self, password: &str) -> Result<(), AggregatorError> {
        let id = self.send(TYPE_LOGIN, password).await?;
        let target = self.target.clone();
        bounded(self.timeout, &target, async {
            loop {
                let reply = self.read_packet().await?;
                if reply.id == AUTH_FAILED_ID {
                    return Err(AggregatorError::Authentication {
                        target: self.target.clone(),
                    });
                }
                // Some servers send an empty response packet ahead of the auth reply.
                if reply.id == id && reply.kind == TYPE_AUTH_RESPONSE {
                    return Ok(());
                }
            }
        })
        .await
    }

    /// Run one command and return the raw reply text.
    ///
    /// Long replies arrive split over several packets. An empty response-type packet is
    /// sent right after the command; the server answers it only after the last fragment,
    /// so its echo marks the end of the reply.
    pub async fn execute(&mut self, command: &str) -> Result<String, AggregatorError> {
        let id = self.send(TYPE_COMMAND, command).await?;
        let end_marker = self.send(TYPE_RESPONSE, "").await?;
        let target = self.target.clone();
        bounded(self.timeout, &target, async {
            let mut body = String::new();
            loop {
                let reply = self.read_packet().await?;
                if reply.id == end_marker {
                    return Ok(body);
                }
                if reply.id == id {
                    body.push_str(&reply.body);
                }
            }
        })
        .await
    }

    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!(addr = %self.target, error = %e, "console shutdown failed");
        }
    }

    async fn send(&mut self, kind: i32, body: &str) -> Result<i32, AggregatorError> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        let frame = Packet::new(id, kind, body)
            .encode()
            .map_err(|e| AggregatorError::unavailable(Source::Console, self.target.clone(), e))?;
        let target = self.target.clone();
        bounded(self.timeout, &target, async {
            self.stream
                .write_all(&frame)
                .await
                .map_err(|e| AggregatorError::unavailable(Source::Console, target.as_str(), e))
        })
        .await?;
        Ok(id)
    }

    async fn read_packet(&mut self) -> Result<Packet, AggregatorError> {
        loop {
            match Packet::decode(&mut self.buf) {
                Ok(Some(p)) => return Ok(p),
                Ok(None) => {}
                Err(e) => {
                    return Err(AggregatorError::unavailable(
                        Source::Console,
                        self.target.clone(),
                        e,
                    ));
                }
            }
            let n = self.stream.read_buf(&mut self.buf).await.map_err(|e| {
                AggregatorError::unavailable(Source::Console, self.target.clone(), e)
            })?;
            if n == 0 {
                return Err(AggregatorError::unavailable(
                    Source::Console,
                    self.target.clone(),
                    "connection closed by peer",
                ));
            }
        }
    }
}

/// Bound one protocol step so a silent peer cannot stall the request.
async fn bounded<T, F>(timeout: Duration, target: &str, fut: F) -> Result<T, AggregatorError>
where
    F: Future<Output = Result<T, AggregatorError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(r) => r,
        Err(_) => Err(AggregatorError::Timeout {
            upstream: Source::Console,
            target: target.to_string(),
        }),
    }
}

/// Full console round trip. The session is closed on every path.
#[instrument(skip(config, password), fields(repo = "console", operation = "query", addr = %config.target()))]
pub async fn query(
    config: &ConsoleConfig,
    password: &str,
    command: &str,
) -> Result<String, AggregatorError> {
    let mut session = RconSession::connect(&config.host, config.port, config.timeout()).await?;
    let result = async {
        session.authenticate(password).await?;
        session.execute(command).await
    }
    .await;
    session.close().await;
    result
}
