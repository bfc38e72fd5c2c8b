//! Client side: drive a running logger and feed it samples.

use anyhow::{Context, Result};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::pin::Pin;
use std::time::Duration;
use tmq::{dealer, publish, Multipart};

use crate::command::Reply;
use crate::transport::{frames_to_multipart, multipart_to_frames, ZmqContext};
use crate::wire;

type BoxedStream = Pin<Box<dyn Stream<Item = Result<Multipart, tmq::TmqError>> + Send>>;
type BoxedSink = Pin<Box<dyn Sink<Multipart, Error = tmq::TmqError> + Send>>;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// DEALER connection to the logger's rpc port.
pub struct LoggerClient {
    #[allow(dead_code)]
    context: ZmqContext,
    tx: BoxedSink,
    rx: BoxedStream,
    timeout: Duration,
}

impl LoggerClient {
    /// Connect (lazy - ZMQ connects once the logger is up).
    pub fn connect(endpoint: &str, timeout: Duration) -> Result<Self> {
        let context = ZmqContext::new();
        let socket = dealer(&context)
            .set_linger(0)
            .connect(endpoint)
            .with_context(|| format!("failed to connect to {}", endpoint))?;
        let (tx, rx) = socket.split();

        Ok(Self {
            context,
            tx: Box::pin(tx),
            rx: Box::pin(rx),
            timeout,
        })
    }

    /// Send raw tokens and wait for the status reply.
    pub async fn send<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<Reply> {
        self.tx
            .send(frames_to_multipart(wire::encode_request(tokens)))
            .await
            .context("failed to send command")?;

        let mp = tokio::time::timeout(self.timeout, self.rx.next())
            .await
            .with_context(|| format!("no reply within {:?}", self.timeout))?
            .context("rpc socket closed")?
            .context("failed to receive reply")?;

        wire::decode_reply(&multipart_to_frames(mp))
    }

    pub async fn record<S: AsRef<str>>(&mut self, columns: &[S]) -> Result<Reply> {
        let mut tokens = vec!["record"];
        tokens.extend(columns.iter().map(|c| c.as_ref()));
        self.send(tokens.as_slice()).await
    }

    pub async fn quit(&mut self) -> Result<Reply> {
        self.send(&["quit"]).await
    }
}

/// PUB connection to the logger's data port.
pub struct SamplePublisher {
    #[allow(dead_code)]
    context: ZmqContext,
    tx: BoxedSink,
}

impl SamplePublisher {
    pub fn connect(endpoint: &str) -> Result<Self> {
        let context = ZmqContext::new();
        let socket = publish(&context)
            .set_linger(0)
            .connect(endpoint)
            .with_context(|| format!("failed to connect to {}", endpoint))?;

        Ok(Self {
            context,
            tx: Box::pin(socket),
        })
    }

    /// Publish one sample vector. Dropped by ZMQ if nobody is subscribed yet.
    pub async fn publish(&mut self, values: &[f64]) -> Result<()> {
        let data = wire::encode_sample(values)?;
        self.tx
            .send(frames_to_multipart(vec![data]))
            .await
            .context("failed to publish sample")
    }
}
