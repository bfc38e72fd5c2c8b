//! ZMQ sockets for the logger
//!
//! The logger binds both of its ports so publishers and controllers can come
//! and go:
//! - data port: SUB, subscribed to everything, receives sample vectors
//! - rpc port: ROUTER, receives commands and sends one reply per request

use anyhow::{Context, Result};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::pin::Pin;
use tmq::{router, subscribe, Multipart};

use crate::wire::Frames;

pub type ZmqContext = zmq::Context;

type BoxedStream = Pin<Box<dyn Stream<Item = Result<Multipart, tmq::TmqError>> + Send>>;
type BoxedSink = Pin<Box<dyn Sink<Multipart, Error = tmq::TmqError> + Send>>;

/// Convert tmq Multipart to raw frames
pub fn multipart_to_frames(mp: Multipart) -> Frames {
    mp.into_iter().map(|msg| msg.to_vec()).collect()
}

/// Convert raw frames to tmq Multipart
pub fn frames_to_multipart(frames: Frames) -> Multipart {
    frames.into()
}

/// Bound SUB socket for sample vectors.
pub struct SampleSubscriber {
    stream: BoxedStream,
}

impl SampleSubscriber {
    pub fn bind(context: &ZmqContext, endpoint: &str) -> Result<Self> {
        // Subscribe to "" for all messages
        let sub = subscribe(context)
            .set_linger(0)
            .bind(endpoint)
            .with_context(|| format!("failed to bind data socket to {}", endpoint))?
            .subscribe(b"")
            .context("failed to subscribe data socket")?;

        Ok(Self {
            stream: Box::pin(sub),
        })
    }

    /// Next raw message. `None` once the socket stream has ended.
    pub async fn recv(&mut self) -> Option<Result<Frames>> {
        let item = self.stream.next().await?;
        Some(
            item.map(multipart_to_frames)
                .context("failed to receive sample"),
        )
    }
}

/// Bound ROUTER socket for commands.
pub struct CommandServer {
    rx: BoxedStream,
    tx: BoxedSink,
}

impl CommandServer {
    pub fn bind(context: &ZmqContext, endpoint: &str) -> Result<Self> {
        let socket = router(context)
            .set_linger(0)
            .bind(endpoint)
            .with_context(|| format!("failed to bind rpc socket to {}", endpoint))?;
        let (tx, rx) = socket.split();

        Ok(Self {
            rx: Box::pin(rx),
            tx: Box::pin(tx),
        })
    }

    /// Next request, envelope included. `None` once the socket stream has ended.
    pub async fn recv(&mut self) -> Option<Result<Frames>> {
        let item = self.rx.next().await?;
        Some(
            item.map(multipart_to_frames)
                .context("failed to receive command"),
        )
    }

    /// Send a reply; `frames` must start with the request's envelope.
    pub async fn reply(&mut self, frames: Frames) -> Result<()> {
        self.tx
            .send(frames_to_multipart(frames))
            .await
            .context("failed to send reply")
    }
}
