//! The logger process: one task owning the session, driven by a select loop.
//!
//! Ticks, incoming samples, commands and shutdown are arms of a single
//! `tokio::select!`, so they never run concurrently and the session needs no
//! lock. Samples only land in the [`LatestSample`] slot; the next tick takes
//! whatever is newest.

use anyhow::Result;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use ticklog_conf::LoggerSettings;

use crate::clock::{Clock, SystemClock};
use crate::command::{self, Command, Response};
use crate::error::SessionError;
use crate::poll::{self, LatestSample, Tick};
use crate::session::RecordingSession;
use crate::transport::{CommandServer, SampleSubscriber, ZmqContext};
use crate::wire::{self, Frames};

pub struct Logger<C: Clock = SystemClock> {
    settings: LoggerSettings,
    session: RecordingSession,
    latest: LatestSample,
    clock: C,
}

impl Logger<SystemClock> {
    pub fn new(settings: LoggerSettings) -> Self {
        Self::with_clock(settings, SystemClock)
    }
}

impl<C: Clock> Logger<C> {
    pub fn with_clock(settings: LoggerSettings, clock: C) -> Self {
        let session = RecordingSession::new(settings.output_dir.clone());
        Self {
            settings,
            session,
            latest: LatestSample::default(),
            clock,
        }
    }

    pub fn settings(&self) -> &LoggerSettings {
        &self.settings
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    /// Decode a raw data-port message into the sample slot.
    pub fn receive_sample(&mut self, frames: &[Vec<u8>]) {
        match wire::decode_sample(frames) {
            Ok(values) => self.latest.store(values),
            Err(e) => warn!("[{}] dropping malformed sample: {:#}", self.settings.data_port, e),
        }
    }

    /// One polling period.
    pub fn tick(&mut self) -> Result<Tick, SessionError> {
        let result = poll::tick(&mut self.session, &mut self.latest, &self.clock);
        if let Ok(Tick::Stored { .. }) = result {
            let replaced = self.latest.take_replaced();
            if replaced > 0 {
                debug!(
                    "[{}] {} older sample(s) replaced since the last row",
                    self.settings.data_port, replaced
                );
            }
        }
        result
    }

    /// Handle one request's tokens.
    pub fn respond<S: AsRef<str>>(&mut self, tokens: &[S]) -> Response {
        let command = Command::parse(tokens);
        debug!("[{}] command: {:?}", self.settings.rpc_port, command);

        let response = command::handle(&mut self.session, command, &self.clock);
        if !response.handled {
            warn!("[{}] command rejected", self.settings.rpc_port);
        }
        response
    }

    /// Handle a raw ROUTER message and build the reply frames.
    fn respond_raw(&mut self, frames: Frames) -> Result<Frames> {
        let (envelope, tokens) = wire::split_request(frames)?;
        let response = self.respond(&tokens);
        Ok(wire::encode_reply(envelope, response.reply))
    }

    /// Finalize any open session.
    pub fn shutdown(&mut self) {
        self.session.shutdown();
    }

    /// Bind both ports and run until `shutdown_rx` fires.
    pub async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let context = ZmqContext::new();
        let mut samples = SampleSubscriber::bind(&context, &self.settings.data_endpoint)?;
        info!(
            "data port {} bound to {}",
            self.settings.data_port, self.settings.data_endpoint
        );
        let mut commands = CommandServer::bind(&context, &self.settings.rpc_endpoint)?;
        info!(
            "rpc port {} bound to {}",
            self.settings.rpc_port, self.settings.rpc_endpoint
        );

        let mut ticker = interval(self.settings.sampling_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            "{} ready, sampling every {:?}",
            self.settings.name, self.settings.sampling_period
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Failures are already logged by the tick itself.
                    let _ = self.tick();
                }

                Some(result) = samples.recv() => {
                    match result {
                        Ok(frames) => self.receive_sample(&frames),
                        Err(e) => error!("{:#}", e),
                    }
                }

                Some(result) = commands.recv() => {
                    let reply = match result.and_then(|frames| self.respond_raw(frames)) {
                        Ok(reply) => reply,
                        Err(e) => {
                            // No envelope to answer to.
                            error!("{:#}", e);
                            continue;
                        }
                    };
                    if let Err(e) = commands.reply(reply).await {
                        error!("{:#}", e);
                    }
                }

                _ = shutdown_rx.recv() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        self.shutdown();
        info!("{} stopped", self.settings.name);
        Ok(())
    }
}
