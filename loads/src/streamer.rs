//! Result streamers
//!
//! Every streamer writes one self-describing JSON record per event. A streamer never fails the
//! run: encoding or I/O problems are logged and the event is dropped.
use async_channel::{Receiver, Sender};
use loads_core::{ResultEvent, Streamer};
use std::io::{self, Write};
use std::sync::Mutex;
use tracing::{error, trace};

/// Newline-delimited JSON on standard output.
#[derive(Debug, Default)]
pub struct StdoutStreamer;

impl StdoutStreamer {
    pub fn new() -> Self {
        Self
    }
}

impl Streamer for StdoutStreamer {
    fn push(&self, event: &ResultEvent) {
        let Some(line) = encode(event) else {
            return;
        };
        let mut stdout = io::stdout().lock();
        if let Err(err) = writeln!(stdout, "{line}") {
            error!("Unable to write {} event: {err}", event.action);
        }
    }
}

/// Newline-delimited JSON on any writer.
pub struct WriterStreamer<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterStreamer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> Streamer for WriterStreamer<W> {
    fn push(&self, event: &ResultEvent) {
        let Some(line) = encode(event) else {
            return;
        };
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(err) = writeln!(writer, "{line}") {
            error!("Unable to write {} event: {err}", event.action);
        }
    }
}

/// Forwards events to an in-process consumer.
#[derive(Clone)]
pub struct ChannelStreamer {
    tx: Sender<ResultEvent>,
}

impl ChannelStreamer {
    pub fn unbounded() -> (Self, Receiver<ResultEvent>) {
        let (tx, rx) = async_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl Streamer for ChannelStreamer {
    fn push(&self, event: &ResultEvent) {
        if self.tx.try_send(event.clone()).is_err() {
            trace!("Event receiver dropped; discarding {}", event.action);
        }
    }
}

fn encode(event: &ResultEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(line) => Some(line),
        Err(err) => {
            error!("Unable to encode {} event: {err}", event.action);
            None
        }
    }
}
