#![allow(dead_code)]

use anyhow::Result;
use consumer_runner::prelude::*;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use rdkafka::producer::BaseProducer;
use rdkafka::ClientConfig;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

pub const BOOTSTRAP_SERVERS: &str = "localhost:9092";

pub fn create_producer() -> BaseProducer {
    ClientConfig::new()
        .set("bootstrap.servers", BOOTSTRAP_SERVERS)
        .create()
        .unwrap()
}

/// Poll outcomes are pushed by the test thread through a channel.
pub struct ChannelConsumer {
    outcomes: Receiver<PollOutcome>,
    closes: Arc<AtomicUsize>,
}

impl ChannelConsumer {
    pub fn new() -> (Self, Sender<PollOutcome>, Arc<AtomicUsize>) {
        let (tx, rx) = channel::unbounded();
        let closes = Arc::new(AtomicUsize::new(0));
        let consumer = Self {
            outcomes: rx,
            closes: closes.clone(),
        };
        (consumer, tx, closes)
    }
}

impl IConsumer for ChannelConsumer {
    fn subscribe(&self, _topics: &[&str]) -> Result<()> {
        Ok(())
    }

    fn poll(&self, timeout: Duration) -> PollOutcome {
        match self.outcomes.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => PollOutcome::TimedOut,
            Err(RecvTimeoutError::Disconnected) => {
                sleep(timeout);
                PollOutcome::TimedOut
            }
        }
    }

    fn close(self: Box<Self>) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Record {
    Message(Message),
    Error(PollError),
}

/// Forwards every written record to the test thread.
pub struct ChannelSink(pub Sender<Record>);

impl ChannelSink {
    pub fn new() -> (Self, Receiver<Record>) {
        let (tx, rx) = channel::unbounded();
        (Self(tx), rx)
    }
}

impl ISink for ChannelSink {
    fn write_message(&mut self, msg: &Message) -> io::Result<()> {
        self.0
            .send(Record::Message(msg.clone()))
            .map_err(|e| io::Error::new(io::ErrorKind::BrokenPipe, e.to_string()))
    }

    fn write_error(&mut self, error: &PollError) -> io::Result<()> {
        self.0
            .send(Record::Error(error.clone()))
            .map_err(|e| io::Error::new(io::ErrorKind::BrokenPipe, e.to_string()))
    }
}
