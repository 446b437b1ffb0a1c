pub(crate) mod config;
pub mod consumer;
pub mod message;
pub mod poll;
pub mod topic;

pub use consumer::{IConsumer, KafkaConsumer};
pub use message::{Message, TopicPartition};
pub use poll::{PollError, PollErrorKind, PollOutcome};
