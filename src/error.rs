use crate::config::ConfigurationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("ConfigurationError: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("ConnectionError: {0}")]
    Connection(String),
    #[error("SubscriptionError: {0}")]
    Subscription(String),
    #[error("Consumer is not subscribed to any topic.")]
    NotSubscribed,
    #[error("Consumer has already been stopped.")]
    Stopped,
    #[error("SinkError: {0}")]
    Sink(#[from] std::io::Error),
    #[error("Gave up after {0} consecutive poll failures.")]
    FailureLimit(usize),
}

pub type RunnerResult<T> = Result<T, RunnerError>;
