use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

const MAX_TOPIC_LENGTH: usize = 249;

static TOPIC_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").unwrap());

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TopicError {
    #[error("topic set is empty")]
    Empty,
    #[error("invalid topic name `{0}`")]
    InvalidName(String),
    #[error("invalid topic pattern `{0}`: {1}")]
    InvalidPattern(String, String),
}

/// 購読するトピック名を検証する。
///
/// `^`で始まる名前はlibrdkafkaの正規表現購読として扱う。
pub fn validate(topics: &[&str]) -> Result<(), TopicError> {
    if topics.is_empty() {
        return Err(TopicError::Empty);
    }
    for topic in topics {
        if topic.starts_with('^') {
            if let Err(e) = Regex::new(topic) {
                return Err(TopicError::InvalidPattern(topic.to_string(), e.to_string()));
            }
            continue;
        }
        if topic.len() > MAX_TOPIC_LENGTH
            || *topic == "."
            || *topic == ".."
            || !TOPIC_NAME.is_match(topic)
        {
            return Err(TopicError::InvalidName(topic.to_string()));
        }
    }
    Ok(())
}
