//! ランナーの設定。
//!
//! [Configuration]は名前付きオプションと文字列値の不変なマッピングで、
//! [Configuration::settings]で検証済みの[ConsumerSettings]に変換される。
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const BROKER_ADDRESS: &str = "brokerAddress";
pub const TOPIC: &str = "topic";
pub const GROUP_IDENTIFIER: &str = "groupIdentifier";
pub const START_POSITION: &str = "startPosition";
pub const POLL_TIMEOUT_MS: &str = "pollTimeoutMs";
pub const MAX_CONSECUTIVE_FAILURES: &str = "maxConsecutiveFailures";

pub const ENV_BOOTSTRAP_SERVERS: &str = "KAFKA_BOOTSTRAP_SERVERS";
pub const ENV_TOPIC: &str = "KAFKA_TOPIC";
pub const ENV_GROUP_ID: &str = "KAFKA_GROUP_ID";
pub const ENV_AUTO_OFFSET_RESET: &str = "KAFKA_AUTO_OFFSET_RESET";
pub const ENV_POLL_TIMEOUT_MS: &str = "KAFKA_POLL_TIMEOUT_MS";
pub const ENV_MAX_CONSECUTIVE_FAILURES: &str = "KAFKA_MAX_CONSECUTIVE_FAILURES";

pub const DEFAULT_GROUP_ID: &str = "consumer-runner";
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// rdkafkaのプロパティのうち、ランナー自身が管理するもの
pub const RESERVED_PROPERTIES: &[&str] = &[
    "bootstrap.servers",
    "group.id",
    "auto.offset.reset",
    "enable.auto.commit",
];

const ENV_MAPPING: &[(&str, &str)] = &[
    (ENV_BOOTSTRAP_SERVERS, BROKER_ADDRESS),
    (ENV_TOPIC, TOPIC),
    (ENV_GROUP_ID, GROUP_IDENTIFIER),
    (ENV_AUTO_OFFSET_RESET, START_POSITION),
    (ENV_POLL_TIMEOUT_MS, POLL_TIMEOUT_MS),
    (ENV_MAX_CONSECUTIVE_FAILURES, MAX_CONSECUTIVE_FAILURES),
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("required option `{0}` is missing or empty")]
    Missing(&'static str),
    #[error("invalid start position `{0}` (expected `earliest` or `latest`)")]
    InvalidStartPosition(String),
    #[error("invalid value `{value}` for `{key}`")]
    InvalidNumber { key: &'static str, value: String },
    #[error("poll timeout must be greater than zero")]
    InvalidPollTimeout,
    #[error("property `{0}` is managed by the runner and cannot be overridden")]
    ReservedProperty(String),
}

/// 新しいコンシューマグループが読み込みを開始する位置
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartPosition {
    Earliest,
    Latest,
}

impl StartPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartPosition::Earliest => "earliest",
            StartPosition::Latest => "latest",
        }
    }
}

impl Default for StartPosition {
    fn default() -> Self {
        StartPosition::Earliest
    }
}

impl fmt::Display for StartPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StartPosition {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "earliest" => Ok(StartPosition::Earliest),
            "latest" => Ok(StartPosition::Latest),
            _ => Err(ConfigurationError::InvalidStartPosition(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Configuration {
    options: BTreeMap<String, String>,
    properties: BTreeMap<String, String>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.options.insert(key.into(), value.into());
        self
    }

    /// rdkafkaにそのまま渡す追加プロパティを設定する。
    pub fn property<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(|v| v.as_str())
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        ENV_MAPPING
            .iter()
            .fold(Self::new(), |config, (name, key)| match lookup(name) {
                Some(value) => config.set(*key, value),
                None => config,
            })
    }

    /// 設定値を検証し、[ConsumerSettings]を生成する。
    ///
    /// `brokerAddress`と`topic`が存在しない、もしくは空の場合は[ConfigurationError::Missing]を返す。
    pub fn settings(&self) -> Result<ConsumerSettings, ConfigurationError> {
        let broker_address = self
            .required(BROKER_ADDRESS)
            .ok_or(ConfigurationError::Missing(BROKER_ADDRESS))?;

        let topics = self
            .required(TOPIC)
            .map(split_topics)
            .filter(|topics| !topics.is_empty())
            .ok_or(ConfigurationError::Missing(TOPIC))?;

        let group_id = self
            .required(GROUP_IDENTIFIER)
            .unwrap_or(DEFAULT_GROUP_ID)
            .to_string();

        let start_position = match self.required(START_POSITION) {
            Some(value) => value.parse()?,
            None => StartPosition::default(),
        };

        let poll_timeout = match self.required(POLL_TIMEOUT_MS) {
            Some(value) => match parse_number(POLL_TIMEOUT_MS, value)? {
                0 => return Err(ConfigurationError::InvalidPollTimeout),
                ms => Duration::from_millis(ms as u64),
            },
            None => DEFAULT_POLL_TIMEOUT,
        };

        let max_consecutive_failures = match self.required(MAX_CONSECUTIVE_FAILURES) {
            Some(value) => parse_number(MAX_CONSECUTIVE_FAILURES, value)?,
            None => 0,
        };

        if let Some(key) = self
            .properties
            .keys()
            .find(|k| RESERVED_PROPERTIES.contains(&k.as_str()))
        {
            return Err(ConfigurationError::ReservedProperty(key.clone()));
        }

        Ok(ConsumerSettings {
            broker_address: broker_address.to_string(),
            topics,
            group_id,
            start_position,
            poll_timeout,
            max_consecutive_failures,
            properties: self.properties.clone(),
        })
    }

    fn required(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }
}

/// 検証済みの設定
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsumerSettings {
    pub broker_address: String,
    pub topics: Vec<String>,
    pub group_id: String,
    pub start_position: StartPosition,
    pub poll_timeout: Duration,
    /// 0の場合はエスカレーションしない
    pub max_consecutive_failures: usize,
    pub properties: BTreeMap<String, String>,
}

fn split_topics(value: &str) -> Vec<String> {
    let mut topics: Vec<String> = vec![];
    for topic in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !topics.iter().any(|t| t == topic) {
            topics.push(topic.to_string());
        }
    }
    topics
}

fn parse_number(key: &'static str, value: &str) -> Result<usize, ConfigurationError> {
    value
        .parse::<usize>()
        .map_err(|_| ConfigurationError::InvalidNumber {
            key,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base() -> Configuration {
        Configuration::new()
            .set(BROKER_ADDRESS, "localhost:9092")
            .set(TOPIC, "orders")
    }

    #[test]
    fn test_defaults() {
        let settings = base().settings().unwrap();
        assert_eq!(settings.broker_address, "localhost:9092");
        assert_eq!(settings.topics, vec!["orders".to_string()]);
        assert_eq!(settings.group_id, DEFAULT_GROUP_ID);
        assert_eq!(settings.start_position, StartPosition::Earliest);
        assert_eq!(settings.poll_timeout, Duration::from_secs(1));
        assert_eq!(settings.max_consecutive_failures, 0);
    }

    #[test]
    fn test_missing_required() {
        let config = Configuration::new().set(TOPIC, "orders");
        assert_eq!(
            config.settings(),
            Err(ConfigurationError::Missing(BROKER_ADDRESS))
        );

        let config = Configuration::new().set(BROKER_ADDRESS, "localhost:9092");
        assert_eq!(config.settings(), Err(ConfigurationError::Missing(TOPIC)));

        let config = base().set(BROKER_ADDRESS, "   ");
        assert_eq!(
            config.settings(),
            Err(ConfigurationError::Missing(BROKER_ADDRESS))
        );

        let config = base().set(TOPIC, " , ,");
        assert_eq!(config.settings(), Err(ConfigurationError::Missing(TOPIC)));
    }

    #[test]
    fn test_topics_are_split_and_deduplicated() {
        let settings = base().set(TOPIC, "orders, payments,orders,").settings().unwrap();
        assert_eq!(settings.topics, vec!["orders", "payments"]);
    }

    #[test]
    fn test_start_position() {
        assert_eq!("LATEST".parse::<StartPosition>(), Ok(StartPosition::Latest));
        assert_eq!(" earliest ".parse::<StartPosition>(), Ok(StartPosition::Earliest));
        let config = base().set(START_POSITION, "middle");
        assert_eq!(
            config.settings(),
            Err(ConfigurationError::InvalidStartPosition("middle".to_string()))
        );
    }

    #[test]
    fn test_numbers() {
        let settings = base()
            .set(POLL_TIMEOUT_MS, "250")
            .set(MAX_CONSECUTIVE_FAILURES, "5")
            .settings()
            .unwrap();
        assert_eq!(settings.poll_timeout, Duration::from_millis(250));
        assert_eq!(settings.max_consecutive_failures, 5);

        assert_eq!(
            base().set(POLL_TIMEOUT_MS, "0").settings(),
            Err(ConfigurationError::InvalidPollTimeout)
        );
        assert_eq!(
            base().set(MAX_CONSECUTIVE_FAILURES, "-1").settings(),
            Err(ConfigurationError::InvalidNumber {
                key: MAX_CONSECUTIVE_FAILURES,
                value: "-1".to_string()
            })
        );
    }

    #[test]
    fn test_reserved_property() {
        let config = base().property("group.id", "other");
        assert_eq!(
            config.settings(),
            Err(ConfigurationError::ReservedProperty("group.id".to_string()))
        );
        assert_eq!(
            base().property("enable.auto.commit", "false").settings(),
            Err(ConfigurationError::ReservedProperty(
                "enable.auto.commit".to_string()
            ))
        );
        let settings = base()
            .property("session.timeout.ms", "6000")
            .settings()
            .unwrap();
        assert_eq!(
            settings.properties.get("session.timeout.ms").map(String::as_str),
            Some("6000")
        );
    }

    #[test]
    fn test_from_lookup() {
        let env: HashMap<&str, &str> = [
            (ENV_BOOTSTRAP_SERVERS, "broker:9092"),
            (ENV_TOPIC, "orders"),
            (ENV_AUTO_OFFSET_RESET, "latest"),
        ]
        .into_iter()
        .collect();
        let config = Configuration::from_lookup(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(config.get(BROKER_ADDRESS), Some("broker:9092"));
        assert_eq!(config.get(GROUP_IDENTIFIER), None);
        let settings = config.settings().unwrap();
        assert_eq!(settings.start_position, StartPosition::Latest);
    }

    #[test]
    fn test_from_env() {
        std::env::set_var(ENV_BOOTSTRAP_SERVERS, "env-broker:9092");
        std::env::set_var(ENV_TOPIC, "orders,payments");
        let config = Configuration::from_env();
        std::env::remove_var(ENV_BOOTSTRAP_SERVERS);
        std::env::remove_var(ENV_TOPIC);

        assert_eq!(config.get(BROKER_ADDRESS), Some("env-broker:9092"));
        let settings = config.settings().unwrap();
        assert_eq!(settings.topics, vec!["orders", "payments"]);
    }
}
