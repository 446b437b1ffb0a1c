use crate::config::ConsumerSettings;
use rdkafka::config::FromClientConfig;
use rdkafka::consumer::BaseConsumer;
use rdkafka::error::KafkaResult;
use rdkafka::ClientConfig;

#[derive(Clone, Debug)]
pub(crate) struct ConsumerConfig {
    base_config: ClientConfig,
}

impl ConsumerConfig {
    pub(crate) fn new() -> ConsumerConfig {
        ConsumerConfig {
            base_config: ClientConfig::new(),
        }
    }

    pub(crate) fn from_settings(settings: &ConsumerSettings) -> ConsumerConfig {
        let mut config = ConsumerConfig::new();
        for (key, value) in settings.properties.iter() {
            config.set(key.as_str(), value.as_str());
        }
        config
            .set("bootstrap.servers", settings.broker_address.as_str())
            .set("group.id", settings.group_id.as_str())
            .set("auto.offset.reset", settings.start_position.as_str());
        config
    }

    pub(crate) fn set<K, V>(&mut self, key: K, value: V) -> &mut ConsumerConfig
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.base_config.set(key.into(), value.into());
        self
    }

    #[cfg(test)]
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.base_config.get(key)
    }

    pub(crate) fn create(&mut self) -> KafkaResult<BaseConsumer> {
        // NOTE: Offsets are committed by librdkafka itself.
        self.base_config.set("enable.auto.commit", "true");
        BaseConsumer::from_config(&self.base_config)
    }
}
