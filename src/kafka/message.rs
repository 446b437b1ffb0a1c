use rdkafka::message::{Message as IMessage, OwnedMessage};
use std::fmt;

/// メッセージの配送位置を表す記述子。表示とログ出力のみに使用する。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl TopicPartition {
    pub fn new(topic: &str, partition: i32, offset: i64) -> Self {
        Self {
            topic: topic.to_string(),
            partition,
            offset,
        }
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]@{}", self.topic, self.partition, self.offset)
    }
}

/// ブローカーから受信したメッセージ
///
/// ペイロードはこのクレートにとって不透明なバイト列として扱う。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    descriptor: TopicPartition,
    key: Option<Vec<u8>>,
    payload: Option<Vec<u8>>,
}

impl Message {
    pub fn new(descriptor: TopicPartition, key: Option<Vec<u8>>, payload: Option<Vec<u8>>) -> Self {
        Self {
            descriptor,
            key,
            payload,
        }
    }

    pub fn descriptor(&self) -> &TopicPartition {
        &self.descriptor
    }

    pub fn key(&self) -> Option<&[u8]> {
        self.key.as_deref()
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }
}

impl From<OwnedMessage> for Message {
    fn from(base: OwnedMessage) -> Self {
        let descriptor = TopicPartition::new(base.topic(), base.partition(), base.offset());
        Self::new(
            descriptor,
            base.key().map(<[u8]>::to_vec),
            base.payload().map(<[u8]>::to_vec),
        )
    }
}
