use crate::kafka::message::Message;
use rdkafka::error::KafkaError;
use rdkafka::types::RDKafkaErrorCode;
use std::fmt;

/// 1回のポーリングの結果
#[derive(Clone, Debug)]
pub enum PollOutcome {
    Delivered(Message),
    /// 待機時間内にメッセージが届かなかった。エラーではない。
    TimedOut,
    Failed(PollError),
}

impl PollOutcome {
    pub fn is_timed_out(&self) -> bool {
        matches!(self, PollOutcome::TimedOut)
    }
}

impl From<Option<Result<Message, KafkaError>>> for PollOutcome {
    fn from(polled: Option<Result<Message, KafkaError>>) -> Self {
        match polled {
            Some(Ok(msg)) => PollOutcome::Delivered(msg),
            Some(Err(e)) => PollOutcome::Failed(PollError::from(e)),
            None => PollOutcome::TimedOut,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PollErrorKind {
    Authentication,
    Authorization,
    UnknownTopicOrPartition,
    BrokerTransport,
    PartitionEof,
    Other,
}

impl PollErrorKind {
    pub fn from_code(code: Option<RDKafkaErrorCode>) -> Self {
        match code {
            Some(RDKafkaErrorCode::Authentication)
            | Some(RDKafkaErrorCode::SaslAuthenticationFailed) => PollErrorKind::Authentication,
            Some(RDKafkaErrorCode::TopicAuthorizationFailed)
            | Some(RDKafkaErrorCode::GroupAuthorizationFailed)
            | Some(RDKafkaErrorCode::ClusterAuthorizationFailed) => PollErrorKind::Authorization,
            Some(RDKafkaErrorCode::UnknownTopicOrPartition)
            | Some(RDKafkaErrorCode::UnknownTopic)
            | Some(RDKafkaErrorCode::UnknownPartition) => PollErrorKind::UnknownTopicOrPartition,
            Some(RDKafkaErrorCode::BrokerTransportFailure)
            | Some(RDKafkaErrorCode::AllBrokersDown)
            | Some(RDKafkaErrorCode::Resolve) => PollErrorKind::BrokerTransport,
            Some(RDKafkaErrorCode::PartitionEOF) => PollErrorKind::PartitionEof,
            _ => PollErrorKind::Other,
        }
    }

    /// ブローカークライアント側の再接続で回復が見込める場合はtrue
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PollErrorKind::BrokerTransport | PollErrorKind::PartitionEof
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PollErrorKind::Authentication => "AuthError",
            PollErrorKind::Authorization => "AuthorizationError",
            PollErrorKind::UnknownTopicOrPartition => "UnknownTopic",
            PollErrorKind::BrokerTransport => "TransportError",
            PollErrorKind::PartitionEof => "PartitionEOF",
            PollErrorKind::Other => "Error",
        }
    }
}

impl fmt::Display for PollErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ブローカーが報告したエラー
///
/// `context`には、エラー発生時に部分的に得られたメッセージの情報があれば格納される。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollError {
    pub kind: PollErrorKind,
    pub detail: String,
    pub context: Option<String>,
}

impl PollError {
    pub fn new(kind: PollErrorKind, detail: &str) -> Self {
        Self {
            kind,
            detail: detail.to_string(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: &str) -> Self {
        self.context = Some(context.to_string());
        self
    }
}

impl From<KafkaError> for PollError {
    fn from(e: KafkaError) -> Self {
        // NOTE: PartitionEOF carries no rdkafka error code.
        let (kind, context) = match &e {
            KafkaError::PartitionEOF(partition) => (
                PollErrorKind::PartitionEof,
                Some(format!("partition {}", partition)),
            ),
            _ => (PollErrorKind::from_code(e.rdkafka_error_code()), None),
        };
        Self {
            kind,
            detail: e.to_string(),
            context,
        }
    }
}

impl fmt::Display for PollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

impl std::error::Error for PollError {}
