//! ポーリングループ本体。
//!
//! 状態は`NotStarted → Running → ShuttingDown → Stopped`の順にのみ遷移する。
//! 停止要求は[ShutdownContext]経由でのみ受け付け、ループは実行中の`poll`が戻った後に
//! フラグを確認するため、停止までの遅延は最大でポーリングの待機時間となる。
use crate::config::{Configuration, ConsumerSettings};
use crate::context::ShutdownContext;
use crate::error::{RunnerError, RunnerResult};
use crate::kafka::consumer::{IConsumer, KafkaConsumer};
use crate::kafka::poll::PollOutcome;
use crate::kafka::topic;
use crate::policy::{self, IFailurePolicy};
use crate::sink::ISink;
use log::{debug, error, info, warn};
use std::fmt::Display;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    NotStarted,
    Running,
    ShuttingDown,
    Stopped,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub delivered: usize,
    pub timed_out: usize,
    pub failed: usize,
}

pub struct Runner<S: ISink> {
    consumer: Option<Box<dyn IConsumer>>,
    settings: ConsumerSettings,
    sink: S,
    context: ShutdownContext,
    failure_policy: Box<dyn IFailurePolicy>,
    state: LoopState,
    summary: RunSummary,
}

impl<S: ISink> Runner<S> {
    /// 設定を検証し、Kafkaへの接続ハンドルを作成する。購読やポーリングはまだ行わない。
    pub fn initialize(config: &Configuration, sink: S, context: ShutdownContext) -> RunnerResult<Self> {
        Self::initialize_with(config, KafkaConsumer::connect, sink, context)
    }

    /// [Runner::initialize]の接続部分を差し替え可能にしたもの。
    ///
    /// 設定が不正な場合、`connect`は呼び出されない。
    pub fn initialize_with<C, E, F>(
        config: &Configuration,
        connect: F,
        sink: S,
        context: ShutdownContext,
    ) -> RunnerResult<Self>
    where
        C: IConsumer,
        E: Display,
        F: FnOnce(&ConsumerSettings) -> Result<C, E>,
    {
        let settings = config.settings()?;
        let consumer = connect(&settings).map_err(|e| RunnerError::Connection(e.to_string()))?;
        Ok(Self::new(Box::new(consumer), settings, sink, context))
    }

    pub fn new(
        consumer: Box<dyn IConsumer>,
        settings: ConsumerSettings,
        sink: S,
        context: ShutdownContext,
    ) -> Self {
        let failure_policy = policy::from_limit(settings.max_consecutive_failures);
        Self {
            consumer: Some(consumer),
            settings,
            sink,
            context,
            failure_policy,
            state: LoopState::NotStarted,
            summary: RunSummary::default(),
        }
    }

    pub fn failure_policy(mut self, failure_policy: Box<dyn IFailurePolicy>) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn settings(&self) -> &ConsumerSettings {
        &self.settings
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// 別スレッドから[ShutdownContext::cancel]を呼ぶためのハンドル
    pub fn shutdown_context(&self) -> ShutdownContext {
        self.context.clone()
    }

    /// 設定されたトピックを購読する。
    pub fn subscribe_configured(&mut self) -> RunnerResult<()> {
        let topics = self.settings.topics.clone();
        let topics = topics.iter().map(String::as_str).collect::<Vec<_>>();
        self.subscribe(&topics)
    }

    /// トピックを購読し、`Running`に遷移する。
    ///
    /// 購読済みのハンドルに対して再度呼び出した場合は、そのままブローカークライアントに委譲する。
    pub fn subscribe(&mut self, topics: &[&str]) -> RunnerResult<()> {
        let consumer = self.consumer.as_ref().ok_or(RunnerError::Stopped)?;
        topic::validate(topics).map_err(|e| RunnerError::Subscription(e.to_string()))?;
        consumer
            .subscribe(topics)
            .map_err(|e| RunnerError::Subscription(e.to_string()))?;
        info!("Subscribed to topics.({})", topics.join(", "));
        if self.state == LoopState::NotStarted {
            self.transition(LoopState::Running);
        }
        Ok(())
    }

    /// 最大`max_wait`だけ待って次のメッセージを取得する。
    pub fn poll_once(&mut self, max_wait: Duration) -> RunnerResult<PollOutcome> {
        if self.state == LoopState::NotStarted {
            return Err(RunnerError::NotSubscribed);
        }
        let consumer = self.consumer.as_ref().ok_or(RunnerError::Stopped)?;
        Ok(consumer.poll(max_wait))
    }

    /// 停止要求を受けるまでポーリングを続ける。
    ///
    /// 終了時には必ずハンドルを解放し、`Stopped`に遷移する。
    pub fn run(&mut self) -> RunnerResult<RunSummary> {
        match self.state {
            LoopState::NotStarted => return Err(RunnerError::NotSubscribed),
            LoopState::ShuttingDown | LoopState::Stopped => return Err(RunnerError::Stopped),
            LoopState::Running => {}
        }
        info!(
            "Consumption loop started.(poll_timeout={:?})",
            self.settings.poll_timeout
        );
        let result = self.consume_loop();
        if let Err(e) = &result {
            error!("Consumption loop aborted.({})", e);
        }
        self.shutdown();
        info!(
            "Consumption loop stopped.(delivered={}, timed_out={}, failed={})",
            self.summary.delivered, self.summary.timed_out, self.summary.failed
        );
        result.map(|_| self.summary)
    }

    /// 停止を要求し、ハンドルを解放する。何度呼び出しても解放は一度だけ行われる。
    pub fn shutdown(&mut self) {
        self.context.cancel();
        if self.state == LoopState::Stopped {
            return;
        }
        self.transition(LoopState::ShuttingDown);
        self.release();
    }

    fn consume_loop(&mut self) -> RunnerResult<()> {
        let timeout = self.settings.poll_timeout;
        while !self.context.is_shutdown() {
            match self.poll_once(timeout)? {
                PollOutcome::Delivered(msg) => {
                    debug!("Read message from {}.", msg.descriptor());
                    self.summary.delivered += 1;
                    self.failure_policy.reset();
                    self.sink.write_message(&msg)?;
                }
                PollOutcome::TimedOut => {
                    self.summary.timed_out += 1;
                }
                PollOutcome::Failed(e) => {
                    warn!("Consumer error.(kind={}, transient={})", e.kind, e.kind.is_transient());
                    self.summary.failed += 1;
                    self.sink.write_error(&e)?;
                    self.failure_policy.update();
                    if self.failure_policy.check() {
                        let limit = self.failure_policy.limit().unwrap_or(self.summary.failed);
                        return Err(RunnerError::FailureLimit(limit));
                    }
                }
            }
        }
        Ok(())
    }

    fn release(&mut self) {
        if let Some(consumer) = self.consumer.take() {
            debug!("Releasing consumer handle.");
            consumer.close();
        }
        self.transition(LoopState::Stopped);
    }

    fn transition(&mut self, next: LoopState) {
        if self.state != next {
            debug!("Loop state: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

impl<S: ISink> Drop for Runner<S> {
    fn drop(&mut self) {
        self.release();
    }
}
