//! kafkaのトピックを購読し、受信したメッセージを出力先に書き出すライブラリ。
//!
//! ### Features
//!
//! - ポーリング結果を[kafka::PollOutcome]として受信・タイムアウト・エラーに分類する
//! - エラーはループを止めずに出力先へ書き出す。[policy::IFailurePolicy]で連続失敗時の停止も選べる
//! - [context::ShutdownContext]で別スレッドやシグナルから安全に停止できる
//! - [kafka::IConsumer]を実装することでブローカークライアントを差し替えられる
//!
//! ### Examples
//!
//! ```no_run
//! use consumer_runner::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     env_logger::init();
//!     let config = Configuration::new()
//!         .set("brokerAddress", "localhost:9092")
//!         .set("topic", "orders")
//!         .set("groupIdentifier", "group")
//!         .property("session.timeout.ms", "6000");
//!     let context = ShutdownContext::new();
//!     context.register_signals()?;
//!     let sink = WriterSink::stdout(OutputFormat::Text);
//!     let mut runner = Runner::initialize(&config, sink, context)?;
//!     runner.subscribe_configured()?;
//!     runner.run()?;
//!     Ok(())
//! }
//! ```
pub mod config;
pub mod context;
pub mod error;
pub mod kafka;
pub mod policy;
pub mod runner;
pub mod sink;

pub mod prelude {
    pub use super::config::{Configuration, ConsumerSettings, StartPosition};
    pub use super::context::ShutdownContext;
    pub use super::error::{RunnerError, RunnerResult};
    pub use super::kafka::*;
    pub use super::policy::*;
    pub use super::runner::*;
    pub use super::sink::*;
}
