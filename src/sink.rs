//! 受信したメッセージとポーリングエラーの出力先。
use crate::kafka::message::Message;
use crate::kafka::poll::PollError;
use serde::Serialize;
use std::io::{self, Write};
use std::str::FromStr;

pub trait ISink: Send {
    fn write_message(&mut self, msg: &Message) -> io::Result<()>;
    fn write_error(&mut self, error: &PollError) -> io::Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Text
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format `{}`", other)),
        }
    }
}

#[derive(Serialize)]
struct MessageRecord<'a> {
    topic: &'a str,
    partition: i32,
    offset: i64,
    key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_bytes: Option<&'a [u8]>,
    payload: Option<&'a str>,
    /// UTF-8でないペイロードはバイト列のまま出力する
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_bytes: Option<&'a [u8]>,
}

fn split_utf8(bytes: Option<&[u8]>) -> (Option<&str>, Option<&[u8]>) {
    match bytes {
        Some(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => (Some(text), None),
            Err(_) => (None, Some(bytes)),
        },
        None => (None, None),
    }
}

#[derive(Serialize)]
struct ErrorRecord<'a> {
    error: &'a str,
    detail: &'a str,
    context: Option<&'a str>,
}

/// 1件につき1行を[Write]に書き込み、都度flushする。
pub struct WriterSink<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_json<T: Serialize>(&mut self, record: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")
    }
}

impl WriterSink<io::Stdout> {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(io::stdout(), format)
    }
}

impl<W: Write + Send> ISink for WriterSink<W> {
    fn write_message(&mut self, msg: &Message) -> io::Result<()> {
        let payload = msg.payload().unwrap_or_default();
        match self.format {
            OutputFormat::Text => {
                // NOTE: The payload is written as raw bytes.
                write!(self.writer, "Message on {}: ", msg.descriptor())?;
                self.writer.write_all(payload)?;
                self.writer.write_all(b"\n")?;
            }
            OutputFormat::Json => {
                let descriptor = msg.descriptor();
                let (key, key_bytes) = split_utf8(msg.key());
                let (payload, payload_bytes) = split_utf8(Some(payload));
                self.write_json(&MessageRecord {
                    topic: &descriptor.topic,
                    partition: descriptor.partition,
                    offset: descriptor.offset,
                    key,
                    key_bytes,
                    payload,
                    payload_bytes,
                })?;
            }
        }
        self.writer.flush()
    }

    fn write_error(&mut self, error: &PollError) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => {
                writeln!(
                    self.writer,
                    "Consumer error: {} ({})",
                    error,
                    error.context.as_deref().unwrap_or("no message")
                )?;
            }
            OutputFormat::Json => {
                self.write_json(&ErrorRecord {
                    error: error.kind.as_str(),
                    detail: &error.detail,
                    context: error.context.as_deref(),
                })?;
            }
        }
        self.writer.flush()
    }
}
