use anyhow::{Context as _, Result};
use clap::Parser;
use consumer_runner::config::{
    BROKER_ADDRESS, GROUP_IDENTIFIER, MAX_CONSECUTIVE_FAILURES, POLL_TIMEOUT_MS, START_POSITION,
    TOPIC,
};
use consumer_runner::prelude::*;
use log::info;
use std::process;

#[derive(Parser, Debug)]
#[clap(version, about = "Subscribe to Kafka topics and print every received message.")]
struct Args {
    /// Broker address(es), comma separated
    #[clap(long, env = "KAFKA_BOOTSTRAP_SERVERS")]
    brokers: Option<String>,

    /// Topic to consume. Repeat or separate with commas for several topics.
    #[clap(short, long = "topic", env = "KAFKA_TOPIC", multiple_occurrences = true)]
    topics: Vec<String>,

    #[clap(long, env = "KAFKA_GROUP_ID")]
    group_id: Option<String>,

    /// earliest | latest
    #[clap(long, env = "KAFKA_AUTO_OFFSET_RESET")]
    start_position: Option<String>,

    #[clap(long, env = "KAFKA_POLL_TIMEOUT_MS")]
    poll_timeout_ms: Option<u64>,

    /// Stop after this many failures without a delivered message (0 = never)
    #[clap(long, env = "KAFKA_MAX_CONSECUTIVE_FAILURES")]
    max_consecutive_failures: Option<usize>,

    /// text | json
    #[clap(long, env = "OUTPUT_FORMAT", default_value = "text")]
    format: OutputFormat,

    /// Extra librdkafka property (key=value)
    #[clap(
        short = 'X',
        long = "property",
        parse(try_from_str = parse_property),
        multiple_occurrences = true
    )]
    properties: Vec<(String, String)>,
}

impl Args {
    fn configuration(&self) -> Configuration {
        let options = [
            (BROKER_ADDRESS, self.brokers.clone()),
            (TOPIC, Some(self.topics.join(","))),
            (GROUP_IDENTIFIER, self.group_id.clone()),
            (START_POSITION, self.start_position.clone()),
            (POLL_TIMEOUT_MS, self.poll_timeout_ms.map(|v| v.to_string())),
            (
                MAX_CONSECUTIVE_FAILURES,
                self.max_consecutive_failures.map(|v| v.to_string()),
            ),
        ];
        let config = options
            .into_iter()
            .fold(Configuration::new(), |config, (key, value)| match value {
                Some(value) => config.set(key, value),
                None => config,
            });
        self.properties
            .iter()
            .fold(config, |config, (key, value)| config.property(key, value))
    }
}

fn parse_property(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got `{}`", s)),
    }
}

fn run(args: Args) -> Result<()> {
    let config = args.configuration();
    let context = ShutdownContext::new();
    context
        .register_signals()
        .context("Failed to register signal handlers.")?;

    let sink = WriterSink::stdout(args.format);
    let mut runner =
        Runner::initialize(&config, sink, context).context("Failed to initialize consumer.")?;
    runner
        .subscribe_configured()
        .context("Failed to subscribe.")?;

    let summary = runner.run()?;
    info!(
        "Exiting.(delivered={}, failed={})",
        summary.delivered, summary.failed
    );
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
