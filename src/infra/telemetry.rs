use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, writer::BoxMakeWriter},
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{Command, LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Where log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

impl LogStream {
    /// The server logs to stdout. One-shot commands keep stdout for their
    /// own output.
    pub fn for_command(command: &Command) -> Self {
        match command {
            Command::Serve(_) => LogStream::Stdout,
            Command::Publish(_) | Command::List(_) => LogStream::Stderr,
        }
    }

    fn make_writer(self) -> BoxMakeWriter {
        match self {
            LogStream::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogStream::Stderr => BoxMakeWriter::new(std::io::stderr),
        }
    }
}

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings, stream: LogStream) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let writer = stream.make_writer();
    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .with_writer(writer)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_writer(writer)
            .compact()
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "mdpage_publish_total",
            Unit::Count,
            "Total number of pages published."
        );
        describe_counter!(
            "mdpage_publish_rejected_total",
            Unit::Count,
            "Total number of uploads rejected by validation, labelled by reason."
        );
        describe_counter!(
            "mdpage_publish_failed_total",
            Unit::Count,
            "Total number of accepted uploads that failed to convert or persist."
        );
        describe_counter!(
            "mdpage_http_responses_total",
            Unit::Count,
            "Total number of HTTP responses, labelled by route and status."
        );
        describe_histogram!(
            "mdpage_publish_ms",
            Unit::Milliseconds,
            "End-to-end publish latency in milliseconds."
        );
    });
}
