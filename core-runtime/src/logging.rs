//! # Logging
//!
//! Installs the process-wide `tracing` subscriber and, optionally, mirrors
//! events into the host's log through a [`LoggerSink`].
//!
//! ```text
//! tracing event ──▶ EnvFilter ──┬──▶ fmt layer (pretty | json | compact) ──▶ stdout
//!                               └──▶ HostLogLayer ──▶ LoggerSink::log
//! ```
//!
//! [`LogSettings`] is plain data so the host can persist it next to
//! [`FormatSettings`](crate::config::FormatSettings):
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogSettings};
//!
//! let settings: LogSettings = serde_json::from_str(r#"{"level":"debug","format":"json"}"#)?;
//! init_logging(&settings, Some(host_sink))?;
//! ```

use crate::error::{Error, Result};

use bridge_traits::log::{LogEntry, LogLevel, LoggerSink};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};

/// Crates whose events follow [`LogSettings::level`]; everything else is
/// held at `warn`.
const WORKSPACE_TARGETS: &[&str] = &[
    "recwerk_workspace",
    "core_runtime",
    "core_project",
    "core_metadata",
    "bridge_desktop",
];

/// Console output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}

impl Default for LogFormat {
    /// Pretty in debug builds, JSON in release builds.
    fn default() -> Self {
        if cfg!(debug_assertions) {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        }
    }
}

/// Persistable logging options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub format: LogFormat,
    /// Level for the workspace crates.
    pub level: LogLevel,
    /// Extra `target=level` directives applied after the defaults,
    /// e.g. `core_project::stream=trace`.
    pub directives: Vec<String>,
    /// Log span open/close (decode passes, tag rewrites).
    pub span_events: bool,
}

impl LogSettings {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// The `EnvFilter` these settings describe.
    pub fn filter(&self) -> Result<EnvFilter> {
        let mut directives = vec!["warn".to_string()];
        directives.extend(
            WORKSPACE_TARGETS
                .iter()
                .map(|target| format!("{}={}", target, self.level.as_str())),
        );
        directives.extend(self.directives.iter().cloned());

        EnvFilter::try_new(directives.join(","))
            .map_err(|e| Error::Config(format!("invalid log directive: {}", e)))
    }
}

/// Install the global subscriber.
///
/// Fails with [`Error::Logging`] if a subscriber is already installed and
/// with [`Error::Config`] if a directive does not parse.
pub fn init_logging(settings: &LogSettings, sink: Option<Arc<dyn LoggerSink>>) -> Result<()> {
    let filter = settings.filter()?;
    let spans = if settings.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let console: Box<dyn Layer<Registry> + Send + Sync> = match settings.format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_span_events(spans)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_span_events(spans)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(settings.span_events)
            .with_span_list(false)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(filter)
        .with(sink.map(HostLogLayer::new))
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}

/// Converts `tracing` events to [`LogEntry`] values for a [`LoggerSink`].
pub struct HostLogLayer {
    sink: Arc<dyn LoggerSink>,
}

impl HostLogLayer {
    pub fn new(sink: Arc<dyn LoggerSink>) -> Self {
        Self { sink }
    }

    fn deliver(&self, entry: LogEntry) {
        let sink = Arc::clone(&self.sink);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(err) = sink.log(entry).await {
                        eprintln!("host log sink failed: {}", err);
                    }
                });
            }
            Err(_) => {
                if let Err(err) = futures::executor::block_on(sink.log(entry)) {
                    eprintln!("host log sink failed: {}", err);
                }
            }
        }
    }
}

impl<S> Layer<S> for HostLogLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = log_level(metadata.level());
        if level < self.sink.min_level() {
            return;
        }

        let mut entry = LogEntry::new(level, metadata.target(), String::new());
        event.record(&mut EntryRecorder(&mut entry));
        if entry.message.is_empty() {
            entry.message = metadata.name().to_string();
        }
        entry.span = ctx.event_span(event).map(|span| span.name().to_string());

        self.deliver(entry);
    }
}

struct EntryRecorder<'a>(&'a mut LogEntry);

impl Visit for EntryRecorder<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.store(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.store(field, format!("{:?}", value));
    }
}

impl EntryRecorder<'_> {
    fn store(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.0.message = value,
            name => {
                self.0.fields.insert(name.to_string(), value);
            }
        }
    }
}

fn log_level(level: &Level) -> LogLevel {
    match *level {
        Level::TRACE => LogLevel::Trace,
        Level::DEBUG => LogLevel::Debug,
        Level::INFO => LogLevel::Info,
        Level::WARN => LogLevel::Warn,
        Level::ERROR => LogLevel::Error,
    }
}

/// File name of `path`, for log fields.
///
/// Both separators are honoured so Windows paths recorded on another
/// platform still shorten.
///
/// ```ignore
/// info!(file = strip_path("/Users/jo/Sessions/take-3.recwerk"), "Opening project");
/// // file="take-3.recwerk"
/// ```
pub fn strip_path(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
