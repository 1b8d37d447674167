use colored::{Color, Colorize};
use std::fmt;
use std::fmt::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

/// Single-line event format: time, level, target, request trace id, span fields, message.
pub(super) struct Formatter {
    use_colors: bool,
}

impl Formatter {
    pub(super) fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }
}

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let now = chrono::Local::now();
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let mut scope = String::new();
        for span in ctx
            .event_scope()
            .into_iter()
            .flat_map(tracing_subscriber::registry::Scope::from_root)
        {
            let exts = span.extensions();
            let Some(fields) = exts.get::<FormattedFields<N>>() else {
                continue;
            };
            if fields.is_empty() {
                continue;
            }
            // request spans only carry the trace id
            match fields.strip_prefix("trace_id=") {
                Some(trace_id) => write!(scope, "@{trace_id}")?,
                None => write!(scope, "{{{}}}", fields.as_str())?,
            }
        }
        let target = meta.target().strip_prefix("fleetd::").unwrap_or(meta.target());

        if self.use_colors {
            let label = level_label(meta.level());
            write!(
                writer,
                "{} {} {} {}",
                now.format("%X%.3f").to_string().as_str().bright_black(),
                label.color(level_color(meta.level())),
                format!("{target}{scope}:").as_str().bright_black(),
                visitor
            )?;
        } else {
            write!(
                writer,
                "{} [{}] {}{}: {}",
                now.format("%F %X%.3f"),
                level_label(meta.level()),
                target,
                scope,
                visitor
            )?;
        }
        writeln!(writer)
    }
}

fn level_label(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "ERR",
        Level::WARN => "WRN",
        Level::INFO => "INF",
        Level::DEBUG => "DBG",
        Level::TRACE => "TRC",
    }
}

fn level_color(level: &Level) -> Color {
    match *level {
        Level::ERROR => Color::BrightRed,
        Level::WARN => Color::BrightYellow,
        Level::INFO => Color::BrightBlue,
        Level::DEBUG => Color::BrightMagenta,
        Level::TRACE => Color::BrightWhite,
    }
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: String,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            write!(self.message, "{value:?}").ok();
        } else {
            write!(self.fields, " {}={value:?}", field.name()).ok();
        }
    }
}

impl fmt::Display for EventVisitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        f.write_str(&self.fields)
    }
}
