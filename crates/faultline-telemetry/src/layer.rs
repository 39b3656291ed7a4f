use std::fmt;
use std::io::Write;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer};

/// Event field that carries a serialized [`crate::Fields`] object
pub(crate) const FIELDS_KEY: &str = "fields";

/// Field marking an error event as process-terminating
pub(crate) const FATAL_KEY: &str = "fatal";

/// Layer writing one JSON object per event
///
/// Every line carries `time`, `level` and `msg`; the event's own fields
/// follow at the top level. A `fields` value holding a JSON object is
/// flattened into the line instead of being nested. Error events marked
/// `fatal: true` are written with level `fatal`.
pub struct JsonLineLayer<W> {
    make_writer: W,
}

impl<W> JsonLineLayer<W>
where
    W: for<'a> MakeWriter<'a> + 'static,
{
    pub const fn new(make_writer: W) -> Self {
        Self { make_writer }
    }
}

impl<S, W> Layer<S> for JsonLineLayer<W>
where
    S: Subscriber,
    W: for<'a> MakeWriter<'a> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);

        let mut line = visitor.into_line(*event.metadata().level());
        line.push('\n');

        let mut writer = self.make_writer.make_writer_for(event.metadata());
        if let Err(e) = writer.write_all(line.as_bytes()) {
            eprintln!("failed to write log line: {e}");
        }
    }
}

#[derive(Default)]
struct JsonVisitor {
    msg: Option<String>,
    fields: Map<String, Value>,
}

impl JsonVisitor {
    fn into_line(self, level: Level) -> String {
        let mut object = Map::new();
        object.insert("time".to_string(), Value::from(format!("{:.3}", jiff::Timestamp::now())));
        let level = if level == Level::ERROR && self.fields.get(FATAL_KEY) == Some(&Value::Bool(true)) {
            "fatal"
        } else {
            level_name(level)
        };
        object.insert("level".to_string(), Value::from(level));
        object.insert("msg".to_string(), Value::from(self.msg.unwrap_or_default()));

        for (key, value) in self.fields {
            object.entry(key).or_insert(value);
        }

        Value::Object(object).to_string()
    }

    fn record_value(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }

    fn record_text(&mut self, field: &Field, text: String) {
        match field.name() {
            "message" => self.msg = Some(text),
            FIELDS_KEY => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => self.fields.extend(map),
                _ => self.record_value(field, Value::from(text)),
            },
            _ => self.record_value(field, Value::from(text)),
        }
    }
}

impl Visit for JsonVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_text(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_text(field, format!("{value:?}"));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_text(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, Value::from(value));
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    }
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::layer::SubscriberExt;

    use super::*;
    use crate::testing::CapturedLogs;

    fn capture(emit: impl FnOnce()) -> Vec<Value> {
        let logs = CapturedLogs::new();
        let subscriber = tracing_subscriber::registry().with(JsonLineLayer::new(logs.clone()));
        tracing::subscriber::with_default(subscriber, emit);
        logs.records()
    }

    #[test]
    fn writes_contract_fields() {
        let records = capture(|| tracing::info!(user_id = 123, "test message"));

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record["level"], "info");
        assert_eq!(record["msg"], "test message");
        assert_eq!(record["user_id"], 123);
        assert!(record["time"].as_str().is_some_and(|t| t.ends_with('Z')));
    }

    #[test]
    fn flattens_fields_object() {
        let records = capture(|| {
            tracing::error!(fields = %r#"{"app_code":1001,"path":"/x"}"#, "failed");
        });

        let record = &records[0];
        assert_eq!(record["level"], "error");
        assert_eq!(record["app_code"], 1001);
        assert_eq!(record["path"], "/x");
        assert!(record.get("fields").is_none());
    }

    #[test]
    fn non_object_fields_value_stays_a_string() {
        let records = capture(|| tracing::warn!(fields = "plain", "odd"));
        assert_eq!(records[0]["fields"], "plain");
    }

    #[test]
    fn fatal_marker_sets_fatal_level() {
        let records = capture(|| tracing::error!(fields = %r#"{"fatal":true}"#, "dying"));
        assert_eq!(records[0]["level"], "fatal");
        assert_eq!(records[0]["fatal"], true);
    }

    #[test]
    fn fatal_marker_ignored_below_error() {
        let records = capture(|| tracing::warn!(fields = %r#"{"fatal":true}"#, "odd"));
        assert_eq!(records[0]["level"], "warn");
    }

    #[test]
    fn contract_keys_cannot_be_overridden() {
        let records = capture(|| tracing::info!(fields = %r#"{"level":"fake"}"#, "real"));
        assert_eq!(records[0]["level"], "info");
    }
}
