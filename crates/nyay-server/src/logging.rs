use std::{collections::VecDeque, sync::Arc};

use tokio::sync::broadcast;

/// Lines kept for replay to new `/api/logs` subscribers.
pub(crate) const LOG_RING_CAPACITY: usize = 500;

pub(crate) type LogRing = Arc<std::sync::Mutex<VecDeque<String>>>;

/// Fans every tracing event out as a JSON line to live SSE subscribers and
/// a bounded replay ring.
pub(crate) struct BroadcastLayer {
    pub tx: broadcast::Sender<String>,
    pub ring: LogRing,
}

/// Collects the event message plus its structured fields (`stage`,
/// `model`, `output_len`, ...).
struct EventVisitor<'a> {
    message: &'a mut String,
    fields: &'a mut serde_json::Map<String, serde_json::Value>,
}

impl EventVisitor<'_> {
    fn put(&mut self, field: &tracing::field::Field, value: serde_json::Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl tracing::field::Visit for EventVisitor<'_> {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            *self.message = value.to_string();
        } else {
            self.put(field, value.into());
        }
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.put(field, value.into());
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.put(field, value.into());
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.put(field, value.into());
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.put(field, value.into());
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        use std::fmt::Write;
        let mut text = String::new();
        let _ = write!(text, "{value:?}");
        // Debug on &str adds quotes
        if let Some(inner) = text.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
            text = inner.to_string();
        }
        if field.name() == "message" {
            *self.message = text;
        } else {
            self.put(field, text.into());
        }
    }
}

pub(crate) fn category_for(target: &str) -> &'static str {
    if target.contains("trial") {
        "trial"
    } else if target.contains("agent") || target.contains("gemini") || target.contains("ollama") {
        "agent"
    } else {
        "system"
    }
}

impl BroadcastLayer {
    fn publish(&self, line: String) {
        let _ = self.tx.send(line.clone());
        if let Ok(mut ring) = self.ring.lock() {
            ring.push_back(line);
            while ring.len() > LOG_RING_CAPACITY {
                ring.pop_front();
            }
        }
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for BroadcastLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let level = match *event.metadata().level() {
            tracing::Level::ERROR => "err",
            tracing::Level::WARN => "warn",
            tracing::Level::INFO => "info",
            tracing::Level::DEBUG => "debug",
            tracing::Level::TRACE => return,
        };

        let mut message = String::new();
        let mut fields = serde_json::Map::new();
        event.record(&mut EventVisitor {
            message: &mut message,
            fields: &mut fields,
        });

        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let line = serde_json::json!({
            "ts": ts,
            "level": level,
            "message": message,
            "category": category_for(event.metadata().target()),
            "fields": fields,
        })
        .to_string();

        self.publish(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(category_for("nyay_core::trial"), "trial");
        assert_eq!(category_for("nyay_agent::gemini"), "agent");
        assert_eq!(category_for("nyay_agent::ollama"), "agent");
        assert_eq!(category_for("tower_http::trace::on_request"), "system");
    }

    #[test]
    fn test_structured_fields_reach_the_log_line() {
        use tracing_subscriber::layer::SubscriberExt;

        let (tx, mut rx) = broadcast::channel(16);
        let ring: LogRing = Arc::new(std::sync::Mutex::new(VecDeque::new()));
        let subscriber = tracing_subscriber::registry().with(BroadcastLayer {
            tx,
            ring: ring.clone(),
        });

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(
                target: "nyay_core::trial",
                stage = %"round_2",
                model = "gemini-1.5-flash",
                output_len = 42_usize,
                "completion received"
            );
        });

        let line: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(line["message"], "completion received");
        assert_eq!(line["level"], "info");
        assert_eq!(line["category"], "trial");
        assert_eq!(line["fields"]["stage"], "round_2");
        assert_eq!(line["fields"]["model"], "gemini-1.5-flash");
        assert_eq!(line["fields"]["output_len"], 42);
        assert!(line["fields"].get("message").is_none());
        assert_eq!(ring.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_ring_is_bounded() {
        let (tx, _rx) = broadcast::channel(16);
        let layer = BroadcastLayer {
            tx,
            ring: Arc::new(std::sync::Mutex::new(VecDeque::new())),
        };
        for i in 0..LOG_RING_CAPACITY + 10 {
            layer.publish(format!("line {i}"));
        }
        let ring = layer.ring.lock().unwrap();
        assert_eq!(ring.len(), LOG_RING_CAPACITY);
        assert_eq!(ring.front().map(String::as_str), Some("line 10"));
    }
}
