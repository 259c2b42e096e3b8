//! Integration tests for telemetry initialization and span helpers.

use std::io;
use std::sync::{Arc, Mutex};

use uniq_queue::merge::retain_new;
use uniq_queue::telemetry::{self, TelemetryConfig};
use uniq_queue::UniqueQueue;

#[test]
fn telemetry_initializes_with_trace_level() {
    // Only one global subscriber per process; Err here just means another
    // test got there first.
    let _ = telemetry::init_telemetry(TelemetryConfig {
        log_level: Some("uniq_queue=trace".to_string()),
    });
}

#[test]
fn queue_operations_run_inside_span() {
    let span = telemetry::queue::queue_span("jobs");
    let _entered = span.enter();

    let mut queue = UniqueQueue::new(retain_new);
    queue.push("a", 1);
    queue.push("a", 2);
    assert_eq!(queue.del("a"), Some(2));
    assert_eq!(queue.pop(), None);
}

#[test]
fn inconsistency_report_does_not_panic() {
    telemetry::queue::report_inconsistency("test");
}

/// In-memory writer so a test can read back what the fmt layer printed.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn queue_operations_emit_trace_events() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let span = telemetry::queue::queue_span("jobs");
        let _entered = span.enter();

        let mut queue = UniqueQueue::new(retain_new);
        queue.push("a", 1);
        queue.push("a", 2);
        queue.pop();
    });

    let output = logs.contents();
    assert!(output.contains("queue push is_new=true len=1"), "{output}");
    assert!(output.contains("queue push merged is_new=false len=1"), "{output}");
    assert!(output.contains("queue pop len=0"), "{output}");
    assert!(output.contains("jobs"), "{output}");
}
