//! Timed begin/close logging around one pipeline stage
//!
//! - `{name}_BEGIN` on open
//! - `{name}_COMPLETE` or `{name}_FAILED` on close, with `duration_ms`
//! - `{name}_INCOMPLETE` if dropped while still open (early `?` return)

use super::logger::Logger;
use crate::clock::SharedClock;

/// ```ignore
/// let scope = ObservationScope::open("EXECUTION", clock.clone(), &[("plan_id", id)]);
/// // ... run actions ...
/// scope.complete(&[("actions_failed", "0")]);
/// ```
///
/// Opening fields are repeated on the closing line.
pub struct ObservationScope {
    name: &'static str,
    clock: SharedClock,
    started_s: f64,
    fields: Vec<(String, String)>,
    closed: bool,
}

impl ObservationScope {
    pub fn open(name: &'static str, clock: SharedClock, fields: &[(&str, &str)]) -> Self {
        Logger::info(&format!("{}_BEGIN", name), fields);
        let started_s = clock.monotonic();
        Self {
            name,
            clock,
            started_s,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            closed: false,
        }
    }

    /// Monotonic milliseconds since the scope was opened.
    pub fn elapsed_ms(&self) -> u64 {
        ((self.clock.monotonic() - self.started_s).max(0.0) * 1000.0).round() as u64
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// INFO `{name}_COMPLETE`.
    pub fn complete(mut self, extra: &[(&str, &str)]) {
        self.close("COMPLETE", extra, false);
    }

    /// ERROR `{name}_FAILED` carrying `reason`.
    pub fn fail(mut self, reason: &str) {
        self.close("FAILED", &[("reason", reason)], true);
    }

    fn close(&mut self, suffix: &str, extra: &[(&str, &str)], failed: bool) {
        self.closed = true;
        let duration = self.elapsed_ms().to_string();

        let mut fields: Vec<(&str, &str)> = self
            .fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        fields.extend(extra.iter().copied());
        fields.push(("duration_ms", duration.as_str()));

        let event = format!("{}_{}", self.name, suffix);
        if failed {
            Logger::error(&event, &fields);
        } else {
            Logger::info(&event, &fields);
        }
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.closed {
            let duration = self.elapsed_ms().to_string();
            Logger::warn(
                &format!("{}_INCOMPLETE", self.name),
                &[("duration_ms", duration.as_str())],
            );
        }
    }
}
