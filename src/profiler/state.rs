use dashmap::DashMap;
use std::io::{self, Write};
use std::time::Duration;

/// Accumulated timings and invocation counts, keyed by call site.
#[derive(Debug, Default)]
pub(crate) struct ProfilingState {
    elapsed: DashMap<String, Duration>,
    invocations: DashMap<String, u64>,
}

impl ProfilingState {
    /// Adds `elapsed` to the total for this call site on this thread and bumps
    /// the call site's invocation count.
    pub fn record(&self, call_site: &str, thread: &str, elapsed: Duration) {
        let key = format!("{} on thread {}", call_site, thread);
        *self.elapsed.entry(key).or_insert(Duration::ZERO) += elapsed;
        *self.invocations.entry(call_site.to_string()).or_insert(0) += 1;
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut timings: Vec<(String, Duration)> = self
            .elapsed
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        timings.sort();
        for (key, elapsed) in timings {
            writeln!(writer, "{} took {}", key, format_duration(elapsed))?;
        }

        let mut counts: Vec<(String, u64)> = self
            .invocations
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        counts.sort();
        for (key, count) in counts {
            writeln!(writer, "{} was invoked {} times", key, count)?;
        }
        Ok(())
    }
}

fn format_duration(duration: Duration) -> String {
    let total_millis = duration.as_millis();
    format!(
        "{}m {}s {}ms",
        total_millis / 60_000,
        (total_millis / 1_000) % 60,
        total_millis % 1_000
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(61_234)), "1m 1s 234ms");
        assert_eq!(format_duration(Duration::ZERO), "0m 0s 0ms");
    }

    #[test]
    fn test_record_aggregates_per_thread_and_counts_per_site() {
        let state = ProfilingState::default();
        state.record("Crawler#crawl", "main", Duration::from_secs(1));
        state.record("Crawler#crawl", "main", Duration::from_secs(2));
        state.record("Crawler#crawl", "worker", Duration::from_millis(500));

        let mut out = Vec::new();
        state.write(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Crawler#crawl on thread main took 0m 3s 0ms\n\
             Crawler#crawl on thread worker took 0m 0s 500ms\n\
             Crawler#crawl was invoked 3 times\n"
        );
    }
}
