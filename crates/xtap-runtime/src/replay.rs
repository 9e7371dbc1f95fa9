use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use xtap_types::Exchange;

use crate::Result;
use crate::interceptor::ExchangeHandler;

/// Totals for one replayed capture file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub exchanges: usize,
    /// Lines that were not a valid exchange
    pub malformed: usize,
    pub credentials_saved: usize,
    pub calls_logged: usize,
    pub posts_inserted: usize,
    pub snapshots_recorded: usize,
}

/// Feed captured exchanges (one JSON object per line) through a handler.
///
/// Blank lines are ignored and malformed lines are skipped with a warning.
/// Store errors stop the replay.
pub fn replay<R, H>(reader: R, handler: &H) -> Result<ReplayReport>
where
    R: BufRead,
    H: ExchangeHandler + ?Sized,
{
    let mut report = ReplayReport::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let exchange: Exchange = match serde_json::from_str(&line) {
            Ok(exchange) => exchange,
            Err(err) => {
                tracing::warn!(line = idx + 1, error = %err, "skipping malformed exchange");
                report.malformed += 1;
                continue;
            }
        };

        let request = handler.handle_request(&exchange)?;
        let response = handler.handle_response(&exchange)?;

        report.exchanges += 1;
        report.credentials_saved += request.harvest.saved.len() + response.harvest.merged.len();
        report.calls_logged += usize::from(response.call_logged);
        report.posts_inserted += response.posts_inserted;
        report.snapshots_recorded += response.snapshots_recorded;
    }

    tracing::info!(
        exchanges = report.exchanges,
        malformed = report.malformed,
        snapshots = report.snapshots_recorded,
        "replay complete"
    );
    Ok(report)
}

pub fn replay_file<H: ExchangeHandler + ?Sized>(path: &Path, handler: &H) -> Result<ReplayReport> {
    let file = File::open(path)?;
    replay(BufReader::new(file), handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::ExchangeReport;
    use std::cell::Cell;

    #[derive(Default)]
    struct CountingHandler {
        requests: Cell<usize>,
        responses: Cell<usize>,
    }

    impl ExchangeHandler for CountingHandler {
        fn handle_request(&self, _exchange: &Exchange) -> Result<ExchangeReport> {
            self.requests.set(self.requests.get() + 1);
            Ok(ExchangeReport::default())
        }

        fn handle_response(&self, _exchange: &Exchange) -> Result<ExchangeReport> {
            self.responses.set(self.responses.get() + 1);
            Ok(ExchangeReport {
                call_logged: true,
                ..Default::default()
            })
        }
    }

    #[test]
    fn test_malformed_lines_are_skipped() -> Result<()> {
        let input = concat!(
            r#"{"timestamp": "2025-02-01T12:00:00Z", "method": "GET", "url": "https://x.com/a"}"#,
            "\n\n",
            "{not json\n",
            r#"{"method": "GET"}"#,
            "\n",
            r#"{"timestamp": "2025-02-01T12:00:01Z", "method": "GET", "url": "https://x.com/b", "status": 200}"#,
            "\n",
        );
        let handler = CountingHandler::default();

        let report = replay(input.as_bytes(), &handler)?;

        assert_eq!(report.exchanges, 2);
        assert_eq!(report.malformed, 2);
        assert_eq!(report.calls_logged, 2);
        assert_eq!(handler.requests.get(), 2);
        assert_eq!(handler.responses.get(), 2);
        Ok(())
    }
}
