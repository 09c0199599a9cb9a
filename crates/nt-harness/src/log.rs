//! Tournament result log parsing and utility aggregation.
//!
//! The harness writes a `;`-delimited table per run. The first physical line
//! is a run banner and is discarded; the second line is the column header.
//! Each data row names the two agents of one negotiation session and the
//! utility each achieved.

use std::fs;
use std::path::Path;

use nt_types::{ParseError, TunerResult};
use tracing::warn;

const AGENT_COLUMNS: [&str; 2] = ["Agent 1", "Agent 2"];
const UTILITY_COLUMNS: [&str; 2] = ["Utility 1", "Utility 2"];

/// Sum the utilities attributed to `agent_name` across every session row
/// where it appears in either seat.
///
/// Seat matching is by substring, since the harness decorates agent names
/// with instance suffixes. An agent that appears in no row scores 0.0; that
/// is a documented harness outcome, not an error.
pub fn sum_agent_utility(path: &Path, agent_name: &str) -> TunerResult<f64> {
    let raw = fs::read_to_string(path)?;
    let body = match raw.split_once('\n') {
        Some((_banner, rest)) => rest,
        None => "",
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| malformed(&e.to_string()))?
        .clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| malformed(&format!("missing column {name:?}")))
    };
    let agent_cols = [column(AGENT_COLUMNS[0])?, column(AGENT_COLUMNS[1])?];
    let utility_cols = [column(UTILITY_COLUMNS[0])?, column(UTILITY_COLUMNS[1])?];

    let mut total = 0.0;
    let mut appearances = 0usize;
    for record in reader.records() {
        let record = record.map_err(|e| malformed(&e.to_string()))?;
        // At most one seat counts per row; seat 1 wins when both match
        // (self-play pairings). Ragged trailing rows match neither seat.
        let seat = (0..2).find(|&seat| {
            record
                .get(agent_cols[seat])
                .map_or(false, |a| a.contains(agent_name))
        });
        let seat = match seat {
            Some(seat) => seat,
            None => continue,
        };
        let cell = record
            .get(utility_cols[seat])
            .ok_or_else(|| malformed(&format!("row {record:?} lacks a utility cell")))?;
        let utility: f64 = cell
            .trim()
            .parse()
            .map_err(|_| malformed(&format!("non-numeric utility {cell:?} in row {record:?}")))?;
        total += utility;
        appearances += 1;
    }

    if appearances == 0 {
        warn!(agent = agent_name, log = %path.display(), "agent appeared in no session row; scoring 0.0");
    }
    Ok(total)
}

fn malformed(message: &str) -> ParseError {
    ParseError::MalformedLog {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nt_types::TunerError;
    use std::io::Write;

    fn write_log(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log0.csv");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    const SAMPLE: &str = "\
tournament run 1\n\
Run time;Agent 1;Agent 2;Utility 1;Utility 2\n\
0.4;TunedAgent@1;Boulware@2;0.3;0.6\n\
0.5;Conceder@1;TunedAgent@3;0.2;0.5\n\
0.6;Conceder@1;Boulware@2;0.55;0.45\n";

    #[test]
    fn sums_both_seats() {
        let (_dir, path) = write_log(SAMPLE);
        let total = sum_agent_utility(&path, "TunedAgent").unwrap();
        assert!((total - 0.8).abs() < 1e-12);
    }

    #[test]
    fn absent_agent_scores_zero() {
        let (_dir, path) = write_log(SAMPLE);
        let total = sum_agent_utility(&path, "NeverEntered").unwrap();
        assert_eq!(total, 0.0);
    }

    #[test]
    fn rows_without_the_agent_contribute_nothing() {
        let (_dir, path) = write_log(SAMPLE);
        // Conceder appears in rows 2 and 3, seat 1 both times.
        let total = sum_agent_utility(&path, "Conceder").unwrap();
        assert!((total - 0.75).abs() < 1e-12);
    }

    #[test]
    fn self_play_row_counts_seat_one_only() {
        let (_dir, path) = write_log(
            "banner\nAgent 1;Agent 2;Utility 1;Utility 2\nTunedAgent@1;TunedAgent@2;0.3;0.5\n",
        );
        let total = sum_agent_utility(&path, "TunedAgent").unwrap();
        assert!((total - 0.3).abs() < 1e-12);
    }

    #[test]
    fn missing_column_is_a_parse_error() {
        let (_dir, path) = write_log("banner\nRun time;Agent 1;Utility 1\n0.4;TunedAgent;0.3\n");
        assert!(matches!(
            sum_agent_utility(&path, "TunedAgent"),
            Err(TunerError::Parse(ParseError::MalformedLog { .. }))
        ));
    }

    #[test]
    fn non_numeric_utility_is_a_parse_error() {
        let (_dir, path) = write_log(
            "banner\nAgent 1;Agent 2;Utility 1;Utility 2\nTunedAgent;Boulware;high;0.2\n",
        );
        assert!(matches!(
            sum_agent_utility(&path, "TunedAgent"),
            Err(TunerError::Parse(ParseError::MalformedLog { .. }))
        ));
    }

    #[test]
    fn ragged_summary_rows_are_skipped() {
        let log = "banner\nAgent 1;Agent 2;Utility 1;Utility 2\nTunedAgent;Boulware;0.3;0.6\ntotals\n";
        let (_dir, path) = write_log(log);
        let total = sum_agent_utility(&path, "TunedAgent").unwrap();
        assert!((total - 0.3).abs() < 1e-12);
    }
}
