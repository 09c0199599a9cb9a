//! `key=value` properties file read/write.
//!
//! This is the contract with the agent-under-test: it reads its
//! hyperparameters from this file at tournament start, so the write must be
//! a complete overwrite and must never leave a half-written file behind.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use nt_types::{Configuration, ParseError, TunerResult};

/// Overwrite `path` with one `name=value` line per parameter.
///
/// Writes a sibling temp file first and renames it over the target, so
/// readers only ever observe a complete file. The handle is scoped, so it is
/// closed on every exit path.
pub fn write_properties(path: &Path, config: &Configuration) -> TunerResult<()> {
    let tmp = path.with_extension("properties.tmp");
    {
        let mut file = File::create(&tmp)?;
        for (name, value) in config.iter() {
            writeln!(file, "{name}={value}")?;
        }
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Parse a properties file back into a configuration.
///
/// Lines are trimmed; blank lines are skipped. A line without `=` or with a
/// non-numeric value is a [`ParseError`]. No ordering is assumed.
pub fn read_properties(path: &Path) -> TunerResult<Configuration> {
    let text = fs::read_to_string(path)?;
    let mut config = Configuration::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = line.split_once('=').ok_or_else(|| ParseError::MalformedLine {
            line_no: idx + 1,
            line: raw.to_string(),
        })?;
        let key = key.trim();
        let value = value.trim();
        let parsed: f64 = value.parse().map_err(|_| ParseError::NonNumericValue {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        config.set(key, parsed);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nt_types::TunerError;

    fn sample_config() -> Configuration {
        let mut config = Configuration::new();
        config.set("finishTime", 0.95);
        config.set("giveUpTime", 0.07);
        config.set("maxListSize", 120.0);
        config
    }

    #[test]
    fn round_trip_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hyperparameter.properties");

        let config = sample_config();
        write_properties(&path, &config).unwrap();
        let back = read_properties(&path).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn write_is_a_full_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hyperparameter.properties");

        let mut old = Configuration::new();
        old.set("staleParameter", 9.0);
        write_properties(&path, &old).unwrap();

        write_properties(&path, &sample_config()).unwrap();
        let back = read_properties(&path).unwrap();
        assert_eq!(back.get("staleParameter"), None);
        assert_eq!(back.len(), 3);
    }

    #[test]
    fn read_tolerates_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.properties");
        fs::write(&path, "  finishTime = 0.95 \n\n giveUpTime=0.5\n").unwrap();

        let config = read_properties(&path).unwrap();
        assert_eq!(config.get("finishTime"), Some(0.95));
        assert_eq!(config.get("giveUpTime"), Some(0.5));
    }

    #[test]
    fn malformed_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.properties");
        fs::write(&path, "finishTime=0.95\nnot a pair\n").unwrap();

        match read_properties(&path) {
            Err(TunerError::Parse(ParseError::MalformedLine { line_no, .. })) => {
                assert_eq!(line_no, 2)
            }
            other => panic!("expected malformed-line error, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_value_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.properties");
        fs::write(&path, "finishTime=fast\n").unwrap();

        assert!(matches!(
            read_properties(&path),
            Err(TunerError::Parse(ParseError::NonNumericValue { .. }))
        ));
    }
}
