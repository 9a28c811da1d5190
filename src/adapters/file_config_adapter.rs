//! INI file configuration adapter.

use configparser::ini::Ini;
use std::path::Path;

use crate::ports::config_port::ConfigPort;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_journal_sections() {
        let content = r#"
[sqlite]
path = journal.db
pool_size = 2

[journal]
min_trades = 5
period = last_quarter

[signals]
lookback_days = 90
top_n = 5
max_position_pct = 0.25
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("sqlite", "path"),
            Some("journal.db".to_string())
        );
        assert_eq!(adapter.get_int("sqlite", "pool_size", 4), 2);
        assert_eq!(adapter.get_usize("journal", "min_trades", 10), 5);
        assert_eq!(
            adapter.get_string("journal", "period"),
            Some("last_quarter".to_string())
        );
        assert_eq!(adapter.get_usize("signals", "lookback_days", 90), 90);
        assert_eq!(adapter.get_double("signals", "max_position_pct", 0.0), 0.25);
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[journal]\nmin_trades = 10\n").unwrap();
        assert_eq!(adapter.get_string("journal", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[journal]\nmin_trades = abc\n").unwrap();
        assert_eq!(adapter.get_int("journal", "min_trades", 42), 42);
    }

    #[test]
    fn get_usize_refuses_negative_values() {
        let adapter = FileConfigAdapter::from_string("[signals]\ntop_n = -3\n").unwrap();
        assert_eq!(adapter.get_usize("signals", "top_n", 5), 5);
    }

    #[test]
    fn get_double_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[signals]\n").unwrap();
        assert_eq!(adapter.get_double("signals", "missing", 99.9), 99.9);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[sqlite]\npath = /tmp/journal.db\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("sqlite", "path"),
            Some("/tmp/journal.db".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(result.is_err());
    }
}
