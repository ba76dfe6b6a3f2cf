//! Startup loading of the reference CSVs behind bloom-status derivation and
//! the detail view's forecast dates.
//!
//! A missing or unreadable file is logged and leaves that table empty; the
//! service still starts and simply reports no bloom status.

use std::path::Path;

use hanami_core::bloom::{BloomOffsetTable, BloomStateCalculator};
use hanami_core::flowering::FloweringCalendar;

use crate::config::MasterDataConfig;

/// Load both CSVs and build the calculator.
pub fn load_bloom_calculator(config: &MasterDataConfig) -> BloomStateCalculator {
    BloomStateCalculator::new(
        load_offsets(&config.bloom_state_csv),
        load_calendar(&config.flowering_date_csv),
    )
}

pub fn load_calendar(path: &Path) -> FloweringCalendar {
    let Some(text) = read_master_file(path) else {
        return FloweringCalendar::default();
    };
    match FloweringCalendar::from_csv(&text) {
        Ok((calendar, skipped)) => {
            log_skipped(path, &skipped);
            tracing::info!(path = %path.display(), spots = calendar.len(), "Loaded flowering-date master");
            calendar
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Invalid flowering-date master");
            FloweringCalendar::default()
        }
    }
}

pub fn load_offsets(path: &Path) -> BloomOffsetTable {
    let Some(text) = read_master_file(path) else {
        return BloomOffsetTable::default();
    };
    let (table, skipped) = BloomOffsetTable::from_csv(&text);
    log_skipped(path, &skipped);
    tracing::info!(path = %path.display(), prefectures = table.len(), "Loaded bloom-state master");
    table
}

fn read_master_file(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to read master CSV");
            None
        }
    }
}

fn log_skipped(path: &Path, skipped: &[String]) {
    for reason in skipped {
        tracing::warn!(path = %path.display(), reason = %reason, "Skipped master CSV row");
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::NaiveDate;
    use hanami_core::bloom::BloomStatus;

    use super::*;

    const FLOWERING_CSV: &str = "\
地点番号,都道府県,住所,緯度（10進法）,経度（10進法）,開花予想日,満開開始予想日,満開終了予想日,予想品種,発表日
1,東京都,千代田区北の丸公園,35.6916,139.7526,3月24日,3月31日,4月5日,ソメイヨシノ,3月1日
";

    const OFFSET_CSV: &str = "\
都道府県コード,都道府県,開花,3分咲き,5分咲き,満開,散り始め,花＋若葉,葉のみ
,,,,,,,,
例,例,3月20日,3月22日,3月23日,3月25日,3月30日,4月4日,4月9日
13,東京都,3月24日,3月26日,3月28日,3月31日,4月5日,4月9日,4月14日
";

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_both_tables() {
        let flowering = write_temp(FLOWERING_CSV);
        let offsets = write_temp(OFFSET_CSV);
        let calculator = load_bloom_calculator(&MasterDataConfig {
            flowering_date_csv: flowering.path().to_path_buf(),
            bloom_state_csv: offsets.path().to_path_buf(),
        });

        assert_eq!(calculator.calendar().len(), 1);
        assert_eq!(calculator.offsets().len(), 1);

        let status = calculator.calculate(
            NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            35.69,
            139.75,
            Some("13"),
        );
        assert_eq!(status, Some(BloomStatus::FullBloom));
    }

    #[test]
    fn missing_files_leave_tables_empty() {
        let dir = tempfile::tempdir().unwrap();
        let calculator = load_bloom_calculator(&MasterDataConfig {
            flowering_date_csv: dir.path().join("absent.csv"),
            bloom_state_csv: dir.path().join("absent_too.csv"),
        });

        assert!(calculator.calendar().is_empty());
        assert!(calculator.offsets().is_empty());
    }
}
