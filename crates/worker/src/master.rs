//! Reference CSVs for the bloom-status batch.
//!
//! Unlike the API server, the batch refuses to run on missing master data:
//! every row would be skipped.

use std::path::PathBuf;

use anyhow::{bail, Context};
use hanami_core::bloom::{BloomOffsetTable, BloomStateCalculator};
use hanami_core::flowering::FloweringCalendar;

#[derive(Debug, Clone)]
pub struct MasterPaths {
    pub flowering_date_csv: PathBuf,
    pub bloom_state_csv: PathBuf,
}

impl MasterPaths {
    /// | Env Var              | Default                      |
    /// |----------------------|------------------------------|
    /// | `FLOWERING_DATE_CSV` | `master/flowering_date.csv`  |
    /// | `BLOOM_STATE_CSV`    | `master/bloom_state.csv`     |
    pub fn from_env() -> Self {
        Self {
            flowering_date_csv: std::env::var("FLOWERING_DATE_CSV")
                .unwrap_or_else(|_| "master/flowering_date.csv".into())
                .into(),
            bloom_state_csv: std::env::var("BLOOM_STATE_CSV")
                .unwrap_or_else(|_| "master/bloom_state.csv".into())
                .into(),
        }
    }
}

pub fn load(paths: &MasterPaths) -> anyhow::Result<BloomStateCalculator> {
    let text = std::fs::read_to_string(&paths.flowering_date_csv).with_context(|| {
        format!("reading {}", paths.flowering_date_csv.display())
    })?;
    let (calendar, skipped) = FloweringCalendar::from_csv(&text)
        .with_context(|| format!("parsing {}", paths.flowering_date_csv.display()))?;
    for reason in &skipped {
        tracing::warn!(path = %paths.flowering_date_csv.display(), reason = %reason, "Skipped master CSV row");
    }

    let text = std::fs::read_to_string(&paths.bloom_state_csv)
        .with_context(|| format!("reading {}", paths.bloom_state_csv.display()))?;
    let (offsets, skipped) = BloomOffsetTable::from_csv(&text);
    for reason in &skipped {
        tracing::warn!(path = %paths.bloom_state_csv.display(), reason = %reason, "Skipped master CSV row");
    }

    if calendar.is_empty() {
        bail!("{} has no forecast spots", paths.flowering_date_csv.display());
    }
    if offsets.is_empty() {
        bail!("{} has no prefecture offsets", paths.bloom_state_csv.display());
    }

    tracing::info!(
        spots = calendar.len(),
        prefectures = offsets.len(),
        "Loaded master data"
    );
    Ok(BloomStateCalculator::new(offsets, calendar))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

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

    #[test]
    fn loads_both_tables() {
        let flowering = write(FLOWERING_CSV);
        let offsets = write(OFFSET_CSV);
        let calc = load(&MasterPaths {
            flowering_date_csv: flowering.path().into(),
            bloom_state_csv: offsets.path().into(),
        })
        .unwrap();
        assert_eq!(calc.calendar().len(), 1);
        assert!(calc.offsets().get("13").is_some());
    }

    #[test]
    fn missing_file_is_an_error() {
        let offsets = write(OFFSET_CSV);
        let err = load(&MasterPaths {
            flowering_date_csv: "/nonexistent/flowering.csv".into(),
            bloom_state_csv: offsets.path().into(),
        })
        .unwrap_err();
        assert!(err.to_string().contains("flowering.csv"));
    }

    #[test]
    fn empty_offsets_are_an_error() {
        let flowering = write(FLOWERING_CSV);
        let offsets = write("都道府県コード,都道府県\n");
        assert!(load(&MasterPaths {
            flowering_date_csv: flowering.path().into(),
            bloom_state_csv: offsets.path().into(),
        })
        .is_err());
    }
}
