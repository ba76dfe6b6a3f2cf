//! Bloom status derivation.
//!
//! A photo's bloom status is computed from its date, the forecast dates of
//! the nearest flowering spot and per-prefecture day offsets taken from the
//! reference calendar. Phases are half-open: a photo taken exactly on a
//! phase's first day belongs to that phase.

use std::collections::HashMap;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::csv::parse_csv;
use crate::error::CoreError;
use crate::flowering::{FloweringCalendar, MonthDay, SpotDates};

/// Rows before the first data row of the reference calendar (two header
/// rows plus one example row).
const OFFSET_CSV_SKIP_ROWS: usize = 3;

/// Minimum columns of a usable reference calendar row.
const OFFSET_CSV_MIN_COLUMNS: usize = 9;

/// Non-leap year used to turn month-days into comparable dates.
const OFFSET_BASE_YEAR: i32 = 2025;

// ---------------------------------------------------------------------------
// BloomStatus
// ---------------------------------------------------------------------------

/// The eight ordinal bloom phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BloomStatus {
    #[serde(rename = "before_bloom")]
    BeforeBloom,
    #[serde(rename = "blooming")]
    Blooming,
    #[serde(rename = "30_percent")]
    ThirtyPercent,
    #[serde(rename = "50_percent")]
    FiftyPercent,
    #[serde(rename = "full_bloom")]
    FullBloom,
    #[serde(rename = "falling")]
    Falling,
    #[serde(rename = "with_leaves")]
    WithLeaves,
    #[serde(rename = "leaves_only")]
    LeavesOnly,
}

impl BloomStatus {
    /// All phases in ordinal order.
    pub const ALL: [BloomStatus; 8] = [
        Self::BeforeBloom,
        Self::Blooming,
        Self::ThirtyPercent,
        Self::FiftyPercent,
        Self::FullBloom,
        Self::Falling,
        Self::WithLeaves,
        Self::LeavesOnly,
    ];

    /// Key stored in `entire_trees.bloom_status`.
    pub fn key(&self) -> &'static str {
        match self {
            Self::BeforeBloom => "before_bloom",
            Self::Blooming => "blooming",
            Self::ThirtyPercent => "30_percent",
            Self::FiftyPercent => "50_percent",
            Self::FullBloom => "full_bloom",
            Self::Falling => "falling",
            Self::WithLeaves => "with_leaves",
            Self::LeavesOnly => "leaves_only",
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::BeforeBloom => "開花前",
            Self::Blooming => "開花",
            Self::ThirtyPercent => "3分咲き",
            Self::FiftyPercent => "5分咲き",
            Self::FullBloom => "8分咲き（満開）",
            Self::Falling => "散り始め",
            Self::WithLeaves => "花＋若葉（葉桜）",
            Self::LeavesOnly => "葉のみ",
        }
    }

    pub fn from_key(key: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|s| s.key() == key)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid bloom status '{key}'. Must be one of: {}",
                    Self::ALL.map(|s| s.key()).join(", ")
                ))
            })
    }

    /// Label for a stored key; `None` for null or unknown keys.
    pub fn label_for_key(key: Option<&str>) -> Option<&'static str> {
        key.and_then(|k| Self::from_key(k).ok()).map(|s| s.label())
    }
}

// ---------------------------------------------------------------------------
// Offsets
// ---------------------------------------------------------------------------

/// Day offsets between phases for one prefecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefectureOffsets {
    /// Flowering to 30% bloom.
    pub flowering_to_30: i64,
    /// Flowering to 50% bloom.
    pub flowering_to_50: i64,
    /// Falling (end of full bloom) to flowers-with-leaves.
    pub end_to_with_leaves: i64,
    /// Falling (end of full bloom) to leaves only.
    pub end_to_leaves_only: i64,
}

/// Per-prefecture offsets keyed by two-digit prefecture code.
#[derive(Debug, Clone, Default)]
pub struct BloomOffsetTable {
    offsets: HashMap<String, PrefectureOffsets>,
}

impl BloomOffsetTable {
    pub fn new(offsets: HashMap<String, PrefectureOffsets>) -> Self {
        Self { offsets }
    }

    /// Parse the reference calendar.
    ///
    /// Column layout: 0 prefecture code, 2 flowering, 3 30%, 4 50%,
    /// 6 falling, 7 with leaves, 8 leaves only. Prefectures without data
    /// (`-` in the flowering column) are left out silently; rows with
    /// unreadable dates are left out and reported.
    pub fn from_csv(text: &str) -> (Self, Vec<String>) {
        let mut offsets = HashMap::new();
        let mut skipped = Vec::new();

        for row in parse_csv(text).into_iter().skip(OFFSET_CSV_SKIP_ROWS) {
            if row.len() < OFFSET_CSV_MIN_COLUMNS {
                continue;
            }
            let code = row[0].trim();
            if code == "例" || row[2].trim() == "-" {
                continue;
            }
            match parse_offsets(&row) {
                Ok(o) => {
                    offsets.insert(code.to_string(), o);
                }
                Err(e) => skipped.push(format!("prefecture {code}: {e}")),
            }
        }
        (Self { offsets }, skipped)
    }

    pub fn get(&self, prefecture_code: &str) -> Option<&PrefectureOffsets> {
        self.offsets.get(prefecture_code)
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

fn parse_offsets(row: &[String]) -> Result<PrefectureOffsets, CoreError> {
    let date = |i: usize| -> Result<NaiveDate, CoreError> {
        MonthDay::parse_japanese(&row[i])?
            .and_then(|md| md.on_year(OFFSET_BASE_YEAR))
            .ok_or_else(|| CoreError::Validation(format!("column {i} has no date")))
    };
    let flowering = date(2)?;
    let thirty = date(3)?;
    let fifty = date(4)?;
    let falling = date(6)?;
    let with_leaves = date(7)?;
    let leaves_only = date(8)?;

    Ok(PrefectureOffsets {
        flowering_to_30: (thirty - flowering).num_days(),
        flowering_to_50: (fifty - flowering).num_days(),
        end_to_with_leaves: (with_leaves - falling).num_days(),
        end_to_leaves_only: (leaves_only - falling).num_days(),
    })
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

fn shift(date: NaiveDate, days: i64) -> NaiveDate {
    let magnitude = Days::new(days.unsigned_abs());
    let shifted = if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    };
    shifted.unwrap_or(date)
}

/// Classify a photo date against a spot's forecast and the prefecture's
/// offsets.
pub fn classify(photo_date: NaiveDate, dates: &SpotDates, offsets: &PrefectureOffsets) -> BloomStatus {
    let thirty_start = shift(dates.flowering, offsets.flowering_to_30);
    let fifty_start = shift(dates.flowering, offsets.flowering_to_50);
    let with_leaves_start = shift(dates.full_bloom_end, offsets.end_to_with_leaves);
    let leaves_only_start = shift(dates.full_bloom_end, offsets.end_to_leaves_only);

    if photo_date < dates.flowering {
        BloomStatus::BeforeBloom
    } else if photo_date < thirty_start {
        BloomStatus::Blooming
    } else if photo_date < fifty_start {
        BloomStatus::ThirtyPercent
    } else if photo_date < dates.full_bloom_start {
        BloomStatus::FiftyPercent
    } else if photo_date < dates.full_bloom_end {
        BloomStatus::FullBloom
    } else if photo_date < with_leaves_start {
        BloomStatus::Falling
    } else if photo_date < leaves_only_start {
        BloomStatus::WithLeaves
    } else {
        BloomStatus::LeavesOnly
    }
}

/// Offsets table plus flowering calendar, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct BloomStateCalculator {
    offsets: BloomOffsetTable,
    calendar: FloweringCalendar,
}

impl BloomStateCalculator {
    pub fn new(offsets: BloomOffsetTable, calendar: FloweringCalendar) -> Self {
        Self { offsets, calendar }
    }

    pub fn offsets(&self) -> &BloomOffsetTable {
        &self.offsets
    }

    pub fn calendar(&self) -> &FloweringCalendar {
        &self.calendar
    }

    /// Bloom status for a photo, or `None` when it cannot be determined
    /// (no prefecture, no offsets for it, no spot, or the forecast dates do
    /// not exist in the photo's year).
    pub fn calculate(
        &self,
        photo_date: NaiveDate,
        latitude: f64,
        longitude: f64,
        prefecture_code: Option<&str>,
    ) -> Option<BloomStatus> {
        let code = prefecture_code.filter(|c| !c.is_empty())?;
        let offsets = self.offsets.get(code)?;
        let spot = self.calendar.find_nearest_spot(latitude, longitude)?;
        let dates = SpotDates::for_year(spot, photo_date.year())?;
        Some(classify(photo_date, &dates, offsets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const OFFSET_CSV: &str = "\
都道府県コード,都道府県,開花,3分咲き,5分咲き,満開,散り始め,花＋若葉,葉のみ
,,,,,,,,
例,例,3月20日,3月22日,3月23日,3月25日,3月30日,4月4日,4月9日
02,青森県,4月17日,4月19日,4月20日,4月22日,4月27日,5月2日,5月7日
13,東京都,3月24日,3月26日,3月28日,3月31日,4月5日,4月9日,4月14日
47,沖縄県,-,-,-,-,-,-,-
99,不明,3月1日,壊れた,3月3日,3月4日,3月5日,3月6日,3月7日
short,row
";

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).unwrap()
    }

    fn aomori() -> PrefectureOffsets {
        PrefectureOffsets {
            flowering_to_30: 2,
            flowering_to_50: 3,
            end_to_with_leaves: 5,
            end_to_leaves_only: 10,
        }
    }

    fn aomori_dates() -> SpotDates {
        SpotDates {
            flowering: d(4, 17),
            full_bloom_start: d(4, 22),
            full_bloom_end: d(4, 26),
        }
    }

    #[test]
    fn keys_and_labels() {
        assert_eq!(BloomStatus::ThirtyPercent.key(), "30_percent");
        assert_eq!(BloomStatus::FullBloom.label(), "8分咲き（満開）");
        assert_eq!(BloomStatus::from_key("leaves_only").unwrap(), BloomStatus::LeavesOnly);
        assert_matches!(BloomStatus::from_key("snow"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn serde_uses_storage_keys() {
        let json = serde_json::to_string(&BloomStatus::FiftyPercent).unwrap();
        assert_eq!(json, "\"50_percent\"");
    }

    #[test]
    fn label_for_unknown_key_is_none() {
        assert_eq!(BloomStatus::label_for_key(Some("falling")), Some("散り始め"));
        assert_eq!(BloomStatus::label_for_key(Some("bogus")), None);
        assert_eq!(BloomStatus::label_for_key(None), None);
    }

    #[test]
    fn all_is_in_ordinal_order() {
        let mut sorted = BloomStatus::ALL;
        sorted.sort();
        assert_eq!(sorted, BloomStatus::ALL);
    }

    #[test]
    fn offset_table_parses_aomori() {
        let (table, _) = BloomOffsetTable::from_csv(OFFSET_CSV);
        assert_eq!(table.get("02"), Some(&aomori()));
    }

    #[test]
    fn offset_table_skips_examples_and_missing_data() {
        let (table, skipped) = BloomOffsetTable::from_csv(OFFSET_CSV);
        assert_eq!(table.len(), 2);
        assert!(table.get("例").is_none());
        assert!(table.get("47").is_none());
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].contains("99"));
    }

    #[test]
    fn classify_phase_boundaries() {
        let dates = aomori_dates();
        let o = aomori();
        let cases = [
            (d(4, 16), BloomStatus::BeforeBloom),
            (d(4, 17), BloomStatus::Blooming),
            (d(4, 18), BloomStatus::Blooming),
            (d(4, 19), BloomStatus::ThirtyPercent),
            (d(4, 20), BloomStatus::FiftyPercent),
            (d(4, 21), BloomStatus::FiftyPercent),
            (d(4, 22), BloomStatus::FullBloom),
            (d(4, 25), BloomStatus::FullBloom),
            (d(4, 26), BloomStatus::Falling),
            (d(4, 30), BloomStatus::Falling),
            (d(5, 1), BloomStatus::WithLeaves),
            (d(5, 5), BloomStatus::WithLeaves),
            (d(5, 6), BloomStatus::LeavesOnly),
            (d(8, 1), BloomStatus::LeavesOnly),
        ];
        for (photo, expected) in cases {
            assert_eq!(classify(photo, &dates, &o), expected, "photo date {photo}");
        }
    }

    fn calculator() -> BloomStateCalculator {
        let (offsets, _) = BloomOffsetTable::from_csv(OFFSET_CSV);
        let calendar_csv = "地点番号,都道府県,住所,緯度（10進法）,経度（10進法）,開花予想日,満開開始予想日,満開終了予想日,予想品種,発表日\n\
                            1,青森県,青森県弘前市,40.6031,140.4640,4月17日,4月22日,-,ソメイヨシノ,3月1日\n";
        let (calendar, _) = FloweringCalendar::from_csv(calendar_csv).unwrap();
        BloomStateCalculator::new(offsets, calendar)
    }

    #[test]
    fn calculator_uses_nearest_spot_and_default_end() {
        let calc = calculator();
        // End defaults to 4/22 + 5 = 4/27.
        assert_eq!(
            calc.calculate(d(4, 26), 40.6, 140.46, Some("02")),
            Some(BloomStatus::FullBloom)
        );
        assert_eq!(
            calc.calculate(d(4, 27), 40.6, 140.46, Some("02")),
            Some(BloomStatus::Falling)
        );
    }

    #[test]
    fn calculator_projects_onto_photo_year() {
        let calc = calculator();
        let photo = NaiveDate::from_ymd_opt(2023, 4, 16).unwrap();
        assert_eq!(
            calc.calculate(photo, 40.6, 140.46, Some("02")),
            Some(BloomStatus::BeforeBloom)
        );
    }

    #[test]
    fn calculator_returns_none_without_inputs() {
        let calc = calculator();
        assert_eq!(calc.calculate(d(4, 20), 40.6, 140.46, None), None);
        assert_eq!(calc.calculate(d(4, 20), 40.6, 140.46, Some("")), None);
        assert_eq!(calc.calculate(d(4, 20), 40.6, 140.46, Some("47")), None);

        let empty = BloomStateCalculator::new(calc.offsets().clone(), FloweringCalendar::default());
        assert_eq!(empty.calculate(d(4, 20), 40.6, 140.46, Some("02")), None);
    }
}
