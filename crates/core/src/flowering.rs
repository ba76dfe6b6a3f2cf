//! Forecast flowering dates per observation spot.
//!
//! The master table lists forecast dates per spot as Japanese month-day
//! strings (`4月17日`). Dates are kept year-less and projected onto the
//! photo's year when needed, since the forecast table is reused across
//! seasons.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::csv::parse_csv;
use crate::error::CoreError;

/// Mean earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Days added to the full-bloom start when a spot has no end date.
pub const DEFAULT_FULL_BLOOM_DAYS: u64 = 5;

// Master CSV column headers.
const COL_SPOT_ID: &str = "地点番号";
const COL_PREFECTURE: &str = "都道府県";
const COL_ADDRESS: &str = "住所";
const COL_LATITUDE: &str = "緯度（10進法）";
const COL_LONGITUDE: &str = "経度（10進法）";
const COL_FLOWERING: &str = "開花予想日";
const COL_FULL_BLOOM_START: &str = "満開開始予想日";
const COL_FULL_BLOOM_END: &str = "満開終了予想日";
const COL_VARIETY: &str = "予想品種";
const COL_PUBLISHED: &str = "発表日";

// ---------------------------------------------------------------------------
// MonthDay
// ---------------------------------------------------------------------------

/// A calendar day without a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    pub fn new(month: u32, day: u32) -> Result<Self, CoreError> {
        // 2024 is a leap year, so 29 Feb is accepted here.
        if NaiveDate::from_ymd_opt(2024, month, day).is_none() {
            return Err(CoreError::Validation(format!(
                "Invalid month/day {month}/{day}"
            )));
        }
        Ok(Self { month, day })
    }

    /// Parse a `M月D日` string such as `4月17日`.
    ///
    /// Returns `Ok(None)` for blank or `-` cells, which mean "no data".
    pub fn parse_japanese(s: &str) -> Result<Option<Self>, CoreError> {
        let s = s.trim();
        if s.is_empty() || s == "-" {
            return Ok(None);
        }
        let invalid = || CoreError::Validation(format!("Invalid date string '{s}'"));
        let (month, rest) = s.split_once('月').ok_or_else(invalid)?;
        let day = rest.strip_suffix('日').ok_or_else(invalid)?;
        let month: u32 = month.trim().parse().map_err(|_| invalid())?;
        let day: u32 = day.trim().parse().map_err(|_| invalid())?;
        Self::new(month, day).map(Some)
    }

    /// Project onto `year`. `None` for 29 Feb on a non-leap year.
    pub fn on_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }
}

// ---------------------------------------------------------------------------
// Spots
// ---------------------------------------------------------------------------

/// One forecast spot from the flowering-date master.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloweringSpot {
    pub spot_id: String,
    pub prefecture: String,
    /// Always prefixed with the prefecture name.
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub flowering: MonthDay,
    pub full_bloom_start: MonthDay,
    pub full_bloom_end: Option<MonthDay>,
    pub variety: String,
    pub published: Option<MonthDay>,
}

/// A spot's forecast dates projected onto a concrete year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpotDates {
    pub flowering: NaiveDate,
    pub full_bloom_start: NaiveDate,
    pub full_bloom_end: NaiveDate,
}

impl SpotDates {
    /// Forecast dates of `spot` for `year`.
    ///
    /// A missing end date defaults to the full-bloom start plus
    /// [`DEFAULT_FULL_BLOOM_DAYS`].
    pub fn for_year(spot: &FloweringSpot, year: i32) -> Option<Self> {
        let flowering = spot.flowering.on_year(year)?;
        let full_bloom_start = spot.full_bloom_start.on_year(year)?;
        let full_bloom_end = match spot.full_bloom_end {
            Some(end) => end.on_year(year)?,
            None => full_bloom_start.checked_add_days(Days::new(DEFAULT_FULL_BLOOM_DAYS))?,
        };
        Some(Self {
            flowering,
            full_bloom_start,
            full_bloom_end,
        })
    }
}

/// Great-circle distance in metres (haversine).
pub fn distance_sphere(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1, lat2, lon2) = (
        lat1.to_radians(),
        lon1.to_radians(),
        lat2.to_radians(),
        lon2.to_radians(),
    );
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// All forecast spots, searchable by location.
#[derive(Debug, Clone, Default)]
pub struct FloweringCalendar {
    spots: Vec<FloweringSpot>,
}

impl FloweringCalendar {
    pub fn new(spots: Vec<FloweringSpot>) -> Self {
        Self { spots }
    }

    /// Parse the flowering-date master CSV.
    ///
    /// Returns the calendar plus one message per skipped row. Fails only if
    /// a required column header is missing.
    pub fn from_csv(text: &str) -> Result<(Self, Vec<String>), CoreError> {
        let mut rows = parse_csv(text).into_iter();
        let header = rows
            .next()
            .ok_or_else(|| CoreError::Validation("Flowering-date CSV is empty".into()))?;
        let col = |name: &str| {
            header
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| {
                    CoreError::Validation(format!("Flowering-date CSV is missing column '{name}'"))
                })
        };
        let idx = ColumnIndex {
            spot_id: col(COL_SPOT_ID)?,
            prefecture: col(COL_PREFECTURE)?,
            address: col(COL_ADDRESS)?,
            latitude: col(COL_LATITUDE)?,
            longitude: col(COL_LONGITUDE)?,
            flowering: col(COL_FLOWERING)?,
            full_bloom_start: col(COL_FULL_BLOOM_START)?,
            full_bloom_end: col(COL_FULL_BLOOM_END)?,
            variety: col(COL_VARIETY)?,
            published: col(COL_PUBLISHED)?,
        };

        let mut spots = Vec::new();
        let mut skipped = Vec::new();
        for (line_no, row) in rows.enumerate() {
            match parse_spot(&row, &idx) {
                Ok(spot) => spots.push(spot),
                // +2: one for the header, one for 1-based numbering.
                Err(e) => skipped.push(format!("line {}: {e}", line_no + 2)),
            }
        }
        Ok((Self { spots }, skipped))
    }

    pub fn spots(&self) -> &[FloweringSpot] {
        &self.spots
    }

    pub fn len(&self) -> usize {
        self.spots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spots.is_empty()
    }

    /// Closest spot to the given coordinates, or `None` if there are no spots.
    pub fn find_nearest_spot(&self, latitude: f64, longitude: f64) -> Option<&FloweringSpot> {
        self.spots
            .iter()
            .map(|s| {
                (
                    s,
                    distance_sphere(latitude, longitude, s.latitude, s.longitude),
                )
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(s, _)| s)
    }
}

struct ColumnIndex {
    spot_id: usize,
    prefecture: usize,
    address: usize,
    latitude: usize,
    longitude: usize,
    flowering: usize,
    full_bloom_start: usize,
    full_bloom_end: usize,
    variety: usize,
    published: usize,
}

fn parse_spot(row: &[String], idx: &ColumnIndex) -> Result<FloweringSpot, CoreError> {
    let cell = |i: usize| {
        row.get(i)
            .map(|s| s.trim())
            .ok_or_else(|| CoreError::Validation(format!("row has no column {i}")))
    };
    let required = |i: usize| {
        MonthDay::parse_japanese(cell(i)?)?
            .ok_or_else(|| CoreError::Validation(format!("column {i} has no date")))
    };
    let number = |i: usize| {
        let raw = cell(i)?;
        raw.parse::<f64>()
            .map_err(|_| CoreError::Validation(format!("'{raw}' is not a number")))
    };

    let prefecture = cell(idx.prefecture)?.to_string();
    let raw_address = cell(idx.address)?;
    let address = format!(
        "{prefecture}{}",
        raw_address.strip_prefix(prefecture.as_str()).unwrap_or(raw_address)
    );

    Ok(FloweringSpot {
        spot_id: cell(idx.spot_id)?.to_string(),
        prefecture,
        address,
        latitude: number(idx.latitude)?,
        longitude: number(idx.longitude)?,
        flowering: required(idx.flowering)?,
        full_bloom_start: required(idx.full_bloom_start)?,
        full_bloom_end: MonthDay::parse_japanese(cell(idx.full_bloom_end)?)?,
        variety: cell(idx.variety)?.to_string(),
        published: MonthDay::parse_japanese(cell(idx.published)?)?,
    })
}
