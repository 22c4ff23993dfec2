//! Data models for retrieved records and the tables derived from them.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Record`]: One search result as returned by the content API
//! - [`QuerySpec`]: The keyword and date range bounding one ingestion run
//! - [`PageResult`]: One decoded page of results (transient)
//! - Derived tables: [`DailySeries`], [`SectionCount`], [`AnomalyEntry`],
//!   [`DateEvents`], [`PeriodCount`]
//! - [`TrendReport`]: Everything a run computed, ready for the output writers
//!
//! Records keep the API's camelCase field names on the wire via serde renames.

use crate::error::{IngestionError, inverted_range_reason};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Content kind tag carried by article records.
pub const ARTICLE_KIND: &str = "article";

/// A single search result.
///
/// Records are immutable once fetched; the analytics modules only ever
/// borrow them.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Record {
    /// Opaque identifier, unique within a query.
    pub id: String,
    /// The result title (`webTitle`).
    #[serde(rename = "webTitle")]
    pub title: String,
    /// Publication instant, normalized to UTC.
    #[serde(
        rename = "webPublicationDate",
        deserialize_with = "deserialize_publication_timestamp"
    )]
    pub publication_timestamp: DateTime<Utc>,
    /// Section name, absent for some content kinds.
    #[serde(rename = "sectionName", default)]
    pub category: Option<String>,
    /// Content kind, e.g. `"article"` or `"liveblog"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Public URL of the item.
    #[serde(rename = "webUrl")]
    pub url: String,
    /// Optional extra fields requested with `show-fields`.
    #[serde(default)]
    pub fields: Option<RecordFields>,
}

/// Extra fields returned when requested through `show-fields`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RecordFields {
    pub headline: Option<String>,
    pub byline: Option<String>,
}

impl Record {
    /// Whether this record counts towards article statistics.
    pub fn is_article(&self) -> bool {
        self.kind == ARTICLE_KIND
    }

    /// Calendar day of publication (UTC).
    pub fn publication_date(&self) -> NaiveDate {
        self.publication_timestamp.date_naive()
    }

    /// Headline from the requested fields, if the API sent one.
    pub fn headline(&self) -> Option<&str> {
        self.fields.as_ref().and_then(|f| f.headline.as_deref())
    }
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
fn deserialize_publication_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_publication_timestamp(&raw).map_err(serde::de::Error::custom)
}

pub fn parse_publication_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| format!("unrecognised publication timestamp: {raw:?}"))
}

/// The keyword and inclusive date range for one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuerySpec {
    pub keyword: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

impl QuerySpec {
    /// Build a query, rejecting inverted ranges and blank keywords.
    pub fn new(
        keyword: impl Into<String>,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Self, IngestionError> {
        let query = Self {
            keyword: keyword.into(),
            from_date,
            to_date,
        };
        query.validate()?;
        Ok(query)
    }

    pub fn validate(&self) -> Result<(), IngestionError> {
        if self.keyword.trim().is_empty() {
            return Err(IngestionError::InvalidQuery {
                reason: "keyword must not be blank".to_string(),
            });
        }
        if self.from_date > self.to_date {
            return Err(IngestionError::InvalidQuery {
                reason: inverted_range_reason(self.from_date, self.to_date),
            });
        }
        Ok(())
    }
}

/// One decoded page. Consumed immediately by the ingestion loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub items: Vec<Record>,
    pub page_number: u32,
    pub total_pages: u32,
}

/// Article count for a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// A gap-free, date-ordered per-day article count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailySeries {
    entries: Vec<DailyCount>,
}

impl DailySeries {
    pub(crate) fn from_entries(entries: Vec<DailyCount>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DailyCount> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total articles across every day.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// Average articles per calendar day, zero-count days included.
    pub fn mean(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.total() as f64 / self.entries.len() as f64
        }
    }

    /// Number of days with at least one article.
    pub fn active_days(&self) -> usize {
        self.entries.iter().filter(|e| e.count > 0).count()
    }
}

impl<'a> IntoIterator for &'a DailySeries {
    type Item = &'a DailyCount;
    type IntoIter = std::slice::Iter<'a, DailyCount>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Article count for one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionCount {
    pub category: String,
    pub count: u64,
}

/// A day whose count fell outside the anomaly band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyEntry {
    pub date: NaiveDate,
    pub count: u64,
}

/// Distribution summary of a daily series and its anomaly band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub mean: f64,
    pub std_dev: f64,
    pub threshold: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Summed article count for a calendar bucket (week, month, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodCount {
    pub period_start: NaiveDate,
    pub count: u64,
}

/// The inspectable fields of an article published on a flagged day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetail {
    pub title: String,
    pub category: Option<String>,
    pub url: String,
    pub publication_timestamp: DateTime<Utc>,
}

/// All inspected articles for one date. `articles` may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateEvents {
    pub date: NaiveDate,
    pub articles: Vec<EventDetail>,
}

/// Everything one run computed, handed to the output writers.
#[derive(Debug, Clone, Serialize)]
pub struct TrendReport {
    pub keyword: String,
    pub filter: Option<String>,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    /// Records retrieved (or kept by the filter), any kind.
    pub total_records: usize,
    pub total_articles: u64,
    pub average_per_day: f64,
    pub active_days: usize,
    pub group_by: String,
    pub stats: SeriesStats,
    pub daily: DailySeries,
    pub periods: Vec<PeriodCount>,
    pub sections: Vec<SectionCount>,
    pub anomalies: Vec<AnomalyEntry>,
    pub events: Vec<DateEvents>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Test helper shared by the analytics modules.
    pub(crate) fn record(id: &str, kind: &str, ts: &str, category: Option<&str>) -> Record {
        Record {
            id: id.to_string(),
            title: format!("Title {id}"),
            publication_timestamp: parse_publication_timestamp(ts).unwrap(),
            category: category.map(str::to_string),
            kind: kind.to_string(),
            url: format!("https://www.theguardian.com/{id}"),
            fields: None,
        }
    }

    pub(crate) fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_record_deserialization() {
        let json = r#"{
            "id": "world/2019/oct/22/trudeau",
            "type": "article",
            "sectionId": "world",
            "sectionName": "World news",
            "webPublicationDate": "2019-10-22T04:12:09Z",
            "webTitle": "Justin Trudeau wins second term",
            "webUrl": "https://www.theguardian.com/world/2019/oct/22/trudeau",
            "apiUrl": "https://content.guardianapis.com/world/2019/oct/22/trudeau",
            "fields": { "headline": "Trudeau wins", "byline": "Leyland Cecco" }
        }"#;

        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.title, "Justin Trudeau wins second term");
        assert_eq!(record.category.as_deref(), Some("World news"));
        assert!(record.is_article());
        assert_eq!(record.publication_date(), date("2019-10-22"));
        assert_eq!(record.headline(), Some("Trudeau wins"));
    }

    #[test]
    fn test_record_without_section_or_fields() {
        let json = r#"{
            "id": "x",
            "type": "liveblog",
            "webPublicationDate": "2019-10-22",
            "webTitle": "Live",
            "webUrl": "https://example.com/x"
        }"#;

        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.category, None);
        assert!(!record.is_article());
        assert_eq!(record.headline(), None);
        assert_eq!(record.publication_date(), date("2019-10-22"));
    }

    #[test]
    fn test_timestamp_normalized_to_utc() {
        let ts = parse_publication_timestamp("2019-10-22T23:30:00-05:00").unwrap();
        assert_eq!(ts.date_naive(), date("2019-10-23"));
        assert!(parse_publication_timestamp("last tuesday").is_err());
    }

    #[test]
    fn test_query_spec_rejects_inverted_range() {
        let err = QuerySpec::new("Trudeau", date("2020-01-02"), date("2020-01-01")).unwrap_err();
        assert!(matches!(err, IngestionError::InvalidQuery { .. }));

        let same_day = QuerySpec::new("Trudeau", date("2020-01-01"), date("2020-01-01"));
        assert!(same_day.is_ok());
    }

    #[test]
    fn test_query_spec_rejects_blank_keyword() {
        let err = QuerySpec::new("   ", date("2020-01-01"), date("2020-01-02")).unwrap_err();
        assert!(matches!(err, IngestionError::InvalidQuery { .. }));
    }

    #[test]
    fn test_daily_series_summaries() {
        let series = DailySeries::from_entries(vec![
            DailyCount { date: date("2018-01-01"), count: 0 },
            DailyCount { date: date("2018-01-02"), count: 3 },
            DailyCount { date: date("2018-01-03"), count: 0 },
            DailyCount { date: date("2018-01-04"), count: 1 },
        ]);

        assert_eq!(series.total(), 4);
        assert_eq!(series.active_days(), 2);
        assert!((series.mean() - 1.0).abs() < f64::EPSILON);
        assert_eq!(DailySeries::default().mean(), 0.0);
    }
}
