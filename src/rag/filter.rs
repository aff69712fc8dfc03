//! Metadata filters: request constraints → filter AST → vector-store query language

use std::collections::BTreeSet;

use chrono::NaiveDate;
use chrono::NaiveTime;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;

use crate::errors::Result;
use crate::errors::WooError;
use crate::models::fields;
use crate::models::Metadata;

/// Calendar date format accepted on the wire
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Lower bound used when no start date is given
pub fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Upper bound used when no end date is given
pub fn default_end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2100, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// Parse a `YYYY-MM-DD` date, reporting failures as validation errors
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| WooError::Validation(format!("{field} must be a YYYY-MM-DD date: {e}")))
}

/// Raw constraints as sent by callers (`filters` object of a request body)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    #[serde(default)]
    pub provinces: Option<Vec<String>>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl FilterParams {
    /// Fail unless both ends of the date range are present
    pub fn require_dates(&self) -> Result<()> {
        if self.start_date.is_none() {
            return Err(WooError::Validation("startDate is required".to_string()));
        }
        if self.end_date.is_none() {
            return Err(WooError::Validation("endDate is required".to_string()));
        }
        Ok(())
    }
}

/// Closed calendar-date interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Inclusive bounds as UTC epoch seconds: start of the first day to the last second of the last day
    #[must_use]
    pub fn epoch_bounds(&self) -> (i64, i64) {
        let low = self.start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let high = self
            .end
            .and_hms_opt(23, 59, 59)
            .map_or(i64::MAX, |dt| dt.and_utc().timestamp());
        (low, high)
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self {
            start: default_start_date(),
            end: default_end_date(),
        }
    }
}

/// Validated, immutable request constraints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFilter {
    pub regions: Option<BTreeSet<String>>,
    pub range: DateRange,
}

impl MetadataFilter {
    /// Lower the constraints to the filter AST
    #[must_use]
    pub fn to_filter(&self) -> Filter {
        let (low, high) = self.range.epoch_bounds();
        let range = Filter::Range {
            field: fields::DATE.to_string(),
            low,
            high,
        };

        match &self.regions {
            Some(regions) => Filter::And(vec![
                Filter::In {
                    field: fields::REGION.to_string(),
                    values: regions.clone(),
                },
                range,
            ]),
            None => range,
        }
    }
}

/// Filter predicate understood by the vector stores
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    And(Vec<Filter>),
    In {
        field: String,
        values: BTreeSet<String>,
    },
    /// Closed numeric interval
    Range { field: String, low: i64, high: i64 },
}

impl Filter {
    /// Serialize to the Chroma `where` language
    #[must_use]
    pub fn to_where(&self) -> Value {
        match self {
            Filter::And(members) if members.len() == 1 => members[0].to_where(),
            Filter::And(members) => {
                json!({ "$and": members.iter().map(Filter::to_where).collect::<Vec<_>>() })
            }
            Filter::In { field, values } => json!({ field.as_str(): { "$in": values } }),
            Filter::Range { field, low, high } => json!({
                "$and": [
                    { field.as_str(): { "$gte": low } },
                    { field.as_str(): { "$lte": high } },
                ]
            }),
        }
    }

    /// Evaluate the predicate against passage metadata
    #[must_use]
    pub fn matches(&self, metadata: &Metadata) -> bool {
        match self {
            Filter::And(members) => members.iter().all(|f| f.matches(metadata)),
            Filter::In { field, values } => metadata
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|v| values.contains(v)),
            Filter::Range { field, low, high } => metadata
                .get(field)
                .and_then(epoch_seconds)
                .is_some_and(|v| (*low..=*high).contains(&v)),
        }
    }
}

/// Numeric metadata, or a `YYYY-MM-DD` string, as epoch seconds
fn epoch_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .ok()
            .map(|d| d.and_time(NaiveTime::MIN).and_utc().timestamp()),
        _ => None,
    }
}

/// Turns caller constraints into a [`MetadataFilter`]
pub struct MetadataFilterBuilder;

impl MetadataFilterBuilder {
    /// Build from typed constraints. Missing dates fall back to 1900-01-01 / 2100-12-31.
    pub fn build(
        regions: Option<&[String]>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<MetadataFilter> {
        let regions = match regions {
            Some(list) if !list.is_empty() => {
                let mut set = BTreeSet::new();
                for region in list {
                    let region = region.trim();
                    if region.is_empty() {
                        return Err(WooError::Validation(
                            "province names must not be empty".to_string(),
                        ));
                    }
                    set.insert(region.to_string());
                }
                Some(set)
            }
            _ => None,
        };

        let range = DateRange {
            start: start.unwrap_or_else(default_start_date),
            end: end.unwrap_or_else(default_end_date),
        };
        if range.start > range.end {
            return Err(WooError::Validation(format!(
                "startDate {} is after endDate {}",
                range.start, range.end
            )));
        }

        Ok(MetadataFilter { regions, range })
    }

    /// Build from the raw request representation
    pub fn from_params(params: &FilterParams) -> Result<MetadataFilter> {
        let start = params
            .start_date
            .as_deref()
            .map(|raw| parse_date("startDate", raw))
            .transpose()?;
        let end = params
            .end_date
            .as_deref()
            .map(|raw| parse_date("endDate", raw))
            .transpose()?;
        Self::build(params.provinces.as_deref(), start, end)
    }
}
