//! Query and result types shared by every provider.
//!
//! # Query types
//!
//! | Type | Typical vendor vertical |
//! |------|-------------------------|
//! | [`QueryType::Web`] | organic web results |
//! | [`QueryType::News`] | news articles with publication dates |
//! | [`QueryType::Images`] | image results with thumbnails |
//!
//! # Example
//!
//! ```rust
//! use scout_core::{ProviderId, Query, QueryType};
//!
//! let query = Query::new("rust async runtimes", QueryType::News)
//!     .expect("valid query")
//!     .with_max_results(5)
//!     .expect("in range")
//!     .with_provider(ProviderId::Beta);
//!
//! assert_eq!(query.explicit_provider, Some(ProviderId::Beta));
//! ```

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ProviderId, ValidationError};

/// Smallest accepted `max_results`.
pub const MIN_RESULTS: usize = 1;
/// Largest accepted `max_results`.
pub const MAX_RESULTS: usize = 50;
/// `max_results` used when the caller does not pick one.
pub const DEFAULT_RESULTS: usize = 10;

/// Search vertical requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Web,
    News,
    Images,
}

impl QueryType {
    pub const ALL: [Self; 3] = [Self::Web, Self::News, Self::Images];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::News => "news",
            Self::Images => "images",
        }
    }
}

impl Display for QueryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "web" => Ok(Self::Web),
            "news" => Ok(Self::News),
            "images" | "image" => Ok(Self::Images),
            other => Err(ValidationError::InvalidQueryType {
                value: other.to_owned(),
            }),
        }
    }
}

/// Recency filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    Day,
    Week,
    Month,
    Year,
}

impl DateRange {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl FromStr for DateRange {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" | "d" => Ok(Self::Day),
            "week" | "w" => Ok(Self::Week),
            "month" | "m" => Ok(Self::Month),
            "year" | "y" => Ok(Self::Year),
            other => Err(ValidationError::InvalidDateRange {
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafeSearch {
    Off,
    Moderate,
    Strict,
}

impl SafeSearch {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Moderate => "moderate",
            Self::Strict => "strict",
        }
    }
}

impl FromStr for SafeSearch {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "moderate" => Ok(Self::Moderate),
            "strict" => Ok(Self::Strict),
            other => Err(ValidationError::InvalidSafeSearch {
                value: other.to_owned(),
            }),
        }
    }
}

/// A semantic search request.
///
/// `explicit_provider` pins the call to exactly one provider and disables fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub query_type: QueryType,
    pub max_results: usize,
    pub date_range: Option<DateRange>,
    pub region: Option<String>,
    pub language: Option<String>,
    pub safe_search: Option<SafeSearch>,
    pub explicit_provider: Option<ProviderId>,
}

impl Query {
    pub fn new(text: impl Into<String>, query_type: QueryType) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyQuery);
        }

        Ok(Self {
            text,
            query_type,
            max_results: DEFAULT_RESULTS,
            date_range: None,
            region: None,
            language: None,
            safe_search: None,
            explicit_provider: None,
        })
    }

    /// Minimal query used by provider health probes.
    pub fn probe() -> Self {
        Self {
            text: String::from("health check"),
            query_type: QueryType::Web,
            max_results: MIN_RESULTS,
            date_range: None,
            region: None,
            language: None,
            safe_search: None,
            explicit_provider: None,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Result<Self, ValidationError> {
        if !(MIN_RESULTS..=MAX_RESULTS).contains(&max_results) {
            return Err(ValidationError::MaxResultsOutOfRange {
                value: max_results,
                min: MIN_RESULTS,
                max: MAX_RESULTS,
            });
        }
        self.max_results = max_results;
        Ok(self)
    }

    pub fn with_date_range(mut self, date_range: DateRange) -> Self {
        self.date_range = Some(date_range);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_safe_search(mut self, safe_search: SafeSearch) -> Self {
        self.safe_search = Some(safe_search);
        self
    }

    pub fn with_provider(mut self, provider: ProviderId) -> Self {
        self.explicit_provider = Some(provider);
        self
    }
}

/// One normalized search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchItem {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Publication date as reported by the vendor (news results).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    /// Thumbnail or full image URL (image results).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Normalized search response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub items: Vec<SearchItem>,
    /// The query text echoed back.
    pub query: String,
    pub query_type: QueryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_results: Option<u64>,
    pub provider_id: ProviderId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_query_uses_defaults() {
        let query = Query::new("rust", QueryType::Web).expect("valid query");

        assert_eq!(query.max_results, DEFAULT_RESULTS);
        assert_eq!(query.explicit_provider, None);
        assert_eq!(query.date_range, None);
    }

    #[test]
    fn blank_text_is_rejected() {
        let error = Query::new("   ", QueryType::Web).expect_err("blank text");
        assert_eq!(error, ValidationError::EmptyQuery);
    }

    #[test]
    fn max_results_must_be_in_range() {
        let query = Query::new("rust", QueryType::Web).expect("valid query");

        assert!(query.clone().with_max_results(0).is_err());
        assert!(query.clone().with_max_results(MAX_RESULTS + 1).is_err());
        assert_eq!(
            query.with_max_results(MAX_RESULTS).expect("upper bound").max_results,
            MAX_RESULTS
        );
    }

    #[test]
    fn enum_names_parse() {
        assert_eq!("Images".parse::<QueryType>(), Ok(QueryType::Images));
        assert_eq!("w".parse::<DateRange>(), Ok(DateRange::Week));
        assert_eq!("strict".parse::<SafeSearch>(), Ok(SafeSearch::Strict));
        assert!("video".parse::<QueryType>().is_err());
    }
}
