/*!
Query filter engine for list requests.

A `CityQuery` holds the optional criteria exactly as a caller supplied them. It
compiles into a list of `CityFilter` predicates (region, district, population
range, foundation range, in that order); absent or empty criteria compile to
nothing. Every range is parsed before any record is inspected, so a malformed
range fails the whole query and no partial result is ever produced.
*/

use crate::city::City;
use crate::{DirectoryError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inclusive integer range written as `"<lower>-<upper>"`
///
/// The text must split on `-` into exactly two integers, so negative bounds
/// cannot be expressed.
///
/// # Example
/// ```rust
/// use citydir_core::query::Range;
///
/// let range: Range = "100-500".parse()?;
/// assert!(range.contains(100));
/// assert!(range.contains(500));
/// assert!(!range.contains(501));
/// # Ok::<(), citydir_core::DirectoryError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub lower: i64,
    pub upper: i64,
}

impl Range {
    pub fn new(lower: i64, upper: i64) -> Self {
        Self { lower, upper }
    }

    /// Whether `value` lies within the range, both bounds included
    pub fn contains(&self, value: i64) -> bool {
        self.lower <= value && value <= self.upper
    }

    /// Parse a range criterion, naming `field` in the error message
    pub fn parse_for(field: &str, text: &str) -> Result<Self> {
        let borders: Vec<&str> = text.split('-').collect();
        if borders.len() != 2 {
            return Err(DirectoryError::malformed_range(format!(
                "{field} value must be in the format 0-10, got `{text}`"
            )));
        }

        let bound = |raw: &str| {
            raw.trim().parse::<i64>().map_err(|e| {
                DirectoryError::malformed_range(format!(
                    "{field} bound `{}` is not an integer: {e}",
                    raw.trim()
                ))
            })
        };

        Ok(Self::new(bound(borders[0])?, bound(borders[1])?))
    }
}

impl FromStr for Range {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_for("range", s)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.lower, self.upper)
    }
}

/// One compiled predicate over a single city
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CityFilter {
    Region(String),
    District(String),
    Population(Range),
    Foundation(Range),
}

impl CityFilter {
    /// Whether `city` satisfies this predicate
    pub fn matches(&self, city: &City) -> bool {
        match self {
            Self::Region(region) => city.region == *region,
            Self::District(district) => city.district == *district,
            Self::Population(range) => range.contains(city.population),
            Self::Foundation(range) => range.contains(city.foundation),
        }
    }
}

/// Optional list criteria as received from a caller
///
/// Field names match the query-string parameters of the HTTP list route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityQuery {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    /// Population range, `"<lower>-<upper>"`
    #[serde(default)]
    pub population: Option<String>,
    /// Foundation year range, `"<lower>-<upper>"`
    #[serde(default)]
    pub foundation: Option<String>,
}

impl CityQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn district(mut self, district: impl Into<String>) -> Self {
        self.district = Some(district.into());
        self
    }

    pub fn population(mut self, range: impl Into<String>) -> Self {
        self.population = Some(range.into());
        self
    }

    pub fn foundation(mut self, range: impl Into<String>) -> Self {
        self.foundation = Some(range.into());
        self
    }

    /// Whether no criterion is set
    pub fn is_empty(&self) -> bool {
        present(&self.region).is_none()
            && present(&self.district).is_none()
            && present(&self.population).is_none()
            && present(&self.foundation).is_none()
    }

    /// Build the active predicates in evaluation order
    ///
    /// # Errors
    /// * `DirectoryError::MalformedRange` - If either range criterion is malformed
    pub fn compile(&self) -> Result<Vec<CityFilter>> {
        let mut filters = Vec::new();

        if let Some(region) = present(&self.region) {
            filters.push(CityFilter::Region(region.to_string()));
        }
        if let Some(district) = present(&self.district) {
            filters.push(CityFilter::District(district.to_string()));
        }
        if let Some(text) = present(&self.population) {
            filters.push(CityFilter::Population(Range::parse_for("population", text)?));
        }
        if let Some(text) = present(&self.foundation) {
            filters.push(CityFilter::Foundation(Range::parse_for("foundation", text)?));
        }

        Ok(filters)
    }

    /// Narrow `cities` to the records matching every criterion
    ///
    /// The input is never modified; matching records are cloned into a new
    /// vector in their original order.
    pub fn apply(&self, cities: &[City]) -> Result<Vec<City>> {
        let filters = self.compile()?;
        Ok(apply_filters(&filters, cities))
    }
}

/// Keep the cities that satisfy all `filters`
pub fn apply_filters(filters: &[CityFilter], cities: &[City]) -> Vec<City> {
    cities
        .iter()
        .filter(|city| filters.iter().all(|filter| filter.matches(city)))
        .cloned()
        .collect()
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
