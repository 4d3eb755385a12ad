/*!
City record definition.
*/

use serde::{Deserialize, Serialize};

/// Caller-assigned unique key of a city record.
pub type CityId = i64;

/// A single city in the directory.
///
/// Field order matters: it is the column order of the snapshot file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct City {
    /// Unique key, assigned by the caller and never changed by the store
    pub id: CityId,

    /// City name
    pub name: String,

    /// Region the city belongs to
    pub region: String,

    /// Federal district the region belongs to
    pub district: String,

    /// Number of inhabitants; the only field mutated after creation
    pub population: i64,

    /// Foundation year
    pub foundation: i64,
}

impl City {
    /// Create a new city record
    ///
    /// # Example
    /// ```rust
    /// use citydir_core::City;
    ///
    /// let city = City::new(1, "Omsk", "Omsk Oblast", "Siberian", 1_125_695, 1716);
    /// assert_eq!(city.id, 1);
    /// assert_eq!(city.region, "Omsk Oblast");
    /// ```
    pub fn new<S1, S2, S3>(
        id: CityId,
        name: S1,
        region: S2,
        district: S3,
        population: i64,
        foundation: i64,
    ) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self {
            id,
            name: name.into(),
            region: region.into(),
            district: district.into(),
            population,
            foundation,
        }
    }

    /// Replace the population count.
    pub fn update_population(&mut self, population: i64) {
        self.population = population;
    }
}
