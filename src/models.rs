use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityCode(pub String);

impl CityCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub code: CityCode,
    pub name: String,
}

/// Canonical year key. The backend sends years either as integers or as
/// numeric strings; both land here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Year(pub i32);

impl<'de> Deserialize<'de> for Year {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawYear {
            Number(i64),
            Text(String),
        }

        match RawYear::deserialize(deserializer)? {
            RawYear::Number(value) => i32::try_from(value)
                .map(Year)
                .map_err(|_| D::Error::custom(format!("year out of range: {value}"))),
            RawYear::Text(text) => text
                .trim()
                .parse::<i32>()
                .map(Year)
                .map_err(|_| D::Error::custom(format!("invalid year: {text:?}"))),
        }
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A numeric value that may be absent. `Missing` serializes as `null`, which
/// chart surfaces draw as a gap.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Measure {
    Present(f64),
    #[default]
    Missing,
}

impl Measure {
    /// Any finite value.
    pub fn from_option(value: Option<f64>) -> Self {
        match value {
            Some(value) if value.is_finite() => Self::Present(value),
            _ => Self::Missing,
        }
    }

    /// Rates, counts and spending amounts: negative values are treated as
    /// missing rather than plotted.
    pub fn non_negative(value: Option<f64>) -> Self {
        match Self::from_option(value) {
            Self::Present(value) if value >= 0.0 => Self::Present(value),
            _ => Self::Missing,
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Self::Present(value) => Some(value),
            Self::Missing => None,
        }
    }
}

impl Serialize for Measure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Present(value) => serializer.serialize_f64(*value),
            Self::Missing => serializer.serialize_none(),
        }
    }
}

/// One row of a trend series (gender or age group).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub year: Year,
    pub category: String,
    pub value: Measure,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WelfareSpending {
    pub year: Year,
    pub spending: Measure,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NationwideAverages(pub BTreeMap<Year, Measure>);

impl NationwideAverages {
    pub fn get(&self, year: Year) -> Measure {
        self.0.get(&year).copied().unwrap_or(Measure::Missing)
    }
}

/// A city's spending next to the nationwide average for the same year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WelfareComparison {
    pub year: Year,
    pub city: Measure,
    pub nationwide: Measure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MunicipalityGroup {
    Special,
    Other,
}

impl MunicipalityGroup {
    pub const SPECIAL_LABEL: &'static str = "Yes";

    /// Total over every possible field value: only an exact match of the
    /// recognized label is special.
    pub fn classify(label: Option<&str>) -> Self {
        match label {
            Some(label) if label.trim() == Self::SPECIAL_LABEL => Self::Special,
            _ => Self::Other,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Special => "Special Municipality",
            Self::Other => "Other City/County",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourcePoint {
    pub year: Year,
    pub city_name: String,
    pub happiness: Measure,
    pub suicide_rate: Measure,
    pub group: MunicipalityGroup,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilitySite {
    pub code: CityCode,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// False when the coordinates are the island-center fallback.
    pub located: bool,
    pub total_facilities: Measure,
    pub density: Measure,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CityDetails {
    pub center_number: Measure,
    pub online_center_number: Measure,
    pub population: Measure,
    pub area: Measure,
}

// Backend wire shapes.

#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct GenderRow {
    pub year: Year,
    pub gender: String,
    #[serde(default)]
    pub suicide_rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct WelfareRow {
    pub year: Year,
    #[serde(default)]
    pub spending: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct CityDetailsRecord {
    #[serde(default)]
    pub center_number: Option<f64>,
    #[serde(default)]
    pub online_center_number: Option<f64>,
    #[serde(default)]
    pub population: Option<f64>,
    #[serde(default)]
    pub area: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AgeTrendRow {
    pub year: Year,
    pub age_group: String,
    #[serde(default)]
    pub crude_suicide_rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ResourceRow {
    pub year: Year,
    #[serde(default)]
    pub happiness_score: Option<f64>,
    #[serde(default)]
    pub suicide_rate: Option<f64>,
    pub city_name: String,
    #[serde(default)]
    pub special_municipality: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NationwideWelfareRow {
    pub year: Year,
    #[serde(default)]
    pub avg_nationwide_spending: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AccessibilityRow {
    pub city_code: CityCode,
    pub city_name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub total_facilities: Option<f64>,
    #[serde(default)]
    pub density_per_area: Option<f64>,
    #[serde(default)]
    pub combined_facilities_per_100k_pop: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_accepts_numbers_and_strings() {
        let years: Vec<Year> = serde_json::from_str(r#"[2020, "2021", " 2022 "]"#).unwrap();
        assert_eq!(years, vec![Year(2020), Year(2021), Year(2022)]);
        assert!(serde_json::from_str::<Year>(r#""twenty""#).is_err());
    }

    #[test]
    fn measure_serializes_missing_as_null() {
        let json = serde_json::to_string(&[Measure::Present(1.5), Measure::Missing]).unwrap();
        assert_eq!(json, "[1.5,null]");
    }

    #[test]
    fn measure_non_negative_rejects_negative_and_nan() {
        assert_eq!(Measure::non_negative(Some(-1.0)), Measure::Missing);
        assert_eq!(Measure::non_negative(Some(f64::NAN)), Measure::Missing);
        assert_eq!(Measure::non_negative(None), Measure::Missing);
        assert_eq!(Measure::non_negative(Some(0.0)), Measure::Present(0.0));
    }

    #[test]
    fn municipality_classifier_is_total() {
        assert_eq!(MunicipalityGroup::classify(Some("Yes")), MunicipalityGroup::Special);
        assert_eq!(MunicipalityGroup::classify(Some(" Yes ")), MunicipalityGroup::Special);
        assert_eq!(MunicipalityGroup::classify(Some("No")), MunicipalityGroup::Other);
        assert_eq!(MunicipalityGroup::classify(Some("yes")), MunicipalityGroup::Other);
        assert_eq!(MunicipalityGroup::classify(None), MunicipalityGroup::Other);
    }

    #[test]
    fn envelope_ignores_extra_fields() {
        let envelope: DataEnvelope<WelfareRow> = serde_json::from_str(
            r#"{"city": "63000", "data": [{"year": 2020, "spending": 12.5}]}"#,
        )
        .unwrap();
        assert_eq!(envelope.data.len(), 1);
        assert_eq!(envelope.data[0].spending, Some(12.5));
    }
}
