use crate::config::Config;
use crate::errors::{DashboardError, FetchCause};
use crate::models::{
    AccessibilityRow, AgeTrendRow, City, CityCode, CityDetails, CityDetailsRecord, DataEnvelope,
    FacilitySite, GenderRow, Measure, MunicipalityGroup, NationwideAverages, NationwideWelfareRow,
    ResourcePoint, ResourceRow, SeriesPoint, WelfareComparison, WelfareRow, WelfareSpending,
};
use crate::year_index::YearIndex;
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Gender labels the gender chart knows how to draw, in trace order.
pub const GENDER_CATEGORIES: [&str; 3] = ["Male", "Female", "Total"];

/// Geographic center of Taiwan, used for map rows without coordinates.
pub const ISLAND_CENTER: (f64, f64) = (23.6978, 120.9605);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Cities,
    Gender,
    Welfare,
    Details,
    AgeTrend,
    ResourcePriority,
    NationwideWelfare,
    Accessibility,
}

impl ResourceKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Cities => "city list",
            Self::Gender => "gender chart",
            Self::Welfare => "welfare chart",
            Self::Details => "city details",
            Self::AgeTrend => "age trend",
            Self::ResourcePriority => "resource priority",
            Self::NationwideWelfare => "nationwide welfare average",
            Self::Accessibility => "accessibility map",
        }
    }

    /// Builds the request for this kind. Per-city kinds need a city.
    pub fn request(self, city: Option<&CityCode>) -> Option<Resource> {
        let resource = match self {
            Self::Cities => Resource::Cities,
            Self::Gender => Resource::Gender(city?.clone()),
            Self::Welfare => Resource::Welfare(city?.clone()),
            Self::Details => Resource::Details(city?.clone()),
            Self::AgeTrend => Resource::AgeTrend,
            Self::ResourcePriority => Resource::ResourcePriority,
            Self::NationwideWelfare => Resource::NationwideWelfare,
            Self::Accessibility => Resource::Accessibility,
        };
        Some(resource)
    }
}

/// A single backend request, tagged by kind and carrying its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    Cities,
    Gender(CityCode),
    Welfare(CityCode),
    Details(CityCode),
    AgeTrend,
    ResourcePriority,
    NationwideWelfare,
    Accessibility,
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Cities => ResourceKind::Cities,
            Self::Gender(_) => ResourceKind::Gender,
            Self::Welfare(_) => ResourceKind::Welfare,
            Self::Details(_) => ResourceKind::Details,
            Self::AgeTrend => ResourceKind::AgeTrend,
            Self::ResourcePriority => ResourceKind::ResourcePriority,
            Self::NationwideWelfare => ResourceKind::NationwideWelfare,
            Self::Accessibility => ResourceKind::Accessibility,
        }
    }

    pub fn path_segments(&self) -> Vec<&str> {
        match self {
            Self::Cities => vec!["cities"],
            Self::Gender(code) => vec!["city", code.as_str(), "gender"],
            Self::Welfare(code) => vec!["city", code.as_str(), "welfare"],
            Self::Details(code) => vec!["city", code.as_str(), "details"],
            Self::AgeTrend => vec!["age_trend"],
            Self::ResourcePriority => vec!["chart", "resource"],
            Self::NationwideWelfare => vec!["nationwide_welfare_avg"],
            Self::Accessibility => vec!["map", "accessibility"],
        }
    }

    pub fn path(&self) -> String {
        format!("/{}", self.path_segments().join("/"))
    }
}

/// Raw JSON access to the statistics backend.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get(&self, resource: &Resource) -> Result<Value, DashboardError>;
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
        })
    }

    fn url_for(&self, resource: &Resource) -> Result<Url, DashboardError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                DashboardError::fetch(
                    resource.kind().name(),
                    FetchCause::Transport(format!("cannot append a path to {}", self.base_url)),
                )
            })?
            .pop_if_empty()
            .extend(resource.path_segments());
        Ok(url)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn get(&self, resource: &Resource) -> Result<Value, DashboardError> {
        let name = resource.kind().name();
        let url = self.url_for(resource)?;
        debug!(%url, "fetching {name}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| DashboardError::fetch(name, FetchCause::Transport(err.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::fetch(name, FetchCause::Status(status.as_u16())));
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| DashboardError::fetch(name, FetchCause::Decode(err.to_string())))
    }
}

/// A normalized payload, tagged by the resource it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    Cities(Vec<City>),
    Gender(CityCode, Vec<SeriesPoint>),
    Welfare(CityCode, Vec<WelfareSpending>),
    Details(CityCode, CityDetails),
    AgeTrend(YearIndex<SeriesPoint>),
    Resources(YearIndex<ResourcePoint>),
    NationwideWelfare(NationwideAverages),
    Accessibility(Vec<FacilitySite>),
}

pub struct Fetcher<B> {
    backend: B,
}

impl<B: Backend> Fetcher<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn cities(&self) -> Result<Vec<City>, DashboardError> {
        let cities: Vec<City> = self.decode(&Resource::Cities).await?;
        if cities.is_empty() {
            return Err(DashboardError::EmptyResult {
                resource: ResourceKind::Cities.name(),
            });
        }
        Ok(cities)
    }

    pub async fn load(&self, resource: &Resource) -> Result<Loaded, DashboardError> {
        let loaded = match resource {
            Resource::Cities => Loaded::Cities(self.cities().await?),
            Resource::Gender(code) => {
                let envelope: DataEnvelope<GenderRow> = self.decode(resource).await?;
                Loaded::Gender(code.clone(), normalize_gender(envelope.data))
            }
            Resource::Welfare(code) => {
                let envelope: DataEnvelope<WelfareRow> = self.decode(resource).await?;
                Loaded::Welfare(code.clone(), normalize_welfare(envelope.data))
            }
            Resource::Details(code) => {
                let record: Option<CityDetailsRecord> = self.decode(resource).await?;
                let record = record.ok_or(DashboardError::EmptyResult {
                    resource: ResourceKind::Details.name(),
                })?;
                Loaded::Details(code.clone(), normalize_details(record))
            }
            Resource::AgeTrend => {
                let envelope: DataEnvelope<AgeTrendRow> = self.decode(resource).await?;
                Loaded::AgeTrend(YearIndex::build(normalize_age_trend(envelope.data)))
            }
            Resource::ResourcePriority => {
                let envelope: DataEnvelope<ResourceRow> = self.decode(resource).await?;
                Loaded::Resources(YearIndex::build(normalize_resources(envelope.data)))
            }
            Resource::NationwideWelfare => {
                let envelope: DataEnvelope<NationwideWelfareRow> = self.decode(resource).await?;
                Loaded::NationwideWelfare(normalize_nationwide(envelope.data))
            }
            Resource::Accessibility => {
                let envelope: DataEnvelope<AccessibilityRow> = self.decode(resource).await?;
                Loaded::Accessibility(locate_sites(envelope.data))
            }
        };
        Ok(loaded)
    }

    async fn decode<T: DeserializeOwned>(&self, resource: &Resource) -> Result<T, DashboardError> {
        let value = self.backend.get(resource).await?;
        serde_json::from_value(value).map_err(|err| {
            DashboardError::fetch(resource.kind().name(), FetchCause::Decode(err.to_string()))
        })
    }
}

pub fn normalize_gender(rows: Vec<GenderRow>) -> Vec<SeriesPoint> {
    rows.into_iter()
        .filter(|row| GENDER_CATEGORIES.contains(&row.gender.as_str()))
        .map(|row| SeriesPoint {
            year: row.year,
            category: row.gender,
            value: Measure::non_negative(row.suicide_rate),
        })
        .collect()
}

pub fn normalize_welfare(rows: Vec<WelfareRow>) -> Vec<WelfareSpending> {
    let mut spending: Vec<WelfareSpending> = rows
        .into_iter()
        .map(|row| WelfareSpending {
            year: row.year,
            spending: Measure::non_negative(row.spending),
        })
        .collect();
    spending.sort_by_key(|row| row.year);
    spending
}

/// Pairs each city year with the nationwide average of the same year. Years
/// without an average keep their point with a missing nationwide value.
pub fn join_welfare(rows: &[WelfareSpending], averages: &NationwideAverages) -> Vec<WelfareComparison> {
    rows.iter()
        .map(|row| WelfareComparison {
            year: row.year,
            city: row.spending,
            nationwide: averages.get(row.year),
        })
        .collect()
}

pub fn normalize_age_trend(rows: Vec<AgeTrendRow>) -> Vec<SeriesPoint> {
    rows.into_iter()
        .map(|row| SeriesPoint {
            year: row.year,
            category: row.age_group,
            value: Measure::non_negative(row.crude_suicide_rate),
        })
        .collect()
}

pub fn normalize_resources(rows: Vec<ResourceRow>) -> Vec<ResourcePoint> {
    rows.into_iter()
        .map(|row| ResourcePoint {
            year: row.year,
            group: MunicipalityGroup::classify(row.special_municipality.as_deref()),
            city_name: row.city_name,
            happiness: Measure::from_option(row.happiness_score),
            suicide_rate: Measure::non_negative(row.suicide_rate),
        })
        .collect()
}

pub fn normalize_nationwide(rows: Vec<NationwideWelfareRow>) -> NationwideAverages {
    NationwideAverages(
        rows.into_iter()
            .map(|row| (row.year, Measure::non_negative(row.avg_nationwide_spending)))
            .collect(),
    )
}

/// Every row becomes a site; rows without usable coordinates sit at the
/// island center.
pub fn locate_sites(rows: Vec<AccessibilityRow>) -> Vec<FacilitySite> {
    rows.into_iter()
        .map(|row| {
            let coordinates = match (row.latitude, row.longitude) {
                (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
                _ => None,
            };
            let (latitude, longitude) = coordinates.unwrap_or(ISLAND_CENTER);
            FacilitySite {
                code: row.city_code,
                name: row.city_name,
                latitude,
                longitude,
                located: coordinates.is_some(),
                total_facilities: Measure::non_negative(row.total_facilities),
                density: Measure::non_negative(
                    row.density_per_area.or(row.combined_facilities_per_100k_pop),
                ),
            }
        })
        .collect()
}

pub fn normalize_details(record: CityDetailsRecord) -> CityDetails {
    CityDetails {
        center_number: Measure::non_negative(record.center_number),
        online_center_number: Measure::non_negative(record.online_center_number),
        population: Measure::non_negative(record.population),
        area: Measure::non_negative(record.area),
    }
}
