use crate::fetch::{join_welfare, Loaded, Resource};
use crate::models::{
    CityCode, CityDetails, FacilitySite, NationwideAverages, ResourcePoint, SeriesPoint,
    WelfareComparison, WelfareSpending,
};
use crate::year_index::YearIndex;
use std::collections::HashMap;

/// Data already fetched this session. Per-city entries are keyed by city
/// code, nationwide entries are singletons. Entries are written once, except
/// resource-priority data, which every refresh replaces.
#[derive(Debug, Default)]
pub struct FetchCache {
    gender: HashMap<CityCode, Vec<SeriesPoint>>,
    welfare: HashMap<CityCode, Vec<WelfareSpending>>,
    details: HashMap<CityCode, CityDetails>,
    age_trend: Option<YearIndex<SeriesPoint>>,
    resources: Option<YearIndex<ResourcePoint>>,
    nationwide_welfare: Option<NationwideAverages>,
    accessibility: Option<Vec<FacilitySite>>,
}

impl FetchCache {
    pub fn contains(&self, resource: &Resource) -> bool {
        match resource {
            Resource::Cities => false,
            Resource::Gender(code) => self.gender.contains_key(code),
            Resource::Welfare(code) => self.welfare.contains_key(code),
            Resource::Details(code) => self.details.contains_key(code),
            Resource::AgeTrend => self.age_trend.is_some(),
            Resource::ResourcePriority => self.resources.is_some(),
            Resource::NationwideWelfare => self.nationwide_welfare.is_some(),
            Resource::Accessibility => self.accessibility.is_some(),
        }
    }

    pub fn store(&mut self, loaded: Loaded) {
        match loaded {
            // The city list lives in the view state.
            Loaded::Cities(_) => {}
            Loaded::Gender(code, rows) => {
                self.gender.entry(code).or_insert(rows);
            }
            Loaded::Welfare(code, rows) => {
                self.welfare.entry(code).or_insert(rows);
            }
            Loaded::Details(code, details) => {
                self.details.entry(code).or_insert(details);
            }
            Loaded::AgeTrend(index) => {
                self.age_trend.get_or_insert(index);
            }
            Loaded::Resources(index) => self.resources = Some(index),
            Loaded::NationwideWelfare(averages) => {
                self.nationwide_welfare.get_or_insert(averages);
            }
            Loaded::Accessibility(sites) => {
                self.accessibility.get_or_insert(sites);
            }
        }
    }

    pub fn gender(&self, code: &CityCode) -> Option<&[SeriesPoint]> {
        self.gender.get(code).map(Vec::as_slice)
    }

    pub fn details(&self, code: &CityCode) -> Option<&CityDetails> {
        self.details.get(code)
    }

    /// The city's welfare series joined with whatever nationwide averages are
    /// loaded; without them every nationwide value is missing.
    pub fn welfare_comparison(&self, code: &CityCode) -> Option<Vec<WelfareComparison>> {
        let rows = self.welfare.get(code)?;
        let empty = NationwideAverages::default();
        let averages = self.nationwide_welfare.as_ref().unwrap_or(&empty);
        Some(join_welfare(rows, averages))
    }

    pub fn age_trend(&self) -> Option<&YearIndex<SeriesPoint>> {
        self.age_trend.as_ref()
    }

    pub fn resources(&self) -> Option<&YearIndex<ResourcePoint>> {
        self.resources.as_ref()
    }

    pub fn accessibility(&self) -> Option<&[FacilitySite]> {
        self.accessibility.as_deref()
    }
}
