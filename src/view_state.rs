use crate::errors::DashboardError;
use crate::models::{City, CityCode, Year};

/// Legal values of the year selector.
pub const YEAR_OPTIONS: [Year; 5] = [Year(2020), Year(2021), Year(2022), Year(2023), Year(2024)];
pub const DEFAULT_YEAR: Year = Year(2024);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Unchanged,
    Changed,
}

/// The shared selection every panel renders against.
#[derive(Debug, Clone)]
pub struct ViewState {
    cities: Vec<City>,
    selected_city: Option<CityCode>,
    selected_year: Year,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            cities: Vec::new(),
            selected_city: None,
            selected_year: DEFAULT_YEAR,
        }
    }

    pub fn is_known_year(year: Year) -> bool {
        YEAR_OPTIONS.contains(&year)
    }

    /// Installs the city list. A selection that is not in the new list is
    /// dropped.
    pub fn load_cities(&mut self, cities: Vec<City>) {
        self.cities = cities;
        if let Some(code) = &self.selected_city {
            if self.city(code).is_none() {
                self.selected_city = None;
            }
        }
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn city(&self, code: &CityCode) -> Option<&City> {
        self.cities.iter().find(|city| &city.code == code)
    }

    pub fn selected_city(&self) -> Option<&CityCode> {
        self.selected_city.as_ref()
    }

    pub fn selected_city_name(&self) -> Option<&str> {
        self.selected_city
            .as_ref()
            .and_then(|code| self.city(code))
            .map(|city| city.name.as_str())
    }

    pub fn selected_year(&self) -> Year {
        self.selected_year
    }

    pub fn set_selected_city(&mut self, code: &CityCode) -> Result<SelectionChange, DashboardError> {
        if self.city(code).is_none() {
            return Err(DashboardError::InvalidSelection(format!("unknown city code {code}")));
        }
        if self.selected_city.as_ref() == Some(code) {
            return Ok(SelectionChange::Unchanged);
        }
        self.selected_city = Some(code.clone());
        Ok(SelectionChange::Changed)
    }

    pub fn set_selected_year(&mut self, year: Year) -> Result<SelectionChange, DashboardError> {
        if !Self::is_known_year(year) {
            return Err(DashboardError::InvalidSelection(format!("year {year} is not selectable")));
        }
        if self.selected_year == year {
            return Ok(SelectionChange::Unchanged);
        }
        self.selected_year = year;
        Ok(SelectionChange::Changed)
    }
}
