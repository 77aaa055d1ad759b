use crate::fetch::GENDER_CATEGORIES;
use crate::models::{
    CityDetails, FacilitySite, Measure, MunicipalityGroup, ResourcePoint, SeriesPoint,
    WelfareComparison, Year,
};
use crate::stats::{mean_rate_for_year, Average};
use crate::view_state::ViewState;
use crate::year_index::YearIndex;
use serde::{Deserialize, Serialize};

pub const NO_DATA_MESSAGE: &str = "No data for this selection";
pub const LOAD_FAILED_MESSAGE: &str = "Data could not be loaded";
pub const FALLBACK_MARKER: &str = "--";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    GenderTrend,
    WelfareTrend,
    Details,
    Summary,
    AgeTrend,
    ResourceScatter,
    AccessibilityMap,
}

impl PanelKind {
    #[cfg(test)]
    pub const ALL: [PanelKind; 7] = [
        PanelKind::GenderTrend,
        PanelKind::WelfareTrend,
        PanelKind::Details,
        PanelKind::Summary,
        PanelKind::AgeTrend,
        PanelKind::ResourceScatter,
        PanelKind::AccessibilityMap,
    ];
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_title: Option<String>,
}

impl Layout {
    fn axes(x: &str, y: &str) -> Self {
        Self {
            x_title: Some(x.to_string()),
            y_title: Some(y.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trace {
    Line {
        name: String,
        x: Vec<Year>,
        y: Vec<Measure>,
    },
    Bar {
        name: String,
        x: Vec<String>,
        y: Vec<Measure>,
    },
    Scatter {
        name: String,
        x: Vec<Measure>,
        y: Vec<Measure>,
        text: Vec<String>,
    },
    Geo {
        name: String,
        lat: Vec<f64>,
        lon: Vec<f64>,
        text: Vec<String>,
        size: Vec<Measure>,
        color: Vec<Measure>,
        highlight: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub traces: Vec<Trace>,
    pub layout: Layout,
    /// Visible note drawn over the chart, used by placeholders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

impl ChartSpec {
    pub fn placeholder(title: impl Into<String>, message: &str) -> Self {
        Self {
            title: title.into(),
            traces: Vec::new(),
            layout: Layout::default(),
            annotation: Some(message.to_string()),
        }
    }

    #[cfg(test)]
    pub fn is_placeholder(&self) -> bool {
        self.traces.is_empty() && self.annotation.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryPanel {
    pub title: String,
    pub year: Year,
    pub average_rate: Average,
    pub average_rate_display: String,
    pub welfare_spending: String,
    pub nationwide_spending: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailsPanel {
    pub title: String,
    pub center_number: String,
    pub online_center_number: String,
    pub population: String,
    pub area: String,
}

impl DetailsPanel {
    pub fn unavailable(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            center_number: FALLBACK_MARKER.to_string(),
            online_center_number: FALLBACK_MARKER.to_string(),
            population: FALLBACK_MARKER.to_string(),
            area: FALLBACK_MARKER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum PanelView {
    Chart(ChartSpec),
    Summary(SummaryPanel),
    Details(DetailsPanel),
}

/// Input for one panel, tagged by the panel it feeds.
#[derive(Debug, Clone)]
pub enum PanelData<'a> {
    Gender(&'a [SeriesPoint]),
    Welfare(Vec<WelfareComparison>),
    AgeTrend(&'a YearIndex<SeriesPoint>),
    Resources(&'a YearIndex<ResourcePoint>),
    Accessibility(&'a [FacilitySite]),
    Summary {
        gender: &'a [SeriesPoint],
        welfare: Vec<WelfareComparison>,
    },
    Details(Option<&'a CityDetails>),
}

pub fn render(view: &ViewState, data: PanelData<'_>) -> PanelView {
    match data {
        PanelData::Gender(points) => PanelView::Chart(render_gender(view, points)),
        PanelData::Welfare(rows) => PanelView::Chart(render_welfare(view, &rows)),
        PanelData::AgeTrend(index) => PanelView::Chart(render_age_trend(view.selected_year(), index)),
        PanelData::Resources(index) => {
            PanelView::Chart(render_resources(view.selected_year(), index))
        }
        PanelData::Accessibility(sites) => PanelView::Chart(render_accessibility(view, sites)),
        PanelData::Summary { gender, welfare } => {
            PanelView::Summary(render_summary(view, gender, &welfare))
        }
        PanelData::Details(details) => PanelView::Details(render_details(view, details)),
    }
}

/// Placeholder shown by a chart panel whose first load failed.
pub fn failed_chart(kind: PanelKind) -> ChartSpec {
    ChartSpec::placeholder(default_title(kind), LOAD_FAILED_MESSAGE)
}

fn default_title(kind: PanelKind) -> &'static str {
    match kind {
        PanelKind::GenderTrend => "Gender SMR Trend",
        PanelKind::WelfareTrend => "Per Capita Social Welfare Expenditure Trend",
        PanelKind::Details => "City Details",
        PanelKind::Summary => "Summary",
        PanelKind::AgeTrend => "Crude Suicide Rate by Age Group",
        PanelKind::ResourceScatter => "Happiness vs. Suicide Rate",
        PanelKind::AccessibilityMap => "Service Accessibility",
    }
}

fn city_label(view: &ViewState) -> &str {
    view.selected_city_name().unwrap_or("Selected city")
}

pub fn render_gender(view: &ViewState, points: &[SeriesPoint]) -> ChartSpec {
    let title = format!("{}: {}", city_label(view), default_title(PanelKind::GenderTrend));

    let traces: Vec<Trace> = GENDER_CATEGORIES
        .iter()
        .filter_map(|category| {
            let mut series: Vec<&SeriesPoint> = points
                .iter()
                .filter(|point| point.category == *category)
                .collect();
            if series.is_empty() {
                return None;
            }
            series.sort_by_key(|point| point.year);
            Some(Trace::Line {
                name: category.to_string(),
                x: series.iter().map(|point| point.year).collect(),
                y: series.iter().map(|point| point.value).collect(),
            })
        })
        .collect();

    if traces.is_empty() {
        return ChartSpec::placeholder(title, NO_DATA_MESSAGE);
    }

    ChartSpec {
        title,
        traces,
        layout: Layout::axes("Year", "SMR"),
        annotation: None,
    }
}

pub fn render_welfare(view: &ViewState, rows: &[WelfareComparison]) -> ChartSpec {
    let title = format!("{}: {}", city_label(view), default_title(PanelKind::WelfareTrend));
    if rows.is_empty() {
        return ChartSpec::placeholder(title, NO_DATA_MESSAGE);
    }

    let years: Vec<Year> = rows.iter().map(|row| row.year).collect();
    ChartSpec {
        title,
        traces: vec![
            Trace::Line {
                name: "Welfare Expenditure".to_string(),
                x: years.clone(),
                y: rows.iter().map(|row| row.city).collect(),
            },
            Trace::Line {
                name: "Nationwide Average".to_string(),
                x: years,
                y: rows.iter().map(|row| row.nationwide).collect(),
            },
        ],
        layout: Layout::axes("Year", "Spending ($)"),
        annotation: None,
    }
}

pub fn render_age_trend(year: Year, index: &YearIndex<SeriesPoint>) -> ChartSpec {
    let title = format!("{}, {year}", default_title(PanelKind::AgeTrend));
    let rows = index.get(year);
    if rows.is_empty() {
        return ChartSpec::placeholder(title, NO_DATA_MESSAGE);
    }

    ChartSpec {
        title,
        traces: vec![Trace::Bar {
            name: "Crude Suicide Rate".to_string(),
            x: rows.iter().map(|row| row.category.clone()).collect(),
            y: rows.iter().map(|row| row.value).collect(),
        }],
        layout: Layout::axes("Age Group", "Rate per 100k"),
        annotation: None,
    }
}

pub fn render_resources(year: Year, index: &YearIndex<ResourcePoint>) -> ChartSpec {
    let title = format!("{}, {year}", default_title(PanelKind::ResourceScatter));
    let rows = index.get(year);
    if rows.is_empty() {
        return ChartSpec::placeholder(title, NO_DATA_MESSAGE);
    }

    let traces = [MunicipalityGroup::Special, MunicipalityGroup::Other]
        .into_iter()
        .filter_map(|group| {
            let members: Vec<&ResourcePoint> = rows.iter().filter(|row| row.group == group).collect();
            if members.is_empty() {
                return None;
            }
            Some(Trace::Scatter {
                name: group.display_name().to_string(),
                x: members.iter().map(|row| row.happiness).collect(),
                y: members.iter().map(|row| row.suicide_rate).collect(),
                text: members.iter().map(|row| row.city_name.clone()).collect(),
            })
        })
        .collect();

    ChartSpec {
        title,
        traces,
        layout: Layout::axes("Happiness Score", "Suicide Rate"),
        annotation: None,
    }
}

pub fn render_accessibility(view: &ViewState, sites: &[FacilitySite]) -> ChartSpec {
    let base_title = default_title(PanelKind::AccessibilityMap);
    if sites.is_empty() {
        return ChartSpec::placeholder(base_title, NO_DATA_MESSAGE);
    }

    let mut traces = vec![geo_trace("Facilities", sites.iter(), false)];
    let selected: Vec<&FacilitySite> = match view.selected_city() {
        Some(code) => sites.iter().filter(|site| &site.code == code).collect(),
        None => Vec::new(),
    };
    let title = match view.selected_city_name() {
        Some(name) if !selected.is_empty() => {
            traces.push(geo_trace(&format!("{name} (selected)"), selected.into_iter(), true));
            format!("{base_title}: {name} highlighted")
        }
        _ => base_title.to_string(),
    };

    ChartSpec {
        title,
        traces,
        layout: Layout::default(),
        annotation: None,
    }
}

fn geo_trace<'a>(name: &str, sites: impl Iterator<Item = &'a FacilitySite> + Clone, highlight: bool) -> Trace {
    Trace::Geo {
        name: name.to_string(),
        lat: sites.clone().map(|site| site.latitude).collect(),
        lon: sites.clone().map(|site| site.longitude).collect(),
        text: sites.clone().map(|site| site.name.clone()).collect(),
        size: sites.clone().map(|site| site.total_facilities).collect(),
        color: sites.map(|site| site.density).collect(),
        highlight,
    }
}

pub fn render_summary(view: &ViewState, gender: &[SeriesPoint], welfare: &[WelfareComparison]) -> SummaryPanel {
    let year = view.selected_year();
    let average_rate = mean_rate_for_year(gender, year);
    let welfare_row = welfare.iter().find(|row| row.year == year);

    SummaryPanel {
        title: format!("{}, {year}", city_label(view)),
        year,
        average_rate,
        average_rate_display: format_measure(average_rate.as_measure(), 2),
        welfare_spending: format_measure(welfare_row.map_or(Measure::Missing, |row| row.city), 0),
        nationwide_spending: format_measure(
            welfare_row.map_or(Measure::Missing, |row| row.nationwide),
            0,
        ),
    }
}

pub fn render_details(view: &ViewState, details: Option<&CityDetails>) -> DetailsPanel {
    let title = format!("{}: {}", city_label(view), default_title(PanelKind::Details));
    match details {
        Some(details) => DetailsPanel {
            title,
            center_number: format_measure(details.center_number, 0),
            online_center_number: format_measure(details.online_center_number, 0),
            population: format_measure(details.population, 0),
            area: format_measure(details.area, 2),
        },
        None => DetailsPanel::unavailable(title),
    }
}

pub fn format_measure(measure: Measure, decimals: usize) -> String {
    match measure {
        Measure::Present(value) => format!("{value:.decimals$}"),
        Measure::Missing => FALLBACK_MARKER.to_string(),
    }
}
