use crate::cache::FetchCache;
use crate::errors::DashboardError;
use crate::fetch::{Backend, Fetcher, Loaded, Resource, ResourceKind};
use crate::models::{City, CityCode, Year};
use crate::render::{failed_chart, render, render_details, PanelData, PanelKind, PanelView};
use crate::sequencer::{RequestSequencer, Ticket};
use crate::view_state::{SelectionChange, ViewState, YEAR_OPTIONS};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    AppStarted,
    CityChanged(CityCode),
    YearChanged(Year),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    /// The selection already had that value; nothing ran.
    Unchanged,
    /// The event named an unknown city or year; nothing changed.
    Ignored,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    PreferCache,
    Refresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Skip,
    Rerender,
    Fetch(ResourceKind, CachePolicy),
}

#[derive(Debug, Clone, Copy)]
pub struct Dependency {
    pub panel: PanelKind,
    pub on_city: Reaction,
    pub on_year: Reaction,
}

pub const DEPENDENCIES: [Dependency; 7] = [
    Dependency {
        panel: PanelKind::GenderTrend,
        on_city: Reaction::Fetch(ResourceKind::Gender, CachePolicy::PreferCache),
        on_year: Reaction::Skip,
    },
    Dependency {
        panel: PanelKind::WelfareTrend,
        on_city: Reaction::Fetch(ResourceKind::Welfare, CachePolicy::PreferCache),
        on_year: Reaction::Skip,
    },
    Dependency {
        panel: PanelKind::Details,
        on_city: Reaction::Fetch(ResourceKind::Details, CachePolicy::PreferCache),
        on_year: Reaction::Skip,
    },
    Dependency {
        panel: PanelKind::Summary,
        on_city: Reaction::Rerender,
        on_year: Reaction::Rerender,
    },
    Dependency {
        panel: PanelKind::AccessibilityMap,
        on_city: Reaction::Rerender,
        on_year: Reaction::Skip,
    },
    Dependency {
        panel: PanelKind::AgeTrend,
        on_city: Reaction::Skip,
        on_year: Reaction::Rerender,
    },
    // Always refetched on a year change, even though the data covers every year.
    Dependency {
        panel: PanelKind::ResourceScatter,
        on_city: Reaction::Skip,
        on_year: Reaction::Fetch(ResourceKind::ResourcePriority, CachePolicy::Refresh),
    },
];

/// Nationwide resources, loaded once at startup.
const STARTUP_RESOURCES: [ResourceKind; 4] = [
    ResourceKind::AgeTrend,
    ResourceKind::ResourcePriority,
    ResourceKind::NationwideWelfare,
    ResourceKind::Accessibility,
];

#[derive(Debug, Clone, Copy)]
enum Trigger {
    City,
    Year,
}

impl Dependency {
    fn reaction(&self, trigger: Trigger) -> Reaction {
        match trigger {
            Trigger::City => self.on_city,
            Trigger::Year => self.on_year,
        }
    }
}

/// Panels that must re-render when a resource arrives.
fn panels_fed_by(kind: ResourceKind) -> &'static [PanelKind] {
    match kind {
        ResourceKind::Cities => &[],
        ResourceKind::Gender => &[PanelKind::GenderTrend, PanelKind::Summary],
        ResourceKind::Welfare | ResourceKind::NationwideWelfare => {
            &[PanelKind::WelfareTrend, PanelKind::Summary]
        }
        ResourceKind::Details => &[PanelKind::Details],
        ResourceKind::AgeTrend => &[PanelKind::AgeTrend],
        ResourceKind::ResourcePriority => &[PanelKind::ResourceScatter],
        ResourceKind::Accessibility => &[PanelKind::AccessibilityMap],
    }
}

/// The shared status/error line.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusLine {
    pub message: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StatusLine {
    fn report(&mut self, err: &DashboardError) {
        self.message = Some(err.user_message());
        self.updated_at = Some(Utc::now());
    }

    fn clear(&mut self) {
        self.message = None;
        self.updated_at = Some(Utc::now());
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub selected_city: Option<CityCode>,
    pub selected_year: Year,
    pub year_options: Vec<Year>,
    pub cities: Vec<City>,
    pub panels: BTreeMap<PanelKind, PanelView>,
    pub status: StatusLine,
}

struct PlannedFetch {
    resource: Resource,
    ticket: Ticket,
    cached: bool,
}

/// Everything the event handlers mutate.
#[derive(Debug, Default)]
pub struct Dashboard {
    view: ViewState,
    cache: FetchCache,
    panels: BTreeMap<PanelKind, PanelView>,
    status: StatusLine,
    sequencer: RequestSequencer,
}

impl Dashboard {
    pub fn panel(&self, kind: PanelKind) -> Option<&PanelView> {
        self.panels.get(&kind)
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            selected_city: self.view.selected_city().cloned(),
            selected_year: self.view.selected_year(),
            year_options: YEAR_OPTIONS.to_vec(),
            cities: self.view.cities().to_vec(),
            panels: self.panels.clone(),
            status: self.status.clone(),
        }
    }

    fn react(&mut self, trigger: Trigger) -> Vec<PlannedFetch> {
        let mut loads = Vec::new();
        for dependency in DEPENDENCIES {
            match dependency.reaction(trigger) {
                Reaction::Skip => {}
                Reaction::Rerender => self.rerender(dependency.panel),
                Reaction::Fetch(kind, policy) => loads.extend(self.plan_fetch(kind, policy)),
            }
        }
        loads
    }

    fn plan_fetch(&mut self, kind: ResourceKind, policy: CachePolicy) -> Option<PlannedFetch> {
        let resource = kind.request(self.view.selected_city())?;
        let cached = policy == CachePolicy::PreferCache && self.cache.contains(&resource);
        let ticket = self.sequencer.issue(kind);
        Some(PlannedFetch {
            resource,
            ticket,
            cached,
        })
    }

    fn panel_data(&self, kind: PanelKind) -> Option<PanelData<'_>> {
        let city = self.view.selected_city();
        match kind {
            PanelKind::GenderTrend => city
                .and_then(|code| self.cache.gender(code))
                .map(PanelData::Gender),
            PanelKind::WelfareTrend => city
                .and_then(|code| self.cache.welfare_comparison(code))
                .map(PanelData::Welfare),
            PanelKind::Details => city
                .and_then(|code| self.cache.details(code))
                .map(|details| PanelData::Details(Some(details))),
            PanelKind::Summary => {
                let code = city?;
                Some(PanelData::Summary {
                    gender: self.cache.gender(code).unwrap_or(&[]),
                    welfare: self.cache.welfare_comparison(code).unwrap_or_default(),
                })
            }
            PanelKind::AgeTrend => self.cache.age_trend().map(PanelData::AgeTrend),
            PanelKind::ResourceScatter => self.cache.resources().map(PanelData::Resources),
            PanelKind::AccessibilityMap => self.cache.accessibility().map(PanelData::Accessibility),
        }
    }

    fn rerender(&mut self, kind: PanelKind) {
        let Some(data) = self.panel_data(kind) else {
            return;
        };
        let view = render(&self.view, data);
        self.panels.insert(kind, view);
    }

    /// Charts keep whatever they showed before; the details panel falls back
    /// to markers since its old values belong to another city.
    fn mark_failed(&mut self, kind: PanelKind) {
        match kind {
            PanelKind::Details => {
                let panel = render_details(&self.view, None);
                self.panels.insert(kind, PanelView::Details(panel));
            }
            PanelKind::Summary => self.rerender(kind),
            _ => {
                self.panels
                    .entry(kind)
                    .or_insert_with(|| PanelView::Chart(failed_chart(kind)));
            }
        }
    }

    /// Records a finished load. Returns whether it was applied to the panels.
    fn apply(&mut self, ticket: Ticket, result: Result<Option<Loaded>, DashboardError>) -> bool {
        let kind = ticket.kind();
        let result = result.map(|loaded| {
            if let Some(loaded) = loaded {
                self.cache.store(loaded);
            }
        });

        if !self.sequencer.is_current(ticket) {
            debug!(resource = kind.name(), "discarding superseded response");
            return false;
        }

        match result {
            Ok(()) => {
                for panel in panels_fed_by(kind) {
                    self.rerender(*panel);
                }
                true
            }
            Err(err) => {
                warn!(%err, "panel load failed");
                self.status.report(&err);
                for panel in panels_fed_by(kind) {
                    self.mark_failed(*panel);
                }
                false
            }
        }
    }
}

/// Owns the dashboard state. The lock is never held across a fetch; every
/// fetch carries a [`Ticket`] and superseded results are cached but not
/// rendered.
pub struct Orchestrator<B> {
    fetcher: Fetcher<B>,
    dashboard: Mutex<Dashboard>,
}

impl<B: Backend> Orchestrator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            fetcher: Fetcher::new(backend),
            dashboard: Mutex::new(Dashboard::default()),
        }
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        self.fetcher.backend()
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.dashboard.lock().await.snapshot()
    }

    pub async fn panel(&self, kind: PanelKind) -> Option<PanelView> {
        self.dashboard.lock().await.panel(kind).cloned()
    }

    pub async fn handle(&self, event: Event) -> Outcome {
        match event {
            Event::AppStarted => self.start().await,
            Event::CityChanged(code) => self.change_city(code).await,
            Event::YearChanged(year) => self.change_year(year).await,
        }
    }

    async fn start(&self) -> Outcome {
        info!("loading city list");
        let cities = match self.fetcher.cities().await {
            Ok(cities) => cities,
            Err(err) => {
                warn!(%err, "city list unavailable");
                self.dashboard.lock().await.status.report(&err);
                return Outcome::Failed;
            }
        };
        let Some(first) = cities.first().map(|city| city.code.clone()) else {
            return Outcome::Failed;
        };
        info!(count = cities.len(), default_city = %first, "city list loaded");

        let loads = {
            let mut dashboard = self.dashboard.lock().await;
            dashboard.view.load_cities(cities);
            if let Err(err) = dashboard.view.set_selected_city(&first) {
                warn!(%err, "default city rejected");
                return Outcome::Failed;
            }
            dashboard.status.clear();
            STARTUP_RESOURCES
                .into_iter()
                .filter_map(|kind| dashboard.plan_fetch(kind, CachePolicy::PreferCache))
                .collect::<Vec<_>>()
        };
        self.run(loads).await;

        // A city picked while the nationwide data was loading already
        // planned its own per-city fetches.
        let loads = {
            let mut dashboard = self.dashboard.lock().await;
            if dashboard.view.selected_city() == Some(&first) {
                dashboard.react(Trigger::City)
            } else {
                debug!("selection changed during startup");
                Vec::new()
            }
        };
        self.run(loads).await;
        Outcome::Applied
    }

    async fn change_city(&self, code: CityCode) -> Outcome {
        let loads = {
            let mut dashboard = self.dashboard.lock().await;
            match dashboard.view.set_selected_city(&code) {
                Err(err) => {
                    warn!(%err, "ignoring city change");
                    return Outcome::Ignored;
                }
                Ok(SelectionChange::Unchanged) => return Outcome::Unchanged,
                Ok(SelectionChange::Changed) => {}
            }
            info!(city = %code, "city changed");
            dashboard.status.clear();
            dashboard.react(Trigger::City)
        };
        self.run(loads).await;
        Outcome::Applied
    }

    async fn change_year(&self, year: Year) -> Outcome {
        let loads = {
            let mut dashboard = self.dashboard.lock().await;
            match dashboard.view.set_selected_year(year) {
                Err(err) => {
                    warn!(%err, "ignoring year change");
                    return Outcome::Ignored;
                }
                Ok(SelectionChange::Unchanged) => return Outcome::Unchanged,
                Ok(SelectionChange::Changed) => {}
            }
            info!(%year, "year changed");
            dashboard.status.clear();
            dashboard.react(Trigger::Year)
        };
        self.run(loads).await;
        Outcome::Applied
    }

    async fn run(&self, loads: Vec<PlannedFetch>) {
        join_all(loads.into_iter().map(|planned| self.load(planned))).await;
    }

    async fn load(&self, planned: PlannedFetch) {
        let PlannedFetch {
            resource,
            ticket,
            cached,
        } = planned;

        let result = if cached {
            debug!(resource = %resource.path(), "served from cache");
            Ok(None)
        } else {
            self.fetcher.load(&resource).await.map(Some)
        };

        self.dashboard.lock().await.apply(ticket, result);
    }
}
