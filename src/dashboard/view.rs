//! The dashboard as plain data: what the user selected and everything the page
//! shows for that selection.

use crate::analysis::chart::render_history_chart;
use crate::analysis::compare::compare_to_history;
use crate::analysis::stats::CityStats;
use crate::dashboard::dataset::{CityAnalysis, Dataset};
use crate::error::error_chain;
use crate::frames::error::DataError;
use crate::frames::observation_frame::PreparedFrame;
use crate::i18n::Locale;
use crate::live::client::TemperatureClient;
use crate::live::error::TemperatureApiError;
use crate::types::city::{city_coordinates, LatLon};
use crate::types::observation::PreparedObservation;
use chrono::NaiveDate;
use log::{debug, error};
use std::collections::HashMap;
use std::sync::Arc;

/// Results of a live fetch, keyed by city.
pub type LiveReadings = HashMap<String, Result<f64, TemperatureApiError>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Overview,
    CityAnalysis,
    Anomalies,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Overview, Tab::CityAnalysis, Tab::Anomalies];

    /// Value used in form fields and element ids.
    pub fn form_value(&self) -> &'static str {
        match self {
            Tab::Overview => "overview",
            Tab::CityAnalysis => "city",
            Tab::Anomalies => "anomalies",
        }
    }

    pub fn from_form_value(value: &str) -> Option<Self> {
        Tab::ALL.into_iter().find(|tab| tab.form_value() == value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CityMode {
    #[default]
    Single,
    Multiple,
}

impl CityMode {
    pub fn form_value(&self) -> &'static str {
        match self {
            CityMode::Single => "single",
            CityMode::Multiple => "multiple",
        }
    }

    pub fn from_form_value(value: &str) -> Option<Self> {
        [CityMode::Single, CityMode::Multiple]
            .into_iter()
            .find(|mode| mode.form_value() == value)
    }
}

/// Everything the user can choose on the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selections {
    pub tab: Tab,
    pub mode: CityMode,
    /// City shown in single mode. The first city of the dataset when unset.
    pub city: Option<String>,
    /// Cities shown in multi mode.
    pub cities: Vec<String>,
    pub api_key: Option<String>,
}

impl Selections {
    /// Builds selections from url-encoded form pairs. `cities` may repeat;
    /// unknown keys and unparseable values are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut selections = Selections::default();
        for (key, value) in pairs {
            match key.as_str() {
                "tab" => {
                    if let Some(tab) = Tab::from_form_value(&value) {
                        selections.tab = tab;
                    }
                }
                "mode" => {
                    if let Some(mode) = CityMode::from_form_value(&value) {
                        selections.mode = mode;
                    }
                }
                "city" if !value.is_empty() => selections.city = Some(value),
                "cities" if !value.is_empty() => selections.cities.push(value),
                "api_key" if !value.trim().is_empty() => {
                    selections.api_key = Some(value.trim().to_string())
                }
                _ => {}
            }
        }
        selections
    }
}

/// Everything shown for one city in the city analysis tab.
#[derive(Debug, Clone)]
pub struct CityPanel {
    pub city: String,
    /// `None` when the city is not in the coordinate table.
    pub coordinates: Option<LatLon>,
    pub observations: Vec<PreparedObservation>,
    pub stats: CityStats,
    /// Trend narrative, or why no trend could be fitted.
    pub trend: Result<String, String>,
    /// Plotly figure JSON for the history chart.
    pub chart_json: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiveOutcome {
    Compared { temperature: f64, report: String },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveReport {
    pub city: String,
    pub outcome: LiveOutcome,
}

#[derive(Debug, Clone)]
pub struct SourceSummary {
    pub name: String,
    pub rows: usize,
}

/// One rendered state of the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardPage {
    pub locale: Locale,
    pub selections: Selections,
    /// `None` until a file has been uploaded.
    pub source: Option<SourceSummary>,
    pub cities: Vec<String>,
    pub overview: Vec<CityStats>,
    pub city_panels: Vec<CityPanel>,
    pub anomalies: Vec<PreparedObservation>,
    pub live: Vec<LiveReport>,
    pub errors: Vec<String>,
}

impl DashboardPage {
    pub fn empty(selections: Selections, locale: Locale) -> Self {
        Self {
            locale,
            selections,
            source: None,
            cities: Vec::new(),
            overview: Vec::new(),
            city_panels: Vec::new(),
            anomalies: Vec::new(),
            live: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Adds a failure to the page's error panel.
    pub fn push_error(&mut self, err: &dyn std::error::Error) {
        error!("{}", error_chain(err));
        self.errors.push(error_chain(err));
    }
}

/// Renders the dashboard for the given dataset and selections.
///
/// Nothing is recomputed from the raw upload: per-city statistics and trends
/// come from `dataset`, and `live` holds readings fetched beforehand. Failures
/// while building a section are collected in [`DashboardPage::errors`] and the
/// remaining sections are still rendered.
pub fn render_dashboard(
    dataset: Option<&Dataset>,
    selections: &Selections,
    live: Option<&LiveReadings>,
    today: NaiveDate,
    locale: Locale,
) -> DashboardPage {
    let mut page = DashboardPage::empty(selections.clone(), locale);
    let Some(dataset) = dataset else {
        return page;
    };

    page.source = Some(SourceSummary {
        name: dataset.source_name.clone(),
        rows: dataset.frame.height(),
    });
    page.cities = dataset.cities.iter().map(|a| a.city.clone()).collect();
    page.overview = dataset.cities.iter().map(|a| a.stats.clone()).collect();

    for analysis in selected_cities(dataset, selections) {
        match city_panel(analysis, locale) {
            Ok(panel) => page.city_panels.push(panel),
            Err(e) => page.push_error(&e),
        }
    }

    page.anomalies = dataset.anomalies.clone();

    if let Some(live) = live {
        for analysis in &dataset.cities {
            let Some(result) = live.get(&analysis.city) else {
                continue;
            };
            match live_report(analysis, result, &dataset.frame, today, locale) {
                Ok(report) => page.live.push(report),
                Err(e) => page.push_error(&e),
            }
        }
    }

    page
}

/// Fetches live readings when an API key is set, then renders on the blocking pool.
pub async fn run_dashboard(
    dataset: Option<Arc<Dataset>>,
    selections: Selections,
    client: &TemperatureClient,
    today: NaiveDate,
    locale: Locale,
) -> Result<DashboardPage, DataError> {
    let live = match (dataset.as_deref(), selections.api_key.as_deref()) {
        (Some(dataset), Some(api_key)) => Some(
            client
                .get_many_temperatures(dataset.city_names().as_slice(), api_key)
                .await,
        ),
        _ => None,
    };
    let page = tokio::task::spawn_blocking(move || {
        render_dashboard(dataset.as_deref(), &selections, live.as_ref(), today, locale)
    })
    .await?;
    Ok(page)
}

fn selected_cities<'a>(dataset: &'a Dataset, selections: &Selections) -> Vec<&'a CityAnalysis> {
    match selections.mode {
        CityMode::Single => selections
            .city
            .as_deref()
            .and_then(|city| dataset.city(city))
            .or_else(|| dataset.cities.first())
            .into_iter()
            .collect(),
        CityMode::Multiple => dataset
            .cities
            .iter()
            .filter(|analysis| selections.cities.contains(&analysis.city))
            .collect(),
    }
}

fn city_panel(analysis: &CityAnalysis, locale: Locale) -> Result<CityPanel, DataError> {
    debug!("Building the analysis panel for {}", analysis.city);
    let chart = render_history_chart(
        &analysis.frame,
        &analysis.stats,
        &analysis.city,
        analysis.trend.as_ref().ok(),
        locale,
    )?;
    let trend = match &analysis.trend {
        Ok(fit) => Ok(fit.description(locale)),
        Err(e) => Err(error_chain(e)),
    };

    Ok(CityPanel {
        city: analysis.city.clone(),
        coordinates: city_coordinates(&analysis.city),
        observations: analysis.observations.clone(),
        stats: analysis.stats.clone(),
        trend,
        chart_json: chart.to_json(),
    })
}

fn live_report(
    analysis: &CityAnalysis,
    result: &Result<f64, TemperatureApiError>,
    frame: &PreparedFrame,
    today: NaiveDate,
    locale: Locale,
) -> Result<LiveReport, DataError> {
    let outcome = match result {
        Ok(temperature) => {
            let comparison = compare_to_history(today, *temperature, &analysis.city, frame)?;
            LiveOutcome::Compared {
                temperature: *temperature,
                report: comparison.render(locale),
            }
        }
        Err(e) => LiveOutcome::Failed {
            message: e.localized(locale),
        },
    };
    Ok(LiveReport {
        city: analysis.city.clone(),
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::test_support::csv_from_rows;
    use crate::live::test_support::spawn_fake_provider;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// London warms slowly over 19 winter days and has one 50 °C outlier on Jan 20;
    /// Atlantis is not in the coordinate table.
    fn dataset() -> Result<Dataset, DataError> {
        let mut rows = Vec::new();
        for day in 1..=20 {
            let temperature = if day == 20 { 50.0 } else { 10.0 + day as f64 * 0.05 };
            rows.push(("London", format!("2020-01-{day:02}"), temperature, "winter"));
        }
        rows.push(("Atlantis", "2020-01-01".to_string(), 3.0, "winter"));
        rows.push(("Atlantis", "2020-01-02".to_string(), 4.0, "winter"));
        Dataset::from_csv_bytes("obs.csv", csv_from_rows(&rows).into_bytes())
    }

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_selections_from_form_pairs() {
        let selections = Selections::from_pairs(pairs(&[
            ("tab", "anomalies"),
            ("mode", "multiple"),
            ("cities", "London"),
            ("cities", "Paris"),
            ("city", ""),
            ("api_key", "  "),
            ("unknown", "x"),
        ]));
        assert_eq!(selections.tab, Tab::Anomalies);
        assert_eq!(selections.mode, CityMode::Multiple);
        assert_eq!(selections.cities, vec!["London", "Paris"]);
        assert_eq!(selections.city, None);
        assert_eq!(selections.api_key, None);

        let selections = Selections::from_pairs(pairs(&[("tab", "bogus"), ("api_key", "k")]));
        assert_eq!(selections.tab, Tab::Overview);
        assert_eq!(selections.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_without_dataset_page_is_empty() {
        let page = render_dashboard(None, &Selections::default(), None, jan(1), Locale::Russian);
        assert!(page.source.is_none());
        assert!(page.city_panels.is_empty());
        assert!(page.errors.is_empty());
    }

    #[test]
    fn test_single_mode_defaults_to_first_city() -> Result<(), Box<dyn std::error::Error>> {
        let dataset = dataset()?;
        let page = render_dashboard(
            Some(&dataset),
            &Selections::default(),
            None,
            jan(1),
            Locale::English,
        );

        assert_eq!(page.cities, vec!["London", "Atlantis"]);
        assert_eq!(page.overview.len(), 2);
        assert_eq!(page.source.as_ref().map(|s| s.rows), Some(22));
        assert_eq!(page.city_panels.len(), 1);

        let panel = &page.city_panels[0];
        assert_eq!(panel.city, "London");
        assert!(panel.coordinates.is_some());
        assert_eq!(panel.observations.len(), 20);
        let chart: serde_json::Value = serde_json::from_str(&panel.chart_json)?;
        assert_eq!(chart["data"][1]["y"], serde_json::json!([50.0]));
        assert_eq!(
            panel.trend.as_deref(),
            Ok("A positive temperature trend is observed in London.")
        );

        assert_eq!(page.anomalies.len(), 1);
        assert_eq!(page.anomalies[0].temperature, Some(50.0));
        assert!(page.errors.is_empty());
        Ok(())
    }

    #[test]
    fn test_multi_mode_and_unknown_coordinates() -> Result<(), Box<dyn std::error::Error>> {
        let dataset = dataset()?;
        let selections = Selections {
            mode: CityMode::Multiple,
            cities: vec!["Atlantis".into(), "Nowhere".into(), "London".into()],
            ..Default::default()
        };
        let page = render_dashboard(Some(&dataset), &selections, None, jan(1), Locale::Russian);

        let shown: Vec<_> = page.city_panels.iter().map(|p| p.city.as_str()).collect();
        assert_eq!(shown, vec!["London", "Atlantis"]);
        assert!(page.city_panels[1].coordinates.is_none());
        Ok(())
    }

    #[test]
    fn test_live_readings_are_compared_per_city() -> Result<(), Box<dyn std::error::Error>> {
        let dataset = dataset()?;
        let mut live = LiveReadings::new();
        live.insert("London".to_string(), Ok(30.0));
        live.insert(
            "Atlantis".to_string(),
            Err(TemperatureApiError::Provider {
                city: "Atlantis".to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
                message: Some("city not found".to_string()),
            }),
        );

        let page = render_dashboard(
            Some(&dataset),
            &Selections::default(),
            Some(&live),
            jan(1),
            Locale::English,
        );

        assert_eq!(page.live.len(), 2);
        assert_eq!(page.live[0].city, "London");
        match &page.live[0].outcome {
            LiveOutcome::Compared {
                temperature,
                report,
            } => {
                assert_eq!(*temperature, 30.0);
                // One reading on Jan 1: zero spread, so any deviation is significant.
                assert!(report.contains("Historical median temperature: 10.05°C"));
                assert!(report.contains("Temperature is significantly off the norm."));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(
            page.live[1].outcome,
            LiveOutcome::Failed {
                message: "API error: city not found".to_string()
            }
        );
        Ok(())
    }

    #[test]
    fn test_live_report_without_history() -> Result<(), Box<dyn std::error::Error>> {
        let dataset = dataset()?;
        let mut live = LiveReadings::new();
        live.insert("London".to_string(), Ok(12.0));

        let page = render_dashboard(
            Some(&dataset),
            &Selections::default(),
            Some(&live),
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            Locale::Russian,
        );
        assert_eq!(
            page.live,
            vec![LiveReport {
                city: "London".to_string(),
                outcome: LiveOutcome::Compared {
                    temperature: 12.0,
                    report: "Нет данных для города London на указанную дату.".to_string(),
                },
            }]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_run_dashboard_fetches_only_with_api_key() -> Result<(), Box<dyn std::error::Error>>
    {
        let dataset = Arc::new(dataset()?);
        let client = TemperatureClient::builder()
            .base_url(spawn_fake_provider().await?)
            .build();

        let page = run_dashboard(
            Some(dataset.clone()),
            Selections::default(),
            &client,
            jan(1),
            Locale::English,
        )
        .await?;
        assert!(page.live.is_empty());
        assert_eq!(page.anomalies, dataset.anomalies);

        let selections = Selections {
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        let page = run_dashboard(Some(dataset), selections, &client, jan(1), Locale::English).await?;
        assert_eq!(page.live.len(), 2);
        assert!(matches!(page.live[0].outcome, LiveOutcome::Compared { .. }));
        assert!(matches!(page.live[1].outcome, LiveOutcome::Failed { .. }));
        Ok(())
    }
}
