//! HTML rendering of a [`DashboardPage`]. Charts are drawn by plotly.js and
//! maps by Leaflet, both loaded from their CDNs.

use crate::analysis::stats::CityStats;
use crate::dashboard::view::{
    CityMode, CityPanel, DashboardPage, LiveOutcome, LiveReport, Tab,
};
use crate::i18n::{Locale, Text};
use crate::types::city::LatLon;
use crate::types::observation::PreparedObservation;
use chrono::NaiveDateTime;

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const TILE_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors";
const MAP_ZOOM: u8 = 10;

const STYLE: &str = "
body { font-family: sans-serif; margin: 2rem auto; max-width: 1200px; color: #262730; }
section { margin-bottom: 2rem; }
table { border-collapse: collapse; margin: 0.5rem 0; }
th, td { border: 1px solid #ddd; padding: 0.25rem 0.5rem; text-align: right; }
th { background: #f0f0f5; }
td.text { text-align: left; }
.table-scroll { max-height: 24rem; overflow-y: auto; }
.tabs button { background: #f0f0f5; border: none; border-radius: 5px 5px 0 0; padding: 0.5rem 1rem; }
.tabs button.active { background: #4CAF50; color: white; }
.controls button { background: #4CAF50; color: white; border: none; border-radius: 5px; padding: 0.4rem 1rem; }
.metrics { display: flex; gap: 2rem; }
.metric .value { font-size: 1.6rem; }
.map { height: 320px; }
.chart { height: 480px; }
.info { background: #e8f0fe; padding: 0.75rem; border-radius: 5px; }
.error { background: #fdecea; color: #8a1c1c; padding: 0.75rem; border-radius: 5px; }
";

/// Renders the complete page.
pub fn render_html(page: &DashboardPage) -> String {
    let locale = page.locale;
    let mut out = String::with_capacity(16 * 1024);

    out.push_str(&format!(
        "<!DOCTYPE html>\n<html lang=\"{}\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n\
         <script src=\"{PLOTLY_JS}\"></script>\n\
         <link rel=\"stylesheet\" href=\"{LEAFLET_CSS}\">\n\
         <script src=\"{LEAFLET_JS}\"></script>\n\
         <style>{STYLE}</style>\n</head>\n<body>\n<h1>{}</h1>\n",
        locale.code(),
        escape(locale.text(Text::PageTitle)),
        escape(locale.text(Text::PageTitle)),
    ));

    render_errors(&mut out, &page.errors, locale);
    render_upload(&mut out, page);

    if page.source.is_some() {
        render_controls(&mut out, page);
        match page.selections.tab {
            Tab::Overview => render_overview(&mut out, &page.overview, locale),
            Tab::CityAnalysis => render_city_analysis(&mut out, page),
            Tab::Anomalies => render_anomalies(&mut out, &page.anomalies, locale),
        }
        render_live(&mut out, &page.live, locale);
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn render_errors(out: &mut String, errors: &[String], locale: Locale) {
    for message in errors {
        out.push_str(&format!(
            "<div class=\"error\"><strong>{}:</strong> {}</div>\n",
            escape(locale.text(Text::ErrorHeader)),
            escape(message)
        ));
    }
}

fn render_upload(out: &mut String, page: &DashboardPage) {
    let locale = page.locale;
    out.push_str(&format!(
        "<section>\n<h2>{}</h2>\n\
         <form method=\"post\" action=\"/upload\" enctype=\"multipart/form-data\">\n\
         <label>{} <input type=\"file\" name=\"file\" accept=\".csv,text/csv\"></label>\n\
         <button type=\"submit\">{}</button>\n</form>\n",
        escape(locale.text(Text::UploadHeader)),
        escape(locale.text(Text::UploadLabel)),
        escape(locale.text(Text::UploadButton)),
    ));
    match &page.source {
        Some(source) => out.push_str(&format!(
            "<p>{}: {} ({}: {})</p>\n",
            escape(locale.text(Text::SourceFile)),
            escape(&source.name),
            escape(locale.text(Text::Rows)),
            source.rows
        )),
        None => out.push_str(&format!(
            "<p class=\"info\">{}</p>\n",
            escape(locale.text(Text::UploadHint))
        )),
    }
    out.push_str("</section>\n");
}

/// The selection form. Tab buttons submit it, so every interaction carries
/// the full set of selections.
fn render_controls(out: &mut String, page: &DashboardPage) {
    let locale = page.locale;
    let selections = &page.selections;
    out.push_str("<form method=\"post\" action=\"/\" class=\"controls\">\n<section>\n");

    out.push_str(&format!("<p>{}", escape(locale.text(Text::ModeLabel))));
    for (mode, label) in [
        (CityMode::Single, Text::ModeSingle),
        (CityMode::Multiple, Text::ModeMultiple),
    ] {
        out.push_str(&format!(
            " <label><input type=\"radio\" name=\"mode\" value=\"{}\"{}> {}</label>",
            mode.form_value(),
            checked(selections.mode == mode),
            escape(locale.text(label))
        ));
    }
    out.push_str("</p>\n");

    let single_city = page
        .city_panels
        .first()
        .filter(|_| selections.mode == CityMode::Single)
        .map(|panel| panel.city.as_str());
    out.push_str(&format!(
        "<p><label>{} <select name=\"city\">",
        escape(locale.text(Text::CityLabel))
    ));
    for city in &page.cities {
        out.push_str(&format!(
            "<option value=\"{0}\"{1}>{0}</option>",
            escape(city),
            selected(single_city == Some(city.as_str()))
        ));
    }
    out.push_str("</select></label></p>\n");

    out.push_str(&format!(
        "<p><label>{} <select name=\"cities\" multiple size=\"{}\">",
        escape(locale.text(Text::ModeMultiple)),
        page.cities.len().clamp(1, 8)
    ));
    for city in &page.cities {
        out.push_str(&format!(
            "<option value=\"{0}\"{1}>{0}</option>",
            escape(city),
            selected(selections.cities.contains(city))
        ));
    }
    out.push_str("</select></label></p>\n");

    out.push_str(&format!(
        "<p><label>{} <input type=\"password\" name=\"api_key\" value=\"{}\" autocomplete=\"off\"></label></p>\n",
        escape(locale.text(Text::ApiKeyLabel)),
        escape(selections.api_key.as_deref().unwrap_or_default())
    ));
    // First submit button in the form, so pressing enter keeps the current tab.
    out.push_str(&format!(
        "<button type=\"submit\" name=\"tab\" value=\"{}\">{}</button>\n</section>\n",
        selections.tab.form_value(),
        escape(locale.text(Text::ApplyButton))
    ));

    out.push_str("<nav class=\"tabs\">");
    for tab in Tab::ALL {
        let label = match tab {
            Tab::Overview => Text::TabOverview,
            Tab::CityAnalysis => Text::TabCityAnalysis,
            Tab::Anomalies => Text::TabAnomalies,
        };
        out.push_str(&format!(
            "<button type=\"submit\" name=\"tab\" value=\"{}\"{}>{}</button>",
            tab.form_value(),
            if tab == selections.tab {
                " class=\"active\""
            } else {
                ""
            },
            escape(locale.text(label))
        ));
    }
    out.push_str("</nav>\n</form>\n");
}

fn render_overview(out: &mut String, overview: &[CityStats], locale: Locale) {
    out.push_str(&format!(
        "<section id=\"tab-overview\">\n<h2>{}</h2>\n<table>\n<tr>",
        escape(locale.text(Text::OverviewHeader))
    ));
    for key in [
        Text::City,
        Text::Rows,
        Text::Period,
        Text::MinTemperature,
        Text::AverageTemperature,
        Text::MaxTemperature,
        Text::AnomalyCount,
    ] {
        out.push_str(&format!("<th>{}</th>", escape(locale.text(key))));
    }
    out.push_str("</tr>\n");
    for stats in overview {
        out.push_str(&format!(
            "<tr><td class=\"text\">{}</td><td>{}</td><td class=\"text\">{} – {}</td>\
             <td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&stats.city),
            stats.rows,
            format_datetime(stats.first_observation),
            format_datetime(stats.last_observation),
            format_temperature(stats.min_temperature),
            format_temperature(stats.average_temperature),
            format_temperature(stats.max_temperature),
            stats.anomalies
        ));
    }
    out.push_str("</table>\n</section>\n");
}

fn render_city_analysis(out: &mut String, page: &DashboardPage) {
    let locale = page.locale;
    out.push_str("<section id=\"tab-city\">\n");
    if page.city_panels.is_empty() && page.selections.mode == CityMode::Multiple {
        out.push_str(&format!(
            "<p class=\"info\">{}</p>\n",
            escape(locale.text(Text::SelectCitiesHint))
        ));
    }
    for (index, panel) in page.city_panels.iter().enumerate() {
        render_city_panel(out, index, panel, locale);
    }
    out.push_str("</section>\n");
}

fn render_city_panel(out: &mut String, index: usize, panel: &CityPanel, locale: Locale) {
    let city = &panel.city;
    out.push_str("<article>\n");
    match panel.coordinates {
        Some(coordinates) => {
            out.push_str(&format!("<h3>{}</h3>\n", escape(&locale.city_coordinates(city))));
            out.push_str(&map_element(&format!("map-{index}"), coordinates));
        }
        None => out.push_str(&format!(
            "<p class=\"info\">{}</p>\n",
            escape(&locale.unknown_coordinates(city))
        )),
    }

    out.push_str(&format!("<h3>{}</h3>\n", escape(&locale.city_data(city))));
    render_observation_table(out, &panel.observations, locale);

    out.push_str("<div class=\"metrics\">\n");
    for (key, value) in [
        (Text::MinTemperature, panel.stats.min_temperature),
        (Text::AverageTemperature, panel.stats.average_temperature),
        (Text::MaxTemperature, panel.stats.max_temperature),
    ] {
        out.push_str(&format!(
            "<div class=\"metric\"><div>{}</div><div class=\"value\">{}</div></div>\n",
            escape(locale.text(key)),
            format_temperature(value)
        ));
    }
    out.push_str("</div>\n");

    render_seasonal_profile(out, &panel.stats, locale);

    match &panel.trend {
        Ok(description) => out.push_str(&format!("<p>{}</p>\n", escape(description))),
        Err(message) => out.push_str(&format!("<p class=\"error\">{}</p>\n", escape(message))),
    }

    out.push_str(&chart_element(&format!("chart-{index}"), &panel.chart_json));
    out.push_str("</article>\n");
}

fn render_seasonal_profile(out: &mut String, stats: &CityStats, locale: Locale) {
    out.push_str(&format!(
        "<h4>{}</h4>\n<table>\n<tr><th>{}</th><th>{}</th><th>{}</th></tr>\n",
        escape(locale.text(Text::SeasonalProfile)),
        escape(locale.text(Text::Season)),
        escape(locale.text(Text::Mean)),
        escape(locale.text(Text::StdDev))
    ));
    for profile in &stats.seasonal_profile {
        out.push_str(&format!(
            "<tr><td class=\"text\">{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(profile.season.as_deref().unwrap_or_default()),
            format_number(profile.mean),
            format_number(profile.std)
        ));
    }
    out.push_str("</table>\n");
}

fn render_observation_table(out: &mut String, rows: &[PreparedObservation], locale: Locale) {
    out.push_str("<div class=\"table-scroll\"><table>\n<tr>");
    for key in [
        Text::City,
        Text::Timestamp,
        Text::Temperature,
        Text::Season,
        Text::MovingAverage,
        Text::Mean,
        Text::StdDev,
        Text::Anomaly,
    ] {
        out.push_str(&format!("<th>{}</th>", escape(locale.text(key))));
    }
    out.push_str("</tr>\n");
    for row in rows {
        out.push_str(&format!(
            "<tr><td class=\"text\">{}</td><td class=\"text\">{}</td><td>{}</td>\
             <td class=\"text\">{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"text\">{}</td></tr>\n",
            escape(&row.city),
            format_datetime(row.timestamp),
            format_number(row.temperature),
            escape(row.season.as_deref().unwrap_or_default()),
            format_number(row.moving_avg),
            format_number(row.seasonal_mean),
            format_number(row.seasonal_std),
            escape(locale.text(if row.is_anomaly { Text::Yes } else { Text::No }))
        ));
    }
    out.push_str("</table></div>\n");
}

fn render_anomalies(out: &mut String, anomalies: &[PreparedObservation], locale: Locale) {
    out.push_str(&format!(
        "<section id=\"tab-anomalies\">\n<h2>{}</h2>\n",
        escape(locale.text(Text::AnomaliesHeader))
    ));
    if anomalies.is_empty() {
        out.push_str(&format!(
            "<p class=\"info\">{}</p>\n",
            escape(locale.text(Text::NoAnomalies))
        ));
    } else {
        out.push_str(&format!(
            "<p>{}: {}</p>\n",
            escape(locale.text(Text::AnomalyCount)),
            anomalies.len()
        ));
        render_observation_table(out, anomalies, locale);
    }
    out.push_str("</section>\n");
}

fn render_live(out: &mut String, live: &[LiveReport], locale: Locale) {
    if live.is_empty() {
        return;
    }
    out.push_str(&format!(
        "<section id=\"live\">\n<h2>{}</h2>\n",
        escape(locale.text(Text::LiveHeader))
    ));
    for report in live {
        match &report.outcome {
            LiveOutcome::Compared {
                temperature,
                report: text,
            } => out.push_str(&format!(
                "<h3>{}</h3>\n<pre>{}</pre>\n",
                escape(&locale.current_temperature(&report.city, *temperature)),
                escape(text)
            )),
            LiveOutcome::Failed { message } => out.push_str(&format!(
                "<div class=\"error\">{} {}</div>\n",
                escape(&locale.fetch_failed(&report.city)),
                escape(message)
            )),
        }
    }
    out.push_str("</section>\n");
}

fn map_element(id: &str, LatLon(lat, lon): LatLon) -> String {
    format!(
        "<div id=\"{id}\" class=\"map\"></div>\n<script>\n(function () {{\n\
         var map = L.map('{id}').setView([{lat}, {lon}], {MAP_ZOOM});\n\
         L.tileLayer('{TILE_URL}', {{ attribution: '{TILE_ATTRIBUTION}' }}).addTo(map);\n\
         L.circleMarker([{lat}, {lon}], {{ color: 'rgb(200, 30, 0)', fillOpacity: 0.63 }}).addTo(map);\n\
         }})();\n</script>\n"
    )
}

fn chart_element(id: &str, figure_json: &str) -> String {
    format!(
        "<div id=\"{id}\" class=\"chart\"></div>\n<script>\n(function () {{\n\
         var figure = {};\n\
         Plotly.newPlot('{id}', figure.data, figure.layout);\n\
         }})();\n</script>\n",
        script_safe(figure_json)
    )
}

/// Escapes text for use in element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// JSON embedded in a `<script>` element must not contain `</`.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn checked(on: bool) -> &'static str {
    if on {
        " checked"
    } else {
        ""
    }
}

fn selected(on: bool) -> &'static str {
    if on {
        " selected"
    } else {
        ""
    }
}

fn format_temperature(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2} °C"))
}

fn format_number(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

fn format_datetime(value: Option<NaiveDateTime>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.format("%Y-%m-%d %H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::dataset::Dataset;
    use crate::dashboard::view::{render_dashboard, Selections};
    use crate::frames::test_support::csv_from_rows;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn dataset(city: &str) -> Result<Dataset, Box<dyn std::error::Error>> {
        let csv = csv_from_rows(&[
            (city, "2020-01-01".to_string(), 5.0, "winter"),
            (city, "2020-01-02".to_string(), 6.0, "winter"),
            (city, "2020-01-03".to_string(), 7.0, "winter"),
        ]);
        Ok(Dataset::from_csv_bytes("obs.csv", csv.into_bytes())?)
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(script_safe(r#"{"name":"</script>"}"#), r#"{"name":"<\/script>"}"#);
    }

    #[test]
    fn test_page_without_data_asks_for_upload() {
        let page = render_dashboard(None, &Selections::default(), None, today(), Locale::Russian);
        let html = render_html(&page);

        assert!(html.contains("<html lang=\"ru\">"));
        assert!(html.contains("Загрузите CSV-файл для анализа."));
        assert!(html.contains("action=\"/upload\""));
        assert!(!html.contains("class=\"tabs\""));
    }

    #[test]
    fn test_city_tab_has_map_chart_and_metrics() -> Result<(), Box<dyn std::error::Error>> {
        let dataset = dataset("London")?;
        let selections = Selections {
            tab: Tab::CityAnalysis,
            ..Default::default()
        };
        let page = render_dashboard(Some(&dataset), &selections, None, today(), Locale::English);
        let html = render_html(&page);

        assert!(html.contains("Coordinates of London"));
        assert!(html.contains("L.map('map-0').setView([51.5074, -0.1278], 10)"));
        assert!(html.contains("Plotly.newPlot('chart-0'"));
        assert!(html.contains("5.00 °C"));
        assert!(html.contains("6.00 °C"));
        assert!(html.contains("7.00 °C"));
        assert!(html.contains("A positive temperature trend is observed in London."));
        assert!(html.contains("<button type=\"submit\" name=\"tab\" value=\"city\" class=\"active\">"));
        Ok(())
    }

    #[test]
    fn test_hostile_city_name_is_escaped() -> Result<(), Box<dyn std::error::Error>> {
        let city = "</script><script>alert(1)</script>";
        let dataset = dataset(city)?;
        let selections = Selections {
            tab: Tab::CityAnalysis,
            ..Default::default()
        };
        let page = render_dashboard(Some(&dataset), &selections, None, today(), Locale::English);
        let html = render_html(&page);

        assert!(!html.contains("</script><script>alert(1)"));
        assert!(html.contains("Coordinates of &lt;/script&gt;&lt;script&gt;alert(1)&lt;/script&gt; are unknown."));
        Ok(())
    }

    #[test]
    fn test_overview_and_empty_anomalies() -> Result<(), Box<dyn std::error::Error>> {
        let dataset = dataset("Paris")?;
        let page = render_dashboard(Some(&dataset), &Selections::default(), None, today(), Locale::English);
        let html = render_html(&page);
        assert!(html.contains("General information"));
        assert!(html.contains("2020-01-01 00:00 – 2020-01-03 00:00"));

        let selections = Selections {
            tab: Tab::Anomalies,
            ..Default::default()
        };
        let page = render_dashboard(Some(&dataset), &selections, None, today(), Locale::English);
        assert!(render_html(&page).contains("No anomalies detected."));
        Ok(())
    }

    #[test]
    fn test_errors_and_live_failures_are_shown() {
        let mut page = DashboardPage::empty(Selections::default(), Locale::English);
        page.errors.push("Missing required column 'season'".to_string());
        let html = render_html(&page);
        assert!(html.contains("<strong>Error:</strong> Missing required column &#39;season&#39;"));

        let mut out = String::new();
        render_live(
            &mut out,
            &[LiveReport {
                city: "Atlantis".to_string(),
                outcome: LiveOutcome::Failed {
                    message: "API error: city not found".to_string(),
                },
            }],
            Locale::English,
        );
        assert!(out.contains("Failed to get the temperature for Atlantis. API error: city not found"));
    }
}
