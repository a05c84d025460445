//! Plotly figure for a city's temperature history.
//!
//! The page hands the plot's JSON to plotly.js.

use crate::analysis::stats::CityStats;
use crate::analysis::trend::TrendFit;
use crate::frames::error::DataError;
use crate::frames::observation_frame::PreparedFrame;
use crate::i18n::{Locale, Text};
use chrono::NaiveDateTime;
use plotly::common::{DashType, Line, Marker, Mode, Title};
use plotly::layout::{Axis, Layout};
use plotly::{Plot, Scatter};

const PLOTLY_DATETIME: &str = "%Y-%m-%d %H:%M:%S";
const ANOMALY_MARKER_SIZE: usize = 8;

/// Builds the history chart: the temperature line, anomalies as red markers,
/// the fitted trend as a black line over the rows it was fitted on, and a
/// dotted line at the city's average temperature.
///
/// Rows without a parsed timestamp cannot be placed on the time axis and are
/// left out.
pub fn render_history_chart(
    city_frame: &PreparedFrame,
    stats: &CityStats,
    city: &str,
    trend: Option<&TrendFit>,
    locale: Locale,
) -> Result<Plot, DataError> {
    let observations = city_frame.observations()?;

    let (mut x, mut y) = (Vec::new(), Vec::new());
    let (mut anomaly_x, mut anomaly_y) = (Vec::new(), Vec::new());
    for observation in &observations {
        let Some(timestamp) = observation.timestamp else {
            continue;
        };
        x.push(format_x(&timestamp));
        y.push(observation.temperature);
        if observation.is_anomaly {
            anomaly_x.push(format_x(&timestamp));
            anomaly_y.push(observation.temperature);
        }
    }

    let mut plot = Plot::new();
    plot.add_trace(
        Scatter::new(x, y)
            .mode(Mode::Lines)
            .name(locale.text(Text::Temperature)),
    );
    plot.add_trace(
        Scatter::new(anomaly_x, anomaly_y)
            .mode(Mode::Markers)
            .name(locale.text(Text::ChartAnomalies))
            .marker(Marker::new().color("red").size(ANOMALY_MARKER_SIZE)),
    );

    if let Some(trend) = trend {
        let trend_x: Vec<String> = trend.timestamps.iter().map(format_x).collect();
        plot.add_trace(
            Scatter::new(trend_x, trend.predicted.clone())
                .mode(Mode::Lines)
                .name(locale.text(Text::ChartTrend))
                .line(Line::new().color("black").width(2.0)),
        );
    }

    if let (Some(first), Some(last), Some(mean)) = (
        stats.first_observation,
        stats.last_observation,
        stats.average_temperature,
    ) {
        plot.add_trace(
            Scatter::new(vec![format_x(&first), format_x(&last)], vec![mean, mean])
                .mode(Mode::Lines)
                .name(locale.text(Text::ChartMean))
                .line(Line::new().color("gray").width(1.0).dash(DashType::Dot)),
        );
    }

    plot.set_layout(
        Layout::new()
            .title(Title::with_text(locale.chart_title(city)))
            .x_axis(Axis::new().title(Title::with_text(locale.text(Text::ChartDateAxis))))
            .y_axis(Axis::new().title(Title::with_text(
                locale.text(Text::ChartTemperatureAxis),
            ))),
    );
    Ok(plot)
}

fn format_x(timestamp: &NaiveDateTime) -> String {
    timestamp.format(PLOTLY_DATETIME).to_string()
}
