//! User-facing strings in the languages the dashboard can be served in.
//!
//! Every message a reader sees on the page (report lines, API errors, widget
//! labels) goes through [`Locale`], so the analysis code never hard-codes a
//! language.

use std::fmt;
use std::str::FromStr;

/// The language used for all rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    #[default]
    Russian,
    English,
}

/// Keys for the fixed (non-parametrised) strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Text {
    PageTitle,
    UploadHeader,
    UploadLabel,
    UploadButton,
    UploadHint,
    TabOverview,
    TabCityAnalysis,
    TabAnomalies,
    OverviewHeader,
    AnomaliesHeader,
    ModeLabel,
    ModeSingle,
    ModeMultiple,
    CityLabel,
    ApiKeyLabel,
    ApplyButton,
    MinTemperature,
    AverageTemperature,
    MaxTemperature,
    SeasonalProfile,
    Season,
    Mean,
    StdDev,
    City,
    Timestamp,
    Temperature,
    MovingAverage,
    Anomaly,
    Rows,
    Period,
    AnomalyCount,
    NoAnomalies,
    ChartDateAxis,
    ChartTemperatureAxis,
    ChartAnomalies,
    ChartTrend,
    ChartMean,
    LiveHeader,
    UnknownError,
    AssessmentNormal,
    AssessmentSlightlyOff,
    AssessmentSignificantlyOff,
    ReportCity,
    ReportActual,
    ReportHistorical,
    ReportDeviation,
    ReportConclusion,
    ErrorHeader,
    SelectCitiesHint,
    SourceFile,
    Yes,
    No,
}

impl Locale {
    /// Short code used in CLI flags and the `lang` attribute of the page.
    pub fn code(&self) -> &'static str {
        match self {
            Locale::Russian => "ru",
            Locale::English => "en",
        }
    }

    pub fn text(&self, key: Text) -> &'static str {
        match self {
            Locale::Russian => russian(key),
            Locale::English => english(key),
        }
    }

    /// The single format every live-fetch failure is shown in.
    pub fn api_error(&self, message: &str) -> String {
        match self {
            Locale::Russian => format!("Ошибка API: {message}"),
            Locale::English => format!("API error: {message}"),
        }
    }

    pub fn trend_description(&self, positive: bool, city: &str) -> String {
        match (self, positive) {
            (Locale::Russian, true) => {
                format!("Наблюдается положительный тренд температуры в городе {city}.")
            }
            (Locale::Russian, false) => {
                format!("Наблюдается отрицательный тренд температуры в городе {city}.")
            }
            (Locale::English, true) => {
                format!("A positive temperature trend is observed in {city}.")
            }
            (Locale::English, false) => {
                format!("A negative temperature trend is observed in {city}.")
            }
        }
    }

    pub fn no_history(&self, city: &str) -> String {
        match self {
            Locale::Russian => format!("Нет данных для города {city} на указанную дату."),
            Locale::English => format!("No data for city {city} on the given date."),
        }
    }

    pub fn city_coordinates(&self, city: &str) -> String {
        match self {
            Locale::Russian => format!("Координаты города: {city}"),
            Locale::English => format!("Coordinates of {city}"),
        }
    }

    pub fn unknown_coordinates(&self, city: &str) -> String {
        match self {
            Locale::Russian => format!("Координаты города {city} неизвестны."),
            Locale::English => format!("Coordinates of {city} are unknown."),
        }
    }

    pub fn city_data(&self, city: &str) -> String {
        match self {
            Locale::Russian => format!("Данные для города {city}"),
            Locale::English => format!("Data for {city}"),
        }
    }

    pub fn chart_title(&self, city: &str) -> String {
        match self {
            Locale::Russian => format!("Температура и аномалии в {city}"),
            Locale::English => format!("Temperature and anomalies in {city}"),
        }
    }

    pub fn current_temperature(&self, city: &str, temperature: f64) -> String {
        match self {
            Locale::Russian => format!("Текущая температура в {city}: {temperature} °C"),
            Locale::English => format!("Current temperature in {city}: {temperature} °C"),
        }
    }

    pub fn fetch_failed(&self, city: &str) -> String {
        match self {
            Locale::Russian => format!("Ошибка получения температуры для {city}."),
            Locale::English => format!("Failed to get the temperature for {city}."),
        }
    }
}

fn russian(key: Text) -> &'static str {
    match key {
        Text::PageTitle => "Анализ температуры в выбранных городах",
        Text::UploadHeader => "Загрузка данных наблюдений",
        Text::UploadLabel => "Выберите файл CSV",
        Text::UploadButton => "Загрузить",
        Text::UploadHint => "Загрузите CSV-файл для анализа.",
        Text::TabOverview => "Обзор",
        Text::TabCityAnalysis => "Анализ города",
        Text::TabAnomalies => "Аномалии",
        Text::OverviewHeader => "Общая информация",
        Text::AnomaliesHeader => "Аномалии температуры",
        Text::ModeLabel => "Выберите режим:",
        Text::ModeSingle => "Один город",
        Text::ModeMultiple => "Несколько городов",
        Text::CityLabel => "Выберите город:",
        Text::ApiKeyLabel => "Введите API-ключ OpenWeatherMap:",
        Text::ApplyButton => "Применить",
        Text::MinTemperature => "Минимальная температура",
        Text::AverageTemperature => "Средняя температура",
        Text::MaxTemperature => "Максимальная температура",
        Text::SeasonalProfile => "Сезонный профиль",
        Text::Season => "Сезон",
        Text::Mean => "Среднее",
        Text::StdDev => "Ст. отклонение",
        Text::City => "Город",
        Text::Timestamp => "Дата",
        Text::Temperature => "Температура (°C)",
        Text::MovingAverage => "Скользящее среднее",
        Text::Anomaly => "Аномалия",
        Text::Rows => "Наблюдений",
        Text::Period => "Период",
        Text::AnomalyCount => "Аномалий",
        Text::NoAnomalies => "Аномалии не обнаружены.",
        Text::ChartDateAxis => "Дата",
        Text::ChartTemperatureAxis => "Температура (°C)",
        Text::ChartAnomalies => "Аномалии",
        Text::ChartTrend => "Тренд",
        Text::ChartMean => "Среднее",
        Text::LiveHeader => "Текущая температура",
        Text::UnknownError => "Неизвестная ошибка",
        Text::AssessmentNormal => "Температура в пределах нормы.",
        Text::AssessmentSlightlyOff => "Температура немного отличается от нормы.",
        Text::AssessmentSignificantlyOff => "Температура сильно отличается от нормы.",
        Text::ReportCity => "Город",
        Text::ReportActual => "Фактическая температура",
        Text::ReportHistorical => "Средняя историческая температура",
        Text::ReportDeviation => "Отклонение",
        Text::ReportConclusion => "Вывод",
        Text::ErrorHeader => "Ошибка",
        Text::SelectCitiesHint => "Выберите один или несколько городов.",
        Text::SourceFile => "Файл",
        Text::Yes => "да",
        Text::No => "нет",
    }
}

fn english(key: Text) -> &'static str {
    match key {
        Text::PageTitle => "Temperature analysis for selected cities",
        Text::UploadHeader => "Upload observations",
        Text::UploadLabel => "Choose a CSV file",
        Text::UploadButton => "Upload",
        Text::UploadHint => "Upload a CSV file to analyse.",
        Text::TabOverview => "Overview",
        Text::TabCityAnalysis => "City analysis",
        Text::TabAnomalies => "Anomalies",
        Text::OverviewHeader => "General information",
        Text::AnomaliesHeader => "Temperature anomalies",
        Text::ModeLabel => "Choose a mode:",
        Text::ModeSingle => "Single city",
        Text::ModeMultiple => "Multiple cities",
        Text::CityLabel => "Choose a city:",
        Text::ApiKeyLabel => "Enter an OpenWeatherMap API key:",
        Text::ApplyButton => "Apply",
        Text::MinTemperature => "Minimum temperature",
        Text::AverageTemperature => "Average temperature",
        Text::MaxTemperature => "Maximum temperature",
        Text::SeasonalProfile => "Seasonal profile",
        Text::Season => "Season",
        Text::Mean => "Mean",
        Text::StdDev => "Std. dev.",
        Text::City => "City",
        Text::Timestamp => "Date",
        Text::Temperature => "Temperature (°C)",
        Text::MovingAverage => "Moving average",
        Text::Anomaly => "Anomaly",
        Text::Rows => "Observations",
        Text::Period => "Period",
        Text::AnomalyCount => "Anomalies",
        Text::NoAnomalies => "No anomalies detected.",
        Text::ChartDateAxis => "Date",
        Text::ChartTemperatureAxis => "Temperature (°C)",
        Text::ChartAnomalies => "Anomalies",
        Text::ChartTrend => "Trend",
        Text::ChartMean => "Mean",
        Text::LiveHeader => "Current temperature",
        Text::UnknownError => "Unknown error",
        Text::AssessmentNormal => "Temperature is within the normal range.",
        Text::AssessmentSlightlyOff => "Temperature is slightly off the norm.",
        Text::AssessmentSignificantlyOff => "Temperature is significantly off the norm.",
        Text::ReportCity => "City",
        Text::ReportActual => "Actual temperature",
        Text::ReportHistorical => "Historical median temperature",
        Text::ReportDeviation => "Deviation",
        Text::ReportConclusion => "Conclusion",
        Text::ErrorHeader => "Error",
        Text::SelectCitiesHint => "Choose one or more cities.",
        Text::SourceFile => "File",
        Text::Yes => "yes",
        Text::No => "no",
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported locale '{0}', expected 'ru' or 'en'")]
pub struct UnknownLocale(pub String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ru" | "russian" => Ok(Locale::Russian),
            "en" | "english" => Ok(Locale::English),
            _ => Err(UnknownLocale(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_parse_and_display() {
        assert_eq!("ru".parse::<Locale>(), Ok(Locale::Russian));
        assert_eq!("EN".parse::<Locale>(), Ok(Locale::English));
        assert!("de".parse::<Locale>().is_err());
        assert_eq!(Locale::English.to_string(), "en");
    }

    #[test]
    fn test_api_error_format() {
        assert_eq!(
            Locale::Russian.api_error("city not found"),
            "Ошибка API: city not found"
        );
        assert_eq!(Locale::English.api_error("boom"), "API error: boom");
    }

    #[test]
    fn test_trend_description_mentions_city() {
        let text = Locale::English.trend_description(false, "Berlin");
        assert_eq!(text, "A negative temperature trend is observed in Berlin.");
        assert!(Locale::Russian
            .trend_description(true, "Москва")
            .contains("положительный"));
    }
}
