//! Weather feed model
//!
//! The panels render from a `WeatherReport` deserialized out of a small
//! JSON feed file:
//!
//! ```json
//! {
//!   "condition": "Partly Cloudy",
//!   "code": "801",
//!   "temperature": 54,
//!   "humidity": 71,
//!   "wind_speed": 12,
//!   "wind_chill": 49,
//!   "wind_degrees": 292.5,
//!   "sunrise": "6:4 am",
//!   "sunset": "7:38 pm",
//!   "today":    { "day": "Thu", "date": "7 Aug 2026", "high": 61, "low": 48, "code": "801" },
//!   "tomorrow": { "day": "Fri", "date": "8 Aug 2026", "high": 64, "low": 51, "code": "500" }
//! }
//! ```
//!
//! How the feed file is produced is a deployment detail (typically a cron
//! job against whatever weather API is in favor this year); the driver
//! only consumes it through the `WeatherSource` trait.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{SketchError, SketchResult};

/// Temperature unit label appended to displayed temperatures
pub const TEMP_UNITS: &str = "F";

/// Wind speed unit label
pub const SPEED_UNITS: &str = "mph";

/// 16-point compass rose, clockwise from north
const COMPASS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Forecast for one day
#[derive(Debug, Clone, Deserialize)]
pub struct DayForecast {
    /// Short day name, e.g. "Thu"
    pub day: String,
    /// Date string of the form "7 Aug 2026"
    pub date: String,
    pub high: i32,
    pub low: i32,
    /// Condition code for the icon table
    pub code: String,
}

impl DayForecast {
    /// Compact "day.month" label for the preview panel; single-digit day
    /// numbers are padded so the column lines up
    pub fn date_label(&self) -> String {
        let mut parts = self.date.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some(day), Some(month)) if day.len() == 1 => format!(" {day}.{month}"),
            (Some(day), Some(month)) => format!("{day}.{month}"),
            _ => self.date.clone(),
        }
    }
}

/// Everything the rotating panels render
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherReport {
    /// Current condition text, e.g. "Partly Cloudy"
    pub condition: String,
    /// Current condition code for the icon table
    pub code: String,
    /// Current temperature, degrees F
    pub temperature: i32,
    /// Relative humidity, percent
    pub humidity: u32,
    pub wind_speed: u32,
    pub wind_chill: i32,
    /// Wind direction in degrees, 0 = north
    pub wind_degrees: f32,
    /// Clock string like "6:04 am"
    pub sunrise: String,
    pub sunset: String,
    pub today: DayForecast,
    pub tomorrow: DayForecast,
}

impl WeatherReport {
    /// Parse a feed document, normalizing the sunrise/sunset clock strings
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut report: WeatherReport = serde_json::from_str(json)?;
        report.sunrise = pad_clock(&report.sunrise);
        report.sunset = pad_clock(&report.sunset);
        Ok(report)
    }

    /// Compass point for the current wind direction
    pub fn wind_compass(&self) -> &'static str {
        compass_point(self.wind_degrees)
    }
}

/// Nearest 16-point compass name for a direction in degrees
pub fn compass_point(degrees: f32) -> &'static str {
    let index = (degrees / 22.5) as usize % COMPASS.len();
    COMPASS[index]
}

/// Some feeds drop the leading zero of the minutes ("7:4 am"); pad it back
fn pad_clock(value: &str) -> String {
    if let Some((hour, rest)) = value.split_once(':') {
        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 1 {
            return format!("{hour}:0{rest}");
        }
    }
    value.to_string()
}

/// Provides the current report to the panel loop
pub trait WeatherSource {
    fn fetch(&self) -> SketchResult<WeatherReport>;
}

/// Reads the report from a feed file on disk
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl WeatherSource for FileSource {
    fn fetch(&self) -> SketchResult<WeatherReport> {
        let contents = fs::read_to_string(&self.path).map_err(|err| SketchError::Resource {
            path: self.path.display().to_string(),
            reason: err.to_string(),
        })?;
        WeatherReport::from_json(&contents).map_err(|err| SketchError::Resource {
            path: self.path.display().to_string(),
            reason: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"{
        "condition": "Partly Cloudy",
        "code": "801",
        "temperature": 54,
        "humidity": 71,
        "wind_speed": 12,
        "wind_chill": 49,
        "wind_degrees": 292.5,
        "sunrise": "6:4 am",
        "sunset": "7:38 pm",
        "today":    { "day": "Thu", "date": "7 Aug 2026", "high": 61, "low": 48, "code": "801" },
        "tomorrow": { "day": "Fri", "date": "8 Aug 2026", "high": 64, "low": 51, "code": "500" }
    }"#;

    #[test]
    fn test_parse_feed() {
        let report = WeatherReport::from_json(FEED).unwrap();
        assert_eq!(report.condition, "Partly Cloudy");
        assert_eq!(report.temperature, 54);
        assert_eq!(report.today.high, 61);
        assert_eq!(report.tomorrow.code, "500");
    }

    #[test]
    fn test_sun_times_are_padded_on_parse() {
        let report = WeatherReport::from_json(FEED).unwrap();
        assert_eq!(report.sunrise, "6:04 am");
        assert_eq!(report.sunset, "7:38 pm", "well-formed times pass through");
    }

    #[test]
    fn test_pad_clock() {
        assert_eq!(pad_clock("7:4 am"), "7:04 am");
        assert_eq!(pad_clock("7:45 am"), "7:45 am");
        assert_eq!(pad_clock("12:5 pm"), "12:05 pm");
        assert_eq!(pad_clock("noonish"), "noonish");
    }

    #[test]
    fn test_compass_point() {
        assert_eq!(compass_point(0.0), "N");
        assert_eq!(compass_point(22.4), "N");
        assert_eq!(compass_point(22.5), "NNE");
        assert_eq!(compass_point(90.0), "E");
        assert_eq!(compass_point(292.5), "WNW");
        assert_eq!(compass_point(359.9), "NNW");
        assert_eq!(compass_point(360.0), "N", "wraps past a full circle");
    }

    #[test]
    fn test_date_label_padding() {
        let forecast = DayForecast {
            day: "Thu".into(),
            date: "7 Aug 2026".into(),
            high: 61,
            low: 48,
            code: "801".into(),
        };
        assert_eq!(forecast.date_label(), " 7.Aug");

        let forecast = DayForecast { date: "17 Aug 2026".into(), ..forecast };
        assert_eq!(forecast.date_label(), "17.Aug");
    }

    #[test]
    fn test_file_source_missing_feed() {
        let source = FileSource::new(PathBuf::from("/nonexistent/weather.json"));
        let err = source.fetch().unwrap_err();
        assert!(matches!(err, SketchError::Resource { .. }), "got {err:?}");
    }
}
