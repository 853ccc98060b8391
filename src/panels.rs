//! Rotating display panels
//!
//! Each panel formats one screen of information through the display
//! driver and reports whether it drew anything; the caller owns the dwell
//! time between panels. Layout metrics come from the display profile.

use chrono::Local;

use crate::display::{DisplayProfile, SketchDisplay, TextConfig};
use crate::error::SketchResult;
use crate::weather::{WeatherReport, SPEED_UNITS, TEMP_UNITS};

/// Degree sign in the device's text encoding
const DEGREE: char = '\u{b0}';

/// One rotating panel
pub type Panel = fn(&mut SketchDisplay, &WeatherReport) -> SketchResult<bool>;

/// The rotation, in display order
pub const ROTATION: [Panel; 4] = [current_conditions, forecast_preview, clock, sun_rise_set];

/// Headline temperature, condition/humidity, wind line, and the current
/// condition icon
pub fn current_conditions(display: &mut SketchDisplay, report: &WeatherReport) -> SketchResult<bool> {
    let profile = display.profile();

    display.show_text(TextConfig {
        text: Some(format!("{}{}{}", report.temperature, DEGREE, TEMP_UNITS)),
        font: Some(profile.headline_font()),
        x: 34,
        y: 0,
        clear: true,
        ..Default::default()
    })?;
    display.show_text(TextConfig {
        text: Some(format!("{}, Humidity: {}%", report.condition, report.humidity)),
        font: Some(profile.body_font()),
        x: profile.conditions_column(),
        y: 0,
        ..Default::default()
    })?;
    display.show_text(TextConfig {
        text: Some(format!(
            "Wind: {} at {}{}, Chill: {}{}{}",
            report.wind_compass(),
            report.wind_speed,
            SPEED_UNITS,
            report.wind_chill,
            DEGREE,
            TEMP_UNITS
        )),
        font: Some(profile.body_font()),
        x: profile.conditions_column(),
        y: profile.second_row(),
        ..Default::default()
    })?;

    display.draw_icon(&report.code, 0, 0)?;
    Ok(true)
}

/// Today and tomorrow side by side, split by a vertical rule
pub fn forecast_preview(display: &mut SketchDisplay, report: &WeatherReport) -> SketchResult<bool> {
    let profile = display.profile();
    let second = profile.second_row();

    // Left half: the rest of today.
    display.show_text(TextConfig {
        text: Some(report.today.day.clone()),
        font: Some(profile.body_font()),
        x: 0,
        y: 0,
        clear: true,
        ..Default::default()
    })?;
    display.show_text(TextConfig {
        text: Some(report.today.date_label()),
        x: 0,
        y: second,
        ..Default::default()
    })?;
    display.show_text(TextConfig {
        text: Some(format!("{}{}{}", report.today.high, DEGREE, TEMP_UNITS)),
        x: 82,
        y: 0,
        ..Default::default()
    })?;
    display.show_text(TextConfig {
        text: Some(format!("{}{}{}", report.today.low, DEGREE, TEMP_UNITS)),
        x: 82,
        y: second,
        ..Default::default()
    })?;

    // Divider between the halves.
    display.clear_rect(139, 0, 141, profile.max_row())?;
    display.draw_line(140, 0, 140, profile.max_row())?;

    // Right half: tomorrow.
    display.show_text(TextConfig {
        text: Some(report.tomorrow.day.clone()),
        font: Some(profile.body_font()),
        x: 145,
        y: 0,
        ..Default::default()
    })?;
    display.show_text(TextConfig {
        text: Some(report.tomorrow.date_label()),
        x: 145,
        y: second,
        ..Default::default()
    })?;
    display.show_text(TextConfig {
        text: Some(format!("{}{}{}", report.tomorrow.high, DEGREE, TEMP_UNITS)),
        x: profile.preview_right_temp_column(),
        y: 0,
        ..Default::default()
    })?;
    display.show_text(TextConfig {
        text: Some(format!("{}{}{}", report.tomorrow.low, DEGREE, TEMP_UNITS)),
        x: profile.preview_right_temp_column(),
        y: second,
        ..Default::default()
    })?;

    display.draw_icon(&report.today.code, profile.preview_icon_today_x(), 0)?;
    display.draw_icon(&report.tomorrow.code, profile.preview_icon_tomorrow_x(), 0)?;
    Ok(true)
}

/// Local time and date. On the wide panel this only repaints the top row
/// for the sun panel to extend, so it contributes no dwell of its own.
pub fn clock(display: &mut SketchDisplay, _report: &WeatherReport) -> SketchResult<bool> {
    let profile = display.profile();
    let now = Local::now();

    display.show_text(TextConfig {
        text: Some(now.format("%H:%M   %a, %b %e").to_string()),
        font: Some(profile.clock_font()),
        x: 80,
        y: 0,
        clear: true,
        ..Default::default()
    })?;

    Ok(profile == DisplayProfile::Compact)
}

/// Sunrise and sunset times. Shares the screen with the clock on the wide
/// panel, so it only clears on the compact one.
pub fn sun_rise_set(display: &mut SketchDisplay, report: &WeatherReport) -> SketchResult<bool> {
    let profile = display.profile();
    let y = match profile {
        DisplayProfile::Compact => 0,
        DisplayProfile::Wide => profile.second_row(),
    };

    display.show_text(TextConfig {
        text: Some(format!("Sunrise: {}", report.sunrise)),
        font: Some(profile.clock_font()),
        x: 8,
        y,
        clear: profile == DisplayProfile::Compact,
        ..Default::default()
    })?;
    display.show_text(TextConfig {
        text: Some(format!("Sunset: {}", report.sunset)),
        font: Some(profile.clock_font()),
        x: 148,
        y,
        ..Default::default()
    })?;

    Ok(true)
}
