//! Display driver facade
//!
//! High-level operations on the device display: positioned text, clears,
//! and icon drawing. The facade owns the session, the icon table, and the
//! display profile, and turns every operation into `sketch` command lines.
//! Drawing an icon expands its PBM resource through the decoder and
//! rasterizer into point and line commands.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::debug;

use crate::bitmap;
use crate::error::{SessionResult, SketchError, SketchResult};
use crate::icons::IconTable;
use crate::raster::{self, DrawOp};
use crate::session::{InterceptOutcome, SketchSession};

/// Layout and font variant of the attached display.
///
/// The compact profile is the 280x16 panel of the M1000-class units, the
/// wide profile the 280x32 panel of the R1000-class units. All per-device
/// fonts, columns, and icon-file prefixes hang off this enum; nothing else
/// in the crate switches on the device type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayProfile {
    Compact,
    Wide,
}

impl DisplayProfile {
    /// Filename prefix of the icon set sized for this panel
    pub fn icon_prefix(self) -> &'static str {
        match self {
            DisplayProfile::Compact => "s-",
            DisplayProfile::Wide => "",
        }
    }

    pub fn width(self) -> usize {
        280
    }

    pub fn height(self) -> usize {
        match self {
            DisplayProfile::Compact => 16,
            DisplayProfile::Wide => 32,
        }
    }

    /// Last drawable row
    pub fn max_row(self) -> usize {
        self.height() - 1
    }

    /// Small font for panel body lines
    pub fn body_font(self) -> u32 {
        match self {
            DisplayProfile::Compact => 1,
            DisplayProfile::Wide => 2,
        }
    }

    /// Large font for the headline temperature
    pub fn headline_font(self) -> u32 {
        match self {
            DisplayProfile::Compact => 10,
            DisplayProfile::Wide => 3,
        }
    }

    /// Font for the clock and sun panels
    pub fn clock_font(self) -> u32 {
        match self {
            DisplayProfile::Compact => 10,
            DisplayProfile::Wide => 2,
        }
    }

    /// Row offset of the second text line
    pub fn second_row(self) -> usize {
        match self {
            DisplayProfile::Compact => 8,
            DisplayProfile::Wide => 16,
        }
    }

    /// Column where the current-conditions text starts
    pub fn conditions_column(self) -> usize {
        match self {
            DisplayProfile::Compact => 80,
            DisplayProfile::Wide => 90,
        }
    }

    /// Icon position for today's forecast on the preview panel
    pub fn preview_icon_today_x(self) -> usize {
        match self {
            DisplayProfile::Compact => 47,
            DisplayProfile::Wide => 49,
        }
    }

    /// Icon position for tomorrow's forecast on the preview panel
    pub fn preview_icon_tomorrow_x(self) -> usize {
        match self {
            DisplayProfile::Compact => 188,
            DisplayProfile::Wide => 194,
        }
    }

    /// Temperature column on the right half of the preview panel
    pub fn preview_right_temp_column(self) -> usize {
        match self {
            DisplayProfile::Compact => 227,
            DisplayProfile::Wide => 233,
        }
    }

    /// Row for transient status messages
    pub fn status_row(self) -> usize {
        match self {
            DisplayProfile::Compact => 5,
            DisplayProfile::Wide => 10,
        }
    }
}

impl FromStr for DisplayProfile {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "compact" | "m1000" | "1" => Ok(DisplayProfile::Compact),
            "wide" | "r1000" | "2" => Ok(DisplayProfile::Wide),
            other => Err(format!("unknown display profile '{other}'")),
        }
    }
}

impl fmt::Display for DisplayProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayProfile::Compact => write!(f, "compact"),
            DisplayProfile::Wide => write!(f, "wide"),
        }
    }
}

/// Options for one `show_text` call.
///
/// `text` absent means "configure only": an encoding or font selection is
/// sent, nothing is drawn. `clear` wipes the display before the text goes
/// up.
#[derive(Debug, Clone, Default)]
pub struct TextConfig {
    pub x: usize,
    pub y: usize,
    pub text: Option<String>,
    pub font: Option<u32>,
    pub clear: bool,
    pub encoding: Option<String>,
}

/// High-level driver for one device display
pub struct SketchDisplay {
    session: SketchSession,
    profile: DisplayProfile,
    icons: IconTable,
    icon_dir: PathBuf,
}

impl SketchDisplay {
    pub fn new(
        session: SketchSession,
        profile: DisplayProfile,
        icons: IconTable,
        icon_dir: PathBuf,
    ) -> Self {
        Self {
            session,
            profile,
            icons,
            icon_dir,
        }
    }

    pub fn profile(&self) -> DisplayProfile {
        self.profile
    }

    // Session lifecycle passthroughs; the facade owns the session so
    // callers serialize on one &mut SketchDisplay.

    pub fn open(&mut self, host: &str) -> SessionResult<()> {
        self.session.open(host)
    }

    pub fn reopen(&mut self) -> SessionResult<()> {
        self.session.reopen()
    }

    pub fn close(&mut self) {
        self.session.close()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_established()
    }

    /// Host recorded by the last successful open, if any
    pub fn host(&self) -> Option<&str> {
        self.session.host()
    }

    pub fn intercept(&mut self, timeout: Duration) -> SessionResult<InterceptOutcome> {
        self.session.intercept(timeout)
    }

    /// Render text and/or adjust device text state.
    ///
    /// Encoding and font selections are sent first; with no `text` the
    /// call is configuration only and nothing is drawn.
    pub fn show_text(&mut self, config: TextConfig) -> SessionResult<()> {
        if let Some(encoding) = &config.encoding {
            self.session.command(&format!("sketch -c encoding {encoding}"))?;
        }
        if let Some(font) = config.font {
            self.session.command(&format!("sketch -c font {font}"))?;
        }

        let Some(text) = &config.text else {
            return Ok(());
        };

        if config.clear {
            self.clear()?;
        }
        self.session
            .command(&format!("sketch -c text {} {} \"{}\"", config.x, config.y, text))
    }

    /// Clear the whole display
    pub fn clear(&mut self) -> SessionResult<()> {
        self.session.command("sketch -c clear")
    }

    /// Blank a rectangular region, leaving the drawing color set
    pub fn clear_rect(&mut self, x: usize, y: usize, w: usize, h: usize) -> SessionResult<()> {
        self.session.command("sketch -c color 0")?;
        self.session.command(&format!("sketch -c rect {x} {y} {w} {h}"))?;
        self.session.command("sketch -c color 1")
    }

    /// Draw a line segment between two points
    pub fn draw_line(&mut self, x1: usize, y1: usize, x2: usize, y2: usize) -> SessionResult<()> {
        self.session
            .command(&format!("sketch -c line {x1} {y1} {x2} {y2}"))
    }

    /// Draw the icon for a weather condition code at `(x, y)`.
    ///
    /// The code resolves through the icon table (unknown codes fall back
    /// to the "not available" icon); the bitmap file is selected by the
    /// display profile, decoded, rasterized, and emitted as draw commands.
    /// A missing or corrupt bitmap is an error — that is a broken
    /// installation, not a lookup miss.
    pub fn draw_icon(&mut self, code: &str, x: usize, y: usize) -> SketchResult<()> {
        let icon = self.icons.lookup(code);
        let file = format!("{}{}.pbm", self.profile.icon_prefix(), icon);
        let path = self.icon_dir.join(&file);
        debug!("drawing icon {file} for condition {code}");

        let contents = fs::read(&path).map_err(|err| SketchError::Resource {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        let image = bitmap::decode(&contents)?;
        let ops = raster::rasterize(&image);

        self.clear_rect(x, y, image.width(), image.height())?;
        for op in ops {
            match op {
                DrawOp::Point { x: px, y: py } => {
                    self.session
                        .command(&format!("sketch -c point {} {}", x + px, y + py))?;
                }
                DrawOp::HLine { x1, x2, y: row } => {
                    self.session.command(&format!(
                        "sketch -c line {} {} {} {}",
                        x + x1,
                        y + row,
                        x + x2,
                        y + row
                    ))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::ScriptHarness;
    use std::io::Write;

    fn open_display(harness: &ScriptHarness, profile: DisplayProfile, icon_dir: PathBuf) -> SketchDisplay {
        harness.push_prompt_script();
        let session = harness.session(Duration::from_millis(100));
        let icons = IconTable::from_json(r#"{ "801": { "altid": "30" } }"#).unwrap();
        let mut display = SketchDisplay::new(session, profile, icons, icon_dir);
        display.open("sb.local").unwrap();
        display
    }

    #[test]
    fn test_show_text_full_config() {
        let harness = ScriptHarness::new();
        let mut display = open_display(&harness, DisplayProfile::Compact, PathBuf::new());

        display
            .show_text(TextConfig {
                x: 34,
                y: 0,
                text: Some("54\u{b0}F".to_string()),
                font: Some(10),
                clear: true,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(
            harness.lines()[1..],
            [
                "sketch -c font 10",
                "sketch -c clear",
                "sketch -c text 34 0 \"54\u{b0}F\"",
            ]
        );
    }

    #[test]
    fn test_show_text_font_only_configures() {
        let harness = ScriptHarness::new();
        let mut display = open_display(&harness, DisplayProfile::Compact, PathBuf::new());

        display
            .show_text(TextConfig {
                font: Some(3),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(harness.lines()[1..], ["sketch -c font 3"], "no text command without text");
    }

    #[test]
    fn test_show_text_encoding_only_configures() {
        let harness = ScriptHarness::new();
        let mut display = open_display(&harness, DisplayProfile::Compact, PathBuf::new());

        display
            .show_text(TextConfig {
                encoding: Some("utf8".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(harness.lines()[1..], ["sketch -c encoding utf8"]);
    }

    #[test]
    fn test_show_text_defaults_draw_at_origin() {
        let harness = ScriptHarness::new();
        let mut display = open_display(&harness, DisplayProfile::Compact, PathBuf::new());

        display
            .show_text(TextConfig {
                text: Some("hi".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(harness.lines()[1..], ["sketch -c text 0 0 \"hi\""]);
    }

    #[test]
    fn test_draw_icon_emits_bounded_ops() {
        let dir = tempfile::tempdir().unwrap();
        // Compact profile selects the small icon set.
        let mut file = std::fs::File::create(dir.path().join("s-30.pbm")).unwrap();
        file.write_all(b"P1\n4 2\n1 1 0 1\n0 0 0 0\n").unwrap();

        let harness = ScriptHarness::new();
        let mut display =
            open_display(&harness, DisplayProfile::Compact, dir.path().to_path_buf());

        display.draw_icon("801", 10, 4).unwrap();

        assert_eq!(
            harness.lines()[1..],
            [
                "sketch -c color 0",
                "sketch -c rect 10 4 4 2",
                "sketch -c color 1",
                "sketch -c line 10 4 12 4",
                "sketch -c point 13 4",
            ]
        );
    }

    #[test]
    fn test_draw_icon_unknown_code_uses_fallback_resource() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("s-3200.pbm")).unwrap();
        file.write_all(b"P1\n1 1\n1\n").unwrap();

        let harness = ScriptHarness::new();
        let mut display =
            open_display(&harness, DisplayProfile::Compact, dir.path().to_path_buf());

        display.draw_icon("999", 0, 0).unwrap();
        assert!(harness.lines().contains(&"sketch -c point 0 0".to_string()));
    }

    #[test]
    fn test_draw_icon_missing_resource_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let harness = ScriptHarness::new();
        let mut display =
            open_display(&harness, DisplayProfile::Compact, dir.path().to_path_buf());

        let err = display.draw_icon("801", 0, 0).unwrap_err();
        assert!(matches!(err, SketchError::Resource { .. }), "got {err:?}");
    }

    #[test]
    fn test_draw_icon_corrupt_resource_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("s-30.pbm")).unwrap();
        file.write_all(b"P1\n4 2\n1 1\n").unwrap(); // short pixel section

        let harness = ScriptHarness::new();
        let mut display =
            open_display(&harness, DisplayProfile::Compact, dir.path().to_path_buf());

        let err = display.draw_icon("801", 0, 0).unwrap_err();
        assert!(matches!(err, SketchError::Bitmap(_)), "got {err:?}");
    }

    #[test]
    fn test_wide_profile_uses_unprefixed_icons() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("30.pbm")).unwrap();
        file.write_all(b"P1\n1 1\n1\n").unwrap();

        let harness = ScriptHarness::new();
        let mut display = open_display(&harness, DisplayProfile::Wide, dir.path().to_path_buf());

        display.draw_icon("801", 0, 0).unwrap();
        assert!(harness.lines().contains(&"sketch -c point 0 0".to_string()));
    }

    #[test]
    fn test_profile_from_str() {
        assert_eq!("compact".parse::<DisplayProfile>().unwrap(), DisplayProfile::Compact);
        assert_eq!("1".parse::<DisplayProfile>().unwrap(), DisplayProfile::Compact);
        assert_eq!("WIDE".parse::<DisplayProfile>().unwrap(), DisplayProfile::Wide);
        assert_eq!("r1000".parse::<DisplayProfile>().unwrap(), DisplayProfile::Wide);
        assert!("huge".parse::<DisplayProfile>().is_err());
    }
}
