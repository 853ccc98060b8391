//! Main entry point for sbsketch
//!
//! Parses the command line, wires the icon table and weather feed into the
//! display driver, and runs the appliance loop: connect, refresh weather,
//! rotate panels, and reconnect with a snooze after any failure. All retry
//! policy lives here; the session layer never retries on its own.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;

use sbsketch::display::{DisplayProfile, SketchDisplay, TextConfig};
use sbsketch::error::SketchError;
use sbsketch::icons::IconTable;
use sbsketch::panels;
use sbsketch::session::{InterceptOutcome, SketchSession};
use sbsketch::weather::{FileSource, WeatherReport, WeatherSource};

/// How long each panel stays up
const PANEL_DWELL: Duration = Duration::from_secs(10);

/// Pause before another connect attempt after a failure
const RECONNECT_SNOOZE: Duration = Duration::from_secs(30);

/// How often the weather feed is re-read
const WEATHER_REFRESH: Duration = Duration::from_secs(20 * 60);

struct Options {
    host: String,
    profile: DisplayProfile,
    icon_dir: PathBuf,
    icon_map: PathBuf,
    feed: PathBuf,
    reset: bool,
    verbose: bool,
}

fn main() {
    env_logger::init();

    let options = match parse_args() {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {message}");
            eprintln!("for help use --help");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(options) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = std::env::args().collect();

    let mut host: Option<String> = None;
    let mut profile = DisplayProfile::Compact;
    let mut icon_dir = PathBuf::from("pbm");
    let mut icon_map = PathBuf::from("ow_icons.json");
    let mut feed = PathBuf::from("weather.json");
    let mut reset = false;
    let mut verbose = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--profile" | "-t" => {
                let value = take_value(&args, &mut i, "--profile")?;
                profile = value.parse()?;
            }
            "--icons" => {
                icon_dir = PathBuf::from(take_value(&args, &mut i, "--icons")?);
            }
            "--icon-map" => {
                icon_map = PathBuf::from(take_value(&args, &mut i, "--icon-map")?);
            }
            "--weather" | "-w" => {
                feed = PathBuf::from(take_value(&args, &mut i, "--weather")?);
            }
            "--reset" | "-r" => {
                reset = true;
            }
            "--verbose" | "-v" => {
                verbose = true;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other if !other.starts_with('-') && host.is_none() => {
                host = Some(other.to_string());
            }
            other => {
                return Err(format!("unrecognized option '{other}'"));
            }
        }
        i += 1;
    }

    let host = host.ok_or_else(|| "display host name or IP required".to_string())?;
    Ok(Options {
        host,
        profile,
        icon_dir,
        icon_map,
        feed,
        reset,
        verbose,
    })
}

fn take_value(args: &[String], i: &mut usize, option: &str) -> Result<String, String> {
    if *i + 1 < args.len() {
        *i += 1;
        Ok(args[*i].clone())
    } else {
        Err(format!("{option} requires a value"))
    }
}

fn print_usage() {
    println!("sbsketch - weather panels for SoundBridge line displays");
    println!();
    println!("Usage: sbsketch [OPTIONS] HOST");
    println!();
    println!("Options:");
    println!("  --profile <compact|wide> or -t      Display panel variant (default: compact)");
    println!("                                      compact = M1000-class 280x16, wide = R1000-class 280x32");
    println!("  --icons <dir>                       Directory holding the PBM icon files (default: pbm)");
    println!("  --icon-map <path>                   Condition-code to icon mapping JSON (default: ow_icons.json)");
    println!("  --weather <path> or -w <path>       Weather feed JSON file (default: weather.json)");
    println!("  --reset or -r                       Reset the display, close the session, and exit");
    println!("  --verbose or -v                     Print weather and keypress details");
    println!("  --help or -h                        Show this help message");
    println!();
    println!("Example:");
    println!("  sbsketch --profile wide -w /var/lib/sbsketch/weather.json soundbridge.local");
}

fn run(options: Options) -> anyhow::Result<()> {
    if options.reset {
        let mut session = SketchSession::new();
        session
            .open(&options.host)
            .with_context(|| format!("cannot reach {}", options.host))?;
        session.close();
        println!("{} reset - exiting", options.host);
        return Ok(());
    }

    let icons = IconTable::load(&options.icon_map).context("loading icon table")?;
    if options.verbose {
        println!("Icon table: {} conditions mapped", icons.len());
    }
    let source = FileSource::new(options.feed.clone());

    let mut display = SketchDisplay::new(
        SketchSession::new(),
        options.profile,
        icons,
        options.icon_dir.clone(),
    );

    let mut report: Option<WeatherReport> = None;
    let mut last_fetch: Option<Instant> = None;

    loop {
        if !display.is_connected() {
            let attempt = if display.host().is_some() {
                display.reopen()
            } else {
                display.open(&options.host)
            };
            if let Err(err) = attempt {
                eprintln!("{}: {err}", options.host);
                thread::sleep(RECONNECT_SNOOZE);
                continue;
            }
        }

        if last_fetch.map_or(true, |at| at.elapsed() >= WEATHER_REFRESH) {
            match refresh_weather(&mut display, &source, options.verbose) {
                Ok(new_report) => {
                    report = Some(new_report);
                    last_fetch = Some(Instant::now());
                }
                Err(SketchError::Session(err)) => {
                    eprintln!("session: {err}");
                    display.close();
                    thread::sleep(RECONNECT_SNOOZE);
                    continue;
                }
                Err(err) => {
                    eprintln!("weather feed: {err}");
                    if report.is_none() {
                        // Nothing to show yet; wait for the feed to appear.
                        thread::sleep(RECONNECT_SNOOZE);
                        continue;
                    }
                    last_fetch = Some(Instant::now());
                }
            }
        }

        let Some(current) = report.as_ref() else {
            continue;
        };

        let mut session_lost = false;
        for panel in panels::ROTATION {
            match panel(&mut display, current) {
                Ok(true) => {
                    // Dwell on the panel; a remote keypress skips ahead and
                    // is handed back to the device.
                    match display.intercept(PANEL_DWELL) {
                        Ok(InterceptOutcome::Key(code)) => {
                            if options.verbose {
                                println!("keypress {code}, advancing");
                            }
                        }
                        Ok(InterceptOutcome::TimedOut) => {}
                        Err(err) => {
                            eprintln!("session: {err}");
                            session_lost = true;
                            break;
                        }
                    }
                }
                Ok(false) => {}
                Err(SketchError::Session(err)) => {
                    eprintln!("session: {err}");
                    session_lost = true;
                    break;
                }
                // A missing or corrupt icon is a broken installation, not
                // something a reconnect will cure.
                Err(err) => return Err(err.into()),
            }
        }

        if session_lost {
            display.close();
            thread::sleep(RECONNECT_SNOOZE);
        }
    }
}

/// Announce the refresh on the display, then re-read the feed
fn refresh_weather(
    display: &mut SketchDisplay,
    source: &FileSource,
    verbose: bool,
) -> Result<WeatherReport, SketchError> {
    display.show_text(TextConfig {
        text: Some("Updating weather...".to_string()),
        font: Some(1),
        x: 25,
        y: display.profile().status_row(),
        clear: true,
        ..Default::default()
    })?;

    let report = source.fetch()?;
    if verbose {
        println!(
            "Current conditions ({}): {}\u{b0}F {}, wind {} at {}mph, humidity {}%",
            report.code,
            report.temperature,
            report.condition,
            report.wind_compass(),
            report.wind_speed,
            report.humidity
        );
        println!("Sunrise {}, sunset {}", report.sunrise, report.sunset);
    }
    Ok(report)
}
