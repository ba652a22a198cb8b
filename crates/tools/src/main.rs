use std::env;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use catalog::{BoundaryProvider, GeoJsonBoundaryProvider, StaticBoundaryProvider, validate_unique_ids};
use clap::{Parser, Subcommand};
use engine::{Container, HeadlessEngine, MapEvent};
use formats::feature_collection;
use foundation::{Boundary, LonLat};
use layers::BOUNDARIES_FILL_LAYER_ID;
use map_widget::config::DEFAULT_INFO_ENDPOINT;
use map_widget::{Interaction, MapWidget, WidgetConfig};
use runtime::{Event, EventLog};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod http;

use http::{ReqwestInfoClient, TokioSpawner};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect boundary data and exercise the boundary map headlessly")]
struct Args {
    /// Map access token (default: $MAPBOX_ACCESS_TOKEN)
    #[arg(long, global = true)]
    access_token: Option<String>,

    /// Boundary info endpoint (default: $BOUNDARY_INFO_URL)
    #[arg(long, global = true)]
    info_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the boundary set as a GeoJSON FeatureCollection
    Export {
        /// GeoJSON file to read instead of the built-in sample set
        #[arg(long)]
        boundaries: Option<PathBuf>,

        #[arg(long)]
        pretty: bool,
    },

    /// Load boundaries, check them and print one line per boundary
    Validate {
        #[arg(long)]
        boundaries: Option<PathBuf>,
    },

    /// Mount the widget on the headless engine and click at a coordinate
    Click {
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long)]
        boundaries: Option<PathBuf>,

        /// Viewport width in pixels
        #[arg(long, default_value_t = 800)]
        width: u32,

        /// Viewport height in pixels
        #[arg(long, default_value_t = 500)]
        height: u32,

        /// Give up waiting for the lookup after this many seconds
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();
    let access_token = args
        .access_token
        .unwrap_or_else(|| env::var("MAPBOX_ACCESS_TOKEN").unwrap_or_default());
    let info_url = args.info_url.unwrap_or_else(|| {
        env::var("BOUNDARY_INFO_URL").unwrap_or_else(|_| DEFAULT_INFO_ENDPOINT.to_string())
    });

    match args.command {
        Command::Export { boundaries, pretty } => cmd_export(boundaries.as_deref(), pretty),
        Command::Validate { boundaries } => cmd_validate(boundaries.as_deref()),
        Command::Click {
            lon,
            lat,
            boundaries,
            width,
            height,
            timeout_secs,
        } => {
            let mut config = WidgetConfig::new(access_token);
            config.info_endpoint = info_url;
            config.height_px = height;
            let click = ClickRequest {
                at: LonLat::new(lon, lat),
                width,
                height,
                timeout: Duration::from_secs(timeout_secs),
            };
            cmd_click(config, boundaries.as_deref(), click)
        }
    }
}

fn load_provider(path: Option<&Path>) -> Result<Box<dyn BoundaryProvider>, String> {
    match path {
        Some(p) => {
            let provider = GeoJsonBoundaryProvider::from_path(p)
                .map_err(|e| format!("{}: {e}", p.display()))?;
            Ok(Box::new(provider))
        }
        None => Ok(Box::new(StaticBoundaryProvider::new())),
    }
}

fn load_boundaries(path: Option<&Path>) -> Result<Vec<Boundary>, String> {
    let boundaries = load_provider(path)?
        .list_boundaries()
        .map_err(|e| e.to_string())?;
    validate_unique_ids(&boundaries).map_err(|e| e.to_string())?;
    Ok(boundaries)
}

fn cmd_export(path: Option<&Path>, pretty: bool) -> Result<(), String> {
    let fc = feature_collection(&load_boundaries(path)?);
    let out = if pretty {
        fc.to_geojson_string_pretty()
    } else {
        fc.to_geojson_string()
    }
    .map_err(|e| e.to_string())?;
    println!("{out}");
    Ok(())
}

fn cmd_validate(path: Option<&Path>) -> Result<(), String> {
    let boundaries = load_boundaries(path)?;
    for b in &boundaries {
        println!("{}", summary_line(b));
    }
    println!("{} boundaries ok", boundaries.len());
    Ok(())
}

fn summary_line(b: &Boundary) -> String {
    let bb = b.geometry().bounds();
    format!(
        "{:<8} {:<24} points={:<3} bbox=[{:.4}, {:.4}, {:.4}, {:.4}]",
        b.id().as_str(),
        b.name(),
        b.geometry().exterior().len(),
        bb.min.lon_deg,
        bb.min.lat_deg,
        bb.max.lon_deg,
        bb.max.lat_deg
    )
}

struct ClickRequest {
    at: LonLat,
    width: u32,
    height: u32,
    timeout: Duration,
}

fn cmd_click(config: WidgetConfig, path: Option<&Path>, click: ClickRequest) -> Result<(), String> {
    if !click.at.is_finite() || !click.at.in_range() {
        return Err(format!(
            "coordinate out of range: {}, {}",
            click.at.lon_deg, click.at.lat_deg
        ));
    }
    let at = click.at;
    let provider = load_provider(path)?;
    let log = EventLog::new();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| e.to_string())?;
    let local = tokio::task::LocalSet::new();

    let outcome = local.block_on(&rt, {
        let log = log.clone();
        async move {
            let mut widget = MapWidget::new(
                config,
                HeadlessEngine::new(),
                provider,
                Rc::new(ReqwestInfoClient::new()),
                TokioSpawner,
                log,
            );
            let container = Container::new("boundary-map", click.width, click.height);
            widget.mount(Some(&container)).map_err(|e| e.to_string())?;
            widget.dispatch(MapEvent::Ready).map_err(|e| e.to_string())?;

            let point = widget
                .handle()
                .map(|m| m.project(click.at))
                .ok_or_else(|| "map is not mounted".to_string())?;
            info!(x = point.x, y = point.y, "clicking");
            let outcome = widget
                .dispatch(MapEvent::click(BOUNDARIES_FILL_LAYER_ID, point))
                .map_err(|e| e.to_string())?;

            let deadline = tokio::time::Instant::now() + click.timeout;
            while widget.pending_lookups() > 0 && tokio::time::Instant::now() < deadline {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            if widget.pending_lookups() > 0 {
                warn!(timeout = ?click.timeout, "lookup still pending, cancelling");
            }
            widget.unmount();
            Ok::<_, String>(outcome)
        }
    })?;

    match outcome {
        Some(Interaction::Selected(id)) => println!("selected {id}"),
        _ => println!("no boundary at {}, {}", at.lon_deg, at.lat_deg),
    }
    for event in log.events() {
        println!("{}", format_event(&event));
    }
    Ok(())
}

fn format_event(e: &Event) -> String {
    format!(
        "{:>3} {:<5} {:<18} {}",
        e.seq,
        e.level.as_str(),
        e.kind,
        e.message
    )
}

#[cfg(test)]
mod tests {
    use super::{Args, Command, format_event, load_boundaries, summary_line};
    use clap::Parser;
    use runtime::{Event, Level};

    #[test]
    fn click_accepts_negative_coordinates() {
        let args = Args::try_parse_from([
            "boundary-map",
            "click",
            "--lon",
            "-123.0",
            "--lat",
            "49.17",
        ])
        .unwrap();
        match args.command {
            Command::Click {
                lon, lat, width, ..
            } => {
                assert_eq!(lon, -123.0);
                assert_eq!(lat, 49.17);
                assert_eq!(width, 800);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_options_follow_the_subcommand() {
        let args =
            Args::try_parse_from(["boundary-map", "validate", "--info-url", "http://x"]).unwrap();
        assert_eq!(args.info_url.as_deref(), Some("http://x"));
        assert!(args.access_token.is_none());
    }

    #[test]
    fn sample_summary_lists_every_boundary() {
        let boundaries = load_boundaries(None).unwrap();
        assert_eq!(boundaries.len(), 6);
        let line = summary_line(&boundaries[0]);
        assert!(line.starts_with("b1"));
        assert!(line.contains("points=5"));
        assert!(line.contains("bbox=[-123.0000, 49.2000, -122.9000, 49.3000]"));
    }

    #[test]
    fn events_render_on_one_line() {
        let e = Event {
            seq: 3,
            level: Level::Error,
            kind: "lookup.failed",
            message: "req-0 boom".to_string(),
        };
        let line = format_event(&e);
        assert!(line.starts_with("  3 error lookup.failed"));
        assert!(line.ends_with("req-0 boom"));
    }
}
