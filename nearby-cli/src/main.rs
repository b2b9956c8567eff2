mod commands;
mod overlay;

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use log::{error, info, warn};
use nearby_logic::{
    CachingGeocoder, ControllerSettings, Location, LocationController, Radius, RetryPolicy,
    SubmitOutcome,
};
use nearby_transport::{
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SECURE, GoogleGeocoder, HttpPersistence, ServerEndpoint,
    WebSocketFeed,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use commands::{Command, HELP};
use overlay::{LogOverlay, LogUpdates};

type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;

type Controller = LocationController<
    CachingGeocoder<GoogleGeocoder>,
    HttpPersistence,
    WebSocketFeed,
    LogOverlay,
    LogUpdates,
>;

#[derive(Parser)]
/// Register a location and watch what's nearby
struct Cli {
    /// Host of the location backend
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port of the location backend
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Use https/wss to talk to the backend
    #[arg(long)]
    secure: bool,

    /// Google Maps geocoding API key
    #[arg(long, env = "NEARBY_GOOGLE_API_KEY")]
    api_key: String,

    /// Initial search radius
    #[arg(long, default_value_t = 20.0)]
    radius: f64,

    /// Quiet period after a radius change before the feed restarts, in milliseconds
    #[arg(long, default_value_t = 1000)]
    debounce_ms: u64,

    /// Retry a dropped feed every second instead of backing off
    #[arg(long)]
    legacy_retry: bool,

    /// Stop reconnecting a dropped feed after this many failures
    #[arg(long)]
    max_retries: Option<u32>,
}

impl Cli {
    fn endpoint(&self) -> ServerEndpoint {
        ServerEndpoint {
            host: self.host.clone(),
            port: self.port,
            secure: self.secure || DEFAULT_SECURE,
        }
    }

    fn settings(&self) -> Result<ControllerSettings> {
        let defaults = ControllerSettings::default();
        Ok(ControllerSettings {
            initial_radius: Radius::new(self.radius).context("Invalid --radius")?,
            debounce: Duration::from_millis(self.debounce_ms),
            retry: if self.legacy_retry {
                RetryPolicy::LEGACY
            } else {
                defaults.retry
            },
            max_retries: self.max_retries,
            ..defaults
        })
    }
}

fn print_location(location: &Location) {
    match serde_json::to_string_pretty(location) {
        Ok(json) => println!("{json}"),
        Err(why) => error!("Couldn't format location: {why:?}"),
    }
    println!("Address: {}", location.address_summary());
}

async fn print_nearby(controller: &Controller) {
    let here = controller.snapshot().await.coordinates();
    let nearby = controller.nearby().await;

    if nearby.is_empty() {
        println!("Nothing nearby yet ({:?})", controller.stream_state().await);
        return;
    }

    for record in nearby {
        if let Some(here) = here {
            let km = here.distance_km(&record.coordinates());
            println!("{:<30} {km:>8.2} km", record.name);
        } else {
            println!("{}", record.name);
        }
    }
}

/// Run one console command, returns `true` when the operator wants to quit
async fn run_command(controller: &Arc<Controller>, cmd: Command) -> bool {
    match cmd {
        Command::Name(v) => controller.set_name(v).await,
        Command::Address(v) => controller.set_address(v).await,
        Command::City(v) => controller.set_city(v).await,
        Command::Region(v) => controller.set_region(v).await,
        Command::PostalCode(v) => controller.set_postal_code(v).await,
        Command::Submit => match controller.submit().await {
            Ok(SubmitOutcome::GeocodeFailed) => {
                warn!("Couldn't find that address, check the form and submit again")
            }
            Ok(SubmitOutcome::Created(id)) => info!("Saved new location {id}"),
            Ok(SubmitOutcome::Updated(id)) => info!("Updated location {id}"),
            Err(why) => error!("Submit failed: {why:?}"),
        },
        Command::Radius(r) => {
            if let Err(why) = controller.on_radius_changed(r).await {
                error!("{why}");
            }
        }
        Command::Observe => controller.enter_observing().await,
        Command::Edit => controller.enter_editing().await,
        Command::Show => print_location(&controller.snapshot().await),
        Command::Nearby => print_nearby(controller).await,
        Command::Help => println!("{HELP}"),
        Command::Quit => return true,
    }
    false
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    colog::init();

    let cli = Cli::parse();
    let endpoint = cli.endpoint();
    let settings = cli.settings()?;

    let geocoder = CachingGeocoder::new(
        GoogleGeocoder::new(cli.api_key.clone()).context("Failed to set up geocoder")?,
    );
    let persistence =
        HttpPersistence::new(endpoint.clone()).context("Failed to set up backend client")?;
    let feed = Arc::new(WebSocketFeed::new(endpoint.clone()));

    let controller = Controller::new(
        settings,
        geocoder,
        persistence,
        feed,
        LogOverlay,
        LogUpdates,
    );

    info!(
        "nearby {} using backend {}",
        env!("CARGO_PKG_VERSION"),
        endpoint.http_url("")
    );
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            Ok(_) = tokio::signal::ctrl_c() => None,
        };

        let Some(line) = line else {
            break;
        };

        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(cmd) => {
                if run_command(&controller, cmd).await {
                    break;
                }
            }
            Err(why) => warn!("{why}"),
        }
    }

    controller.shutdown().await;

    Ok(())
}
