use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use climate_core::{
    BackendClient, Config, Dashboard, FormFields,
    display::SlotSnapshot,
    form,
    server,
};
use inquire::{Select, Text};
use std::{fs, path::PathBuf, sync::Arc};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "climate", version, about = "Climate, wildfire and oil slick dashboard")]
pub struct Cli {
    /// Backend base URL; overrides the config file.
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Also write the whole dashboard page to this file.
    #[arg(long, global = true)]
    pub page: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 16-day temperature forecast for a location.
    Forecast {
        #[arg(long, allow_hyphen_values = true)]
        latitude: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        longitude: Option<String>,
    },

    /// Recent satellite fire detections for a country.
    Fires {
        /// ISO 3166 alpha-3 country code (default USA).
        #[arg(long)]
        country: Option<String>,

        /// FIRMS data source (default VIIRS_SNPP_NRT).
        #[arg(long)]
        source: Option<String>,

        /// Number of days to look back (default 10).
        #[arg(long)]
        day_range: Option<String>,

        /// How many detections to show.
        #[arg(long)]
        display_number: Option<String>,
    },

    /// Oil slick detections inside a bounding box.
    Slicks {
        /// "xmin,ymin,xmax,ymax"
        #[arg(long, allow_hyphen_values = true)]
        bbox: Option<String>,

        /// e.g. 2024-09-01T00:00:00Z
        #[arg(long)]
        start_date: Option<String>,

        #[arg(long)]
        end_date: Option<String>,

        #[arg(long)]
        min_confidence: Option<String>,

        #[arg(long)]
        limit: Option<String>,
    },

    /// Run the backend that proxies the public APIs.
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// Edit the config file interactively.
    Configure,
}

impl Cli {
    pub async fn run(self, mut config: Config) -> Result<()> {
        if let Some(url) = self.backend {
            config.backend.base_url = url;
        }

        let (form, region) = match self.command {
            Command::Configure => return configure(config),
            Command::Serve { host, port } => {
                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }
                return server::serve(&config.server).await;
            }
            Command::Forecast { latitude, longitude } => {
                let mut form = FormFields::new();
                form.set_opt(form::LATITUDE, latitude);
                form.set_opt(form::LONGITUDE, longitude);
                (form, Region::Climate)
            }
            Command::Fires {
                country,
                source,
                day_range,
                display_number,
            } => {
                let mut form = FormFields::new();
                form.set_opt(form::COUNTRY, country);
                form.set_opt(form::SOURCE, source);
                form.set_opt(form::DAY_RANGE, day_range);
                form.set_opt(form::DISPLAY_NUMBER, display_number);
                (form, Region::Fire)
            }
            Command::Slicks {
                bbox,
                start_date,
                end_date,
                min_confidence,
                limit,
            } => {
                let mut form = FormFields::new();
                form.set_opt(form::BBOX, bbox);
                form.set_opt(form::START_DATE, start_date);
                form.set_opt(form::END_DATE, end_date);
                form.set_opt(form::MIN_CONFIDENCE, min_confidence);
                form.set_opt(form::LIMIT, limit);
                (form, Region::Slick)
            }
        };

        let client = BackendClient::from_config(&config.backend)?;
        let dashboard = Dashboard::new(Arc::new(client));

        let shown = region.fetch(&dashboard, &form).await;
        println!("{}", shown.html);

        if let Some(path) = self.page {
            fs::write(&path, dashboard.page().await)
                .with_context(|| format!("Failed to write page: {}", path.display()))?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Region {
    Climate,
    Fire,
    Slick,
}

impl Region {
    async fn fetch(self, dashboard: &Dashboard, form: &FormFields) -> SlotSnapshot {
        match self {
            Region::Climate => {
                dashboard.fetch_climate(form).await;
                dashboard.climate_region().await
            }
            Region::Fire => {
                dashboard.fetch_fires(form).await;
                dashboard.fire_region().await
            }
            Region::Slick => {
                dashboard.fetch_slicks(form).await;
                dashboard.slick_region().await
            }
        }
    }
}

fn configure(mut config: Config) -> Result<()> {
    config.backend.base_url = Text::new("Backend URL:")
        .with_default(&config.backend.base_url)
        .prompt()?;

    let key = Text::new("NASA FIRMS map key (used by `climate serve`):")
        .with_default(config.server.firms_map_key.as_deref().unwrap_or(""))
        .prompt()?;
    config.server.firms_map_key = Some(key.trim().to_string()).filter(|k| !k.is_empty());

    let levels = vec!["error", "warn", "info", "debug", "trace"];
    let start = levels
        .iter()
        .position(|l| *l == config.logging.level)
        .unwrap_or(2);
    config.logging.level = Select::new("Log level:", levels)
        .with_starting_cursor(start)
        .prompt()?
        .to_string();

    config.validate()?;
    let path = config.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}
