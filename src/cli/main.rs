//! Command-line lookups and batch cleaning over the Gazetteer tables.
//!
//! Loads the reference store once, then runs a single lookup or a row-wise
//! batch operation over a CSV file.

mod config;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use usgeo::batch::Table;
use usgeo::geocode::NominatimGeocoder;
use usgeo::{GeoLookup, ReferenceStore};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "usgeo")]
#[command(about = "US ZIP / city / coordinate lookups over Census Gazetteer data")]
struct Args {
    /// TOML config with data paths and geocoder settings
    #[arg(long, default_value = "usgeo.toml")]
    config: PathBuf,

    /// Override the ZIP gazetteer path
    #[arg(long)]
    zip_file: Option<PathBuf>,

    /// Override the places gazetteer path
    #[arg(long)]
    city_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the record for a ZIP code
    Zip {
        zip: u32,

        /// Fall back to the remote geocoder on a local miss
        #[arg(long)]
        online: bool,
    },

    /// Record or coordinate for a place
    City {
        state: String,
        city: String,

        /// Fall back to the remote geocoder on a local miss
        #[arg(long)]
        online: bool,
    },

    /// Nearest ZIP and place to a coordinate
    Locate {
        #[arg(allow_negative_numbers = true)]
        lat: f64,

        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },

    /// Add state/city columns resolved from a ZIP column
    ZipToCity {
        input: PathBuf,
        output: PathBuf,

        /// Name of the ZIP column in the input
        #[arg(long, default_value = "zip")]
        zip_col: String,

        /// Fall back to the remote geocoder for unknown ZIPs
        #[arg(long)]
        online: bool,

        /// Discard rows resolved farther than this many miles; negative
        /// disables the filter
        #[arg(long, default_value_t = -1.0, allow_negative_numbers = true)]
        max_miles: f64,
    },

    /// Add a zip column resolved from state/city columns
    CityToZip {
        input: PathBuf,
        output: PathBuf,

        #[arg(long, default_value = "state")]
        state_col: String,

        #[arg(long, default_value = "city")]
        city_col: String,

        /// Fall back to the remote geocoder for unknown places
        #[arg(long)]
        online: bool,

        #[arg(long, default_value_t = -1.0, allow_negative_numbers = true)]
        max_miles: f64,
    },

    /// Validate a ZIP column, replacing or dropping unknown ZIPs
    CleanZips {
        input: PathBuf,
        output: PathBuf,

        #[arg(long, default_value = "zip")]
        zip_col: String,

        /// Replace unknown ZIPs with the nearest known one via the geocoder
        #[arg(long)]
        online: bool,

        #[arg(long, default_value_t = -1.0, allow_negative_numbers = true)]
        max_miles: f64,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = if args.config.exists() {
        Config::load_from_file(&args.config)?
    } else {
        Config::default()
    };
    if let Some(path) = args.zip_file {
        config.data.zip_file = path;
    }
    if let Some(path) = args.city_file {
        config.data.city_file = path;
    }

    let store = ReferenceStore::load(&config.data.zip_file, &config.data.city_file)
        .context("Failed to load gazetteer reference data")?;
    info!(
        "Reference store ready: {} ZIPs, {} places",
        store.zip_count(),
        store.city_count()
    );

    let geocoder = NominatimGeocoder::with_config(
        &config.geocoder.endpoint,
        &config.geocoder.user_agent,
        Duration::from_secs(config.geocoder.timeout_secs),
    )?;
    let lookup = GeoLookup::new(store, Box::new(geocoder));

    match args.command {
        Command::Zip { zip, online } => match lookup.zip_info(zip) {
            Ok(record) => println!("{}", serde_json::to_string_pretty(record)?),
            Err(usgeo::Error::NotFound) if online => {
                let point = lookup.zip_to_coord(zip, true)?;
                println!("{} {}", point.lat, point.lon);
            }
            Err(e) => return Err(e.into()),
        },

        Command::City {
            state,
            city,
            online,
        } => {
            if let Ok(record) = lookup.state_city_info(&state, &city) {
                println!("{}", serde_json::to_string_pretty(record)?);
            } else {
                let point = lookup.state_city_to_coord(&state, &city, online)?;
                println!("{} {}", point.lat, point.lon);
            }
        }

        Command::Locate { lat, lon } => {
            let zip = lookup.coord_to_zip(lat, lon)?;
            let place = lookup.coord_to_state_city(lat, lon)?;
            println!("zip   {} ({:.2} mi)", zip.key, zip.distance_mi);
            println!("place {} ({:.2} mi)", place.key, place.distance_mi);
        }

        Command::ZipToCity {
            input,
            output,
            zip_col,
            online,
            max_miles,
        } => {
            let table = read_table(&input)?;
            let pb = batch_spinner(table.len())?;
            let out = lookup.zip_to_state_city_table(&table, &zip_col, online, max_miles)?;
            finish_batch(&pb, &table, &out);
            write_table(&out, &output)?;
        }

        Command::CityToZip {
            input,
            output,
            state_col,
            city_col,
            online,
            max_miles,
        } => {
            let table = read_table(&input)?;
            let pb = batch_spinner(table.len())?;
            let out =
                lookup.state_city_to_zip_table(&table, &state_col, &city_col, online, max_miles)?;
            finish_batch(&pb, &table, &out);
            write_table(&out, &output)?;
        }

        Command::CleanZips {
            input,
            output,
            zip_col,
            online,
            max_miles,
        } => {
            let table = read_table(&input)?;
            let pb = batch_spinner(table.len())?;
            let out = lookup.clean_zips(&table, &zip_col, online, max_miles)?;
            finish_batch(&pb, &table, &out);
            write_table(&out, &output)?;
        }
    }

    Ok(())
}

fn read_table(path: &PathBuf) -> Result<Table> {
    Table::from_csv_path(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_table(table: &Table, path: &PathBuf) -> Result<()> {
    table
        .write_csv_path(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

fn batch_spinner(rows: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed_precise}]")?,
    );
    pb.set_message(format!("resolving {rows} rows..."));
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

fn finish_batch(pb: &ProgressBar, input: &Table, output: &Table) {
    pb.finish_with_message(format!(
        "{} of {} rows retained",
        output.len(),
        input.len()
    ));
}
