//! Library command handlers

use anyhow::{anyhow, bail, Context, Result};

use bookguide_core::{route_url, Config, Coordinates, LibraryDirectory, RoutePlatform};

use crate::output::{Output, OutputFormat};

/// Load the configured libraries file
fn load_directory(config: &Config) -> Result<LibraryDirectory> {
    let path = config.libraries_file.as_ref().ok_or_else(|| {
        anyhow!(
            "No libraries file configured.\n\
             Set one with: bookguide config set libraries_file <path>"
        )
    })?;
    LibraryDirectory::load(path).context("Failed to load libraries")
}

/// Search origin from flags, falling back to the configured home
fn origin(config: &Config, lat: Option<f64>, lon: Option<f64>) -> Result<Coordinates> {
    let (lat, lon) = match (lat, lon) {
        (Some(lat), Some(lon)) => (lat, lon),
        (None, None) => config.home().ok_or_else(|| {
            anyhow!(
                "No location given.\n\
                 Pass --lat and --lon, or set home_latitude and home_longitude."
            )
        })?,
        _ => bail!("--lat and --lon must be given together"),
    };
    Ok(Coordinates::new(lat, lon)?)
}

/// List libraries around a point, closest first
pub fn nearby(
    config: &Config,
    lat: Option<f64>,
    lon: Option<f64>,
    radius_km: Option<f64>,
    output: &Output,
) -> Result<()> {
    let origin = origin(config, lat, lon)?;
    let radius_km = radius_km.unwrap_or(config.search_radius_km);

    let found = load_directory(config)?.nearby(origin, radius_km)?;
    output.print_libraries(&found, radius_km);

    Ok(())
}

/// Print, and optionally open, directions to a library
pub fn route(
    config: &Config,
    id: String,
    platform: RoutePlatform,
    open_link: bool,
    output: &Output,
) -> Result<()> {
    let directory = load_directory(config)?;
    let library = directory
        .get(&id)
        .ok_or_else(|| anyhow!("Library not found: {}", id))?;
    let url = route_url(library, platform);

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({"id": library.id, "name": library.name, "url": url})
            );
        }
        OutputFormat::Quiet => println!("{}", url),
        OutputFormat::Human => {
            println!("{}", library.name);
            if !library.address.is_empty() {
                println!("{}", library.address);
            }
            println!();
            println!("{}", url);
        }
    }

    if open_link {
        open::that(&url).with_context(|| format!("Failed to open {}", url))?;
    }

    Ok(())
}
