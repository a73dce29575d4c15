use clap::{Parser, Subcommand};
use site_maint::adapters::{GooglePlaces, Nominatim};
use site_maint::app::geo;
use site_maint::config::credentials;
use site_maint::config::{exit_with, GlobalArgs};
use site_maint::domain::model::{PartnerLocation, PartnerQuery};
use site_maint::{Geocoder, SiteConfig};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "partner-geo")]
#[command(about = "Look up coordinates and street addresses for partner locations")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Geocode partner_locations.json into partner_coordinates.json (Google Places)
    Geocode {
        #[arg(short, long, default_value = "partner_locations.json")]
        input: PathBuf,
        #[arg(short, long, default_value = "partner_coordinates.json")]
        output: PathBuf,
    },
    /// Search street addresses for a partner list (Google, then Nominatim)
    FindAddresses {
        input: PathBuf,
        #[arg(short, long, default_value = "partner_addresses.json")]
        output: PathBuf,
        /// Log phone and website from Google Place Details
        #[arg(long)]
        details: bool,
    },
}

fn resolve(config: &SiteConfig, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        config.site_path(path)
    }
}

async fn geocode(config: &SiteConfig, input: &Path, output: &Path) -> site_maint::Result<()> {
    let api_key = credentials::require_google_api_key()?;
    let google = GooglePlaces::new(&config.geocoding.google_base_url, api_key);

    let input = resolve(config, input);
    let partners: BTreeMap<String, PartnerLocation> = geo::read_json(&input)?;
    println!("Geocoding {} partners from {}", partners.len(), input.display());

    let delay = Duration::from_millis(config.geocoding.request_delay_ms);
    let coordinates = geo::geocode_partners(&partners, &google, delay).await;

    let output = resolve(config, output);
    geo::write_json(&output, &coordinates)?;
    println!("\n✅ Coordinates saved to {}", output.display());
    println!(
        "Successfully geocoded: {}/{} partners",
        geo::resolved_count(&coordinates),
        partners.len()
    );
    Ok(())
}

async fn log_details(google: &GooglePlaces, results: &BTreeMap<String, Option<geo::AddressMatch>>) {
    for (name, found) in results {
        let Some(found) = found else { continue };
        if found.source != google.source() {
            continue;
        }
        let Some(place_id) = &found.place_id else { continue };

        match google.details(place_id).await {
            Ok(details) => {
                tracing::info!("📇 {}", name);
                if let Some(phone) = &details.formatted_phone_number {
                    tracing::info!("   Phone: {}", phone);
                }
                if let Some(website) = &details.website {
                    tracing::info!("   Website: {}", website);
                }
            }
            Err(e) => tracing::warn!("⚠️ Details lookup failed for {}: {}", name, e),
        }
    }
}

async fn find_addresses(
    config: &SiteConfig,
    input: &Path,
    output: &Path,
    details: bool,
) -> site_maint::Result<()> {
    let input = resolve(config, input);
    let partners: Vec<PartnerQuery> = geo::read_json(&input)?;

    let google = credentials::google_api_key()
        .map(|key| GooglePlaces::new(&config.geocoding.google_base_url, key));
    if google.is_none() {
        tracing::warn!("⚠️ No Google API key found, using Nominatim only");
    }
    let nominatim = Nominatim::new(&config.geocoding.nominatim_base_url, &config.geocoding.user_agent);

    println!("Finding addresses for {} partners...\n", partners.len());
    let delay = Duration::from_millis(config.geocoding.request_delay_ms);
    let primary = google.as_ref().map(|g| g as &dyn Geocoder);
    let results = geo::find_addresses(&partners, primary, &nominatim, delay).await;

    if details {
        if let Some(google) = &google {
            log_details(google, &results).await;
        }
    }

    let found = results.values().filter(|r| r.is_some()).count();
    println!("\n📊 Summary: found {}/{}", found, results.len());
    for (name, result) in &results {
        match result {
            Some(m) => println!("  ✓ {}: {} ({})", name, m.formatted_address, m.source),
            None => println!("  ✗ {}: not found", name),
        }
    }

    let output = resolve(config, output);
    geo::write_json(&output, &geo::addresses_json(&results))?;
    println!("\n✅ Results saved to {}", output.display());
    Ok(())
}

async fn run(command: Command, config: SiteConfig) -> site_maint::Result<()> {
    match command {
        Command::Geocode { input, output } => geocode(&config, &input, &output).await,
        Command::FindAddresses {
            input,
            output,
            details,
        } => find_addresses(&config, &input, &output, details).await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.global.init_logging();

    let config = match cli.global.load_config() {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    if let Err(e) = run(cli.command, config).await {
        exit_with(&e);
    }
    Ok(())
}
