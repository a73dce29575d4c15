use clap::{Parser, Subcommand};
use site_maint::adapters::NamecheapClient;
use site_maint::config::credentials::NamecheapCredentials;
use site_maint::config::{exit_with, GlobalArgs};
use site_maint::core::{dns, wix};
use site_maint::domain::model::DnsRecord;
use site_maint::utils::prompt;
use site_maint::{SiteConfig, SiteError};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "dns-tool")]
#[command(about = "Export DNS records from Wix and migrate them to Route53 or Namecheap")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a saved Wix Domains dashboard page into hostname,value,ttl CSV
    ParseWix {
        #[arg(default_value = "assets/raw/wix_agroverse_Domains.htm")]
        input: PathBuf,
        /// Defaults to [dns].records_csv
        output: Option<PathBuf>,
    },
    /// Convert a JSON DNS export into hostname,value,ttl CSV
    JsonToCsv {
        input: PathBuf,
        /// Defaults to the input path with a .csv extension
        output: Option<PathBuf>,
    },
    /// List Route53 hosted zones
    #[cfg(feature = "route53")]
    ListZones {
        /// Also show up to 20 records per zone
        #[arg(short, long)]
        records: bool,
    },
    /// Upsert the CSV records into the Route53 hosted zone
    #[cfg(feature = "route53")]
    MigrateRoute53 {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Replace the Namecheap host records with the CSV records
    MigrateNamecheap {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// List domains in the Namecheap account
    NamecheapDomains,
    /// Show Namecheap host records for a domain
    NamecheapHosts {
        /// Defaults to [dns].domain
        domain: Option<String>,
    },
}

fn resolve(config: &SiteConfig, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        config.site_path(path)
    }
}

fn print_records(records: &[DnsRecord]) {
    println!("\n📋 All records:");
    for (i, record) in records.iter().enumerate() {
        let ttl = record
            .ttl
            .map(|t| t.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        println!(
            "  {:2}. {:40} → {:50} (TTL: {})",
            i + 1,
            record.hostname,
            record.value,
            ttl
        );
    }
}

fn load_csv(config: &SiteConfig) -> site_maint::Result<Vec<DnsRecord>> {
    let path = config.site_path(&config.dns.records_csv);
    if !path.is_file() {
        return Err(SiteError::ConfigValidationError {
            field: "dns.records_csv".to_string(),
            message: format!("{} not found, run `dns-tool parse-wix` first", path.display()),
        });
    }
    let records = dns::read_records_csv(&path, config.dns.default_ttl)?;
    if records.is_empty() {
        return Err(SiteError::ProcessingError {
            message: format!("No DNS records found in {}", path.display()),
        });
    }
    println!("📋 Found {} DNS records to migrate", records.len());
    Ok(records)
}

fn parse_wix(config: &SiteConfig, input: &Path, output: Option<&Path>) -> site_maint::Result<()> {
    let input = resolve(config, input);
    let output = resolve(config, output.unwrap_or(config.dns.records_csv.as_path()));
    println!("Parsing {}...", input.display());

    let html = std::fs::read_to_string(&input)?;
    let records = wix::parse_wix_dns(&html)?;
    if records.is_empty() {
        tracing::warn!("⚠️ No DNS records found.");
        return Ok(());
    }

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    dns::write_records_csv(&output, &records)?;
    println!("\n✅ Extracted {} unique DNS records", records.len());
    println!("📄 Output written to: {}", output.display());
    print_records(&records);
    Ok(())
}

fn json_to_csv(config: &SiteConfig, input: &Path, output: Option<&Path>) -> site_maint::Result<()> {
    let input = resolve(config, input);
    let output = match output {
        Some(path) => resolve(config, path),
        None => input.with_extension("csv"),
    };

    let content = std::fs::read_to_string(&input)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    let records = dns::records_from_json(&value);
    if records.is_empty() {
        tracing::warn!("⚠️ No DNS records found in {}", input.display());
        return Ok(());
    }

    dns::write_records_csv(&output, &records)?;
    println!("✅ Converted {} DNS records to {}", records.len(), output.display());
    Ok(())
}

#[cfg(feature = "route53")]
async fn list_zones(show_records: bool) -> site_maint::Result<()> {
    use site_maint::adapters::Route53Client;

    let client = Route53Client::from_env().await;
    println!("📋 Fetching Route53 hosted zones...\n");
    let zones = client.list_zones(show_records).await?;

    if zones.is_empty() {
        println!("ℹ️  No hosted zones found in this AWS account");
        println!("To create a hosted zone:");
        println!("  aws route53 create-hosted-zone --name yourdomain.com --caller-reference $(date +%s)");
        return Ok(());
    }

    println!("✅ Found {} hosted zone(s)\n", zones.len());
    for (i, zone) in zones.iter().enumerate() {
        println!("{}. Zone: {}", i + 1, zone.name);
        println!("   Zone ID: {}", zone.id);
        println!("   Record Count: {}", zone.record_count);
        println!("   Private Zone: {}", zone.private);
        if !zone.name_servers.is_empty() {
            println!("   Name Servers:");
            for ns in &zone.name_servers {
                println!("     - {}", ns);
            }
        }
        if !zone.records.is_empty() {
            println!("\n   DNS Records:");
            for (j, record) in zone.records.iter().enumerate() {
                println!(
                    "      {:2}. {:40} {:5} → {:50} (TTL: {})",
                    j + 1,
                    record.name,
                    record.record_type,
                    record.values,
                    record.ttl
                );
            }
            if zone.total_records > zone.records.len() {
                println!("      ... and {} more records", zone.total_records - zone.records.len());
            }
        }
        println!("{}", "-".repeat(70));
    }
    println!("✅ Total: {} hosted zone(s)", zones.len());
    Ok(())
}

#[cfg(feature = "route53")]
async fn migrate_route53(config: &SiteConfig, yes: bool, dry_run: bool) -> site_maint::Result<()> {
    use site_maint::adapters::Route53Client;

    let records = load_csv(config)?;
    let plan = dns::plan_route53(&records, config.dns.default_ttl);

    println!("\n📝 {} record set(s) for {}:", plan.len(), config.dns.domain);
    for set in &plan {
        println!(
            "   {:40} {:5} → {} (TTL: {})",
            set.display_name(),
            set.record_type,
            set.value_summary(),
            set.ttl
        );
    }
    if dry_run {
        println!("\n🔍 Dry run, nothing sent to Route53");
        return Ok(());
    }
    if !yes {
        prompt::confirm_stdin(&format!(
            "\n⚠️  This will create/update DNS records in Route53 for {}. Continue?",
            config.dns.domain
        ))?;
    }

    let client = Route53Client::from_env().await;
    let zone_id = client.find_zone_id(&config.dns.domain).await?;
    println!("✅ Found hosted zone: {}", zone_id);

    let outcome = client.apply_plan(&zone_id, &plan).await?;
    println!("\n📊 Migration Summary:");
    println!("   ✅ Success: {} record sets", outcome.succeeded);
    println!("   ❌ Failed: {} record sets", outcome.failed);

    if outcome.succeeded == 0 {
        return Err(SiteError::provider("Route53", "No record sets were applied"));
    }
    Ok(())
}

fn namecheap_client(config: &SiteConfig) -> site_maint::Result<NamecheapClient> {
    let creds = NamecheapCredentials::from_env()?;
    tracing::debug!("Namecheap credentials: {:?}", creds);
    Ok(NamecheapClient::with_endpoint(creds, &config.dns.namecheap_endpoint))
}

async fn migrate_namecheap(config: &SiteConfig, yes: bool, dry_run: bool) -> site_maint::Result<()> {
    let client = namecheap_client(config)?;
    let records = load_csv(config)?;
    let domain = &config.dns.domain;

    println!("\n📡 Migrating DNS records to Namecheap for {}...", domain);
    println!("1️⃣  Fetching existing DNS records...");
    match client.get_hosts(domain).await {
        Ok(existing) => println!("   ✅ Retrieved {} existing records", existing.len()),
        Err(e) => {
            tracing::warn!("   ⚠️ Could not fetch existing records: {}", e);
            println!("   Continuing with new records only...");
        }
    }

    println!("\n2️⃣  Preparing records for migration...");
    let hosts = dns::plan_namecheap(&records, domain, config.dns.default_ttl);
    for (i, host) in hosts.iter().enumerate() {
        println!(
            "   {:2}. {:30} {:5} → {}",
            i + 1,
            host.host_name,
            host.record_type,
            host.address
        );
    }
    if dry_run {
        println!("\n🔍 Dry run, nothing sent to Namecheap");
        return Ok(());
    }
    if !yes {
        prompt::confirm_stdin(&format!(
            "\n⚠️  This will overwrite existing DNS records for {}. Continue?",
            domain
        ))?;
    }

    println!("\n3️⃣  Setting DNS records via Namecheap API...");
    client.set_hosts(domain, &hosts).await?;
    println!("\n✅ DNS migration completed successfully!");
    println!("   Verify the records in the Namecheap dashboard; propagation can take up to 48 hours.");
    Ok(())
}

async fn namecheap_domains(config: &SiteConfig) -> site_maint::Result<()> {
    let client = namecheap_client(config)?;
    let domains = client.list_domains().await?;
    println!("✅ Found {} domain(s)\n", domains.len());
    for (i, domain) in domains.iter().enumerate() {
        println!(
            "{:2}. {:30} expires {}{}",
            i + 1,
            domain.name,
            domain.expires,
            if domain.is_expired { " (EXPIRED)" } else { "" }
        );
    }
    Ok(())
}

async fn namecheap_hosts(config: &SiteConfig, domain: Option<String>) -> site_maint::Result<()> {
    let client = namecheap_client(config)?;
    let domain = domain.unwrap_or_else(|| config.dns.domain.clone());
    let hosts = client.get_hosts(&domain).await?;
    println!("📋 {} record(s) for {}", hosts.len(), domain);
    for host in &hosts {
        let name = if host.name == "@" { domain.as_str() } else { host.name.as_str() };
        let pref = if host.record_type == "MX" {
            format!(" (pref {})", host.mx_pref)
        } else {
            String::new()
        };
        println!(
            "   {:30} {:5} → {}{} (TTL: {})",
            name, host.record_type, host.address, pref, host.ttl
        );
    }
    Ok(())
}

async fn run(command: Command, config: SiteConfig, dry_run: bool) -> site_maint::Result<()> {
    match command {
        Command::ParseWix { input, output } => parse_wix(&config, &input, output.as_deref()),
        Command::JsonToCsv { input, output } => json_to_csv(&config, &input, output.as_deref()),
        #[cfg(feature = "route53")]
        Command::ListZones { records } => list_zones(records).await,
        #[cfg(feature = "route53")]
        Command::MigrateRoute53 { yes } => migrate_route53(&config, yes, dry_run).await,
        Command::MigrateNamecheap { yes } => migrate_namecheap(&config, yes, dry_run).await,
        Command::NamecheapDomains => namecheap_domains(&config).await,
        Command::NamecheapHosts { domain } => namecheap_hosts(&config, domain).await,
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

    if let Err(e) = run(cli.command, config, cli.global.dry_run).await {
        exit_with(&e);
    }
    Ok(())
}
