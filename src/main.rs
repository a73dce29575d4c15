use clap::{Parser, Subcommand, ValueEnum};
use site_maint::app::patches::{
    AnalyticsPatch, BlogCardImagesPatch, BlogLinkPatch, DedupeMenuPatch, EventHeroPatch,
    EventParagraphPatch, HamburgerPatch, MenuHideCssPatch, MobileNavPatch, PartnerImagesPatch,
    PartnerLinksPatch, PostNavPatch, RawImagesPatch, Scope, SocialMetaPatch, SpacingCssPatch,
};
use site_maint::config::{exit_with, GlobalArgs};
use site_maint::core::navigation::SectionKind;
use site_maint::core::{events, feed, listing, site};
use site_maint::{LocalStorage, Patch, PatchEngine, RunSummary, SiteConfig, SiteError};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "site-maint")]
#[command(about = "Maintenance fixes and generators for the static agroverse.shop site")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug, Clone)]
struct Files {
    /// Only patch these files (relative to the site root)
    files: Vec<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SectionArg {
    Posts,
    Farms,
    Shipments,
    All,
}

impl SectionArg {
    fn kinds(self) -> Vec<SectionKind> {
        match self {
            SectionArg::Posts => vec![SectionKind::Post],
            SectionArg::Farms => vec![SectionKind::Farm],
            SectionArg::Shipments => vec![SectionKind::Shipment],
            SectionArg::All => SectionKind::ALL.to_vec(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Add the Google Analytics tag to every page
    Analytics(Files),
    /// Add the mobile hamburger menu
    Hamburger(Files),
    /// Hide the mobile menu list on desktop
    MenuHideCss(Files),
    /// Add header/paragraph spacing rules to blog posts
    SpacingCss(Files),
    /// Remove duplicated mobile menu elements
    DedupeMenu(Files),
    /// Add previous/next navigation to posts, farms or shipments
    PostNav {
        #[arg(long, value_enum, default_value = "all")]
        section: SectionArg,
        /// Use the target page titles as link labels
        #[arg(long)]
        titles: bool,
        #[command(flatten)]
        files: Files,
    },
    /// Add a Blog link after Shipments in site menus
    BlogLink(Files),
    /// Add Partners and Gatherings links to blog post menus
    PartnerLinks(Files),
    /// Point og:image and twitter:image at the page hero image
    SocialMeta(Files),
    /// Fix partner header image URLs in social meta tags
    PartnerImages(Files),
    /// Show event header images full-size behind a centered overlay
    EventHero(Files),
    /// Center event titles and description paragraphs
    EventParagraphs(Files),
    /// Move images out of assets/raw and update the references
    RawImages(Files),
    /// Fill empty blog listing cards with each post's first image
    BlogCardImages(Files),
    /// Hide desktop nav links on mobile and add the viewport tag
    MobileNav(Files),
    /// Regenerate blog/index.html from the posts
    BlogListing,
    /// Generate the Facebook product catalog feed
    FacebookFeed,
    /// Generate event-details-registration pages from the raw Wix event exports
    GenerateEvents,
}

fn targets(config: &SiteConfig, files: &Files, scope: Scope) -> site_maint::Result<Vec<PathBuf>> {
    if files.files.is_empty() {
        scope.targets(config)
    } else {
        Ok(site::explicit_targets(config, &files.files))
    }
}

async fn run_patch<P: Patch>(
    engine: &PatchEngine<LocalStorage>,
    config: &SiteConfig,
    patch: &P,
    files: &Files,
    scope: Scope,
    dry_run: bool,
) -> site_maint::Result<RunSummary> {
    let targets = targets(config, files, scope)?;
    let summary = engine.run(patch, &targets).await;
    summary.print(patch.name(), dry_run);
    Ok(summary)
}

async fn run(command: Command, config: SiteConfig, dry_run: bool) -> site_maint::Result<RunSummary> {
    let engine = PatchEngine::new(LocalStorage::new(config.root())).with_dry_run(dry_run);
    let posts = Scope::Section(config.sections.posts.clone());

    match command {
        Command::Analytics(files) => {
            let patch = AnalyticsPatch::new(&config.analytics.measurement_id);
            run_patch(&engine, &config, &patch, &files, Scope::AllPages, dry_run).await
        }
        Command::Hamburger(files) => {
            run_patch(&engine, &config, &HamburgerPatch, &files, Scope::AllPages, dry_run).await
        }
        Command::MenuHideCss(files) => {
            run_patch(&engine, &config, &MenuHideCssPatch, &files, Scope::AllPages, dry_run).await
        }
        Command::SpacingCss(files) => {
            run_patch(&engine, &config, &SpacingCssPatch, &files, posts, dry_run).await
        }
        Command::DedupeMenu(files) => {
            run_patch(&engine, &config, &DedupeMenuPatch, &files, Scope::AllPages, dry_run).await
        }
        Command::PostNav {
            section,
            titles,
            files,
        } => {
            let mut total = RunSummary::default();
            for kind in section.kinds() {
                let patch = PostNavPatch::prepare(&config, kind, titles)?;
                let scope = Scope::Section(kind.directory(&config.sections).to_string());
                let summary = run_patch(&engine, &config, &patch, &files, scope, dry_run).await?;
                total.updated.extend(summary.updated);
                total.skipped += summary.skipped;
                total.failed.extend(summary.failed);
            }
            Ok(total)
        }
        Command::BlogLink(files) => {
            let patch = BlogLinkPatch::new(config.blog_index());
            run_patch(&engine, &config, &patch, &files, Scope::AllPages, dry_run).await
        }
        Command::PartnerLinks(files) => {
            run_patch(&engine, &config, &PartnerLinksPatch, &files, posts, dry_run).await
        }
        Command::SocialMeta(files) => {
            let patch = SocialMetaPatch::new(config.base_url());
            run_patch(&engine, &config, &patch, &files, Scope::AllPages, dry_run).await
        }
        Command::PartnerImages(files) => {
            let patch = PartnerImagesPatch::new(config.base_url())?;
            let scope = Scope::Section(config.sections.partners.clone());
            run_patch(&engine, &config, &patch, &files, scope, dry_run).await
        }
        Command::EventHero(files) => {
            let scope = Scope::Section(config.events.output_dir.clone());
            run_patch(&engine, &config, &EventHeroPatch, &files, scope, dry_run).await
        }
        Command::EventParagraphs(files) => {
            let scope = Scope::Section(config.events.output_dir.clone());
            run_patch(&engine, &config, &EventParagraphPatch, &files, scope, dry_run).await
        }
        Command::RawImages(files) => {
            let patch = RawImagesPatch::new(config.root()).with_copy(!dry_run);
            run_patch(&engine, &config, &patch, &files, Scope::AllPages, dry_run).await
        }
        Command::BlogCardImages(files) => {
            let patch = BlogCardImagesPatch::prepare(&config)?;
            let files = if files.files.is_empty() {
                Files {
                    files: vec![config.blog_index()],
                }
            } else {
                files
            };
            run_patch(&engine, &config, &patch, &files, Scope::AllPages, dry_run).await
        }
        Command::MobileNav(files) => {
            run_patch(&engine, &config, &MobileNavPatch, &files, Scope::AllPages, dry_run).await
        }
        Command::BlogListing => {
            if dry_run {
                let posts = listing::collect_posts(&config)?;
                println!("Would write {} with {} posts", config.blog_index().display(), posts.len());
            } else {
                let count = listing::generate_listing(&config)?;
                println!("✅ Blog listing generated with {} posts", count);
            }
            Ok(RunSummary::default())
        }
        Command::FacebookFeed => {
            if dry_run {
                let products = feed::load_products(&config)?;
                println!("Would write {} with {} products", config.feed.output.display(), products.len());
            } else {
                let count = feed::generate_feed(&config)?;
                println!("✅ Feed generated with {} products", count);
                println!("   Upload {} to Facebook Commerce Manager", config.feed.output.display());
            }
            Ok(RunSummary::default())
        }
        Command::GenerateEvents => {
            if dry_run {
                for event in events::collect_events(&config)? {
                    println!(
                        "Would write {}",
                        events::event_output_path(&config, &event.slug).display()
                    );
                }
            } else {
                let count = events::generate_events(&config, chrono::Utc::now())?;
                println!("✅ Created {} event pages", count);
            }
            Ok(RunSummary::default())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日誌
    cli.global.init_logging();
    tracing::info!("🚀 Starting site-maint");

    let config = match cli.global.load_config() {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    match run(cli.command, config, cli.global.dry_run).await {
        Ok(summary) if !summary.failed.is_empty() => {
            let e = SiteError::ProcessingError {
                message: format!("{} file(s) could not be patched", summary.failed.len()),
            };
            exit_with(&e)
        }
        Ok(_) => Ok(()),
        Err(e) => exit_with(&e),
    }
}
