use crate::infra::{seed_demo_data, Platform, DEMO_MEMBERS, DEMO_STAFF};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use maison::concierge::{
    ConciergeServiceError, RequestStatus, RequestSubmission, ServiceCategory,
};
use maison::config::AppConfig;
use maison::error::AppError;
use maison::events::{EventServiceError, RsvpAction};
use maison::integrations::Integrations;
use maison::marketplace::{SyncMode, SyncSummary};
use maison::membership::UserId;
use maison::properties::{AggregatedListings, PropertyImporter, PropertyQuery};
use maison::session::{resolve_session, Session};
use maison::telemetry;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Demo member whose point of view the walkthrough takes.
    #[arg(long, default_value = "member-gold")]
    pub(crate) member: String,
    /// Skip the marketplace preview at the end of the demo.
    #[arg(long)]
    pub(crate) skip_marketplace: bool,
}

#[derive(Args, Debug)]
pub(crate) struct MarketplaceSyncArgs {
    /// Category to scrape; repeat for several. Defaults to the configured set.
    #[arg(long = "category")]
    pub(crate) categories: Vec<String>,
    /// Parse and report without writing to the catalog.
    #[arg(long)]
    pub(crate) preview: bool,
}

#[derive(Args, Debug)]
pub(crate) struct PropertyImportArgs {
    /// Listing CSV export to load into the local inventory.
    #[arg(long)]
    pub(crate) csv: PathBuf,
}

pub(crate) async fn run_marketplace_sync(args: MarketplaceSyncArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let integrations =
        Integrations::from_config(&config.integrations, &config.marketplace.source_base_url)?;
    let platform = Platform::build(&config, &integrations)?;

    let mode = if args.preview {
        SyncMode::Preview
    } else {
        SyncMode::Sync
    };
    let summary = platform.marketplace.run(mode, &args.categories).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

pub(crate) async fn run_property_import(args: PropertyImportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let integrations =
        Integrations::from_config(&config.integrations, &config.marketplace.source_base_url)?;
    let platform = Platform::build(&config, &integrations)?;

    let properties = PropertyImporter::from_path(&args.csv)?;
    let imported = PropertyImporter::import(platform.store.as_ref(), properties)?;
    println!("Imported {} listings from {}", imported, args.csv.display());

    let listings = platform.listings.aggregate(&PropertyQuery::default()).await?;
    render_listings(&listings);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let mut config = AppConfig::local();
    config.marketplace.request_delay = std::time::Duration::ZERO;
    let integrations = Integrations::mock(&config.marketplace.source_base_url);
    let platform = Platform::build(&config, &integrations)?;
    seed_demo_data(&platform.store)?;
    let now = Utc::now();

    println!("Maison platform demo (mock integrations)");
    println!("\nMembership tiers");
    for (user, _) in DEMO_MEMBERS {
        let session = resolve_session(&platform.resolver, UserId::new(user), now)?;
        let open = platform
            .concierge
            .categories(&session)
            .iter()
            .filter(|entry| entry.accessible)
            .count();
        println!(
            "- {}: {} tier | {} of {} concierge categories open",
            user,
            session.tier(),
            open,
            ServiceCategory::catalogue().len()
        );
    }

    let member = resolve_session(&platform.resolver, UserId::new(args.member), now)?;
    let staff = resolve_session(&platform.resolver, UserId::new(DEMO_STAFF), now)?;

    if let Err(err) = concierge_walkthrough(&platform, &member, &staff).await {
        println!("  Concierge walkthrough stopped: {}", err);
    }
    if let Err(err) = event_walkthrough(&platform, &member, now) {
        println!("  Event walkthrough stopped: {}", err);
    }

    println!("\nProperty listings");
    let listings = platform.listings.aggregate(&PropertyQuery::default()).await?;
    render_listings(&listings);

    if !args.skip_marketplace {
        println!("\nMarketplace preview");
        let summary = platform.marketplace.run(SyncMode::Preview, &[]).await?;
        render_sync_summary(&summary);
    }

    Ok(())
}

async fn concierge_walkthrough(
    platform: &Platform,
    member: &Session,
    staff: &Session,
) -> Result<(), ConciergeServiceError> {
    let concierge = &platform.concierge;
    println!(
        "\nConcierge desk for {} ({} tier)",
        member.user_id,
        member.tier()
    );

    let categories = concierge.categories(member);
    for entry in &categories {
        let marker = if entry.accessible { "open" } else { "locked" };
        println!(
            "  - {} [{}] from {}",
            entry.category.label, marker, entry.category.min_tier
        );
    }
    if let Some(locked) = categories.iter().find(|entry| !entry.accessible) {
        if let Err(err) = concierge.select_category(member, locked.category.id) {
            println!("- Selecting {} was refused: {}", locked.category.label, err);
        }
    }

    let submission = RequestSubmission {
        category: "dining".to_string(),
        title: "Chef's table for four".to_string(),
        description: "Anniversary dinner, window seating if possible".to_string(),
        preferred_date: Some((Utc::now() + Duration::days(10)).date_naive()),
        budget_range: Some("$1,000 - $2,500".to_string()),
    };
    let request = concierge.submit(member, submission).await?;
    println!(
        "- Submitted {} \"{}\" -> {}",
        request.id.0,
        request.title,
        request.status.label()
    );

    let request = concierge
        .advance_status(staff, &request.id, RequestStatus::InProgress)
        .await?;
    println!("- Desk picked it up -> {}", request.status.label());

    concierge
        .post_message(staff, &request.id, "Reserved for Saturday at 8pm, table by the window.")
        .await?;
    println!(
        "- Member has {} unread message(s)",
        concierge.unread_count(member, &request.id)?
    );

    for message in concierge.thread(member, &request.id)? {
        println!("  {}: {}", message.sender, message.content);
    }
    println!(
        "- After reading the thread: {} unread",
        concierge.unread_count(member, &request.id)?
    );

    let request = concierge
        .advance_status(staff, &request.id, RequestStatus::Completed)
        .await?;
    println!("- Request closed -> {}", request.status.label());
    Ok(())
}

fn event_walkthrough(
    platform: &Platform,
    member: &Session,
    now: DateTime<Utc>,
) -> Result<(), EventServiceError> {
    println!("\nUpcoming events for {}", member.user_id);
    let listings = platform.events.list_upcoming(member, now)?;
    for listing in &listings {
        let action = match listing.action {
            RsvpAction::Rsvp => "rsvp open".to_string(),
            RsvpAction::Attending { status } => format!("attending ({:?})", status),
            RsvpAction::UpgradeRequired { required_tier, .. } => {
                format!("upgrade to {} to attend", required_tier)
            }
        };
        println!(
            "  - {} at {} | {} spots left | {}",
            listing.event.title, listing.event.location, listing.spots_left, action
        );
    }

    if let Some(open) = listings
        .iter()
        .find(|listing| listing.action == RsvpAction::Rsvp)
    {
        let first = platform.events.rsvp(member, &open.event.id, now)?;
        let repeat = platform.events.rsvp(member, &open.event.id, now)?;
        println!(
            "- RSVP to {}: {:?} (repeat created a new row: {})",
            open.event.title, first.rsvp.status, repeat.created
        );
    }
    Ok(())
}

fn render_listings(listings: &AggregatedListings) {
    for property in &listings.properties {
        println!(
            "  - [{}] {} | ${} | {}, {} | {} bd / {} ba",
            property.source.label(),
            property.title,
            property.price,
            property.location.address,
            property.location.city,
            property.bedrooms,
            property.bathrooms
        );
    }
    for failure in &listings.degraded {
        println!("  ! {} source unavailable: {}", failure.source.label(), failure.error);
    }
}

fn render_sync_summary(summary: &SyncSummary) {
    println!(
        "- {} items found across {} categories (success: {})",
        summary.items_found,
        summary.categories.len(),
        summary.success
    );
    for outcome in &summary.categories {
        println!(
            "  - {}: {:?}, {} items",
            outcome.category, outcome.status, outcome.items_found
        );
    }
    for item in summary.items.iter().take(5) {
        println!(
            "  * {} ({}) ${:.2}",
            item.title,
            item.brand.as_deref().unwrap_or("unbranded"),
            item.price_cents as f64 / 100.0
        );
    }
}
