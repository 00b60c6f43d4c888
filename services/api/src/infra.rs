use chrono::{Duration, Utc};
use maison::concierge::{ChangeFeed, ConciergeService};
use maison::config::AppConfig;
use maison::error::AppError;
use maison::events::{Event, EventId, EventRepository, EventService, EventStatus};
use maison::integrations::{ConciergeNotifier, Integrations};
use maison::marketplace::{CatalogSyncJob, ScrapeClient};
use maison::membership::{
    Membership, MembershipStatus, MembershipTier, TierResolver, UserId, UserRole,
};
use maison::properties::{
    IdxFeed, Location, Property, PropertyAggregator, PropertyId, PropertyRepository,
    PropertySource,
};
use maison::store::MemoryStore;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type Concierge = ConciergeService<MemoryStore, ConciergeNotifier>;
pub(crate) type Listings = PropertyAggregator<MemoryStore, dyn IdxFeed>;
pub(crate) type Marketplace = CatalogSyncJob<dyn ScrapeClient, MemoryStore>;

/// Every service wired against one store and one adapter set.
pub(crate) struct Platform {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) resolver: TierResolver<MemoryStore>,
    pub(crate) concierge: Arc<Concierge>,
    pub(crate) events: Arc<EventService<MemoryStore>>,
    pub(crate) listings: Arc<Listings>,
    pub(crate) marketplace: Arc<Marketplace>,
}

impl Platform {
    pub(crate) fn build(config: &AppConfig, integrations: &Integrations) -> Result<Self, AppError> {
        let store = Arc::new(MemoryStore::default());

        Ok(Self {
            resolver: TierResolver::new(store.clone()),
            concierge: Arc::new(ConciergeService::new(
                store.clone(),
                Arc::new(integrations.notifier()),
                ChangeFeed::default(),
            )),
            events: Arc::new(EventService::new(store.clone())),
            listings: Arc::new(PropertyAggregator::new(
                store.clone(),
                integrations.idx.clone(),
                config.properties.clone(),
            )),
            marketplace: Arc::new(CatalogSyncJob::new(
                integrations.scrape.clone(),
                store.clone(),
                config.marketplace.clone(),
            )?),
            store,
        })
    }
}

pub(crate) const DEMO_MEMBERS: [(&str, MembershipTier); 4] = [
    ("member-silver", MembershipTier::Silver),
    ("member-gold", MembershipTier::Gold),
    ("member-platinum", MembershipTier::Platinum),
    ("member-black", MembershipTier::Black),
];
pub(crate) const DEMO_STAFF: &str = "concierge-desk";
pub(crate) const DEMO_ADMIN: &str = "platform-admin";

/// Memberships, roles, events and local listings for demos and local runs.
pub(crate) fn seed_demo_data(store: &MemoryStore) -> Result<(), AppError> {
    let renews = Some(Utc::now() + Duration::days(30));
    for (user, tier) in DEMO_MEMBERS {
        store.put_membership(Membership {
            user_id: UserId::new(user),
            tier,
            status: MembershipStatus::Active,
            current_period_end: renews,
        });
    }
    store.put_role(UserId::new(DEMO_STAFF), UserRole::Staff);
    store.put_role(UserId::new(DEMO_ADMIN), UserRole::Admin);

    for event in demo_events() {
        store.insert_event(event)?;
    }
    for property in demo_properties() {
        store.insert_property(property)?;
    }
    Ok(())
}

fn demo_events() -> Vec<Event> {
    let now = Utc::now();
    let event = |id: &str, title: &str, location: &str, days: i64, capacity: u32, tier| Event {
        id: EventId(id.to_string()),
        title: title.to_string(),
        description: format!("{title}, hosted for members"),
        location: location.to_string(),
        starts_at: now + Duration::days(days),
        capacity,
        min_tier: tier,
        status: EventStatus::Scheduled,
    };

    vec![
        event(
            "evt-gallery",
            "Gallery Night in Wynwood",
            "Wynwood, Miami",
            7,
            60,
            MembershipTier::Silver,
        ),
        event(
            "evt-polo",
            "Polo Brunch",
            "Wellington, FL",
            14,
            24,
            MembershipTier::Gold,
        ),
        event(
            "evt-regatta",
            "Superyacht Regatta Preview",
            "Port Everglades",
            21,
            12,
            MembershipTier::Platinum,
        ),
        event(
            "evt-cellar",
            "Private Cellar Dinner",
            "Coral Gables",
            30,
            2,
            MembershipTier::Black,
        ),
    ]
}

fn demo_properties() -> Vec<Property> {
    let property = |id: &str, title: &str, price: u64, address: &str, layout: (u8, f32, u32)| {
        let (bedrooms, bathrooms, square_feet) = layout;
        Property {
            id: PropertyId(id.to_string()),
            title: title.to_string(),
            price,
            location: Location {
                address: address.to_string(),
                city: "Miami".to_string(),
                state: "FL".to_string(),
            },
            bedrooms,
            bathrooms,
            square_feet,
            images: vec![format!("https://cdn.maison.example/properties/{id}.jpg")],
            source: PropertySource::Local,
        }
    };

    vec![
        property(
            "mia-001",
            "Fisher Island Residence",
            9_800_000,
            "7000 Fisher Island Dr",
            (4, 5.5, 5_200),
        ),
        property(
            "mia-002",
            "Star Island Waterfront",
            42_000_000,
            "31 Star Island Dr",
            (8, 10.0, 16_500),
        ),
        property(
            "mia-003",
            "Brickell Sky Penthouse",
            6_250_000,
            "1000 Brickell Plaza",
            (3, 4.0, 4_100),
        ),
    ]
}
