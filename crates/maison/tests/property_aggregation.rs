use std::sync::Arc;

use async_trait::async_trait;
use maison::config::PropertyConfig;
use maison::integrations::MockIdxFeed;
use maison::properties::{
    AggregationError, FeedError, IdxFeed, Location, Property, PropertyAggregator,
    PropertyFilters, PropertyId, PropertyImporter, PropertyQuery, PropertyRepository,
    PropertySource,
};
use maison::store::{MemoryStore, RepositoryError};

const LISTING_CSV: &str = "\
ID,Title,Price,Address,City,State,Bedrooms,Bathrooms,Square Feet,Images
mia-201,Coconut Grove Villa,\"$4,400,000\",3500 Main Hwy,Miami,FL,5,5.5,6100,https://cdn.example/201a.jpg|https://cdn.example/201b.jpg
mia-202,Bal Harbour Oceanfront,\"$7,950,000\",10201 Collins Ave,Miami,FL,4,4.5,4800,
nap-301,Port Royal Estate,\"$19,000,000\",3000 Gordon Dr,Naples,FL,6,8,11000,
";

struct OfflineFeed;

#[async_trait]
impl IdxFeed for OfflineFeed {
    async fn search_properties(
        &self,
        _filters: &PropertyFilters,
    ) -> Result<Vec<Property>, FeedError> {
        Err(FeedError::Transport("connection refused".to_string()))
    }

    async fn get_property_by_id(&self, _id: &PropertyId) -> Result<Option<Property>, FeedError> {
        Err(FeedError::Transport("connection refused".to_string()))
    }
}

struct OfflineTable;

impl PropertyRepository for OfflineTable {
    fn insert_property(&self, _property: Property) -> Result<Property, RepositoryError> {
        Err(RepositoryError::Unavailable("table offline".to_string()))
    }

    fn fetch_property(&self, _id: &PropertyId) -> Result<Option<Property>, RepositoryError> {
        Err(RepositoryError::Unavailable("table offline".to_string()))
    }

    fn search_properties(
        &self,
        _filters: &PropertyFilters,
    ) -> Result<Vec<Property>, RepositoryError> {
        Err(RepositoryError::Unavailable("table offline".to_string()))
    }
}

fn imported_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::default());
    let properties =
        PropertyImporter::from_reader(LISTING_CSV.as_bytes()).expect("csv parses cleanly");
    let imported = PropertyImporter::import(store.as_ref(), properties).expect("rows import");
    assert_eq!(imported, 3);
    store
}

fn sources(properties: &[Property]) -> Vec<PropertySource> {
    properties.iter().map(|property| property.source).collect()
}

#[tokio::test]
async fn imported_inventory_interleaves_with_the_feed() {
    let aggregator = PropertyAggregator::new(
        imported_store(),
        Arc::new(MockIdxFeed::sample()),
        PropertyConfig::default(),
    );

    let listings = aggregator
        .aggregate(&PropertyQuery::default())
        .await
        .expect("both sources answer");

    assert!(listings.degraded.is_empty());
    // Two Miami rows locally (Naples is outside the local segment) and four feed rows.
    assert_eq!(
        sources(&listings.properties),
        vec![
            PropertySource::Idx,
            PropertySource::Local,
            PropertySource::Idx,
            PropertySource::Local,
            PropertySource::Idx,
            PropertySource::Idx,
        ]
    );
    assert!(listings
        .properties
        .iter()
        .all(|property| property.location.city != "Naples"));
}

#[tokio::test]
async fn query_limit_and_filters_reach_both_sources() {
    let aggregator = PropertyAggregator::new(
        imported_store(),
        Arc::new(MockIdxFeed::sample()),
        PropertyConfig::default(),
    );

    let listings = aggregator
        .aggregate(&PropertyQuery {
            min_price: Some(5_000_000),
            limit: Some(3),
            ..PropertyQuery::default()
        })
        .await
        .expect("both sources answer");

    assert_eq!(listings.properties.len(), 3);
    assert!(listings
        .properties
        .iter()
        .all(|property| property.price >= 5_000_000));
}

#[tokio::test]
async fn feed_outage_degrades_to_local_listings() {
    let aggregator =
        PropertyAggregator::new(imported_store(), Arc::new(OfflineFeed), PropertyConfig::default());

    let listings = aggregator
        .aggregate(&PropertyQuery::default())
        .await
        .expect("local listings still served");

    assert_eq!(listings.properties.len(), 2);
    assert!(listings
        .properties
        .iter()
        .all(|property| property.source == PropertySource::Local));
    assert_eq!(listings.degraded.len(), 1);
    assert_eq!(listings.degraded[0].source, PropertySource::Idx);
}

#[tokio::test]
async fn table_outage_degrades_to_feed_listings() {
    let aggregator = PropertyAggregator::new(
        Arc::new(OfflineTable),
        Arc::new(MockIdxFeed::sample()),
        PropertyConfig::default(),
    );

    let listings = aggregator
        .aggregate(&PropertyQuery::default())
        .await
        .expect("feed listings still served");

    assert_eq!(listings.properties.len(), 4);
    assert_eq!(listings.degraded[0].source, PropertySource::Local);
}

#[tokio::test]
async fn both_sources_down_is_an_error() {
    let aggregator = PropertyAggregator::new(
        Arc::new(OfflineTable),
        Arc::new(OfflineFeed),
        PropertyConfig::default(),
    );

    let err = aggregator
        .aggregate(&PropertyQuery::default())
        .await
        .expect_err("nothing to show");

    assert!(matches!(err, AggregationError::AllSourcesFailed { .. }));
}

#[tokio::test]
async fn single_listing_lookup_prefers_local_then_feed() {
    let store = imported_store();
    store
        .insert_property(Property {
            id: PropertyId("idx-pb-103".to_string()),
            title: "Worth Avenue Penthouse (office copy)".to_string(),
            price: 8_700_000,
            location: Location {
                address: "3 Worth Ave".to_string(),
                city: "Palm Beach".to_string(),
                state: "FL".to_string(),
            },
            bedrooms: 3,
            bathrooms: 3.5,
            square_feet: 3_400,
            images: Vec::new(),
            source: PropertySource::Local,
        })
        .expect("insert succeeds");
    let aggregator = PropertyAggregator::new(
        store,
        Arc::new(MockIdxFeed::sample()),
        PropertyConfig::default(),
    );

    let shadowed = aggregator
        .property(&PropertyId("idx-pb-103".to_string()))
        .await
        .expect("found locally");
    assert_eq!(shadowed.source, PropertySource::Local);

    let remote = aggregator
        .property(&PropertyId("idx-pb-101".to_string()))
        .await
        .expect("found in feed");
    assert_eq!(remote.source, PropertySource::Idx);

    let missing = aggregator
        .property(&PropertyId("nowhere".to_string()))
        .await
        .expect_err("unknown id");
    assert!(matches!(missing, AggregationError::NotFound(_)));
}
