use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;

use super::http::ApiClient;
use super::IntegrationError;
use crate::config::EndpointConfig;
use crate::properties::{
    FeedError, IdxFeed, Location, Property, PropertyFilters, PropertyId, PropertySource,
};

/// Serves a fixed listing set through the feed interface.
pub struct MockIdxFeed {
    listings: Vec<Property>,
}

impl MockIdxFeed {
    pub fn new(listings: Vec<Property>) -> Self {
        Self { listings }
    }

    pub fn sample() -> Self {
        let listing = |id: &str, title: &str, price: u64, address: &str, beds: u8, baths: f32, sqft: u32| {
            Property {
                id: PropertyId(id.to_string()),
                title: title.to_string(),
                price,
                location: Location {
                    address: address.to_string(),
                    city: "Palm Beach".to_string(),
                    state: "FL".to_string(),
                },
                bedrooms: beds,
                bathrooms: baths,
                square_feet: sqft,
                images: vec![format!("https://images.idx.example/{id}/front.jpg")],
                source: PropertySource::Idx,
            }
        };

        Self::new(vec![
            listing("idx-pb-101", "Oceanfront Estate on South Ocean", 38_500_000, "1100 S Ocean Blvd", 7, 9.5, 14_200),
            listing("idx-pb-102", "Lake Trail Mediterranean", 12_900_000, "240 Lake Trail", 5, 6.0, 6_800),
            listing("idx-pb-103", "Worth Avenue Penthouse", 8_750_000, "3 Worth Ave", 3, 3.5, 3_400),
            listing("idx-pb-104", "Intracoastal Modern", 16_200_000, "1520 N Lake Way", 6, 7.5, 9_100),
        ])
    }
}

#[async_trait]
impl IdxFeed for MockIdxFeed {
    async fn search_properties(
        &self,
        filters: &PropertyFilters,
    ) -> Result<Vec<Property>, FeedError> {
        let matching = self.listings.iter().filter(|listing| filters.matches(listing));
        Ok(match filters.limit {
            Some(limit) => matching.take(limit).cloned().collect(),
            None => matching.cloned().collect(),
        })
    }

    async fn get_property_by_id(&self, id: &PropertyId) -> Result<Option<Property>, FeedError> {
        Ok(self.listings.iter().find(|listing| &listing.id == id).cloned())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdxListing {
    listing_id: String,
    #[serde(default)]
    headline: Option<String>,
    list_price: u64,
    address: IdxAddress,
    #[serde(default)]
    bedrooms: u8,
    #[serde(default)]
    bathrooms: f32,
    #[serde(default)]
    living_area: u32,
    #[serde(default)]
    photos: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdxAddress {
    full: String,
    city: String,
    state_or_province: String,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    listings: Vec<IdxListing>,
}

impl From<IdxListing> for Property {
    fn from(listing: IdxListing) -> Self {
        Property {
            title: listing
                .headline
                .unwrap_or_else(|| listing.address.full.clone()),
            id: PropertyId(listing.listing_id),
            price: listing.list_price,
            location: Location {
                address: listing.address.full,
                city: listing.address.city,
                state: listing.address.state_or_province,
            },
            bedrooms: listing.bedrooms,
            bathrooms: listing.bathrooms,
            square_feet: listing.living_area,
            images: listing.photos,
            source: PropertySource::Idx,
        }
    }
}

pub struct HttpIdxFeed {
    api: ApiClient,
}

impl HttpIdxFeed {
    pub fn new(endpoint: &EndpointConfig) -> Result<Self, IntegrationError> {
        Ok(Self {
            api: ApiClient::new("idx feed", endpoint)?,
        })
    }
}

fn feed_error(err: IntegrationError) -> FeedError {
    match err {
        IntegrationError::Status { .. } => FeedError::Payload(err.to_string()),
        other => FeedError::Transport(other.to_string()),
    }
}

#[async_trait]
impl IdxFeed for HttpIdxFeed {
    async fn search_properties(
        &self,
        filters: &PropertyFilters,
    ) -> Result<Vec<Property>, FeedError> {
        let request = self.api.request(Method::GET, "properties").query(filters);
        let page: SearchPage = self.api.json(request).await.map_err(feed_error)?;
        Ok(page.listings.into_iter().map(Property::from).collect())
    }

    async fn get_property_by_id(&self, id: &PropertyId) -> Result<Option<Property>, FeedError> {
        let request = self
            .api
            .request(Method::GET, &format!("properties/{}", id.0));
        let listing: Option<IdxListing> =
            self.api.json_optional(request).await.map_err(feed_error)?;
        Ok(listing.map(Property::from))
    }
}
