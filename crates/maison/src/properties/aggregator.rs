use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use super::domain::{Property, PropertyFilters, PropertyId, PropertyQuery, PropertySource};
use super::feed::IdxFeed;
use super::repository::PropertyRepository;
use crate::config::PropertyConfig;

/// Alternate between `external` and `local`, external first, until `limit`
/// entries are taken or both lists run out.
pub fn interleave(external: Vec<Property>, local: Vec<Property>, limit: usize) -> Vec<Property> {
    let mut merged = Vec::with_capacity(limit.min(external.len() + local.len()));
    let mut external = external.into_iter();
    let mut local = local.into_iter();

    while merged.len() < limit {
        let mut progressed = false;
        for source in [&mut external, &mut local] {
            if merged.len() == limit {
                break;
            }
            if let Some(property) = source.next() {
                merged.push(property);
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    merged
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source: PropertySource,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedListings {
    pub properties: Vec<Property>,
    /// Sources that failed; their listings are missing from `properties`.
    pub degraded: Vec<SourceFailure>,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    #[error("all property sources failed (local: {local}; idx: {external})")]
    AllSourcesFailed { local: String, external: String },
    #[error("property {0} not found")]
    NotFound(PropertyId),
    #[error("property lookup failed: {0}")]
    Lookup(String),
}

/// Merges the local table and the IDX feed into one display list.
pub struct PropertyAggregator<R, F: ?Sized> {
    repository: Arc<R>,
    feed: Arc<F>,
    config: PropertyConfig,
}

impl<R, F> PropertyAggregator<R, F>
where
    R: PropertyRepository + 'static,
    F: IdxFeed + ?Sized + 'static,
{
    pub fn new(repository: Arc<R>, feed: Arc<F>, config: PropertyConfig) -> Self {
        Self {
            repository,
            feed,
            config,
        }
    }

    pub async fn aggregate(
        &self,
        query: &PropertyQuery,
    ) -> Result<AggregatedListings, AggregationError> {
        let limit = query.limit.unwrap_or(self.config.limit);
        let local_filters = self.filters_for(query, &self.config.local_city, limit);
        let feed_filters = self.filters_for(query, &self.config.feed_city, limit);

        let local = async { self.repository.search_properties(&local_filters) };
        let (local, external) = tokio::join!(local, self.feed.search_properties(&feed_filters));

        let (local, external, degraded) = match (local, external) {
            (Ok(local), Ok(external)) => (local, external, Vec::new()),
            (Ok(local), Err(err)) => {
                warn!(error = %err, "idx feed unavailable, showing local listings only");
                (local, Vec::new(), vec![failure(PropertySource::Idx, err)])
            }
            (Err(err), Ok(external)) => {
                warn!(error = %err, "local listings unavailable, showing idx listings only");
                (Vec::new(), external, vec![failure(PropertySource::Local, err)])
            }
            (Err(local_err), Err(feed_err)) => {
                return Err(AggregationError::AllSourcesFailed {
                    local: local_err.to_string(),
                    external: feed_err.to_string(),
                });
            }
        };

        Ok(AggregatedListings {
            properties: interleave(tag(external, PropertySource::Idx), local, limit),
            degraded,
        })
    }

    /// Local table first, then the feed.
    pub async fn property(&self, id: &PropertyId) -> Result<Property, AggregationError> {
        let local_error = match self.repository.fetch_property(id) {
            Ok(Some(property)) => return Ok(property),
            Ok(None) => None,
            Err(err) => Some(err),
        };

        match self.feed.get_property_by_id(id).await {
            Ok(Some(property)) => Ok(Property {
                source: PropertySource::Idx,
                ..property
            }),
            Ok(None) => match local_error {
                Some(err) => Err(AggregationError::Lookup(err.to_string())),
                None => Err(AggregationError::NotFound(id.clone())),
            },
            Err(feed_err) => match local_error {
                Some(local_err) => Err(AggregationError::AllSourcesFailed {
                    local: local_err.to_string(),
                    external: feed_err.to_string(),
                }),
                None => Err(AggregationError::Lookup(feed_err.to_string())),
            },
        }
    }

    fn filters_for(&self, query: &PropertyQuery, city: &str, limit: usize) -> PropertyFilters {
        PropertyFilters {
            city: Some(city.to_string()),
            min_price: query.min_price,
            max_price: query.max_price,
            min_bedrooms: query.min_bedrooms,
            limit: Some(limit),
        }
    }
}

fn tag(properties: Vec<Property>, source: PropertySource) -> Vec<Property> {
    properties
        .into_iter()
        .map(|property| Property { source, ..property })
        .collect()
}

fn failure(source: PropertySource, err: impl std::fmt::Display) -> SourceFailure {
    SourceFailure {
        source,
        error: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::domain::Location;

    fn listing(id: &str, source: PropertySource) -> Property {
        Property {
            id: PropertyId(id.to_string()),
            title: format!("Residence {id}"),
            price: 2_500_000,
            location: Location {
                address: "1 Ocean Dr".to_string(),
                city: "Miami".to_string(),
                state: "FL".to_string(),
            },
            bedrooms: 3,
            bathrooms: 2.5,
            square_feet: 2400,
            images: Vec::new(),
            source,
        }
    }

    fn many(prefix: &str, count: usize, source: PropertySource) -> Vec<Property> {
        (0..count)
            .map(|index| listing(&format!("{prefix}{index}"), source))
            .collect()
    }

    fn ids(properties: &[Property]) -> Vec<&str> {
        properties.iter().map(|property| property.id.0.as_str()).collect()
    }

    #[test]
    fn interleave_starts_with_external_and_alternates() {
        let merged = interleave(
            many("x", 2, PropertySource::Idx),
            many("l", 2, PropertySource::Local),
            10,
        );
        assert_eq!(ids(&merged), vec!["x0", "l0", "x1", "l1"]);
    }

    #[test]
    fn interleave_drains_the_longer_source() {
        let merged = interleave(
            many("x", 1, PropertySource::Idx),
            many("l", 3, PropertySource::Local),
            10,
        );
        assert_eq!(ids(&merged), vec!["x0", "l0", "l1", "l2"]);
    }

    #[test]
    fn interleave_length_is_min_of_total_and_limit() {
        for external in 0..5 {
            for local in 0..5 {
                for limit in 0..8 {
                    let merged = interleave(
                        many("x", external, PropertySource::Idx),
                        many("l", local, PropertySource::Local),
                        limit,
                    );
                    assert_eq!(merged.len(), (external + local).min(limit));
                }
            }
        }
    }

    #[test]
    fn interleave_stops_mid_round_at_limit() {
        let merged = interleave(
            many("x", 3, PropertySource::Idx),
            many("l", 3, PropertySource::Local),
            3,
        );
        assert_eq!(ids(&merged), vec!["x0", "l0", "x1"]);
    }
}
