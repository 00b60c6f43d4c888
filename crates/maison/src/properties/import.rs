use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use tracing::info;

use super::domain::{Location, Property, PropertyId, PropertySource};
use super::repository::PropertyRepository;
use crate::store::RepositoryError;

#[derive(Debug)]
pub enum PropertyImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: u64, reason: String },
    Repository(RepositoryError),
}

impl std::fmt::Display for PropertyImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyImportError::Io(err) => write!(f, "failed to read listing export: {}", err),
            PropertyImportError::Csv(err) => write!(f, "invalid listing CSV data: {}", err),
            PropertyImportError::InvalidRow { line, reason } => {
                write!(f, "listing on line {} is invalid: {}", line, reason)
            }
            PropertyImportError::Repository(err) => {
                write!(f, "could not store imported listing: {}", err)
            }
        }
    }
}

impl std::error::Error for PropertyImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PropertyImportError::Io(err) => Some(err),
            PropertyImportError::Csv(err) => Some(err),
            PropertyImportError::Repository(err) => Some(err),
            PropertyImportError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for PropertyImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for PropertyImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<RepositoryError> for PropertyImportError {
    fn from(err: RepositoryError) -> Self {
        Self::Repository(err)
    }
}

/// Loads local listings from a spreadsheet export.
pub struct PropertyImporter;

impl PropertyImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Property>, PropertyImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Property>, PropertyImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut properties = Vec::new();

        for (index, record) in csv_reader.deserialize::<ListingRow>().enumerate() {
            let row = record?;
            // header is line 1
            let line = index as u64 + 2;
            properties.push(row.into_property(line)?);
        }

        Ok(properties)
    }

    /// Inserts every listing; returns how many rows were written.
    pub fn import<R>(repository: &R, properties: Vec<Property>) -> Result<usize, PropertyImportError>
    where
        R: PropertyRepository + ?Sized,
    {
        let mut written = 0;
        for property in properties {
            repository.insert_property(property)?;
            written += 1;
        }
        info!(count = written, "imported local listings");
        Ok(written)
    }
}

#[derive(Debug, Deserialize)]
struct ListingRow {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Price")]
    price: String,
    #[serde(rename = "Address")]
    address: String,
    #[serde(rename = "City")]
    city: String,
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "Bedrooms")]
    bedrooms: u8,
    #[serde(rename = "Bathrooms")]
    bathrooms: f32,
    #[serde(rename = "Square Feet", default, deserialize_with = "empty_as_zero")]
    square_feet: u32,
    #[serde(rename = "Images", default)]
    images: String,
}

impl ListingRow {
    fn into_property(self, line: u64) -> Result<Property, PropertyImportError> {
        if self.id.is_empty() {
            return Err(invalid(line, "ID is empty"));
        }
        if self.title.is_empty() {
            return Err(invalid(line, "Title is empty"));
        }
        let price = parse_price(&self.price)
            .ok_or_else(|| invalid(line, &format!("price '{}' is not a number", self.price)))?;

        Ok(Property {
            id: PropertyId(self.id),
            title: self.title,
            price,
            location: Location {
                address: self.address,
                city: self.city,
                state: self.state,
            },
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            square_feet: self.square_feet,
            images: self
                .images
                .split('|')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string)
                .collect(),
            source: PropertySource::Local,
        })
    }
}

fn invalid(line: u64, reason: &str) -> PropertyImportError {
    PropertyImportError::InvalidRow {
        line,
        reason: reason.to_string(),
    }
}

/// Accepts `1250000`, `$1,250,000` and `1250000.00`.
fn parse_price(raw: &str) -> Option<u64> {
    let cleaned: String = raw
        .chars()
        .filter(|ch| !matches!(ch, '$' | ',' | ' '))
        .collect();
    let whole = cleaned.split('.').next()?;
    whole.parse().ok()
}

fn empty_as_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return Ok(0);
    }
    cleaned.parse().map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::domain::PropertyFilters;
    use crate::store::MemoryStore;
    use std::io::Cursor;

    const EXPORT: &str = "ID,Title,Price,Address,City,State,Bedrooms,Bathrooms,Square Feet,Images\n\
        mia-1,Bayfront Penthouse,\"$4,750,000\",1 Collins Ave,Miami,FL,4,4.5,\"3,900\",https://img/a.jpg|https://img/b.jpg\n\
        mia-2,Coconut Grove Villa,2100000,88 Main Hwy,Miami,FL,5,5,,\n";

    #[test]
    fn parses_formatted_prices_and_image_lists() {
        let properties = PropertyImporter::from_reader(Cursor::new(EXPORT)).expect("export parses");

        assert_eq!(properties.len(), 2);
        assert_eq!(properties[0].price, 4_750_000);
        assert_eq!(properties[0].square_feet, 3_900);
        assert_eq!(properties[0].images.len(), 2);
        assert_eq!(properties[0].source, PropertySource::Local);
        assert_eq!(properties[1].square_feet, 0);
        assert!(properties[1].images.is_empty());
    }

    #[test]
    fn reports_the_line_of_a_bad_price() {
        let export = "ID,Title,Price,Address,City,State,Bedrooms,Bathrooms,Square Feet,Images\n\
            mia-1,Penthouse,call agent,1 Collins Ave,Miami,FL,4,4.5,,\n";

        match PropertyImporter::from_reader(Cursor::new(export)) {
            Err(PropertyImportError::InvalidRow { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            PropertyImporter::from_path("./no-such-listings.csv"),
            Err(PropertyImportError::Io(_))
        ));
    }

    #[test]
    fn import_writes_rows_into_the_repository() {
        let store = MemoryStore::default();
        let properties = PropertyImporter::from_reader(Cursor::new(EXPORT)).expect("export parses");

        let written = PropertyImporter::import(&store, properties).expect("import succeeds");

        assert_eq!(written, 2);
        let miami = store
            .search_properties(&PropertyFilters {
                city: Some("miami".to_string()),
                ..PropertyFilters::default()
            })
            .expect("search succeeds");
        assert_eq!(miami.len(), 2);
    }
}
