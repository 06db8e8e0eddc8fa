//! Module for loading and representing flight catalogs.
//!
//! The catalog is the tabular boundary between the optimizer and the data
//! acquisition pipeline: each row is one candidate itinerary scraped from a
//! travel-search page and exported as CSV. Loading applies the same cleaning
//! the upstream pipeline performs on raw scraped text (digit stripping,
//! missing-emission defaults, `nonstop` normalization) so the optimizer only
//! ever sees typed fields.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// A single candidate itinerary in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightRecord {
    /// Stable index into the owning catalog.
    pub id: usize,
    /// Ticket price in currency units.
    pub price: u32,
    /// CO2-equivalent emissions in kg; 0 when the source did not report any.
    pub emissions: u32,
    /// Cleaned stop descriptor, e.g. `0 stops` or `1 stop`. Only the leading
    /// integer token is ever interpreted.
    pub stops: String,
    /// Trip duration in days. Bookkeeping only, not part of the objective.
    pub stay_days: i32,
}

impl FlightRecord {
    pub fn new(id: usize, price: u32, emissions: u32, stops: &str, stay_days: i32) -> Self {
        FlightRecord {
            id,
            price,
            emissions,
            stops: stops.to_string(),
            stay_days,
        }
    }

    /// Number of layovers, read from the leading integer token of `stops`.
    /// A descriptor without a leading count is treated as nonstop.
    pub fn stop_count(&self) -> u32 {
        self.stops
            .split_whitespace()
            .next()
            .and_then(|token| token.parse().ok())
            .unwrap_or(0)
    }

    pub fn is_nonstop(&self) -> bool {
        self.stop_count() == 0
    }
}

/// An immutable, indexed table of candidate flights.
///
/// Record ids are positional: `catalog.get(r.id)` returns `r` for every
/// record. The catalog is constructed once per optimization run and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightCatalog {
    records: Vec<FlightRecord>,
}

impl FlightCatalog {
    /// Build a catalog from already-cleaned records, reassigning ids so they
    /// match positions.
    pub fn new(records: Vec<FlightRecord>) -> Self {
        let records = records
            .into_iter()
            .enumerate()
            .map(|(id, mut r)| {
                r.id = id;
                r
            })
            .collect();
        FlightCatalog { records }
    }

    /// Load a catalog from a CSV export of the scraping pipeline.
    ///
    /// Required columns: `price` and `stops`. Optional: `emissions` (missing
    /// column or empty values default to 0) and `days` (falls back to
    /// `stay_days`). Price and emissions cells are cleaned by stripping every
    /// non-digit character; `nonstop` is normalized to `0 stops`.
    pub fn from_csv<P: AsRef<Path>>(path: P, stay_days: i32) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, stay_days)
    }

    /// Load a catalog from any CSV source. See [`FlightCatalog::from_csv`].
    pub fn from_reader<R: Read>(reader: R, stay_days: i32) -> Result<Self, CatalogError> {
        let mut csv = csv::Reader::from_reader(reader);

        let headers = csv.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h.trim() == name);

        let price_col = column("price").ok_or_else(|| CatalogError::MissingColumn("price".into()))?;
        let stops_col = column("stops").ok_or_else(|| CatalogError::MissingColumn("stops".into()))?;
        let emissions_col = column("emissions");
        let days_col = column("days");

        let mut records = Vec::new();
        for (row, result) in csv.records().enumerate() {
            let record = result?;

            let raw_price = record.get(price_col).unwrap_or("");
            let price = parse_cleaned_number(raw_price).ok_or_else(|| CatalogError::BadField {
                row,
                column: "price",
                value: raw_price.to_string(),
            })?;

            // Unreported emissions clean to an empty string; default to 0.
            let emissions = emissions_col
                .and_then(|col| record.get(col))
                .and_then(parse_cleaned_number)
                .unwrap_or(0);

            let stops = normalize_stops(record.get(stops_col).unwrap_or(""));
            let leading_ok = stops
                .split_whitespace()
                .next()
                .map_or(false, |t| t.parse::<u32>().is_ok());
            if !leading_ok {
                return Err(CatalogError::BadField {
                    row,
                    column: "stops",
                    value: record.get(stops_col).unwrap_or("").to_string(),
                });
            }

            let days = days_col
                .and_then(|col| record.get(col))
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(stay_days);

            records.push(FlightRecord::new(records.len(), price, emissions, &stops, days));
        }

        Ok(FlightCatalog { records })
    }

    /// Keep only itineraries with exactly `count` layovers, reindexing the
    /// survivors. The upstream pipeline ran the optimizer over one-stop
    /// flights only; this reproduces that filter.
    pub fn retain_stops(self, count: u32) -> Self {
        let kept = self
            .records
            .into_iter()
            .filter(|r| r.stop_count() == count)
            .collect();
        FlightCatalog::new(kept)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn get(&self, id: usize) -> Option<&FlightRecord> {
        self.records.get(id)
    }

    pub fn records(&self) -> &[FlightRecord] {
        &self.records
    }

    /// Summary statistics over the catalog, for reporting and plotting.
    pub fn statistics(&self) -> CatalogStatistics {
        let prices: Vec<u32> = self.records.iter().map(|r| r.price).collect();
        let emissions: Vec<u32> = self.records.iter().map(|r| r.emissions).collect();
        let nonstop = self.records.iter().filter(|r| r.is_nonstop()).count();

        let avg = |values: &[u32]| {
            if values.is_empty() {
                0.0
            } else {
                values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
            }
        };

        CatalogStatistics {
            num_records: self.records.len(),
            num_nonstop: nonstop,
            min_price: prices.iter().copied().min().unwrap_or(0),
            max_price: prices.iter().copied().max().unwrap_or(0),
            avg_price: avg(&prices),
            min_emissions: emissions.iter().copied().min().unwrap_or(0),
            max_emissions: emissions.iter().copied().max().unwrap_or(0),
            avg_emissions: avg(&emissions),
        }
    }
}

/// Strip every non-digit character and parse what remains. Returns `None`
/// for cells with no digits at all (e.g. empty or purely textual).
fn parse_cleaned_number(raw: &str) -> Option<u32> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Normalize the stop descriptor: the zero-stop token `nonstop` becomes
/// `0 stops`, everything else is trimmed and kept as-is.
fn normalize_stops(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("nonstop") {
        "0 stops".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Statistics about a flight catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStatistics {
    pub num_records: usize,
    pub num_nonstop: usize,
    pub min_price: u32,
    pub max_price: u32,
    pub avg_price: f64,
    pub min_emissions: u32,
    pub max_emissions: u32,
    pub avg_emissions: f64,
}

impl std::fmt::Display for CatalogStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Catalog: {} itineraries ({} nonstop)", self.num_records, self.num_nonstop)?;
        writeln!(
            f,
            "  Price: min {} / avg {:.2} / max {}",
            self.min_price, self.avg_price, self.max_price
        )?;
        writeln!(
            f,
            "  Emissions: min {} / avg {:.2} / max {} kg CO2e",
            self.min_emissions, self.avg_emissions, self.max_emissions
        )
    }
}

impl std::fmt::Display for FlightRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Flight #{}", self.id)?;
        writeln!(f, "  Price: {}", self.price)?;
        writeln!(f, "  Emissions: {} kg CO2e", self.emissions)?;
        writeln!(f, "  Stops: {}", self.stops)?;
        writeln!(f, "  Stay: {} days", self.stay_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
price,emissions,stops,days
\"MX$12,345\",\"1,002 kg\",1 stop,14
MX$800,,nonstop,14
MX$999,515 kg,2 stops,7
";

    #[test]
    fn test_cleaning_rules() {
        let catalog = FlightCatalog::from_reader(SAMPLE.as_bytes(), 14).unwrap();
        assert_eq!(catalog.len(), 3);

        let first = catalog.get(0).unwrap();
        assert_eq!(first.price, 12345);
        assert_eq!(first.emissions, 1002);
        assert_eq!(first.stop_count(), 1);

        // Empty emissions default to 0, nonstop normalizes to "0 stops".
        let second = catalog.get(1).unwrap();
        assert_eq!(second.emissions, 0);
        assert_eq!(second.stops, "0 stops");
        assert!(second.is_nonstop());

        let third = catalog.get(2).unwrap();
        assert_eq!(third.stop_count(), 2);
        assert_eq!(third.stay_days, 7);
    }

    #[test]
    fn test_missing_price_column_rejected() {
        let csv = "emissions,stops\n100,nonstop\n";
        match FlightCatalog::from_reader(csv.as_bytes(), 14) {
            Err(CatalogError::MissingColumn(col)) => assert_eq!(col, "price"),
            _ => panic!("expected MissingColumn error"),
        }
    }

    #[test]
    fn test_price_without_digits_rejected() {
        let csv = "price,stops\nunavailable,1 stop\n";
        assert!(matches!(
            FlightCatalog::from_reader(csv.as_bytes(), 14),
            Err(CatalogError::BadField { column: "price", .. })
        ));
    }

    #[test]
    fn test_stop_filter_reindexes() {
        let catalog = FlightCatalog::from_reader(SAMPLE.as_bytes(), 14).unwrap();
        let one_stop = catalog.retain_stops(1);

        assert_eq!(one_stop.len(), 1);
        let record = one_stop.get(0).unwrap();
        assert_eq!(record.id, 0);
        assert_eq!(record.price, 12345);
    }

    #[test]
    fn test_statistics() {
        let catalog = FlightCatalog::from_reader(SAMPLE.as_bytes(), 14).unwrap();
        let stats = catalog.statistics();

        assert_eq!(stats.num_records, 3);
        assert_eq!(stats.num_nonstop, 1);
        assert_eq!(stats.min_price, 800);
        assert_eq!(stats.max_price, 12345);
        assert_eq!(stats.max_emissions, 1002);
    }
}
