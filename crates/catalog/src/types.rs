//! Catalog record types and dump loading.

use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::config::CatalogConfig;
use crate::error::CatalogError;

/// One catalog entry as it travels through embedding and indexing.
///
/// `image_url` doubles as the stable external identifier of a product: hits
/// returned from retrieval carry it as their `id`, and the ingest tool uses
/// it as the index document id so re-ingesting a dump upserts instead of
/// duplicating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductRecord {
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_url: String,
}

impl ProductRecord {
    /// Validate the record against the configured limits.
    pub fn validate(&self, cfg: &CatalogConfig) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::MissingField("name"));
        }
        if self.description.trim().is_empty() {
            return Err(CatalogError::MissingField("description"));
        }
        if self.image_url.trim().is_empty() {
            return Err(CatalogError::MissingField("image_url"));
        }
        check_len("name", &self.name, cfg.max_name_bytes)?;
        check_len("description", &self.description, cfg.max_description_bytes)?;
        check_len("price", &self.price, cfg.max_price_bytes)?;
        Ok(())
    }

    /// Return a sanitized copy: trimmed fields, control characters stripped
    /// when the config asks for it. Validation is separate so callers can
    /// sanitize first and report limit violations on the cleaned text.
    pub fn sanitized(&self, cfg: &CatalogConfig) -> ProductRecord {
        let clean = |s: &str| {
            let trimmed = s.trim();
            if cfg.strip_control_chars {
                trimmed.chars().filter(|c| !c.is_control()).collect()
            } else {
                trimmed.to_string()
            }
        };
        ProductRecord {
            name: clean(&self.name),
            description: clean(&self.description),
            price: clean(&self.price),
            image_url: self.image_url.trim().to_string(),
        }
    }
}

fn check_len(field: &'static str, value: &str, limit: usize) -> Result<(), CatalogError> {
    if value.len() > limit {
        return Err(CatalogError::FieldTooLarge {
            field,
            limit,
            actual: value.len(),
        });
    }
    Ok(())
}

/// Outcome of loading a catalog dump: validated records plus the lines that
/// were rejected, keyed by 1-based line number.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub records: Vec<ProductRecord>,
    pub skipped: Vec<(usize, CatalogError)>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Load a JSON-Lines catalog dump.
///
/// Each line is one JSON object with `name`, `description`, `price`, and
/// `image_url`. Blank lines are ignored. Lines that fail to parse or
/// validate are collected in the report rather than aborting the load; the
/// ingest tool decides what to do with them.
pub fn load_products<R: BufRead>(
    reader: R,
    cfg: &CatalogConfig,
) -> Result<LoadReport, CatalogError> {
    let mut report = LoadReport::default();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record: ProductRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(source) => {
                report.skipped.push((
                    line_no,
                    CatalogError::InvalidLine {
                        line: line_no,
                        source,
                    },
                ));
                continue;
            }
        };

        let record = record.sanitized(cfg);
        match record.validate(cfg) {
            Ok(()) => report.records.push(record),
            Err(err) => report.skipped.push((line_no, err)),
        }
    }

    Ok(report)
}
