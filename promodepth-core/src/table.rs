//! Row ingestion.
//!
//! Loads an uploaded table (CSV, or a JSON array of objects) into headers plus
//! rows of [`RawEntry`] cells. The cell kind is decided here once.

use crate::error::{PromoDepthError, PromoDepthResult};
use crate::types::RawEntry;
use serde_json::Value;
use std::io::Read;
use std::path::Path;

static MISSING: RawEntry = RawEntry::Missing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Json,
}

impl TableFormat {
    pub fn parse(name: &str) -> PromoDepthResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "csv" => Ok(TableFormat::Csv),
            "json" => Ok(TableFormat::Json),
            other => Err(PromoDepthError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Format implied by the file extension
    pub fn from_path(path: &Path) -> PromoDepthResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::parse(extension)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawEntry>>,
}

impl Table {
    pub fn from_path(path: &str) -> PromoDepthResult<Self> {
        match TableFormat::from_path(Path::new(path))? {
            TableFormat::Csv => Self::from_csv_reader(std::fs::File::open(path)?),
            TableFormat::Json => Self::from_json_str(&std::fs::read_to_string(path)?),
        }
    }

    /// Parse CSV with a header row. Empty cells and short rows become `Missing`.
    pub fn from_csv_reader<R: Read>(reader: R) -> PromoDepthResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(String::from).collect();

        let mut rows = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            let row = (0..headers.len())
                .map(|index| match record.get(index) {
                    Some(cell) if !cell.is_empty() => RawEntry::Text(cell.to_string()),
                    _ => RawEntry::Missing,
                })
                .collect();
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Parse a JSON array of objects. Headers are the union of keys in first-seen order.
    pub fn from_json_str(json: &str) -> PromoDepthResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Array(items) = value else {
            return Err(PromoDepthError::InvalidJson(
                "expected an array of objects".to_string(),
            ));
        };

        let mut objects = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match item {
                Value::Object(object) => objects.push(object),
                _ => {
                    return Err(PromoDepthError::InvalidJson(format!(
                        "row {index} is not an object"
                    )))
                }
            }
        }

        let mut headers: Vec<String> = Vec::new();
        for object in &objects {
            for key in object.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }

        let rows = objects
            .iter()
            .map(|object| {
                headers
                    .iter()
                    .map(|header| object.get(header).map(RawEntry::from).unwrap_or(RawEntry::Missing))
                    .collect()
            })
            .collect();

        Ok(Self { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// First of `candidates` present in the headers, with its index.
    pub fn find_column<'a>(&self, candidates: &'a [String]) -> PromoDepthResult<(usize, &'a str)> {
        candidates
            .iter()
            .find_map(|name| self.column_index(name).map(|index| (index, name.as_str())))
            .ok_or_else(|| PromoDepthError::MissingColumn {
                expected: candidates.to_vec(),
            })
    }

    pub fn column(&self, index: usize) -> impl Iterator<Item = &RawEntry> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(index).unwrap_or(&MISSING))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn promo_columns() -> Vec<String> {
        vec![
            "Price & Promo".to_string(),
            "Price & Promo Details".to_string(),
        ]
    }

    #[test]
    fn test_csv_cells_and_missing_values() {
        let csv = "SKU,Price & Promo\nA1,19.90 - Buy 2 Get 1 Free\nA2,\nA3\n";
        let table = Table::from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["SKU", "Price & Promo"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[0][1], RawEntry::from("19.90 - Buy 2 Get 1 Free"));
        assert_eq!(table.rows[1][1], RawEntry::Missing);
        assert_eq!(table.rows[2][1], RawEntry::Missing);
    }

    #[test]
    fn test_json_values_keep_their_kind() {
        let json = r#"[
            {"Price & Promo": "50 - 20% off", "Qty": 3},
            {"Price & Promo": 42.5},
            {"Price & Promo": null}
        ]"#;
        let table = Table::from_json_str(json).unwrap();
        let index = table.column_index("Price & Promo").unwrap();
        let cells: Vec<&RawEntry> = table.column(index).collect();

        assert_eq!(cells[0], &RawEntry::from("50 - 20% off"));
        assert_eq!(cells[1], &RawEntry::NonText("42.5".to_string()));
        assert_eq!(cells[2], &RawEntry::Missing);
    }

    #[test]
    fn test_json_must_be_array_of_objects() {
        assert!(matches!(
            Table::from_json_str(r#"{"Price & Promo": "x"}"#),
            Err(PromoDepthError::InvalidJson(_))
        ));
        assert!(matches!(
            Table::from_json_str(r#"["x"]"#),
            Err(PromoDepthError::InvalidJson(_))
        ));
        assert!(matches!(
            Table::from_json_str("not json"),
            Err(PromoDepthError::Json(_))
        ));
    }

    #[test]
    fn test_first_recognized_column_wins() {
        let csv = "Price & Promo Details,Price & Promo\na,b\n";
        let table = Table::from_csv_reader(csv.as_bytes()).unwrap();
        let columns = promo_columns();
        let (index, name) = table.find_column(&columns).unwrap();
        assert_eq!((index, name), (1, "Price & Promo"));
    }

    #[test]
    fn test_missing_column_is_reported() {
        let table = Table::from_csv_reader("SKU,Price\nA1,10\n".as_bytes()).unwrap();
        let columns = promo_columns();
        match table.find_column(&columns) {
            Err(PromoDepthError::MissingColumn { expected }) => assert_eq!(expected, columns),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            TableFormat::from_path(Path::new("rows.CSV")).unwrap(),
            TableFormat::Csv
        );
        assert_eq!(TableFormat::parse("json").unwrap(), TableFormat::Json);
        assert!(matches!(
            TableFormat::from_path(Path::new("rows.xlsx")),
            Err(PromoDepthError::UnsupportedFormat(_))
        ));
    }
}
