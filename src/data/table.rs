//! CSV tables and row cleaning.
//!
//! The entity table has columns `id`, `name`, `lng`, `lat`; the relationship
//! table has `instA_coords` and `instB_coords`, each a JSON `[lng, lat]`
//! pair, plus an optional `count`. Extra columns are ignored.

use serde::Deserialize;
use std::io::Read;

use super::model::{Entity, LngLat, Relationship};
use super::{LoadError, RowError};

const ENTITY_COLUMNS: [&str; 2] = ["lng", "lat"];
const RELATIONSHIP_COLUMNS: [&str; 2] = ["instA_coords", "instB_coords"];

/// One raw row of the entity table, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityRow {
    pub id: Option<String>,
    pub name: Option<String>,
    pub lng: Option<String>,
    pub lat: Option<String>,
}

/// One raw row of the relationship table, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelationshipRow {
    #[serde(rename = "instA_coords")]
    pub source: Option<String>,
    #[serde(rename = "instB_coords")]
    pub target: Option<String>,
    pub count: Option<String>,
}

/// How many rows of a table survived cleaning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableReport {
    pub kept: usize,
    pub dropped: usize,
}

impl TableReport {
    pub fn total(&self) -> usize {
        self.kept + self.dropped
    }
}

/// Parses a JSON-encoded `[lng, lat]` pair.
pub fn parse_coordinate_pair(raw: &str) -> Result<LngLat, RowError> {
    let [lng, lat]: [f64; 2] = serde_json::from_str(raw.trim())
        .map_err(|_| RowError::InvalidCoordinatePair(raw.to_string()))?;
    LngLat::new(lng, lat)
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, RowError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(RowError::MissingField(field))
}

fn parse_number(value: &Option<String>, field: &'static str) -> Result<f64, RowError> {
    let raw = required(value, field)?;
    raw.parse().map_err(|_| RowError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

fn parse_entity_row(index: usize, row: &EntityRow) -> Result<Entity, RowError> {
    let lng = parse_number(&row.lng, "lng")?;
    let lat = parse_number(&row.lat, "lat")?;
    let position = LngLat::new(lng, lat)?;

    let id = match required(&row.id, "id") {
        Ok(id) => id.to_string(),
        Err(_) => index.to_string(),
    };
    let name = row.name.as_deref().map(str::trim).unwrap_or_default();

    Ok(Entity {
        id,
        name: name.to_string(),
        position,
    })
}

fn parse_relationship_row(row: &RelationshipRow) -> Result<Relationship, RowError> {
    let source = parse_coordinate_pair(required(&row.source, "instA_coords")?)?;
    let target = parse_coordinate_pair(required(&row.target, "instB_coords")?)?;

    // The weight is optional: an unreadable one is treated as absent.
    let count = row.count.as_deref().and_then(|c| c.trim().parse().ok());

    Ok(Relationship {
        source,
        target,
        count,
    })
}

/// Validates in-memory entity rows, dropping malformed ones.
pub fn entities_from_rows(
    rows: impl IntoIterator<Item = EntityRow>,
) -> (Vec<Entity>, TableReport) {
    let mut report = TableReport::default();
    let entities = rows
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| match parse_entity_row(index, &row) {
            Ok(entity) => {
                report.kept += 1;
                Some(entity)
            }
            Err(e) => {
                log::warn!("Dropping entity row {}: {}", index, e);
                report.dropped += 1;
                None
            }
        })
        .collect();
    (entities, report)
}

/// Validates in-memory relationship rows, dropping malformed ones.
pub fn relationships_from_rows(
    rows: impl IntoIterator<Item = RelationshipRow>,
) -> (Vec<Relationship>, TableReport) {
    let mut report = TableReport::default();
    let relationships = rows
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| match parse_relationship_row(&row) {
            Ok(relationship) => {
                report.kept += 1;
                Some(relationship)
            }
            Err(e) => {
                log::warn!("Dropping relationship row {}: {}", index, e);
                report.dropped += 1;
                None
            }
        })
        .collect();
    (relationships, report)
}

/// Reads raw rows from a CSV stream after checking the header.
///
/// A row the CSV reader cannot decode (wrong field count, bad UTF-8) becomes
/// an empty row so that it is counted as dropped; an I/O error fails the
/// whole table.
fn read_rows<T, R>(reader: R, columns: &[&'static str]) -> Result<Vec<T>, LoadError>
where
    T: for<'de> Deserialize<'de> + Default,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    if let Some(missing) = columns.iter().find(|c| !headers.iter().any(|h| h == **c)) {
        return Err(LoadError::MissingColumn(*missing));
    }

    let mut rows = Vec::new();
    for result in csv_reader.deserialize::<T>() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                log::debug!("Unreadable CSV record: {}", e);
                rows.push(T::default());
            }
        }
    }
    Ok(rows)
}

/// Reads and cleans the entity table.
pub fn read_entities<R: Read>(reader: R) -> Result<(Vec<Entity>, TableReport), LoadError> {
    let rows = read_rows::<EntityRow, _>(reader, &ENTITY_COLUMNS)?;
    Ok(entities_from_rows(rows))
}

/// Reads and cleans the relationship table.
pub fn read_relationships<R: Read>(
    reader: R,
) -> Result<(Vec<Relationship>, TableReport), LoadError> {
    let rows = read_rows::<RelationshipRow, _>(reader, &RELATIONSHIP_COLUMNS)?;
    Ok(relationships_from_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_row(id: &str, lng: &str, lat: &str) -> EntityRow {
        EntityRow {
            id: Some(id.to_string()),
            name: Some(format!("Institution {id}")),
            lng: Some(lng.to_string()),
            lat: Some(lat.to_string()),
        }
    }

    #[test]
    fn test_entity_count_matches_valid_rows() {
        let rows = vec![
            entity_row("1", "0.45", "51.47"),
            entity_row("2", "", "40.0"),
            entity_row("3", "-73.9", "north"),
            entity_row("4", "-73.9", "40.7"),
            entity_row("5", "200", "10"),
        ];

        let (entities, report) = entities_from_rows(rows);

        assert_eq!(entities.len(), 2);
        assert_eq!(report, TableReport { kept: 2, dropped: 3 });
        assert_eq!(entities[0].id, "1");
        assert_eq!(entities[1].id, "4");
    }

    #[test]
    fn test_entity_id_falls_back_to_row_index() {
        let mut row = entity_row("x", "1.0", "2.0");
        row.id = None;
        row.name = None;

        let (entities, _) = entities_from_rows(vec![EntityRow::default(), row]);

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].id, "1");
        assert_eq!(entities[0].name, "");
    }

    #[test]
    fn test_parse_coordinate_pair() {
        let pos = parse_coordinate_pair(" [-122.4, 37.79] ").unwrap();
        assert_eq!(pos.lng(), -122.4);
        assert_eq!(pos.lat(), 37.79);

        assert!(matches!(
            parse_coordinate_pair("[1.0]"),
            Err(RowError::InvalidCoordinatePair(_))
        ));
        assert!(matches!(
            parse_coordinate_pair("not json"),
            Err(RowError::InvalidCoordinatePair(_))
        ));
        assert!(matches!(
            parse_coordinate_pair("[0, 95]"),
            Err(RowError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_unparsable_relationship_row_is_dropped() {
        let csv = "instA_coords,instB_coords,count\n\
                   \"[0.45, 51.47]\",\"[-73.9, 40.7]\",3\n\
                   \"[2.35, 48.85]\",\"[oops\",1\n\
                   \"[13.4, 52.5]\",\"[2.35, 48.85]\",many\n";

        let (relationships, report) = read_relationships(csv.as_bytes()).unwrap();

        assert_eq!(report, TableReport { kept: 2, dropped: 1 });
        assert_eq!(relationships[0].count, Some(3));
        assert_eq!(relationships[1].count, None);
    }

    #[test]
    fn test_read_entities_ignores_extra_columns() {
        let csv = "id,name,country,lng,lat\n\
                   1,Heathrow Lab,UK,0.45,51.47\n\
                   2,Nowhere,??,,\n";

        let (entities, report) = read_entities(csv.as_bytes()).unwrap();

        assert_eq!(entities.len(), 1);
        assert_eq!(report.total(), 2);
        assert_eq!(entities[0].name, "Heathrow Lab");
        assert_eq!(entities[0].position, LngLat::new(0.45, 51.47).unwrap());
    }

    #[test]
    fn test_missing_column_fails_table() {
        let csv = "id,name,lng\n1,A,0.0\n";

        let err = read_entities(csv.as_bytes()).unwrap_err();

        assert!(matches!(err, LoadError::MissingColumn("lat")));
    }

    #[test]
    fn test_ragged_record_counts_as_dropped() {
        let csv = "id,name,lng,lat\n1,A,0.0,0.0\n2,B,1.0\n";

        let (entities, report) = read_entities(csv.as_bytes()).unwrap();

        assert_eq!(entities.len(), 1);
        assert_eq!(report, TableReport { kept: 1, dropped: 1 });
    }
}
