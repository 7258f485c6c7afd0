use crate::domain::model::{ListId, Voter};
use crate::utils::error::Result;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// One row of a voter export. Empty cells deserialize to `None`.
#[derive(Debug, Deserialize)]
struct VoterRow {
    list_id: String,
    voter_id: String,
    household_key: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    precinct: Option<String>,
    sort_order: Option<i64>,
}

impl From<VoterRow> for (ListId, Voter) {
    fn from(row: VoterRow) -> Self {
        (
            row.list_id,
            Voter {
                id: row.voter_id,
                household_key: row.household_key,
                lat: row.lat,
                lng: row.lng,
                precinct: row.precinct,
                sort_order: row.sort_order,
            },
        )
    }
}

/// Reads `list_id,voter_id,household_key,lat,lng,precinct,sort_order` rows.
pub fn read_voters<R: Read>(reader: R) -> Result<Vec<(ListId, Voter)>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.deserialize::<VoterRow>() {
        rows.push(record?.into());
    }
    tracing::debug!("Read {} voter rows", rows.len());
    Ok(rows)
}

pub fn load_voters<P: AsRef<Path>>(path: P) -> Result<Vec<(ListId, Voter)>> {
    let file = std::fs::File::open(path)?;
    read_voters(file)
}
