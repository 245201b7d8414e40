//! Import of cases from the retired intake tool's CSV export.
//!
//! The importer only maps rows onto seeds; writing the cases back through
//! the service is the caller's job, so a dry run is just an import whose
//! seeds are thrown away.

mod mapping;
mod parser;

use crate::workflows::onboarding::cases::{
    AmlDeclarations, CaseSeed, CaseStatus, CaseSubmission, CompanyAddress, SettlementDetails,
};
use chrono::{TimeZone, Utc};
use serde::Serialize;
use std::io::Read;
use std::path::Path;

use parser::ExportRecord;

#[derive(Debug)]
pub enum CaseBackfillImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for CaseBackfillImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaseBackfillImportError::Io(err) => {
                write!(f, "failed to read intake export: {}", err)
            }
            CaseBackfillImportError::Csv(err) => {
                write!(f, "invalid intake export data: {}", err)
            }
        }
    }
}

impl std::error::Error for CaseBackfillImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaseBackfillImportError::Io(err) => Some(err),
            CaseBackfillImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CaseBackfillImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CaseBackfillImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// A row the import refused, with the first row of data counted as row 2 to
/// match what the operator sees in a spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    pub row: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_code: Option<String>,
    pub reason: String,
}

/// Result of one import: seeds ready to restore, plus everything that was
/// skipped and why.
#[derive(Debug)]
pub struct CaseBackfill {
    pub seeds: Vec<CaseSeed>,
    pub skipped: Vec<SkippedRow>,
}

pub struct CaseBackfillImporter;

impl CaseBackfillImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<CaseBackfill, CaseBackfillImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<CaseBackfill, CaseBackfillImportError> {
        let mut seeds = Vec::new();
        let mut skipped = Vec::new();

        for (index, record) in parser::parse_records(reader)?.into_iter().enumerate() {
            let row = index as u64 + 2;

            let Some(status) = mapping::status_for_label(&record.status_label) else {
                skipped.push(SkippedRow {
                    row,
                    tracking_code: record.tracking_code,
                    reason: format!("unrecognized status label '{}'", record.status_label),
                });
                continue;
            };

            if record.incorporation_date.is_none() {
                skipped.push(SkippedRow {
                    row,
                    tracking_code: record.tracking_code,
                    reason: "missing incorporation date".to_string(),
                });
                continue;
            }

            seeds.push(seed_from_record(record, status));
        }

        Ok(CaseBackfill { seeds, skipped })
    }
}

fn seed_from_record(record: ExportRecord, status: CaseStatus) -> CaseSeed {
    let submitted_at = record
        .submitted_at
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or_else(Utc::now);

    let (contact_first_name, contact_last_name) = split_contact_name(&record.contact_name);

    // The export predates the structured ownership and AML sections, so
    // those arrive empty and reviewers re-collect them on demand.
    let submission = CaseSubmission {
        company_name: record.company_name,
        registration_number: record.registration_number,
        entity_type: record.entity_type,
        country: record.country,
        incorporation_date: record
            .incorporation_date
            .unwrap_or_else(|| submitted_at.date_naive()),
        website: record.website,
        contact_first_name,
        contact_last_name,
        contact_email: record.contact_email,
        address: CompanyAddress {
            street: String::new(),
            city: String::new(),
            state: None,
            postal_code: String::new(),
        },
        directors: Vec::new(),
        ubos: Vec::new(),
        declarations: AmlDeclarations {
            sanctions_exposure: false,
            source_of_funds: String::new(),
            source_of_wealth: String::new(),
            expected_volume: record.expected_volume.unwrap_or_default(),
            aml_program_confirmed: false,
        },
        banking: SettlementDetails {
            bank_name: String::new(),
            routing_number: None,
            account_number: None,
        },
    };

    CaseSeed {
        submission,
        status,
        submitted_at,
        tracking_code: record.tracking_code,
    }
}

fn split_contact_name(full: &str) -> (String, String) {
    let collapsed = full.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.rsplit_once(' ') {
        Some((first, last)) => (first.to_string(), last.to_string()),
        None => (collapsed, String::new()),
    }
}
