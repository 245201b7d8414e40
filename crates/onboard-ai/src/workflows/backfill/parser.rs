use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use std::io::Read;

/// One row of the legacy intake export, cleaned but not yet mapped onto the
/// pipeline.
#[derive(Debug)]
pub(crate) struct ExportRecord {
    pub(crate) tracking_code: Option<String>,
    pub(crate) company_name: String,
    pub(crate) registration_number: String,
    pub(crate) entity_type: String,
    pub(crate) country: String,
    pub(crate) incorporation_date: Option<NaiveDate>,
    pub(crate) contact_name: String,
    pub(crate) contact_email: String,
    pub(crate) website: Option<String>,
    pub(crate) expected_volume: Option<String>,
    pub(crate) status_label: String,
    pub(crate) submitted_at: Option<NaiveDateTime>,
}

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<ExportRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for record in csv_reader.deserialize::<ExportRow>() {
        let row = record?;
        let incorporation_date = row.incorporation_date();
        let submitted_at = row.submitted_at();

        records.push(ExportRecord {
            tracking_code: row.tracking_id,
            company_name: row.company_name,
            registration_number: row.registration_number,
            entity_type: row.entity_type,
            country: row.country,
            incorporation_date,
            contact_name: row.contact_name,
            contact_email: row.contact_email,
            website: row.website,
            expected_volume: row.expected_volume,
            status_label: row.status,
            submitted_at,
        });
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct ExportRow {
    #[serde(
        rename = "Tracking ID",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    tracking_id: Option<String>,
    #[serde(rename = "Company Name")]
    company_name: String,
    #[serde(rename = "Registration Number", default)]
    registration_number: String,
    #[serde(rename = "Entity Type", default)]
    entity_type: String,
    #[serde(rename = "Country", default)]
    country: String,
    #[serde(
        rename = "Incorporation Date",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    incorporation_date: Option<String>,
    #[serde(rename = "Contact Name", default)]
    contact_name: String,
    #[serde(rename = "Contact Email", default)]
    contact_email: String,
    #[serde(rename = "Website", default, deserialize_with = "empty_string_as_none")]
    website: Option<String>,
    #[serde(
        rename = "Expected Volume",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    expected_volume: Option<String>,
    #[serde(rename = "Status", default)]
    status: String,
    #[serde(
        rename = "Submitted At",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    submitted_at: Option<String>,
}

impl ExportRow {
    fn incorporation_date(&self) -> Option<NaiveDate> {
        self.incorporation_date.as_deref().and_then(parse_date)
    }

    fn submitted_at(&self) -> Option<NaiveDateTime> {
        self.submitted_at.as_deref().and_then(parse_datetime)
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Exports written by different tool versions carry either RFC 3339
/// timestamps or bare dates.
fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    None
}

#[cfg(test)]
pub(crate) fn parse_datetime_for_tests(value: &str) -> Option<NaiveDateTime> {
    parse_datetime(value)
}
