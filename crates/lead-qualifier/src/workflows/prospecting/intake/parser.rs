use std::collections::BTreeMap;
use std::io::Read;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::IntakeError;

const NAME_KEYS: &[&str] = &["name", "nome", "title"];
const PHONE_KEYS: &[&str] = &["phone", "telefone"];
const WEBSITE_KEYS: &[&str] = &["website", "site", "url"];
const ADDRESS_KEYS: &[&str] = &["address", "endereco", "endereço", "formatted_address"];
const INDUSTRY_KEYS: &[&str] = &["industry_code", "cnae"];
const SOCIAL_KEYS: &[&str] = &["social_handle", "instagram"];
const SOCIAL_GROUP_KEYS: &[&str] = &["redes_sociais", "social_media"];
const CONTACT_KEYS: &[&str] = &["contact", "whatsapp"];
const REGISTRY_KEYS: &[&str] = &["registry_id", "cnpj"];
const SOURCE_KEYS: &[&str] = &["source", "fonte"];
const COLLECTED_AT_KEYS: &[&str] = &["collected_at", "data_coleta"];

/// One record as a collector exported it, before any validation.
///
/// Field names follow the English schema; the Portuguese keys used by the collectors are
/// accepted as aliases, with the English key winning when both are present. Numbers and
/// booleans are read as text; nested values are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawRecord {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub industry_code: Option<String>,
    pub social_handle: Option<String>,
    pub contact: Option<String>,
    pub registry_id: Option<String>,
    pub source: Option<String>,
    pub collected_at: Option<String>,
}

impl RawRecord {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Reads one exported entry. Anything that is not an object yields an empty record,
    /// which normalization then rejects on its own without affecting its neighbours.
    pub fn from_value(value: &Value) -> Self {
        match value.as_object() {
            Some(fields) => Self::from_fields(fields),
            None => Self::default(),
        }
    }

    fn from_fields(fields: &Map<String, Value>) -> Self {
        let fields: BTreeMap<String, &Value> = fields
            .iter()
            .map(|(key, value)| (key.trim().to_lowercase(), value))
            .collect();
        let pick = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| fields.get(*key).and_then(|value| scalar_text(value)))
        };

        Self {
            name: pick(NAME_KEYS),
            phone: pick(PHONE_KEYS),
            website: pick(WEBSITE_KEYS),
            address: pick(ADDRESS_KEYS),
            industry_code: pick(INDUSTRY_KEYS),
            social_handle: pick(SOCIAL_KEYS).or_else(|| {
                SOCIAL_GROUP_KEYS
                    .iter()
                    .find_map(|key| fields.get(*key).and_then(|value| grouped_handle(value)))
            }),
            contact: pick(CONTACT_KEYS),
            registry_id: pick(REGISTRY_KEYS),
            source: pick(SOURCE_KEYS),
            collected_at: pick(COLLECTED_AT_KEYS),
        }
    }
}

impl<'de> Deserialize<'de> for RawRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// Parses a CSV export. Headers are matched case-insensitively; unknown columns are ignored.
///
/// A row that cannot be decoded becomes an empty record at its position so the rest of the
/// file still loads; only I/O failures abort the parse.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<RawRecord>, IntakeError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut records = Vec::new();

    // Cells go through a JSON map so they stay text: csv's own type inference would
    // turn "0119..." into a number and drop the leading zero.
    for (index, row) in csv_reader
        .deserialize::<BTreeMap<String, String>>()
        .enumerate()
    {
        match row {
            Ok(row) => {
                let fields = row
                    .into_iter()
                    .map(|(header, cell)| (header, Value::String(cell)))
                    .collect::<Map<_, _>>();
                records.push(RawRecord::from_fields(&fields));
            }
            Err(error) if error.is_io_error() => return Err(error.into()),
            Err(error) => {
                warn!(row = index, error = %error, "unreadable CSV row");
                records.push(RawRecord::default());
            }
        }
    }

    Ok(records)
}

/// Parses a JSON array of records. Elements are read one by one, so a malformed element
/// only affects its own position.
pub fn parse_json<R: Read>(reader: R) -> Result<Vec<RawRecord>, IntakeError> {
    let entries: Vec<Value> = serde_json::from_reader(reader)?;
    Ok(entries.iter().map(RawRecord::from_value).collect())
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };

    (!text.trim().is_empty()).then_some(text)
}

/// First handle inside a `{"instagram": "...", "facebook": "..."}` style group.
fn grouped_handle(value: &Value) -> Option<String> {
    let group = value.as_object()?;
    group
        .get("instagram")
        .and_then(scalar_text)
        .or_else(|| group.values().find_map(scalar_text))
}
