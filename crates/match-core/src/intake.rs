//! Record intake
//!
//! Converts stored patient/donor records into engine inputs. This is where
//! closed-set fields are enforced and loose numeric/JSON data is coerced:
//!
//! - Unknown blood group, organ or status: rejected with [`IntakeError`]
//! - Numbers given as strings are parsed; unparseable numbers use defaults
//! - `organ_metrics` may be an object or a JSON string; anything that does not
//!   decode for the record's organ becomes "no metrics"
//! - `medical_history` may be an array or a JSON string; anything else becomes
//!   an empty history
//!
//! Degraded fields are logged at `warn` and otherwise silent. A malformed
//! history therefore hides any contraindication it contained.

use crate::model::{
    BloodGroup, Donor, DonorMetrics, Organ, Patient, RecipientMetrics, RecordStatus,
};
use crate::IntakeError;
use chrono::NaiveDate;
use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Patient record as stored by the registry
#[derive(Clone, Debug, Deserialize)]
pub struct RawPatient {
    pub patient_id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub dob: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub blood_group: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient::opt_float")]
    pub weight_kg: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_float")]
    pub height_cm: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub organ_needed: String,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub urgency_score: Option<i64>,
    #[serde(default)]
    pub organ_metrics: Value,
    #[serde(default)]
    pub medical_history: Value,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub status: Option<String>,
}

/// Donor record as stored by the registry
#[derive(Clone, Debug, Deserialize)]
pub struct RawDonor {
    pub donor_id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub dob: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub blood_group: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient::opt_float")]
    pub weight_kg: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_float")]
    pub height_cm: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub organ_type: String,
    #[serde(default)]
    pub organ_metrics: Value,
    #[serde(default)]
    pub medical_history: Value,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub status: Option<String>,
}

impl TryFrom<RawPatient> for Patient {
    type Error = IntakeError;

    fn try_from(raw: RawPatient) -> Result<Self, Self::Error> {
        let id = raw.patient_id.trim().to_string();
        let organ_needed: Organ = closed_set(&id, &raw.organ_needed)?;
        let blood_group: BloodGroup = closed_set(&id, &raw.blood_group)?;
        let status = parse_status(&id, raw.status.as_deref())?;
        let date_of_birth = parse_dob(&id, &raw.dob)?;
        let weight_kg = measurement(&id, "weight_kg", raw.weight_kg)?;
        let height_cm = measurement(&id, "height_cm", raw.height_cm)?;
        let urgency_score = raw.urgency_score.unwrap_or(0).clamp(0, 100) as u8;

        let organ_metrics = metrics_object(&id, &raw.organ_metrics)
            .and_then(|object| recipient_metrics(&id, organ_needed, object));
        let medical_history = history(&id, &raw.medical_history);

        Ok(Patient {
            patient_id: id,
            name: raw.name,
            organ_needed,
            blood_group,
            date_of_birth,
            weight_kg,
            height_cm,
            location: raw.location,
            urgency_score,
            organ_metrics,
            medical_history,
            status,
        })
    }
}

impl TryFrom<RawDonor> for Donor {
    type Error = IntakeError;

    fn try_from(raw: RawDonor) -> Result<Self, Self::Error> {
        let id = raw.donor_id.trim().to_string();
        let organ_type: Organ = closed_set(&id, &raw.organ_type)?;
        let blood_group: BloodGroup = closed_set(&id, &raw.blood_group)?;
        let status = parse_status(&id, raw.status.as_deref())?;
        let date_of_birth = parse_dob(&id, &raw.dob)?;
        let weight_kg = measurement(&id, "weight_kg", raw.weight_kg)?;
        let height_cm = measurement(&id, "height_cm", raw.height_cm)?;

        let organ_metrics = metrics_object(&id, &raw.organ_metrics)
            .and_then(|object| donor_metrics(&id, organ_type, object));
        let medical_history = history(&id, &raw.medical_history);

        Ok(Donor {
            donor_id: id,
            name: raw.name,
            organ_type,
            blood_group,
            date_of_birth,
            weight_kg,
            height_cm,
            location: raw.location,
            organ_metrics,
            medical_history,
            status,
        })
    }
}

/// Read a JSON array of patient records
pub fn load_patients(path: impl AsRef<Path>) -> Result<Vec<Patient>, IntakeError> {
    let content = fs::read_to_string(path)?;
    patients_from_json(&content)
}

/// Read a JSON array of donor records
pub fn load_donors(path: impl AsRef<Path>) -> Result<Vec<Donor>, IntakeError> {
    let content = fs::read_to_string(path)?;
    donors_from_json(&content)
}

pub fn patients_from_json(json: &str) -> Result<Vec<Patient>, IntakeError> {
    let raw: Vec<RawPatient> = serde_json::from_str(json)?;
    raw.into_iter().map(Patient::try_from).collect()
}

pub fn donors_from_json(json: &str) -> Result<Vec<Donor>, IntakeError> {
    let raw: Vec<RawDonor> = serde_json::from_str(json)?;
    raw.into_iter().map(Donor::try_from).collect()
}

fn closed_set<T>(record: &str, value: &str) -> Result<T, IntakeError>
where
    T: std::str::FromStr<Err = crate::model::UnknownValue>,
{
    value.parse().map_err(|source| IntakeError::Rejected {
        record: record.to_string(),
        source,
    })
}

fn parse_status(record: &str, value: Option<&str>) -> Result<RecordStatus, IntakeError> {
    match value {
        None => Ok(RecordStatus::default()),
        Some(status) => closed_set(record, status),
    }
}

fn parse_dob(record: &str, value: &str) -> Result<NaiveDate, IntakeError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| IntakeError::InvalidDate {
        record: record.to_string(),
        value: value.to_string(),
    })
}

fn measurement(record: &str, field: &'static str, value: Option<f64>) -> Result<f64, IntakeError> {
    let value = value.unwrap_or(0.0);
    if value < 0.0 {
        return Err(IntakeError::InvalidMeasurement {
            record: record.to_string(),
            field,
            value,
        });
    }
    Ok(value)
}

/// Non-empty metrics object, unwrapping JSON-encoded strings
fn metrics_object(record: &str, value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) if map.is_empty() => None,
        Value::Object(_) => Some(value.clone()),
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(inner @ Value::Object(_)) => metrics_object(record, &inner),
            _ => {
                warn!("Record {}: unreadable organ_metrics, treating as empty", record);
                None
            }
        },
        _ => {
            warn!("Record {}: organ_metrics is not an object, treating as empty", record);
            None
        }
    }
}

fn decode<T: DeserializeOwned>(record: &str, object: Value) -> Option<T> {
    match serde_json::from_value(object) {
        Ok(metrics) => Some(metrics),
        Err(e) => {
            warn!("Record {}: organ_metrics did not decode ({}), treating as empty", record, e);
            None
        }
    }
}

fn recipient_metrics(record: &str, organ: Organ, object: Value) -> Option<RecipientMetrics> {
    Some(match organ {
        Organ::Kidney => RecipientMetrics::Kidney(decode(record, object)?),
        Organ::Liver => RecipientMetrics::Liver(decode(record, object)?),
        Organ::Heart => RecipientMetrics::Heart(decode(record, object)?),
        Organ::Lung => RecipientMetrics::Lung(decode(record, object)?),
        Organ::Pancreas => RecipientMetrics::Pancreas(decode(record, object)?),
    })
}

fn donor_metrics(record: &str, organ: Organ, object: Value) -> Option<DonorMetrics> {
    Some(match organ {
        Organ::Kidney => DonorMetrics::Kidney(decode(record, object)?),
        Organ::Liver => DonorMetrics::Liver(decode(record, object)?),
        Organ::Heart => DonorMetrics::Heart(decode(record, object)?),
        Organ::Lung => DonorMetrics::Lung(decode(record, object)?),
        Organ::Pancreas => DonorMetrics::Pancreas(decode(record, object)?),
    })
}

/// Condition labels from an array or a JSON-encoded array
fn history(record: &str, value: &Value) -> BTreeSet<String> {
    match value {
        Value::Null => BTreeSet::new(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string)
            .collect(),
        Value::String(text) if text.trim().is_empty() => BTreeSet::new(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(inner @ Value::Array(_)) => history(record, &inner),
            _ => {
                warn!("Record {}: unreadable medical_history, treating as empty", record);
                BTreeSet::new()
            }
        },
        _ => {
            warn!("Record {}: medical_history is not a list, treating as empty", record);
            BTreeSet::new()
        }
    }
}

/// Forgiving field deserializers for hand-entered numeric and text data
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn as_float(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|v| v.is_finite())
    }

    fn as_int(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    pub fn opt_float<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(as_float(&Value::deserialize(d)?))
    }

    pub fn opt_int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(as_int(&Value::deserialize(d)?))
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(opt_text(d)?.unwrap_or_default())
    }
}
