use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::model::aggregates::{AGGREGATE_KEYS, AggregateMetrics};

pub const GROUP1_TERM_WEIGHT: f64 = 0.33;
pub const GROUP2_TERM_WEIGHT: f64 = 0.5;
pub const GROUP3_TERM_WEIGHT: f64 = 0.5;

/// (FID + CNR + gCNR) : (KS^A + KS^B) : (Dice + ASD) = 5 : 3 : 2
pub const GROUP_WEIGHTS: [f64; 3] = [5.0, 3.0, 2.0];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinalScore {
    pub group1: f64,
    pub group2: f64,
    pub group3: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("aggregate record is not a JSON object (found {0})")]
    NotAnObject(&'static str),
    #[error("aggregate {key} is not numeric (found {found})")]
    NonNumeric { key: String, found: &'static str },
}

/// Absent terms contribute nothing; the remaining weights are not rescaled.
pub fn compute_final_score(m: &AggregateMetrics) -> FinalScore {
    let mut group1 = 0.0;
    if let Some(fid) = m.fid {
        group1 += (100.0 - fid) * GROUP1_TERM_WEIGHT;
    }
    if let Some(cnr) = m.cnr_mean {
        group1 += cnr * 100.0 * GROUP1_TERM_WEIGHT;
    }
    if let Some(gcnr) = m.gcnr_mean {
        group1 += gcnr * 100.0 * GROUP1_TERM_WEIGHT;
    }

    let mut group2 = 0.0;
    if let Some(ks_a) = m.ks_a_mean {
        group2 += (1.0 - ks_a) * 100.0 * GROUP2_TERM_WEIGHT;
    }
    if let Some(ks_b) = m.ks_b_mean {
        group2 += ks_b * 100.0 * GROUP2_TERM_WEIGHT;
    }

    let mut group3 = 0.0;
    if let Some(dice) = m.dice_mean {
        group3 += dice * 100.0 * GROUP3_TERM_WEIGHT;
    }
    if let Some(asd) = m.asd_mean {
        group3 += (1.0 - asd) * 100.0 * GROUP3_TERM_WEIGHT;
    }

    let value = (group1 * GROUP_WEIGHTS[0] + group2 * GROUP_WEIGHTS[1] + group3 * GROUP_WEIGHTS[2])
        / 10.0;
    FinalScore {
        group1,
        group2,
        group3,
        value,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Reads an untrusted aggregate record. Missing keys and `null` are absent;
/// unknown keys are ignored.
pub fn aggregates_from_json(value: &Value) -> Result<AggregateMetrics, ScoreError> {
    let Value::Object(obj) = value else {
        return Err(ScoreError::NotAnObject(json_type_name(value)));
    };
    let mut out = AggregateMetrics::default();
    for key in AGGREGATE_KEYS {
        let parsed = match obj.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => n.as_f64(),
            Some(other) => {
                return Err(ScoreError::NonNumeric {
                    key: key.to_string(),
                    found: json_type_name(other),
                });
            }
        };
        out.set(key, parsed);
    }
    Ok(out)
}

pub fn final_score_from_json(value: &Value) -> Result<FinalScore, ScoreError> {
    Ok(compute_final_score(&aggregates_from_json(value)?))
}

/// Best-effort score: any failure is logged and scored as 0.
pub fn score_or_zero(value: &Value) -> f64 {
    match final_score_from_json(value) {
        Ok(score) => score.value,
        Err(err) => {
            tracing::warn!("Error calculating final score: {err}");
            0.0
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/final_score.rs"]
mod tests;
