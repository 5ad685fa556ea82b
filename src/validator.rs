// ==============================================================================
// validator.rs - Variant Field & Query Validation
// ==============================================================================
// Description: Domain rules for variant records and /result query parameters
// Author: Matt Barham
// Created: 2026-10-17
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================

use serde::Deserialize;
use serde_json::{Map, Value};
use ::validator::{Validate, ValidationErrors};

use crate::models::{CHROM_COLUMN, ID_COLUMN, POS_COLUMN};

/// Fields every submitted record must carry
pub const REQUIRED_FIELDS: [&str; 5] = [CHROM_COLUMN, ID_COLUMN, POS_COLUMN, "ALT", "REF"];

/// Fixed VCF columns; anything else must be a sample column of the table
pub const FIXED_FIELDS: [&str; 9] = [
    CHROM_COLUMN,
    POS_COLUMN,
    ID_COLUMN,
    "REF",
    "ALT",
    "QUAL",
    "FILTER",
    "INFO",
    "FORMAT",
];

const ALLELES: [&str; 5] = ["A", "C", "G", "T", "."];
const CHROM_PREFIX: &str = "chr";
const NAMED_CHROMOSOMES: [&str; 3] = ["X", "Y", "M"];

/// Query parameters accepted by `/result`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ResultQuery {
    pub id: Option<String>,

    #[validate(range(min = 1, message = "page must be an integer >= 1"))]
    pub page: Option<i64>,

    #[validate(range(min = 1, message = "per_page must be an integer >= 1"))]
    pub per_page: Option<i64>,
}

/// Flatten `validator` errors into sorted human-readable messages
pub fn error_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("invalid value for '{}'", field),
            })
        })
        .collect();
    messages.sort();
    messages
}

/// Check a candidate record against the per-field rules
///
/// Needs nothing from the store, so it runs before the table is loaded.
/// Returns every violation found, except that missing required fields
/// short-circuit. Field membership is checked separately by
/// [`unknown_fields`] once the table's columns are known.
pub fn validate_record(candidate: &Map<String, Value>) -> Vec<String> {
    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !candidate.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        return vec![format!(
            "Missing required field(s): {}",
            missing.join(", ")
        )];
    }

    candidate
        .iter()
        .filter_map(|(field, value)| {
            let result = match field.as_str() {
                CHROM_COLUMN => check_chrom(value),
                POS_COLUMN => check_pos(value),
                ID_COLUMN => check_id(value),
                "ALT" | "REF" => check_allele(field, value),
                _ => Ok(()),
            };
            result.err()
        })
        .collect()
}

/// Fields that are neither fixed VCF columns nor columns of `schema`
///
/// `schema` is the column list of the loaded table; its non-fixed columns are
/// the sample genotype columns a payload may also set.
pub fn unknown_fields(candidate: &Map<String, Value>, schema: &[String]) -> Vec<String> {
    candidate
        .keys()
        .filter(|key| !FIXED_FIELDS.contains(&key.as_str()))
        .filter(|key| !schema.iter().any(|column| column == *key))
        .map(|key| format!("Unknown field: {}", key))
        .collect()
}

fn check_chrom(value: &Value) -> Result<(), String> {
    let chrom = value
        .as_str()
        .ok_or_else(|| "CHROM must be a string".to_string())?;

    let suffix = chrom
        .strip_prefix(CHROM_PREFIX)
        .ok_or_else(|| format!("CHROM must start with 'chr', got '{}'", chrom))?;

    if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
        return match suffix.parse::<u32>() {
            Ok(1..=22) => Ok(()),
            _ => Err(format!(
                "CHROM number must be between 1 and 22, got '{}'",
                chrom
            )),
        };
    }

    if NAMED_CHROMOSOMES.contains(&suffix) {
        Ok(())
    } else {
        Err(format!(
            "CHROM must be chr1-chr22, chrX, chrY or chrM, got '{}'",
            chrom
        ))
    }
}

fn check_pos(value: &Value) -> Result<(), String> {
    if value.is_i64() || value.is_u64() {
        Ok(())
    } else {
        Err(format!("POS must be an integer, got {}", value))
    }
}

fn check_id(value: &Value) -> Result<(), String> {
    let valid = value
        .as_str()
        .and_then(|id| id.strip_prefix("rs"))
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()));

    if valid {
        Ok(())
    } else {
        Err(format!("ID must be 'rs' followed by digits, got {}", value))
    }
}

fn check_allele(field: &str, value: &Value) -> Result<(), String> {
    match value.as_str() {
        Some(allele) if ALLELES.contains(&allele) => Ok(()),
        _ => Err(format!(
            "{} must be one of A, C, G, T or '.', got {}",
            field, value
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Vec<String> {
        ["CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO", "FORMAT", "NA00001"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn candidate(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn valid() -> Map<String, Value> {
        candidate(json!({"CHROM": "chrX", "POS": 102222200, "ALT": "A", "REF": "G", "ID": "rs123"}))
    }

    fn with(field: &str, value: Value) -> Map<String, Value> {
        let mut record = valid();
        record.insert(field.to_string(), value);
        record
    }

    #[test]
    fn test_valid_record() {
        assert!(validate_record(&valid()).is_empty());
    }

    #[test]
    fn test_optional_and_sample_columns_accepted() {
        let mut record = with("QUAL", json!("50"));
        record.insert("NA00001".to_string(), json!("0|1"));
        assert!(validate_record(&record).is_empty());
        assert!(unknown_fields(&record, &schema()).is_empty());
    }

    #[test]
    fn test_unknown_fields_checked_against_table_columns() {
        let record = with("NA00002", json!("0|0"));
        assert_eq!(unknown_fields(&record, &schema()), vec!["Unknown field: NA00002"]);

        // Fixed columns are known even when the table lacks them
        let narrow: Vec<String> = REQUIRED_FIELDS.iter().map(|s| s.to_string()).collect();
        assert!(unknown_fields(&with("INFO", json!("DP=1")), &narrow).is_empty());
    }

    #[test]
    fn test_missing_fields_short_circuit() {
        // Bad CHROM would also fail, but only one violation is reported
        let record = candidate(json!({"CHROM": "wrong", "POS": 1, "BOGUS": 1}));
        let violations = validate_record(&record);

        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("Missing required field(s)"));
        assert!(violations[0].contains("ID"));
        assert!(violations[0].contains("ALT"));
        assert!(violations[0].contains("REF"));
    }

    #[test]
    fn test_chrom_boundaries() {
        for chrom in ["chr1", "chr22", "chrX", "chrY", "chrM"] {
            assert!(validate_record(&with("CHROM", json!(chrom))).is_empty(), "{chrom}");
        }
        for chrom in ["chr23", "chr0", "chrQ", "21", "chr", "wrongCHROM"] {
            assert_eq!(validate_record(&with("CHROM", json!(chrom))).len(), 1, "{chrom}");
        }
    }

    #[test]
    fn test_chrom_reports_failed_sub_rule() {
        let no_prefix = validate_record(&with("CHROM", json!("21")));
        assert!(no_prefix[0].contains("must start with 'chr'"));

        let out_of_range = validate_record(&with("CHROM", json!("chr23")));
        assert!(out_of_range[0].contains("between 1 and 22"));

        let unknown_name = validate_record(&with("CHROM", json!("chrQ")));
        assert!(unknown_name[0].contains("chrX, chrY or chrM"));
    }

    #[test]
    fn test_id_boundaries() {
        assert!(validate_record(&with("ID", json!("rs123"))).is_empty());
        assert_eq!(validate_record(&with("ID", json!("rs12a"))).len(), 1);
        assert_eq!(validate_record(&with("ID", json!("123"))).len(), 1);
        assert_eq!(validate_record(&with("ID", json!("rs"))).len(), 1);
    }

    #[test]
    fn test_pos_must_be_integer_type() {
        assert_eq!(validate_record(&with("POS", json!("100"))).len(), 1);
        assert_eq!(validate_record(&with("POS", json!(1.5))).len(), 1);
    }

    #[test]
    fn test_alleles() {
        assert!(validate_record(&with("ALT", json!("."))).is_empty());
        assert_eq!(validate_record(&with("REF", json!("AT"))).len(), 1);
        assert_eq!(validate_record(&with("ALT", json!("N"))).len(), 1);
    }

    #[test]
    fn test_violations_accumulate() {
        let record = candidate(json!({
            "CHROM": "chr99", "POS": "1", "ALT": "Z", "REF": "G", "ID": "x1", "EXTRA": 1
        }));
        let violations = validate_record(&record);
        assert_eq!(violations.len(), 4);
        assert!(violations[0].starts_with("CHROM"));
        assert!(violations.iter().all(|v| !v.contains("EXTRA")));

        assert_eq!(unknown_fields(&record, &schema()), vec!["Unknown field: EXTRA"]);
    }

    #[test]
    fn test_query_ranges() {
        let query = ResultQuery {
            id: Some("rs1".to_string()),
            page: Some(0),
            per_page: Some(-1),
        };
        let errors = query.validate().unwrap_err();
        let messages = error_messages(&errors);
        assert_eq!(
            messages,
            vec![
                "page must be an integer >= 1".to_string(),
                "per_page must be an integer >= 1".to_string(),
            ]
        );

        assert!(ResultQuery::default().validate().is_ok());
    }
}
