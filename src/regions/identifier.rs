//! Identifier and label resolution for boundary features.
//!
//! Boundary files carry several overlapping identity fields, populated
//! inconsistently across countries. The policy is an ordered fallback: the first
//! field that is present and non-empty wins.

use serde_json::{Map, Value};

/// Candidate identifier fields, in priority order: administrative code, numeric
/// network identifier, English display name, generic name.
pub const ID_FIELDS: [&str; 4] = ["adm1_code", "ne_id", "name_en", "name"];

/// Candidate display-name fields, in priority order.
pub const NAME_FIELDS: [&str; 2] = ["name_en", "name"];

/// Field holding the parent administrative unit name.
pub const ADMIN_FIELD: &str = "admin";

/// Returns the first present, non-empty value among `fields`, rendered as a string.
pub fn first_present(properties: &Map<String, Value>, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .find_map(|field| properties.get(*field).and_then(value_as_text))
}

pub fn resolve_id(properties: &Map<String, Value>) -> Option<String> {
    first_present(properties, &ID_FIELDS)
}

pub fn resolve_name(properties: &Map<String, Value>) -> Option<String> {
    first_present(properties, &NAME_FIELDS)
}

pub fn resolve_admin(properties: &Map<String, Value>) -> Option<String> {
    first_present(properties, &[ADMIN_FIELD])
}

/// Identifier assigned when no candidate field resolves.
pub fn synthetic_id(index: usize) -> String {
    format!("region-{}", index)
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().map(|f| {
                    if f.fract() == 0.0 && f.abs() < 1e15 {
                        format!("{}", f as i64)
                    } else {
                        f.to_string()
                    }
                })
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn admin_code_wins_when_present() {
        let p = props(json!({"adm1_code": "PRT-1", "ne_id": 42, "name": "Lisboa"}));
        assert_eq!(resolve_id(&p).as_deref(), Some("PRT-1"));
    }

    #[test]
    fn empty_and_null_fields_fall_through() {
        let p = props(json!({"adm1_code": "", "ne_id": null, "name_en": "  ", "name": "Lisboa"}));
        assert_eq!(resolve_id(&p).as_deref(), Some("Lisboa"));
    }

    #[test]
    fn numeric_identifier_is_rendered_without_fraction() {
        let p = props(json!({"ne_id": 1159315805}));
        assert_eq!(resolve_id(&p).as_deref(), Some("1159315805"));
        let p = props(json!({"ne_id": 17.0}));
        assert_eq!(resolve_id(&p).as_deref(), Some("17"));
    }

    #[test]
    fn no_candidate_yields_none() {
        let p = props(json!({"admin": "Portugal", "iso": "PT"}));
        assert_eq!(resolve_id(&p), None);
        assert_eq!(synthetic_id(3), "region-3");
    }

    #[test]
    fn name_prefers_english() {
        let p = props(json!({"name_en": "Lisbon", "name": "Lisboa", "admin": "Portugal"}));
        assert_eq!(resolve_name(&p).as_deref(), Some("Lisbon"));
        assert_eq!(resolve_admin(&p).as_deref(), Some("Portugal"));
    }
}
