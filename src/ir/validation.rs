//! Request validation.
//!
//! Documents built in code are well formed, but requests can also arrive
//! from a replayed log, so the server validates every envelope before
//! executing it.

use serde_json::Value;

use crate::error::ValidationError;
use crate::ir::operations::Request;

/// Conservative upper bound for free-form string variables.
pub const MAX_TEXT_LEN: usize = 16 * 1024;

fn longest_string(value: &Value) -> usize {
    match value {
        Value::String(s) => s.len(),
        Value::Array(items) => items.iter().map(longest_string).max().unwrap_or(0),
        Value::Object(map) => map.values().map(longest_string).max().unwrap_or(0),
        _ => 0,
    }
}

/// Validate a request envelope.
///
/// # Errors
/// - `DocumentHashMismatch`: the declared hash does not match the document
/// - `InvalidVariables`: variables are not an object or a non-null
///   variable is missing
/// - `FieldTooLong`: a string variable exceeds [`MAX_TEXT_LEN`]
pub fn validate_request(request: &Request) -> Result<(), ValidationError> {
    let actual = request.document.hash();
    if request.document_hash != actual {
        return Err(ValidationError::DocumentHashMismatch {
            operation: request.operation_name.clone(),
        });
    }

    let vars = match &request.variables {
        Value::Null => None,
        Value::Object(map) => Some(map),
        _ => {
            return Err(ValidationError::InvalidVariables {
                operation: request.operation_name.clone(),
                reason: "variables must be an object".to_string(),
            })
        }
    };

    for def in &request.document.variables {
        if !def.type_name.ends_with('!') {
            continue;
        }
        let present = vars
            .and_then(|m| m.get(&def.name))
            .is_some_and(|v| !v.is_null());
        if !present {
            return Err(ValidationError::InvalidVariables {
                operation: request.operation_name.clone(),
                reason: format!("variable '${}' of type {} is required", def.name, def.type_name),
            });
        }
    }

    if longest_string(&request.variables) > MAX_TEXT_LEN {
        return Err(ValidationError::FieldTooLong {
            field: "variables".to_string(),
            max_length: MAX_TEXT_LEN,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::catalog;
    use serde_json::json;

    #[test]
    fn accepts_well_formed_request() {
        let req = Request::new(&catalog::authors(), json!({ "filter": {} }));
        assert!(validate_request(&req).is_ok());
    }

    #[test]
    fn rejects_missing_required_variable() {
        let req = Request::new(&catalog::book(), json!({}));
        let err = validate_request(&req).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidVariables { .. }));
    }

    #[test]
    fn optional_variables_may_be_absent() {
        let req = Request::new(&catalog::authors(), json!({ "filter": {} }));
        assert!(req.variables.get("sortBy").is_none());
        assert!(validate_request(&req).is_ok());
    }

    #[test]
    fn rejects_tampered_document() {
        let mut req = Request::new(&catalog::books(), Value::Null);
        req.document = catalog::book();
        assert!(matches!(
            validate_request(&req),
            Err(ValidationError::DocumentHashMismatch { .. })
        ));
    }

    #[test]
    fn rejects_oversized_strings() {
        let title = "x".repeat(MAX_TEXT_LEN + 1);
        let req = Request::new(&catalog::add_book(), json!({ "input": { "title": title } }));
        assert!(matches!(
            validate_request(&req),
            Err(ValidationError::FieldTooLong { .. })
        ));
    }
}
