//! Cloudformation intrinsic functions, rendered as the json objects the
//! template expects.

use serde_json::{json, Value};

pub const ACCOUNT_ID: &str = "AWS::AccountId";

pub fn get_ref(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

/// `{ "Fn::Sub": "..." }`. `${Name}` inside the string resolves to
/// the Ref of `Name`.
pub fn sub(template: impl Into<String>) -> Value {
    json!({ "Fn::Sub": template.into() })
}

pub fn join(delimiter: &str, parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": [delimiter, parts] })
}
