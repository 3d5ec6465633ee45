//! The synthesized cloudformation template.
//!
//! Maps are `BTreeMap`s so the serialized template is byte-for-byte the same
//! every time the same stack is synthesized.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resources::RemovalPolicy;

/// anything that becomes one entry under `Resources`.
pub trait CfnResource {
    fn type_string(&self) -> &'static str;
    fn properties(&self) -> Value;
    /// checks that can be made without talking to AWS.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
    /// maps to both `DeletionPolicy` and `UpdateReplacePolicy`.
    fn removal_policy(&self) -> Option<RemovalPolicy> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SavedResource {
    #[serde(rename = "Type")]
    pub ty: String,
    #[serde(rename = "Properties")]
    pub properties: Value,
    #[serde(rename = "DeletionPolicy", default, skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<String>,
    #[serde(rename = "UpdateReplacePolicy", default, skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<String>,
    #[serde(rename = "DependsOn", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl SavedResource {
    pub fn from_resource<R: CfnResource>(resource: &R) -> Self {
        let policy = resource.removal_policy().map(|p| p.as_cfn().to_string());
        Self {
            ty: resource.type_string().to_string(),
            properties: resource.properties(),
            deletion_policy: policy.clone(),
            update_replace_policy: policy,
            depends_on: vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceOutput {
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Value")]
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTemplate {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub version: String,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, SavedResource>,
    #[serde(rename = "Outputs", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, ResourceOutput>,
}

impl Default for SavedTemplate {
    fn default() -> Self {
        Self {
            version: "2010-09-09".to_string(),
            description: None,
            resources: Default::default(),
            outputs: Default::default(),
        }
    }
}

impl SavedTemplate {
    /// we make it pretty so if a user needs to look at the stack in the Cfn console, it looks nice
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// the resources of the given cloudformation type, in logical id order.
    pub fn resources_of_type<'a>(
        &'a self,
        ty: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a SavedResource)> + 'a {
        self.resources.iter().filter(move |(_, r)| r.ty == ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Dummy;

    impl CfnResource for Dummy {
        fn type_string(&self) -> &'static str {
            "AWS::Dummy::Thing"
        }
        fn properties(&self) -> Value {
            json!({ "A": 1 })
        }
        fn removal_policy(&self) -> Option<RemovalPolicy> {
            Some(RemovalPolicy::Destroy)
        }
    }

    #[test]
    fn saved_resource_carries_policies() {
        let saved = SavedResource::from_resource(&Dummy);
        let value = serde_json::to_value(&saved).unwrap();
        assert_eq!(
            value,
            json!({
                "Type": "AWS::Dummy::Thing",
                "Properties": { "A": 1 },
                "DeletionPolicy": "Delete",
                "UpdateReplacePolicy": "Delete",
            })
        );
    }

    #[test]
    fn empty_outputs_are_omitted() {
        let value = serde_json::to_value(SavedTemplate::default()).unwrap();
        assert_eq!(
            value,
            json!({ "AWSTemplateFormatVersion": "2010-09-09", "Resources": {} })
        );
    }
}
