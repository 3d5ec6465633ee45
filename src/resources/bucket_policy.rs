use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use super::{Bucket, Handle};
use crate::template::CfnResource;

pub const POLICY_VERSION: &str = "2012-10-17";

/// actions granted by [`read_grant`]
pub const READ_ACTIONS: &[&str] = &["s3:GetObject*", "s3:GetBucket*", "s3:List*"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Effect {
    #[default]
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "Allow",
            Effect::Deny => "Deny",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    /// an AWS service, ie: `cloudfront.amazonaws.com`
    Service(String),
    /// canonical user id, used for origin access identities
    CanonicalUser(Value),
}

impl Principal {
    pub fn service(name: &str) -> Self {
        Principal::Service(name.to_string())
    }

    fn key(&self) -> &'static str {
        match self {
            Principal::Service(_) => "Service",
            Principal::CanonicalUser(_) => "CanonicalUser",
        }
    }

    fn value(&self) -> Value {
        match self {
            Principal::Service(s) => Value::String(s.clone()),
            Principal::CanonicalUser(v) => v.clone(),
        }
    }
}

/// `{ operator: { key: value } }`, ie: `StringEquals` -> `AWS:SourceArn` -> arn
pub type Conditions = BTreeMap<String, BTreeMap<String, Value>>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolicyStatement {
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resources: Vec<Value>,
    pub principals: Vec<Principal>,
    pub conditions: Conditions,
}

/// iam collapses single element lists to the element itself.
fn one_or_many(mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        values.remove(0)
    } else {
        Value::Array(values)
    }
}

impl PolicyStatement {
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("Effect".to_string(), self.effect.as_str().into());
        let actions = self.actions.iter().map(|a| Value::String(a.clone())).collect();
        map.insert("Action".to_string(), one_or_many(actions));
        if !self.resources.is_empty() {
            map.insert("Resource".to_string(), one_or_many(self.resources.clone()));
        }
        if !self.principals.is_empty() {
            let mut grouped: BTreeMap<&str, Vec<Value>> = BTreeMap::new();
            for principal in &self.principals {
                grouped.entry(principal.key()).or_default().push(principal.value());
            }
            let principal: Map<String, Value> = grouped
                .into_iter()
                .map(|(k, v)| (k.to_string(), one_or_many(v)))
                .collect();
            map.insert("Principal".to_string(), Value::Object(principal));
        }
        if !self.conditions.is_empty() {
            let conditions: Map<String, Value> = self
                .conditions
                .iter()
                .map(|(op, entries)| {
                    let entries: Map<String, Value> =
                        entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                    (op.clone(), Value::Object(entries))
                })
                .collect();
            map.insert("Condition".to_string(), Value::Object(conditions));
        }
        Value::Object(map)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.actions.is_empty() {
            return Err("A policy statement must contain at least one action".to_string());
        }
        if self.principals.is_empty() {
            return Err("A statement in a resource policy must name at least one principal".to_string());
        }
        if self.resources.is_empty() {
            return Err("A policy statement must name at least one resource".to_string());
        }
        Ok(())
    }
}

/// read access to the bucket and every object in it. Mirrors what a bucket
/// read grant gives an identity.
pub fn read_grant(bucket: &Handle<Bucket>, principal: Principal) -> PolicyStatement {
    PolicyStatement {
        effect: Effect::Allow,
        actions: READ_ACTIONS.iter().map(|a| a.to_string()).collect(),
        resources: vec![bucket.arn(), bucket.arn_for_objects("*")],
        principals: vec![principal],
        conditions: Conditions::new(),
    }
}

/// the resource policy of one bucket. A stack keeps at most one per bucket
/// and appends statements to it.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketPolicy {
    pub bucket: Handle<Bucket>,
    pub statements: Vec<PolicyStatement>,
}

impl CfnResource for BucketPolicy {
    fn type_string(&self) -> &'static str {
        "AWS::S3::BucketPolicy"
    }

    fn properties(&self) -> Value {
        let statements: Vec<Value> = self.statements.iter().map(PolicyStatement::to_json).collect();
        json!({
            "Bucket": self.bucket.get_ref(),
            "PolicyDocument": {
                "Version": POLICY_VERSION,
                "Statement": statements,
            },
        })
    }

    fn validate(&self) -> Result<(), String> {
        if self.statements.is_empty() {
            return Err("Bucket policy has no statements".to_string());
        }
        for (i, statement) in self.statements.iter().enumerate() {
            statement.validate().map_err(|e| format!("statement {i}: {e}"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket() -> Handle<Bucket> {
        Handle::new("bucket", "bucket0001")
    }

    #[test]
    fn single_values_are_collapsed() {
        let mut conditions = Conditions::new();
        conditions
            .entry("StringEquals".to_string())
            .or_default()
            .insert("AWS:SourceArn".to_string(), Value::String("arn".into()));
        let statement = PolicyStatement {
            actions: vec!["s3:GetObject".into()],
            resources: vec![bucket().arn_for_objects("*")],
            principals: vec![Principal::service("cloudfront.amazonaws.com")],
            conditions,
            ..Default::default()
        };
        assert_eq!(
            statement.to_json(),
            json!({
                "Effect": "Allow",
                "Action": "s3:GetObject",
                "Resource": { "Fn::Join": ["", [{ "Fn::GetAtt": ["bucket0001", "Arn"] }, "/*"]] },
                "Principal": { "Service": "cloudfront.amazonaws.com" },
                "Condition": { "StringEquals": { "AWS:SourceArn": "arn" } },
            })
        );
    }

    #[test]
    fn read_grant_covers_bucket_and_objects() {
        let principal = Principal::CanonicalUser(json!({ "Fn::GetAtt": ["oai", "S3CanonicalUserId"] }));
        let json = read_grant(&bucket(), principal).to_json();
        assert_eq!(json["Action"], json!(["s3:GetObject*", "s3:GetBucket*", "s3:List*"]));
        assert_eq!(json["Resource"].as_array().map(Vec::len), Some(2));
        assert_eq!(
            json["Principal"],
            json!({ "CanonicalUser": { "Fn::GetAtt": ["oai", "S3CanonicalUserId"] } })
        );
        assert!(json.get("Condition").is_none());
    }

    #[test]
    fn empty_policies_fail_validation() {
        let policy = BucketPolicy {
            bucket: bucket(),
            statements: vec![],
        };
        assert!(policy.validate().is_err());
        let policy = BucketPolicy {
            bucket: bucket(),
            statements: vec![PolicyStatement::default()],
        };
        assert!(policy.validate().unwrap_err().contains("statement 0"));
    }
}
