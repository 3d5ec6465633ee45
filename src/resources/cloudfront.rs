use serde_json::{json, Map, Value};

use super::{Bucket, Handle, OriginAccessIdentity};
use crate::template::CfnResource;

/// caching optimized:
/// https://docs.aws.amazon.com/AmazonCloudFront/latest/DeveloperGuide/using-managed-cache-policies.html#managed-cache-caching-optimized
pub const CACHING_OPTIMIZED_POLICY_ID: &str = "658327ea-f89d-4fab-a63d-7e88639e58f6";

pub const MAX_DISTRIBUTION_COMMENT_LENGTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewerProtocolPolicy {
    #[default]
    AllowAll,
    HttpsOnly,
    RedirectToHttps,
}

impl ViewerProtocolPolicy {
    pub fn as_cfn(&self) -> &'static str {
        match self {
            ViewerProtocolPolicy::AllowAll => "allow-all",
            ViewerProtocolPolicy::HttpsOnly => "https-only",
            ViewerProtocolPolicy::RedirectToHttps => "redirect-to-https",
        }
    }
}

/// a private bucket origin, reached through an origin access identity.
#[derive(Debug, Clone, PartialEq)]
pub struct S3Origin {
    pub bucket: Handle<Bucket>,
    pub origin_access_identity: Handle<OriginAccessIdentity>,
}

impl S3Origin {
    pub fn origin_id(&self) -> String {
        format!("{}Origin", self.bucket.logical_id())
    }

    fn to_json(&self) -> Value {
        json!({
            "Id": self.origin_id(),
            "DomainName": self.bucket.regional_domain_name(),
            "S3OriginConfig": {
                "OriginAccessIdentity": self.origin_access_identity.origin_access_identity_path(),
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorOptions {
    pub origin: S3Origin,
    pub viewer_protocol_policy: ViewerProtocolPolicy,
    pub cache_policy_id: String,
    pub compress: bool,
}

impl BehaviorOptions {
    /// defaults for everything but the origin.
    pub fn new(origin: S3Origin) -> Self {
        Self {
            origin,
            viewer_protocol_policy: ViewerProtocolPolicy::default(),
            cache_policy_id: CACHING_OPTIMIZED_POLICY_ID.to_string(),
            compress: true,
        }
    }
}

/// A distribution with exactly one origin and one cache behavior. Additional
/// behaviors, error responses and alternate domain names are not supported.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub default_behavior: BehaviorOptions,
    /// object returned for requests to the root url, ie: `index.html`
    pub default_root_object: Option<String>,
    pub comment: Option<String>,
    /// by default we create the distribution enabled and ready to use.
    pub enabled: bool,
}

impl Distribution {
    pub fn new(default_behavior: BehaviorOptions) -> Self {
        Self {
            default_behavior,
            default_root_object: None,
            comment: None,
            enabled: true,
        }
    }

    pub fn origins(&self) -> Vec<&S3Origin> {
        vec![&self.default_behavior.origin]
    }

    pub fn behaviors(&self) -> Vec<&BehaviorOptions> {
        vec![&self.default_behavior]
    }
}

impl CfnResource for Distribution {
    fn type_string(&self) -> &'static str {
        "AWS::CloudFront::Distribution"
    }

    fn properties(&self) -> Value {
        let behavior = &self.default_behavior;
        let mut config = Map::new();
        config.insert("Enabled".to_string(), Value::Bool(self.enabled));
        config.insert("HttpVersion".to_string(), "http2".into());
        config.insert("IPV6Enabled".to_string(), Value::Bool(true));
        if let Some(root) = &self.default_root_object {
            config.insert("DefaultRootObject".to_string(), Value::String(root.clone()));
        }
        if let Some(comment) = &self.comment {
            config.insert("Comment".to_string(), Value::String(comment.clone()));
        }
        let origins = self.origins().into_iter().map(S3Origin::to_json).collect();
        config.insert("Origins".to_string(), Value::Array(origins));
        config.insert(
            "DefaultCacheBehavior".to_string(),
            json!({
                "TargetOriginId": behavior.origin.origin_id(),
                "ViewerProtocolPolicy": behavior.viewer_protocol_policy.as_cfn(),
                "CachePolicyId": behavior.cache_policy_id,
                "Compress": behavior.compress,
            }),
        );
        json!({ "DistributionConfig": config })
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(root) = &self.default_root_object {
            if root.starts_with('/') {
                return Err(format!("Default root object {root:?} must not start with '/'"));
            }
        }
        if let Some(comment) = &self.comment {
            if comment.len() > MAX_DISTRIBUTION_COMMENT_LENGTH {
                return Err(format!(
                    "Distribution comment must be at most {MAX_DISTRIBUTION_COMMENT_LENGTH} characters, got {}",
                    comment.len()
                ));
            }
        }
        if self.default_behavior.cache_policy_id.is_empty() {
            return Err("Default behavior needs a cache policy id".to_string());
        }
        Ok(())
    }
}

impl Handle<Distribution> {
    /// the id cloudfront assigns, ie: `E2QWRUHAPOMQZL`
    pub fn distribution_id(&self) -> Value {
        self.get_ref()
    }

    pub fn domain_name(&self) -> Value {
        self.get_att("DomainName")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distribution() -> Distribution {
        let origin = S3Origin {
            bucket: Handle::new("bucket", "bucket0001"),
            origin_access_identity: Handle::new("oai", "oai0001"),
        };
        Distribution {
            default_root_object: Some("index.html".into()),
            ..Distribution::new(BehaviorOptions::new(origin))
        }
    }

    #[test]
    fn single_origin_and_behavior() {
        let props = distribution().properties();
        let config = &props["DistributionConfig"];
        assert_eq!(config["Origins"].as_array().map(Vec::len), Some(1));
        assert!(config.get("CacheBehaviors").is_none());
        assert_eq!(config["DefaultRootObject"], "index.html");
        assert_eq!(config["DefaultCacheBehavior"]["TargetOriginId"], "bucket0001Origin");
        assert_eq!(config["Origins"][0]["Id"], "bucket0001Origin");
        assert_eq!(
            config["Origins"][0]["DomainName"],
            json!({ "Fn::GetAtt": ["bucket0001", "RegionalDomainName"] })
        );
        assert_eq!(config["DefaultCacheBehavior"]["CachePolicyId"], CACHING_OPTIMIZED_POLICY_ID);
        assert_eq!(config["DefaultCacheBehavior"]["ViewerProtocolPolicy"], "allow-all");
    }

    #[test]
    fn rejects_rooted_default_object() {
        let mut d = distribution();
        assert!(d.validate().is_ok());
        d.default_root_object = Some("/index.html".into());
        assert!(d.validate().is_err());
    }
}
