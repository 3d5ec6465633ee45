use serde_json::{json, Value};

use super::Handle;
use crate::intrinsics::join;
use crate::template::CfnResource;

pub const MAX_OAI_COMMENT_LENGTH: usize = 128;

/// an identity cloudfront uses to read from a bucket that is not public.
#[derive(Debug, Clone, PartialEq)]
pub struct OriginAccessIdentity {
    pub comment: String,
}

impl Default for OriginAccessIdentity {
    fn default() -> Self {
        Self {
            comment: "Allows CloudFront to reach the bucket".into(),
        }
    }
}

impl CfnResource for OriginAccessIdentity {
    fn type_string(&self) -> &'static str {
        "AWS::CloudFront::CloudFrontOriginAccessIdentity"
    }

    fn properties(&self) -> Value {
        json!({
            "CloudFrontOriginAccessIdentityConfig": {
                "Comment": self.comment,
            }
        })
    }

    fn validate(&self) -> Result<(), String> {
        if self.comment.len() > MAX_OAI_COMMENT_LENGTH {
            return Err(format!(
                "Origin access identity comment must be at most {MAX_OAI_COMMENT_LENGTH} characters, got {}",
                self.comment.len()
            ));
        }
        Ok(())
    }
}

impl Handle<OriginAccessIdentity> {
    /// the value an S3 origin expects: `origin-access-identity/cloudfront/<id>`
    pub fn origin_access_identity_path(&self) -> Value {
        join("", vec!["origin-access-identity/cloudfront/".into(), self.get_ref()])
    }

    pub fn s3_canonical_user_id(&self) -> Value {
        self.get_att("S3CanonicalUserId")
    }
}
