use serde_json::{json, Map, Value};

use super::Handle;
use crate::intrinsics::join;
use crate::template::CfnResource;

/// what happens to the bucket's data when the bucket leaves the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovalPolicy {
    /// delete the resource. For buckets this only succeeds on an empty
    /// bucket, pair it with `auto_delete_objects`.
    Destroy,
    #[default]
    Retain,
    Snapshot,
}

impl RemovalPolicy {
    pub fn as_cfn(&self) -> &'static str {
        match self {
            RemovalPolicy::Destroy => "Delete",
            RemovalPolicy::Retain => "Retain",
            RemovalPolicy::Snapshot => "Snapshot",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockPublicAccess {
    pub block_public_acls: bool,
    pub block_public_policy: bool,
    pub ignore_public_acls: bool,
    pub restrict_public_buckets: bool,
}

impl BlockPublicAccess {
    pub const BLOCK_ALL: Self = Self {
        block_public_acls: true,
        block_public_policy: true,
        ignore_public_acls: true,
        restrict_public_buckets: true,
    };

    pub const BLOCK_ACLS: Self = Self {
        block_public_acls: true,
        block_public_policy: false,
        ignore_public_acls: true,
        restrict_public_buckets: false,
    };

    pub fn is_block_all(&self) -> bool {
        *self == Self::BLOCK_ALL
    }

    fn to_json(self) -> Value {
        json!({
            "BlockPublicAcls": self.block_public_acls,
            "BlockPublicPolicy": self.block_public_policy,
            "IgnorePublicAcls": self.ignore_public_acls,
            "RestrictPublicBuckets": self.restrict_public_buckets,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bucket {
    /// physical name of the bucket. Must be globally unique.
    /// Leave empty to let cloudformation generate one from the logical id.
    pub bucket_name: Option<String>,
    pub removal_policy: RemovalPolicy,
    /// `None` leaves the account defaults in place.
    pub block_public_access: Option<BlockPublicAccess>,
    /// s3 buckets in cloudformation cannot be deleted if they contain objects.
    /// When set, the stack also gets a custom resource that empties the
    /// bucket before cloudformation deletes it. See [`auto_delete_resources`](super::auto_delete_resources).
    pub auto_delete_objects: bool,
}

fn validate_bucket_name(bucket_name: &str) -> Result<(), String> {
    if bucket_name.len() > 63 || bucket_name.len() < 3 {
        return Err(format!("Invalid bucket name {:?}\nMust be between 3 and 63 characters", bucket_name));
    }
    let valid_char_check = |c: char| -> bool {
        c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-'
    };
    if !bucket_name.chars().all(valid_char_check) {
        return Err(format!("Invalid bucket name {:?}\nMay only contain lowercase letters, numbers, dots, and dashes", bucket_name));
    }
    let first_ok = bucket_name.chars().next().map_or(false, |c| c.is_ascii_alphanumeric());
    let last_ok = bucket_name.chars().last().map_or(false, |c| c.is_ascii_alphanumeric());
    if !first_ok || !last_ok {
        return Err(format!("Invalid bucket name {:?}\nFirst and last character must be either lowercase letter, or number", bucket_name));
    }
    if bucket_name.contains("..") {
        return Err(format!("Invalid bucket name {:?}\nMay not contain two consecutive dots", bucket_name));
    }
    Ok(())
}

impl CfnResource for Bucket {
    fn type_string(&self) -> &'static str {
        "AWS::S3::Bucket"
    }

    fn properties(&self) -> Value {
        let mut map = Map::new();
        if let Some(name) = &self.bucket_name {
            map.insert("BucketName".to_string(), Value::String(name.clone()));
        }
        if let Some(block) = self.block_public_access {
            map.insert("PublicAccessBlockConfiguration".to_string(), block.to_json());
        }
        Value::Object(map)
    }

    fn validate(&self) -> Result<(), String> {
        if self.auto_delete_objects && self.removal_policy != RemovalPolicy::Destroy {
            return Err("Cannot use 'auto_delete_objects' on a bucket without setting removal policy to Destroy".to_string());
        }
        if let Some(name) = &self.bucket_name {
            validate_bucket_name(name)?;
        }
        Ok(())
    }

    fn removal_policy(&self) -> Option<RemovalPolicy> {
        Some(self.removal_policy)
    }
}

impl Handle<Bucket> {
    pub fn arn(&self) -> Value {
        self.get_att("Arn")
    }

    /// arn matching the keys of `key_pattern`, ie: `"*"` for every object.
    pub fn arn_for_objects(&self, key_pattern: &str) -> Value {
        join("", vec![self.arn(), Value::String(format!("/{key_pattern}"))])
    }

    pub fn regional_domain_name(&self) -> Value {
        self.get_att("RegionalDomainName")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site_bucket() -> Bucket {
        Bucket {
            removal_policy: RemovalPolicy::Destroy,
            block_public_access: Some(BlockPublicAccess::BLOCK_ALL),
            auto_delete_objects: true,
            ..Default::default()
        }
    }

    #[test]
    fn block_all_sets_every_flag() {
        let props = site_bucket().properties();
        assert_eq!(
            props["PublicAccessBlockConfiguration"],
            json!({
                "BlockPublicAcls": true,
                "BlockPublicPolicy": true,
                "IgnorePublicAcls": true,
                "RestrictPublicBuckets": true,
            })
        );
        assert!(props.get("BucketName").is_none());
        assert!(BlockPublicAccess::BLOCK_ALL.is_block_all());
        assert!(!BlockPublicAccess::BLOCK_ACLS.is_block_all());
    }

    #[test]
    fn auto_delete_requires_destroy() {
        assert!(site_bucket().validate().is_ok());
        let bucket = Bucket {
            removal_policy: RemovalPolicy::Retain,
            ..site_bucket()
        };
        let err = bucket.validate().unwrap_err();
        assert!(err.contains("removal policy to Destroy"));
    }

    #[test]
    fn checks_explicit_bucket_names() {
        let named = |name: &str| Bucket {
            bucket_name: Some(name.to_string()),
            ..Default::default()
        };
        assert!(named("my-site-assets").validate().is_ok());
        assert!(named("ab").validate().unwrap_err().contains("between 3 and 63"));
        assert!(named("My-Site").validate().unwrap_err().contains("lowercase"));
        assert!(named("-site").validate().unwrap_err().contains("First and last"));
        assert!(named("my..site").validate().unwrap_err().contains("two consecutive dots"));
    }

    #[test]
    fn object_arn_joins_bucket_arn() {
        let handle: Handle<Bucket> = Handle::new("b", "b1234");
        assert_eq!(
            handle.arn_for_objects("*"),
            json!({ "Fn::Join": ["", [{ "Fn::GetAtt": ["b1234", "Arn"] }, "/*"]] })
        );
    }
}
