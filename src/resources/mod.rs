use std::fmt;
use std::marker::PhantomData;

use serde_json::Value;

use crate::intrinsics;
use crate::template::SavedResource;

mod s3_bucket;
pub use s3_bucket::*;
mod auto_delete;
pub use auto_delete::*;
mod origin_access_identity;
pub use origin_access_identity::*;
mod cloudfront;
pub use cloudfront::*;
mod bucket_policy;
pub use bucket_policy::*;
mod bucket_deployment;
pub use bucket_deployment::*;

// higher level resources:
pub mod static_website;

/// a typed reference to a resource that was added to a stack.
/// other declarations hold handles instead of the resources themselves, the
/// stack stays the only owner.
pub struct Handle<T> {
    construct_id: String,
    logical_id: String,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(construct_id: &str, logical_id: &str) -> Self {
        Self {
            construct_id: construct_id.to_string(),
            logical_id: logical_id.to_string(),
            _kind: PhantomData,
        }
    }

    pub fn construct_id(&self) -> &str {
        &self.construct_id
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn get_ref(&self) -> Value {
        intrinsics::get_ref(&self.logical_id)
    }

    pub fn get_att(&self, attribute: &str) -> Value {
        intrinsics::get_att(&self.logical_id, attribute)
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self::new(&self.construct_id, &self.logical_id)
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.logical_id == other.logical_id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("construct_id", &self.construct_id)
            .field("logical_id", &self.logical_id)
            .finish()
    }
}

/// every descriptor a stack can own.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceKind {
    Bucket(Bucket),
    OriginAccessIdentity(OriginAccessIdentity),
    Distribution(Distribution),
    BucketPolicy(BucketPolicy),
    BucketDeployment(BucketDeployment),
}

impl ResourceKind {
    /// logical ids this declaration points at.
    pub fn references(&self) -> Vec<&str> {
        match self {
            ResourceKind::Bucket(_) | ResourceKind::OriginAccessIdentity(_) => vec![],
            ResourceKind::Distribution(d) => {
                let origin = &d.default_behavior.origin;
                vec![origin.bucket.logical_id(), origin.origin_access_identity.logical_id()]
            }
            ResourceKind::BucketPolicy(p) => vec![p.bucket.logical_id()],
            ResourceKind::BucketDeployment(d) => {
                let mut out = vec![d.destination_bucket.logical_id()];
                if let Some(distribution) = &d.distribution {
                    out.push(distribution.logical_id());
                }
                out
            }
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        use crate::template::CfnResource;
        match self {
            ResourceKind::Bucket(r) => r.validate(),
            ResourceKind::OriginAccessIdentity(r) => r.validate(),
            ResourceKind::Distribution(r) => r.validate(),
            ResourceKind::BucketPolicy(r) => r.validate(),
            ResourceKind::BucketDeployment(r) => r.validate(),
        }
    }

    /// the template entry for this declaration. Deployments have none,
    /// they run after the stack is deployed.
    pub fn saved(&self) -> Option<SavedResource> {
        match self {
            ResourceKind::Bucket(r) => Some(SavedResource::from_resource(r)),
            ResourceKind::OriginAccessIdentity(r) => Some(SavedResource::from_resource(r)),
            ResourceKind::Distribution(r) => Some(SavedResource::from_resource(r)),
            ResourceKind::BucketPolicy(r) => Some(SavedResource::from_resource(r)),
            ResourceKind::BucketDeployment(_) => None,
        }
    }
}

/// conversion between a concrete descriptor and the stack's storage.
pub trait Declared: Sized {
    fn into_kind(self) -> ResourceKind;
    fn from_kind(kind: &ResourceKind) -> Option<&Self>;
}

macro_rules! declared {
    ($($ty:ident),*) => {
        $(
            impl Declared for $ty {
                fn into_kind(self) -> ResourceKind {
                    ResourceKind::$ty(self)
                }
                fn from_kind(kind: &ResourceKind) -> Option<&Self> {
                    match kind {
                        ResourceKind::$ty(r) => Some(r),
                        _ => None,
                    }
                }
            }
        )*
    };
}

declared!(Bucket, OriginAccessIdentity, Distribution, BucketPolicy, BucketDeployment);

#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub construct_id: String,
    pub logical_id: String,
    pub kind: ResourceKind,
}
