//! The static website: a private bucket served through cloudfront, filled
//! from the local `../dist` directory on every deploy.

use std::collections::BTreeMap;

use super::*;
use crate::config::SiteConfig;
use crate::error::SynthError;
use crate::stack::{Stack, StackProps};

pub const DEFAULT_ROOT_OBJECT: &str = "index.html";
pub const ORIGIN_ACCESS_IDENTITY_COMMENT: &str = "OAI for my distribution";
pub const AWS_CLOUDFRONT_URL: &str = "cloudfront.amazonaws.com";
pub const DIST_LOCATION: &str = "../dist";
pub const DISTRIBUTION_PATH_PATTERN: &str = "/*";

pub const BUCKET_ID: &str = "rs-task-2-bucket";
pub const ORIGIN_ACCESS_IDENTITY_ID: &str = "OAI_new";
pub const DISTRIBUTION_ID: &str = "MyStaticDistribution";

/// the stack plus handles to everything declared in it.
pub struct StaticWebsite {
    pub stack: Stack,
    pub bucket: Handle<Bucket>,
    pub origin_access_identity: Handle<OriginAccessIdentity>,
    pub distribution: Handle<Distribution>,
    pub deployment: Handle<BucketDeployment>,
}

impl StaticWebsite {
    pub fn new(config: &SiteConfig) -> Result<Self, SynthError> {
        let props = StackProps {
            account: config.account.clone(),
            region: config.region.clone(),
            description: Some("Static website served from a private bucket through CloudFront".into()),
        };
        let mut stack = Stack::new(&config.stack_name, props)?;

        let bucket = build_bucket(&mut stack)?;
        let origin_access_identity = stack.add(
            ORIGIN_ACCESS_IDENTITY_ID,
            OriginAccessIdentity {
                comment: ORIGIN_ACCESS_IDENTITY_COMMENT.into(),
            },
        )?;
        let distribution = build_distribution(&mut stack, &bucket, &origin_access_identity)?;

        let statement = build_policy_permissions(&stack, &bucket, &distribution);
        stack.add_to_resource_policy(&bucket, statement)?;
        stack.grant_read(&bucket, &origin_access_identity)?;

        let deployment = init_bucket_deployment(&mut stack, config, &bucket, &distribution)?;
        Ok(Self {
            stack,
            bucket,
            origin_access_identity,
            distribution,
            deployment,
        })
    }
}

fn build_bucket(stack: &mut Stack) -> Result<Handle<Bucket>, SynthError> {
    let bucket = Bucket {
        removal_policy: RemovalPolicy::Destroy,
        block_public_access: Some(BlockPublicAccess::BLOCK_ALL),
        auto_delete_objects: true,
        ..Default::default()
    };
    stack.add(BUCKET_ID, bucket)
}

fn build_distribution(
    stack: &mut Stack,
    bucket: &Handle<Bucket>,
    origin_access_identity: &Handle<OriginAccessIdentity>,
) -> Result<Handle<Distribution>, SynthError> {
    let origin = S3Origin {
        bucket: bucket.clone(),
        origin_access_identity: origin_access_identity.clone(),
    };
    let mut distribution = Distribution::new(BehaviorOptions::new(origin));
    distribution.default_root_object = Some(DEFAULT_ROOT_OBJECT.into());
    stack.add(DISTRIBUTION_ID, distribution)
}

/// cloudfront may read any object, but only on behalf of our distribution.
fn build_policy_permissions(
    stack: &Stack,
    bucket: &Handle<Bucket>,
    distribution: &Handle<Distribution>,
) -> PolicyStatement {
    let mut source_arn = BTreeMap::new();
    source_arn.insert("AWS:SourceArn".to_string(), stack.distribution_arn(distribution));
    let mut conditions = Conditions::new();
    conditions.insert("StringEquals".to_string(), source_arn);

    PolicyStatement {
        effect: Effect::Allow,
        actions: vec!["s3:GetObject".into()],
        resources: vec![bucket.arn_for_objects("*")],
        principals: vec![Principal::service(AWS_CLOUDFRONT_URL)],
        conditions,
    }
}

fn init_bucket_deployment(
    stack: &mut Stack,
    config: &SiteConfig,
    bucket: &Handle<Bucket>,
    distribution: &Handle<Distribution>,
) -> Result<Handle<BucketDeployment>, SynthError> {
    let mut deployment = BucketDeployment::new(vec![Source::asset(&config.asset_dir)], bucket.clone());
    deployment.distribution = Some(distribution.clone());
    deployment.distribution_paths = vec![DISTRIBUTION_PATH_PATTERN.into()];
    // the deployment is named after the stack itself
    let id = stack.name().to_string();
    stack.add(&id, deployment)
}
