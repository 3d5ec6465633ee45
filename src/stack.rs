//! A stack owns its resource declarations and synthesizes them into a
//! template, an asset manifest and a deploy script.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::assets::{self, AssetManifest, DeploymentManifest};
use crate::deploy_script::{self, DEPLOY_FILE};
use crate::error::SynthError;
use crate::intrinsics::{self, sub};
use crate::naming;
use crate::resources::{
    auto_delete_resources, read_grant, Bucket, BucketDeployment, BucketPolicy, Declared, Distribution,
    Handle, OriginAccessIdentity, PolicyStatement, Principal, Resource, ResourceKind, Source,
};
use crate::template::{ResourceOutput, SavedTemplate};

#[derive(Debug, Clone, PartialEq)]
pub struct StackProps {
    /// the account the stack deploys to. Left empty, arns that need it
    /// use the `AWS::AccountId` pseudo parameter.
    pub account: Option<String>,
    pub region: String,
    pub description: Option<String>,
}

impl Default for StackProps {
    fn default() -> Self {
        Self {
            account: None,
            region: "us-east-1".to_string(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stack {
    name: String,
    props: StackProps,
    resources: Vec<Resource>,
}

impl Stack {
    pub fn new(name: &str, props: StackProps) -> Result<Self, SynthError> {
        naming::validate_stack_name(name)?;
        naming::validate_region(&props.region)?;
        if let Some(account) = &props.account {
            naming::validate_account(account)?;
        }
        Ok(Self {
            name: name.to_string(),
            props,
            resources: vec![],
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn props(&self) -> &StackProps {
        &self.props
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// the account as it should appear inside an `Fn::Sub` string.
    pub fn account_sub(&self) -> String {
        match &self.props.account {
            Some(account) => account.clone(),
            None => format!("${{{}}}", intrinsics::ACCOUNT_ID),
        }
    }

    /// registers `resource` under `construct_id` and returns a handle other
    /// declarations can reference it by.
    pub fn add<T: Declared>(&mut self, construct_id: &str, resource: T) -> Result<Handle<T>, SynthError> {
        naming::verify_construct_id(construct_id)?;
        let logical_id = naming::logical_id(&self.name, construct_id);
        naming::verify_logical_id(&logical_id)?;
        if self.resources.iter().any(|r| r.logical_id == logical_id) {
            return Err(SynthError::DuplicateLogicalId(logical_id));
        }
        debug!(stack = %self.name, construct_id, logical_id = %logical_id, "declared resource");
        self.resources.push(Resource {
            construct_id: construct_id.to_string(),
            logical_id: logical_id.clone(),
            kind: resource.into_kind(),
        });
        Ok(Handle::new(construct_id, &logical_id))
    }

    pub fn get<T: Declared>(&self, handle: &Handle<T>) -> Option<&T> {
        self.resources
            .iter()
            .find(|r| r.logical_id == handle.logical_id())
            .and_then(|r| T::from_kind(&r.kind))
    }

    /// `arn:aws:cloudfront::<account>:distribution/<distribution id>`, the id
    /// is resolved by cloudformation at deploy time.
    pub fn distribution_arn(&self, distribution: &Handle<Distribution>) -> serde_json::Value {
        sub(format!(
            "arn:aws:cloudfront::{}:distribution/${{{}}}",
            self.account_sub(),
            distribution.logical_id()
        ))
    }

    /// appends `statement` to the bucket's resource policy, creating the
    /// policy on first use.
    pub fn add_to_resource_policy(
        &mut self,
        bucket: &Handle<Bucket>,
        statement: PolicyStatement,
    ) -> Result<(), SynthError> {
        for resource in self.resources.iter_mut() {
            if let ResourceKind::BucketPolicy(policy) = &mut resource.kind {
                if &policy.bucket == bucket {
                    policy.statements.push(statement);
                    return Ok(());
                }
            }
        }
        let policy = BucketPolicy {
            bucket: bucket.clone(),
            statements: vec![statement],
        };
        self.add(&format!("{}Policy", bucket.construct_id()), policy)?;
        Ok(())
    }

    /// lets the origin access identity read every object of the bucket.
    pub fn grant_read(
        &mut self,
        bucket: &Handle<Bucket>,
        identity: &Handle<OriginAccessIdentity>,
    ) -> Result<(), SynthError> {
        let principal = Principal::CanonicalUser(identity.s3_canonical_user_id());
        self.add_to_resource_policy(bucket, read_grant(bucket, principal))
    }

    fn check_references(&self) -> Result<(), SynthError> {
        let declared: BTreeSet<&str> = self.resources.iter().map(|r| r.logical_id.as_str()).collect();
        for resource in &self.resources {
            for reference in resource.kind.references() {
                if !declared.contains(reference) {
                    return Err(SynthError::UnknownReference {
                        from: resource.logical_id.clone(),
                        to: reference.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn deployment_manifest(
        &self,
        base_dir: &Path,
        deployment: &BucketDeployment,
        template: &mut SavedTemplate,
    ) -> Result<DeploymentManifest, SynthError> {
        let bucket = &deployment.destination_bucket;
        let bucket_output = format!("{}Name", bucket.logical_id());
        template.outputs.insert(
            bucket_output.clone(),
            ResourceOutput {
                description: format!("bucket name of {}", bucket.construct_id()),
                value: bucket.get_ref(),
            },
        );
        let distribution_output = match &deployment.distribution {
            Some(distribution) => {
                let output = format!("{}Id", distribution.logical_id());
                template.outputs.insert(
                    output.clone(),
                    ResourceOutput {
                        description: format!("distribution id of {}", distribution.construct_id()),
                        value: distribution.distribution_id(),
                    },
                );
                template.outputs.insert(
                    format!("{}DomainName", distribution.logical_id()),
                    ResourceOutput {
                        description: format!("domain name of {}", distribution.construct_id()),
                        value: distribution.domain_name(),
                    },
                );
                Some(output)
            }
            None => None,
        };
        let mut sources = vec![];
        for source in &deployment.sources {
            match source {
                Source::Asset(path) => sources.push(assets::stage_directory(base_dir, path)?),
            }
        }
        Ok(DeploymentManifest {
            destination_bucket: bucket.logical_id().to_string(),
            bucket_output,
            destination_key_prefix: deployment.destination_key_prefix.clone(),
            distribution: deployment.distribution.as_ref().map(|d| d.logical_id().to_string()),
            distribution_output,
            invalidation_paths: deployment.invalidation_paths(),
            prune: deployment.prune,
            sources,
        })
    }

    /// turns the declarations into deployable output. Relative asset paths
    /// resolve against `base_dir`. The same declarations and the same asset
    /// contents always give the same assembly.
    pub fn synth(&self, base_dir: &Path) -> Result<Assembly, SynthError> {
        self.check_references()?;
        let mut template = SavedTemplate {
            description: self.props.description.clone(),
            ..Default::default()
        };
        let mut manifest = AssetManifest::new(&self.name, &self.props.region);

        for resource in &self.resources {
            resource.kind.validate().map_err(|message| SynthError::Validation {
                resource: resource.construct_id.clone(),
                message,
            })?;
            if let Some(saved) = resource.kind.saved() {
                template.resources.insert(resource.logical_id.clone(), saved);
            }
            match &resource.kind {
                ResourceKind::Bucket(bucket) if bucket.auto_delete_objects => {
                    for (logical_id, saved) in auto_delete_resources(&resource.logical_id) {
                        naming::verify_logical_id(&logical_id)?;
                        template.resources.insert(logical_id, saved);
                    }
                }
                ResourceKind::BucketDeployment(deployment) => {
                    let entry = self.deployment_manifest(base_dir, deployment, &mut template)?;
                    manifest.deployments.insert(resource.logical_id.clone(), entry);
                }
                _ => {}
            }
        }

        let template_file = format!("{}.template.json", self.name);
        let deploy_script = deploy_script::render(&manifest, &template_file);
        info!(
            stack = %self.name,
            resources = template.resources.len(),
            deployments = manifest.deployments.len(),
            "synthesized stack"
        );
        Ok(Assembly {
            stack_name: self.name.clone(),
            template,
            assets: manifest,
            deploy_script,
        })
    }
}

/// everything one stack synthesizes to.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub stack_name: String,
    pub template: SavedTemplate,
    pub assets: AssetManifest,
    pub deploy_script: String,
}

impl Assembly {
    pub fn template_file_name(&self) -> String {
        format!("{}.template.json", self.stack_name)
    }

    pub fn assets_file_name(&self) -> String {
        format!("{}.assets.json", self.stack_name)
    }

    /// writes the template, asset manifest and `deploy.sh` into `out_dir`.
    pub fn write_to(&self, out_dir: &Path) -> Result<Vec<PathBuf>, SynthError> {
        std::fs::create_dir_all(out_dir).map_err(|e| SynthError::write(out_dir, e))?;
        let template_path = out_dir.join(self.template_file_name());
        let assets_path = out_dir.join(self.assets_file_name());
        let script_path = out_dir.join(DEPLOY_FILE);

        let template = self.template.to_json_pretty()?;
        let assets = serde_json::to_string_pretty(&self.assets)?;
        for (path, contents) in [
            (&template_path, &template),
            (&assets_path, &assets),
            (&script_path, &self.deploy_script),
        ] {
            std::fs::write(path, contents).map_err(|e| SynthError::write(path, e))?;
            info!(path = %path.display(), "wrote");
        }
        make_executable(&script_path)?;
        Ok(vec![template_path, assets_path, script_path])
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), SynthError> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)
        .map_err(|e| SynthError::write(path, e))?
        .permissions();
    perms.set_mode(perms.mode() | 0o755);
    std::fs::set_permissions(path, perms).map_err(|e| SynthError::write(path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), SynthError> {
    Ok(())
}

/// the root every stack is synthesized under.
pub struct App {
    base_dir: PathBuf,
    out_dir: PathBuf,
    stacks: Vec<Stack>,
}

impl App {
    pub fn new(base_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            out_dir: out_dir.into(),
            stacks: vec![],
        }
    }

    pub fn add_stack(&mut self, stack: Stack) {
        self.stacks.push(stack);
    }

    /// synthesizes every stack and writes the results into the output
    /// directory. Nothing is written unless every stack synthesizes.
    pub fn synth(&self) -> Result<Vec<Assembly>, SynthError> {
        let assemblies = self
            .stacks
            .iter()
            .map(|stack| stack.synth(&self.base_dir))
            .collect::<Result<Vec<_>, _>>()?;
        for assembly in &assemblies {
            assembly.write_to(&self.out_dir)?;
        }
        Ok(assemblies)
    }
}
