use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use site_stack::{App, SavedTemplate, SiteConfig, StaticWebsite, SynthError};
use tempfile::TempDir;

/// `<tmp>/site` is where the stack is defined, `<tmp>/dist` the built site
fn workspace() -> (TempDir, SiteConfig) {
    let tmp = tempfile::tempdir().unwrap();
    let site = tmp.path().join("site");
    let dist = tmp.path().join("dist");
    fs::create_dir_all(&site).unwrap();
    fs::create_dir_all(dist.join("css")).unwrap();
    fs::write(dist.join("index.html"), "<html>hello</html>").unwrap();
    fs::write(dist.join("css/site.css"), "body { margin: 0 }").unwrap();
    let config = SiteConfig {
        base_dir: site,
        out_dir: tmp.path().join("site.out"),
        ..Default::default()
    };
    (tmp, config)
}

fn synth_template(config: &SiteConfig) -> (StaticWebsite, SavedTemplate) {
    let site = StaticWebsite::new(config).unwrap();
    let assembly = site.stack.synth(&config.base_dir).unwrap();
    (site, assembly.template)
}

/// the single resource of type `ty`, serialized the way it lands in the template
fn only(template: &SavedTemplate, ty: &str) -> (String, Value) {
    let found: Vec<_> = template.resources_of_type(ty).collect();
    assert_eq!(found.len(), 1, "expected exactly one {ty}");
    let (id, resource) = found[0];
    (id.clone(), serde_json::to_value(resource).unwrap())
}

#[test]
fn bucket_blocks_public_access_and_is_destroyed_with_the_stack() {
    let (_tmp, config) = workspace();
    let (_, template) = synth_template(&config);
    let (bucket_id, bucket) = only(&template, "AWS::S3::Bucket");
    assert_eq!(
        bucket["Properties"]["PublicAccessBlockConfiguration"],
        json!({
            "BlockPublicAcls": true,
            "BlockPublicPolicy": true,
            "IgnorePublicAcls": true,
            "RestrictPublicBuckets": true,
        })
    );
    assert_eq!(bucket["DeletionPolicy"], "Delete");
    assert_eq!(bucket["UpdateReplacePolicy"], "Delete");

    let (_, cleanup) = only(&template, "Custom::S3AutoDeleteObjects");
    assert_eq!(cleanup["Properties"]["BucketName"], json!({ "Ref": bucket_id }));
}

#[test]
fn distribution_has_one_origin_and_one_behavior() {
    let (_tmp, config) = workspace();
    let (site, template) = synth_template(&config);
    let (dist_id, dist) = only(&template, "AWS::CloudFront::Distribution");
    assert_eq!(dist_id, site.distribution.logical_id());
    let dist_config = &dist["Properties"]["DistributionConfig"];
    assert_eq!(dist_config["DefaultRootObject"], "index.html");
    assert_eq!(dist_config["Origins"].as_array().map(Vec::len), Some(1));
    assert!(dist_config.get("CacheBehaviors").is_none());
    assert_eq!(
        dist_config["DefaultCacheBehavior"]["TargetOriginId"],
        dist_config["Origins"][0]["Id"]
    );
    let (oai_id, _) = only(&template, "AWS::CloudFront::CloudFrontOriginAccessIdentity");
    assert_eq!(
        dist_config["Origins"][0]["S3OriginConfig"]["OriginAccessIdentity"],
        json!({ "Fn::Join": ["", ["origin-access-identity/cloudfront/", { "Ref": oai_id }]] })
    );
}

fn cloudfront_statement(template: &SavedTemplate) -> Value {
    let (_, policy) = only(template, "AWS::S3::BucketPolicy");
    policy["Properties"]["PolicyDocument"]["Statement"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["Principal"]["Service"] == "cloudfront.amazonaws.com")
        .cloned()
        .unwrap()
}

#[test]
fn statement_is_conditioned_on_our_distribution() {
    let (_tmp, mut config) = workspace();
    config.account = Some("123456789012".into());
    let (site, template) = synth_template(&config);
    let statement = cloudfront_statement(&template);
    assert_eq!(
        statement["Condition"]["StringEquals"]["AWS:SourceArn"],
        json!({
            "Fn::Sub": format!(
                "arn:aws:cloudfront::123456789012:distribution/${{{}}}",
                site.distribution.logical_id()
            )
        })
    );
}

#[test]
fn statement_without_account_uses_pseudo_parameter() {
    let (_tmp, config) = workspace();
    let (_, template) = synth_template(&config);
    let arn = cloudfront_statement(&template)["Condition"]["StringEquals"]["AWS:SourceArn"]["Fn::Sub"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(arn.starts_with("arn:aws:cloudfront::${AWS::AccountId}:distribution/${"));
}

#[test]
fn statement_grants_cloudfront_get_object_only() {
    let (_tmp, config) = workspace();
    let (_, template) = synth_template(&config);
    let statement = cloudfront_statement(&template);
    assert_eq!(statement["Principal"], json!({ "Service": "cloudfront.amazonaws.com" }));
    assert_eq!(statement["Action"], "s3:GetObject");
    assert_eq!(statement["Effect"], "Allow");
}

#[test]
fn deployment_invalidates_everything_on_the_declared_distribution() {
    let (_tmp, config) = workspace();
    let site = StaticWebsite::new(&config).unwrap();
    let assembly = site.stack.synth(&config.base_dir).unwrap();
    assert_eq!(assembly.assets.deployments.len(), 1);
    let deployment = assembly.assets.deployments.values().next().unwrap();
    assert_eq!(deployment.distribution.as_deref(), Some(site.distribution.logical_id()));
    assert_eq!(deployment.destination_bucket, site.bucket.logical_id());
    assert_eq!(deployment.invalidation_paths, vec!["/*".to_string()]);

    let files: Vec<&str> = deployment.sources[0].files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(files, ["css/site.css", "index.html"]);

    // the script reads the ids back from these outputs
    let outputs = &assembly.template.outputs;
    assert!(outputs.contains_key(&deployment.bucket_output));
    assert!(outputs.contains_key(deployment.distribution_output.as_deref().unwrap()));
    assert!(assembly.deploy_script.contains("--paths '/*'"));
}

#[test]
fn synthesis_is_deterministic() {
    let (_tmp, config) = workspace();
    let first = StaticWebsite::new(&config).unwrap().stack.synth(&config.base_dir).unwrap();
    let second = StaticWebsite::new(&config).unwrap().stack.synth(&config.base_dir).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.template.to_json_pretty().unwrap(),
        second.template.to_json_pretty().unwrap()
    );
}

#[test]
fn missing_dist_fails_naming_the_path() {
    let tmp = tempfile::tempdir().unwrap();
    let site_dir = tmp.path().join("site");
    fs::create_dir_all(&site_dir).unwrap();
    let config = SiteConfig {
        base_dir: site_dir,
        ..Default::default()
    };
    let site = StaticWebsite::new(&config).unwrap();
    let err = site.stack.synth(&config.base_dir).unwrap_err();
    match &err {
        SynthError::AssetNotFound { path } => assert!(path.ends_with("dist")),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("dist"));
}

#[test]
fn invalid_account_is_rejected_before_synthesis() {
    let (_tmp, mut config) = workspace();
    config.account = Some("not-an-account".into());
    assert!(matches!(
        StaticWebsite::new(&config),
        Err(SynthError::InvalidAccount(_))
    ));
}

fn written(out_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(out_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    files.sort();
    files
}

#[test]
fn app_writes_template_manifest_and_script() {
    let (_tmp, config) = workspace();
    let site = StaticWebsite::new(&config).unwrap();
    let mut app = App::new(&config.base_dir, &config.out_dir);
    app.add_stack(site.stack);
    let assemblies = app.synth().unwrap();
    assert_eq!(assemblies.len(), 1);

    let files = written(&config.out_dir);
    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        ["StaticSiteStack.assets.json", "StaticSiteStack.template.json", "deploy.sh"]
    );

    let template: Value =
        serde_json::from_str(&fs::read_to_string(config.out_dir.join("StaticSiteStack.template.json")).unwrap())
            .unwrap();
    assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(config.out_dir.join("deploy.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}

#[test]
fn nothing_is_written_when_synthesis_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let config = SiteConfig {
        base_dir: tmp.path().join("site"),
        out_dir: tmp.path().join("site.out"),
        ..Default::default()
    };
    fs::create_dir_all(&config.base_dir).unwrap();
    let site = StaticWebsite::new(&config).unwrap();
    let mut app = App::new(&config.base_dir, &config.out_dir);
    app.add_stack(site.stack);
    assert!(app.synth().is_err());
    assert!(!config.out_dir.exists());
}

/// an `aws` stand-in that logs its arguments. Like the real cli it fails a
/// `cloudformation deploy` of an unchanged template unless told not to.
#[cfg(unix)]
const FAKE_AWS: &str = r#"#!/bin/sh
echo "$*" >> "$AWS_CALL_LOG"
case "$*" in
  *"cloudformation deploy"*)
    case "$*" in
      *--no-fail-on-empty-changeset*) ;;
      *) echo "No changes to deploy. Stack is up to date" >&2; exit 255 ;;
    esac ;;
  *"describe-stacks"*) echo "from-stack-output" ;;
esac
exit 0
"#;

#[cfg(unix)]
#[test]
fn unchanged_template_still_syncs_and_invalidates() {
    use std::os::unix::fs::PermissionsExt;

    let (tmp, config) = workspace();
    let site = StaticWebsite::new(&config).unwrap();
    let mut app = App::new(&config.base_dir, &config.out_dir);
    app.add_stack(site.stack);
    app.synth().unwrap();

    let bin = tmp.path().join("bin");
    fs::create_dir_all(&bin).unwrap();
    let aws = bin.join("aws");
    fs::write(&aws, FAKE_AWS).unwrap();
    fs::set_permissions(&aws, fs::Permissions::from_mode(0o755)).unwrap();
    let log = tmp.path().join("aws.log");

    let path = format!("{}:{}", bin.display(), std::env::var("PATH").unwrap_or_default());
    let status = std::process::Command::new("bash")
        .arg(config.out_dir.join("deploy.sh"))
        .env("PATH", path)
        .env("AWS_CALL_LOG", &log)
        .status()
        .unwrap();
    assert!(status.success(), "deploy.sh exited with {status}");

    let calls = fs::read_to_string(&log).unwrap();
    let position = |needle: &str| {
        calls
            .lines()
            .position(|line| line.contains(needle))
            .unwrap_or_else(|| panic!("no aws call containing {needle:?} in:\n{calls}"))
    };
    let deploy = position("cloudformation deploy");
    let sync = position("s3 sync");
    let invalidate = position("cloudfront create-invalidation");
    assert!(deploy < sync && sync < invalidate);
    assert!(calls.contains("s3://from-stack-output/"));
    assert!(calls.contains("--distribution-id from-stack-output --paths /*"));
}
