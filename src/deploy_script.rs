//! Renders `deploy.sh`: deploy the template, then run every bucket
//! deployment against the freshly deployed stack.

use crate::assets::AssetManifest;

pub const DEPLOY_FILE: &str = "deploy.sh";

/// single quotes for the shell, so paths with spaces or `$` survive.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r#"'\''"#))
}

pub fn render(manifest: &AssetManifest, template_file: &str) -> String {
    let region = &manifest.region;
    let stack_name = &manifest.stack_name;
    let mut out = String::new();
    out.push_str("#!/usr/bin/env bash\n");
    out.push_str("set -euo pipefail\n");
    out.push_str("cd \"$(dirname \"$0\")\"\n\n");

    out.push_str("# 1. deploy:\n");
    // an unchanged template is the common case when only the site changed,
    // the sync and invalidation below still have to run
    out.push_str(&format!(
        "AWS_REGION=\"{region}\" aws --region {region} cloudformation deploy --stack-name {stack_name} --template-file {} --capabilities CAPABILITY_IAM CAPABILITY_NAMED_IAM --no-fail-on-empty-changeset\n",
        shell_quote(template_file)
    ));

    if manifest.deployments.is_empty() {
        return out;
    }

    out.push_str("\n# 2. sync assets:\n");
    out.push_str("stack_output() {\n");
    out.push_str(&format!(
        "    aws --region {region} cloudformation describe-stacks --stack-name {stack_name} --query \"Stacks[0].Outputs[?OutputKey=='$1'].OutputValue\" --output text\n"
    ));
    out.push_str("}\n");

    for (logical_id, deployment) in manifest.deployments.iter() {
        out.push_str(&format!("\n# {logical_id}\n"));
        out.push_str(&format!("bucket=$(stack_output {})\n", deployment.bucket_output));
        let prefix = deployment.destination_key_prefix.as_deref().unwrap_or("");
        let destination = shell_quote(&format!("s3://$bucket/{prefix}"))
            // the bucket variable has to expand
            .replace("$bucket", "'\"$bucket\"'");
        // with several sources a later --delete would remove the files of the earlier ones
        let delete = if deployment.prune && deployment.sources.len() == 1 {
            " --delete"
        } else {
            ""
        };
        for source in &deployment.sources {
            let source_path = source.path.display().to_string();
            out.push_str(&format!(
                "aws --region {region} s3 sync {} {destination}{delete}\n",
                shell_quote(&source_path)
            ));
        }
        if let (Some(output), false) = (
            &deployment.distribution_output,
            deployment.invalidation_paths.is_empty(),
        ) {
            out.push_str(&format!("distribution=$(stack_output {output})\n"));
            let paths: Vec<String> = deployment
                .invalidation_paths
                .iter()
                .map(|p| shell_quote(p))
                .collect();
            out.push_str(&format!(
                "aws cloudfront create-invalidation --distribution-id \"$distribution\" --paths {}\n",
                paths.join(" ")
            ));
        }
    }
    out
}
