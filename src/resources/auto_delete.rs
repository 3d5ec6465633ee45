//! Support resources for `Bucket::auto_delete_objects`.
//!
//! A lambda function is created that deletes the contents of the bucket when
//! the cloudformation stack gets deleted. Without it, deleting a stack with
//! a bucket that is not empty fails.

use serde_json::{json, Value};

use crate::intrinsics::{get_att, get_ref, sub};
use crate::template::{CfnResource, SavedResource};

pub const AUTO_DELETE_RESOURCE_TYPE: &str = "Custom::S3AutoDeleteObjects";

const HANDLER_CODE: &str = r#"import boto3
import cfnresponse

def handler(event, context):
    status = cfnresponse.SUCCESS
    if event['RequestType'] == 'Delete':
        try:
            bucket = boto3.resource('s3').Bucket(event['ResourceProperties']['BucketName'])
            bucket.object_versions.delete()
            bucket.objects.all().delete()
        except Exception as err:
            print(f'Error deleting objects from S3 bucket: {err}')
            status = cfnresponse.FAILED
    cfnresponse.send(event, context, status, {})
"#;

pub fn create_assume_role_policy_doc() -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "Service": "lambda.amazonaws.com" },
            "Action": "sts:AssumeRole",
        }]
    })
}

pub struct AutoDeleteRole {
    pub bucket_logical_id: String,
}

impl CfnResource for AutoDeleteRole {
    fn type_string(&self) -> &'static str {
        "AWS::IAM::Role"
    }

    fn properties(&self) -> Value {
        let bucket = &self.bucket_logical_id;
        json!({
            "Description": format!("auto generated cleanup role for {bucket}"),
            "AssumeRolePolicyDocument": create_assume_role_policy_doc(),
            "ManagedPolicyArns": [
                sub("arn:${AWS::Partition}:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole"),
            ],
            "Policies": [{
                "PolicyName": "auto-delete-objects",
                "PolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [
                        {
                            "Effect": "Allow",
                            "Action": ["s3:ListBucket", "s3:ListBucketVersions"],
                            "Resource": get_att(bucket, "Arn"),
                        },
                        {
                            "Effect": "Allow",
                            "Action": ["s3:DeleteObject", "s3:DeleteObjectVersion"],
                            "Resource": sub(format!("${{{bucket}.Arn}}/*")),
                        },
                    ],
                },
            }],
        })
    }
}

pub struct AutoDeleteFunction {
    pub role_logical_id: String,
}

impl CfnResource for AutoDeleteFunction {
    fn type_string(&self) -> &'static str {
        "AWS::Lambda::Function"
    }

    fn properties(&self) -> Value {
        json!({
            "Runtime": "python3.12",
            "Handler": "index.handler",
            "Timeout": 900,
            "Role": get_att(&self.role_logical_id, "Arn"),
            "Code": { "ZipFile": HANDLER_CODE },
        })
    }
}

pub struct AutoDeleteObjects {
    pub function_logical_id: String,
    pub bucket_logical_id: String,
}

impl CfnResource for AutoDeleteObjects {
    fn type_string(&self) -> &'static str {
        AUTO_DELETE_RESOURCE_TYPE
    }

    fn properties(&self) -> Value {
        json!({
            "ServiceToken": get_att(&self.function_logical_id, "Arn"),
            "BucketName": get_ref(&self.bucket_logical_id),
        })
    }
}

/// the role, function and custom resource that empty `bucket_logical_id`
/// on stack deletion, keyed by their logical ids.
pub fn auto_delete_resources(bucket_logical_id: &str) -> Vec<(String, SavedResource)> {
    let role_id = format!("{bucket_logical_id}AutoDeleteRole");
    let function_id = format!("{bucket_logical_id}AutoDeleteFunction");
    let custom_id = format!("{bucket_logical_id}AutoDeleteObjects");

    let role = AutoDeleteRole {
        bucket_logical_id: bucket_logical_id.to_string(),
    };
    let function = AutoDeleteFunction {
        role_logical_id: role_id.clone(),
    };
    let custom = AutoDeleteObjects {
        function_logical_id: function_id.clone(),
        bucket_logical_id: bucket_logical_id.to_string(),
    };
    let mut custom_saved = SavedResource::from_resource(&custom);
    // the bucket must still exist when the custom resource is deleted
    custom_saved.depends_on.push(bucket_logical_id.to_string());
    vec![
        (role_id, SavedResource::from_resource(&role)),
        (function_id, SavedResource::from_resource(&function)),
        (custom_id, custom_saved),
    ]
}
