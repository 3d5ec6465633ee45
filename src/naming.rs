//! Logical ids and the name checks cloudformation would otherwise only
//! report at deploy time.

use adler32::RollingAdler32;

use crate::error::SynthError;

pub const VALID_AWS_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "ca-central-1",
    "eu-north-1",
    "eu-west-3",
    "eu-west-2",
    "eu-west-1",
    "eu-central-1",
    "eu-central-2",
    "eu-south-1",
    "eu-south-2",
    "ap-south-1",
    "ap-south-2",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-southeast-3",
    "ap-southeast-4",
    "ap-east-1",
    "sa-east-1",
    "cn-north-1",
    "cn-northwest-1",
    "us-gov-east-1",
    "us-gov-west-1",
    "me-south-1",
    "me-central-1",
    "il-central-1",
    "af-south-1",
];

/// length of the hex hash appended to every logical id.
pub const HASH_SUFFIX_LENGTH: usize = 8;

/// leaves room for suffixes like `AutoDeleteFunction` on derived resources
/// while staying under the 255 character limit.
const MAX_READABLE_PART: usize = 200;

pub fn adler32_hex(bytes: &[u8]) -> String {
    let hash = RollingAdler32::from_buffer(bytes).hash();
    format!("{:08x}", hash)
}

/// the logical id for `construct_id` inside `stack_id`. We keep the
/// alphanumeric characters of the path so the template stays readable, and
/// append a hash of the full path so that `a-b` and `ab` still get different ids.
pub fn logical_id(stack_id: &str, construct_id: &str) -> String {
    let path = format!("{stack_id}/{construct_id}");
    let mut readable: String = construct_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    readable.truncate(MAX_READABLE_PART);
    let mut hash = adler32_hex(path.as_bytes());
    hash.truncate(HASH_SUFFIX_LENGTH);
    format!("{readable}{hash}")
}

pub fn verify_logical_id(id: &str) -> Result<(), SynthError> {
    let invalid = |reason| SynthError::InvalidLogicalId {
        id: id.to_string(),
        reason,
    };
    if id.len() > 255 {
        return Err(invalid("must be less than 255 characters"));
    }
    if id.is_empty() {
        return Err(invalid("Must contain at least 1 character"));
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid("Must contain only alphanumeric characters [A-Za-z0-9]"));
    }
    Ok(())
}

pub fn verify_construct_id(id: &str) -> Result<(), SynthError> {
    let invalid = |reason| SynthError::InvalidConstructId {
        id: id.to_string(),
        reason,
    };
    if id.is_empty() {
        return Err(invalid("Must contain at least 1 character"));
    }
    if id.contains('/') {
        return Err(invalid("May not contain '/', it separates construct paths"));
    }
    if !id.chars().any(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid("Must contain at least one alphanumeric character"));
    }
    Ok(())
}

pub fn validate_stack_name(stack_name: &str) -> Result<(), SynthError> {
    // A stack name can contain only alphanumeric characters (case sensitive) and hyphens.
    // It must start with an alphabetical character and can't be longer than 128 characters.
    let reason = "Must only consist of alphanumeric characters and hyphens, Must start with an alphabetical character, and cannot be longer than 128 characters.";
    let invalid = || SynthError::InvalidStackName {
        name: stack_name.to_string(),
        reason,
    };
    match stack_name.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return Err(invalid()),
    }
    if !stack_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(invalid());
    }
    if stack_name.len() > 128 {
        return Err(invalid());
    }
    Ok(())
}

pub fn validate_region(region: &str) -> Result<(), SynthError> {
    if VALID_AWS_REGIONS.contains(&region) {
        Ok(())
    } else {
        Err(SynthError::InvalidRegion(region.to_string()))
    }
}

pub fn validate_account(account: &str) -> Result<(), SynthError> {
    if account.len() == 12 && account.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(SynthError::InvalidAccount(account.to_string()))
    }
}
