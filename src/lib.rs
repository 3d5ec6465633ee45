//! Declares a static website stack (private bucket, origin access identity,
//! cloudfront distribution, bucket policy, asset deployment) and synthesizes
//! it into a cloudformation template, an asset manifest and a deploy script.

pub mod assets;
pub mod config;
pub mod deploy_script;
pub mod error;
pub mod intrinsics;
pub mod naming;
pub mod resources;
pub mod stack;
pub mod template;

pub use config::SiteConfig;
pub use error::{ConfigError, SynthError};
pub use resources::static_website::StaticWebsite;
pub use stack::{App, Assembly, Stack, StackProps};
pub use template::{CfnResource, SavedTemplate};
