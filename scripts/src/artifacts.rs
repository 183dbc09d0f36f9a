//! Selection of the artifact deployed for a logical name.
//!
//! A handful of proxy factories ship a harness variant that exposes extra
//! instrumentation to the unit tests. The harness is swapped in here, without
//! changing the shape of the deployment graph.

use std::fmt::{self, Display};

use crate::{
    constants::HARNESS_ARTIFACTS, environment::EnvironmentContext, types::DeploymentTarget,
};

/// The variant of an artifact to deploy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactVariant {
    /// The artifact deployed to real networks
    Production,
    /// The test-only artifact exposing additional instrumentation
    Harness,
}

impl ArtifactVariant {
    /// The variant the environment calls for
    pub fn for_env(env: &EnvironmentContext) -> Self {
        if env.is_test_environment && env.harness_enabled {
            ArtifactVariant::Harness
        } else {
            ArtifactVariant::Production
        }
    }
}

impl Display for ArtifactVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactVariant::Production => write!(f, "production"),
            ArtifactVariant::Harness => write!(f, "harness"),
        }
    }
}

/// The harness artifact of a logical name, if it has one
pub fn harness_artifact(logical_name: &str) -> Option<&'static str> {
    HARNESS_ARTIFACTS
        .iter()
        .find_map(|(name, harness)| (*name == logical_name).then_some(*harness))
}

/// The artifact of the given variant implementing the target
pub fn artifact_for(target: &DeploymentTarget, variant: ArtifactVariant) -> &str {
    match variant {
        ArtifactVariant::Harness => {
            harness_artifact(&target.logical_name).unwrap_or(target.artifact.as_str())
        }
        ArtifactVariant::Production => target.artifact.as_str(),
    }
}

/// The artifact to deploy for the target in the given environment
pub fn select<'a>(target: &'a DeploymentTarget, env: &EnvironmentContext) -> &'a str {
    artifact_for(target, ArtifactVariant::for_env(env))
}
