//! TeamCity REST client and the operations the MCP tools and resources map to.

mod build_log;
mod build_types;
mod builds;
mod client;
mod error;
mod locator;
mod models;
mod projects;
mod resources;
mod test_occurrences;

use async_trait::async_trait;

pub use build_log::{render_log, LinePattern, LogFilter, Severity};
pub use build_types::{GetBuildTypesArgs, SearchBuildConfigurationsArgs};
pub use builds::{
    CancelBuildArgs, DownloadArtifactArgs, FetchBuildLogArgs, PinBuildArgs, SearchBuildsArgs,
    SetBuildTagArgs, TriggerBuildArgs,
};
pub use client::{parse_args, parse_build_id, TeamCityClient};
pub use error::{ClientError, ClientResult};
pub use locator::{calculate_duration, format_teamcity_date, Locator, DEFAULT_COUNT};
pub use models::*;
pub use projects::GetProjectsArgs;
pub use resources::{resource_uri, ResourceDescriptor, ResourceUri, JSON_MIME, SCHEME};
pub use test_occurrences::TestResultsArgs;

/// Upstream reachability check used by `/readyz`.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn check(&self) -> ClientResult<()>;
}

#[async_trait]
impl ReadinessProbe for TeamCityClient {
    async fn check(&self) -> ClientResult<()> {
        self.timed("readiness", async {
            self.request(reqwest::Method::GET, "/projects?locator=count:1", None)
                .await
                .map(|_| ())
        })
        .await
    }
}
