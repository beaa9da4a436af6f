//! Collection listings and generic resource reads keyed by `teamcity://` URIs.

use serde::Serialize;
use serde_json::Value;

use super::client::TeamCityClient;
use super::error::{ClientError, ClientResult};
use super::locator::Locator;
use super::models::{AgentList, BuildList, BuildTypeList, ProjectList};

pub const SCHEME: &str = "teamcity";
pub const JSON_MIME: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

impl ResourceDescriptor {
    pub fn new(uri: String, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            uri,
            name: name.into(),
            description: description.into(),
            mime_type: JSON_MIME.to_string(),
        }
    }
}

pub fn resource_uri(collection: &str, id: impl std::fmt::Display) -> String {
    format!("{}://{}/{}", SCHEME, collection, id)
}

/// A parsed `teamcity://...` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUri {
    Projects(Option<String>),
    BuildTypes(Option<String>),
    Builds(Option<String>),
    Agents(Option<String>),
    Artifacts { build_id: String },
}

impl ResourceUri {
    pub fn parse(uri: &str) -> ClientResult<Self> {
        let unsupported = || ClientError::UnsupportedResource(uri.to_string());
        let rest = uri
            .strip_prefix(SCHEME)
            .and_then(|r| r.strip_prefix("://"))
            .ok_or_else(unsupported)?;

        if let Some(query) = rest.strip_prefix("artifacts?locator=") {
            let build_id = query
                .strip_prefix("build:")
                .map(|id| id.trim_start_matches("(id:").trim_end_matches(')'))
                .filter(|id| !id.is_empty())
                .ok_or_else(unsupported)?;
            return Ok(ResourceUri::Artifacts {
                build_id: build_id.to_string(),
            });
        }

        let (collection, id) = match rest.split_once('/') {
            Some((collection, id)) if !id.is_empty() && !id.contains('/') => {
                (collection, Some(id.to_string()))
            }
            Some(_) => return Err(unsupported()),
            None => (rest, None),
        };

        match collection {
            "projects" => Ok(ResourceUri::Projects(id)),
            "buildTypes" => Ok(ResourceUri::BuildTypes(id)),
            "builds" => Ok(ResourceUri::Builds(id)),
            "agents" => Ok(ResourceUri::Agents(id)),
            _ => Err(unsupported()),
        }
    }

    /// REST endpoint (relative to `/app/rest`) serving this resource.
    pub fn endpoint(&self) -> String {
        let by_id = |collection: &str, id: &Option<String>, default_query: &str| match id {
            Some(id) => format!("/{}/id:{}", collection, urlencoding::encode(id)),
            None => format!("/{}{}", collection, default_query),
        };
        match self {
            ResourceUri::Projects(id) => by_id("projects", id, ""),
            ResourceUri::BuildTypes(id) => by_id("buildTypes", id, ""),
            ResourceUri::Builds(id) => {
                by_id("builds", id, &format!("?locator={}", Locator::with_count(None)))
            }
            ResourceUri::Agents(id) => by_id("agents", id, ""),
            ResourceUri::Artifacts { build_id } => format!(
                "/builds/id:{}/artifacts/children",
                urlencoding::encode(build_id)
            ),
        }
    }
}

impl TeamCityClient {
    pub async fn list_projects(&self) -> ClientResult<Vec<ResourceDescriptor>> {
        self.timed("list_projects", async {
            let list: ProjectList = self.get_json("/projects", "projects").await?;
            Ok(list
                .project
                .into_iter()
                .map(|p| ResourceDescriptor::new(resource_uri("projects", &p.id), p.name, p.description))
                .collect())
        })
        .await
    }

    pub async fn list_build_types(&self) -> ClientResult<Vec<ResourceDescriptor>> {
        self.timed("list_build_types", async {
            let list: BuildTypeList = self.get_json("/buildTypes", "build types").await?;
            Ok(list
                .build_type
                .into_iter()
                .map(|bt| {
                    ResourceDescriptor::new(resource_uri("buildTypes", &bt.id), bt.name, bt.description)
                })
                .collect())
        })
        .await
    }

    /// The 100 most recent builds.
    pub async fn list_builds(&self) -> ClientResult<Vec<ResourceDescriptor>> {
        self.timed("list_builds", async {
            let endpoint = format!("/builds?locator={}", Locator::with_count(None));
            let list: BuildList = self.get_json(&endpoint, "builds").await?;
            Ok(list
                .build
                .into_iter()
                .map(|b| {
                    ResourceDescriptor::new(
                        resource_uri("builds", b.id),
                        format!("Build #{}", b.number),
                        format!("Status: {}", b.status),
                    )
                })
                .collect())
        })
        .await
    }

    pub async fn list_agents(&self) -> ClientResult<Vec<ResourceDescriptor>> {
        self.timed("list_agents", async {
            let list: AgentList = self.get_json("/agents", "agents").await?;
            Ok(list
                .agent
                .into_iter()
                .map(|a| {
                    ResourceDescriptor::new(
                        resource_uri("agents", a.id),
                        a.name,
                        format!("Connected: {}", a.connected),
                    )
                })
                .collect())
        })
        .await
    }

    /// Fetch the raw upstream JSON behind a resource URI.
    pub async fn get_resource(&self, uri: &str) -> ClientResult<Value> {
        self.timed("get_resource", async {
            let resource = ResourceUri::parse(uri)?;
            self.get_json(&resource.endpoint(), "resource").await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_collections_and_ids() {
        assert_eq!(
            ResourceUri::parse("teamcity://projects").unwrap(),
            ResourceUri::Projects(None)
        );
        assert_eq!(
            ResourceUri::parse("teamcity://builds/42").unwrap(),
            ResourceUri::Builds(Some("42".to_string()))
        );
        assert_eq!(
            ResourceUri::parse("teamcity://artifacts?locator=build:7").unwrap(),
            ResourceUri::Artifacts {
                build_id: "7".to_string()
            }
        );
        assert_eq!(
            ResourceUri::parse("teamcity://artifacts?locator=build:(id:7)").unwrap(),
            ResourceUri::Artifacts {
                build_id: "7".to_string()
            }
        );
    }

    #[test]
    fn rejects_unknown_uris() {
        for uri in [
            "http://projects",
            "teamcity://users",
            "teamcity://builds/1/log",
            "teamcity://artifacts?locator=",
        ] {
            assert!(
                matches!(ResourceUri::parse(uri), Err(ClientError::UnsupportedResource(_))),
                "{uri} should be unsupported"
            );
        }
    }

    #[test]
    fn endpoints() {
        assert_eq!(ResourceUri::Projects(None).endpoint(), "/projects");
        assert_eq!(
            ResourceUri::BuildTypes(Some("Proj_Build".into())).endpoint(),
            "/buildTypes/id:Proj_Build"
        );
        assert_eq!(
            ResourceUri::Builds(None).endpoint(),
            "/builds?locator=count:100"
        );
        assert_eq!(
            ResourceUri::Artifacts {
                build_id: "9".into()
            }
            .endpoint(),
            "/builds/id:9/artifacts/children"
        );
    }
}
