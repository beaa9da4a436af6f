//! Typed reflections of the TeamCity REST entities the gateway reads.
//!
//! Every field is defaulted so partial payloads (e.g. `fields=` projections)
//! still deserialize.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub parent_project_id: String,
    pub archived: bool,
    pub web_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectList {
    pub count: u64,
    pub project: Vec<Project>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildType {
    pub id: String,
    pub name: String,
    pub description: String,
    pub project_id: String,
    pub project_name: String,
    pub project: Option<Project>,
    pub paused: bool,
    pub web_url: String,
}

impl BuildType {
    pub fn display_project_name(&self) -> &str {
        match &self.project {
            Some(project) if !project.name.is_empty() => &project.name,
            _ => &self.project_name,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildTypeList {
    pub count: u64,
    pub build_type: Vec<BuildType>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Build {
    pub id: i64,
    pub number: String,
    pub status: String,
    pub state: String,
    pub branch_name: String,
    pub build_type_id: String,
    pub start_date: String,
    pub finish_date: String,
    pub queued_date: String,
    pub build_type: Option<BuildType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BuildList {
    pub count: u64,
    pub build: Vec<Build>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Agent {
    pub id: i64,
    pub name: String,
    pub connected: bool,
    pub enabled: bool,
    pub web_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AgentList {
    pub count: u64,
    pub agent: Vec<Agent>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParameterList {
    pub property: Vec<Parameter>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BuildStep {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub step_type: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BuildStepList {
    pub step: Vec<BuildStep>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VcsRoot {
    pub id: String,
    pub name: String,
    pub vcs_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VcsRootEntry {
    #[serde(rename = "vcs-root")]
    pub vcs_root: VcsRoot,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VcsRootEntryList {
    #[serde(rename = "vcs-root-entry")]
    pub vcs_root_entry: Vec<VcsRootEntry>,
}

/// A build configuration together with the three detail collections that
/// need separate REST calls.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DetailedBuildType {
    #[serde(flatten)]
    pub build_type: BuildType,
    pub enabled: Option<bool>,
    pub template: bool,
    #[serde(skip)]
    pub parameters: Vec<Parameter>,
    #[serde(skip)]
    pub steps: Vec<BuildStep>,
    #[serde(skip)]
    pub vcs_roots: Vec<VcsRoot>,
}

impl From<BuildType> for DetailedBuildType {
    fn from(build_type: BuildType) -> Self {
        Self {
            build_type,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TestOccurrence {
    pub id: String,
    pub name: String,
    pub status: String,
    pub duration: u64,
    pub details: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TestOccurrenceList {
    pub count: u64,
    pub test_occurrence: Vec<TestOccurrence>,
}

/// Accepts `"123"` as well as `123` for identifier arguments.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    }))
}
