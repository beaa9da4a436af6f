use std::fmt::Write as _;

use serde::Deserialize;

use super::client::TeamCityClient;
use super::error::ClientResult;
use super::locator::Locator;
use super::models::{Project, ProjectList};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GetProjectsArgs {
    pub id: Option<String>,
    pub name: Option<String>,
    pub archived: Option<bool>,
    #[serde(rename = "virtual")]
    pub is_virtual: Option<bool>,
    pub parent_project: Option<String>,
    pub affected_project: Option<String>,
    pub build: Option<String>,
    pub build_type: Option<String>,
    pub vcs_root: Option<String>,
    pub start: Option<u32>,
    pub count: Option<u32>,
}

impl GetProjectsArgs {
    pub fn locator(&self) -> Locator {
        let mut locator = Locator::with_count(self.count);
        locator
            .push_str("name", self.name.as_deref())
            .push_bool("archived", self.archived)
            .push_bool("virtual", self.is_virtual)
            .push_str("parentProject", self.parent_project.as_deref())
            .push_str("affectedProject", self.affected_project.as_deref())
            .push_str("build", self.build.as_deref())
            .push_str("buildType", self.build_type.as_deref())
            .push_str("vcsRoot", self.vcs_root.as_deref())
            .push_num("start", self.start);
        locator
    }
}

impl TeamCityClient {
    /// A single project when `id` is given (other filters ignored), otherwise
    /// every project matching the locator filters.
    pub async fn get_projects(&self, args: GetProjectsArgs) -> ClientResult<String> {
        self.timed("get_projects", async {
            if let Some(id) = args.id.as_deref().filter(|id| !id.is_empty()) {
                let endpoint = format!("/projects/id:{}", urlencoding::encode(id));
                let project: Project = self.get_json(&endpoint, "project").await?;
                let mut out = String::new();
                write_project(&mut out, &project);
                return Ok(out);
            }

            let endpoint = format!("/projects?locator={}", args.locator());
            let list: ProjectList = self.get_json(&endpoint, "projects").await?;
            Ok(render_projects(&list))
        })
        .await
    }
}

fn write_project(out: &mut String, project: &Project) {
    let _ = writeln!(out, "Project: {} ({})", project.name, project.id);
    if !project.parent_project_id.is_empty() {
        let _ = writeln!(out, "  Parent: {}", project.parent_project_id);
    }
    if !project.description.is_empty() {
        let _ = writeln!(out, "  Description: {}", project.description);
    }
    if project.archived {
        out.push_str("  Archived: true\n");
    }
    if !project.web_url.is_empty() {
        let _ = writeln!(out, "  URL: {}", project.web_url);
    }
}

fn render_projects(list: &ProjectList) -> String {
    if list.project.is_empty() {
        return "No projects found matching the specified criteria.".to_string();
    }
    let mut out = format!("Found {} projects:\n\n", list.project.len());
    for project in &list.project {
        write_project(&mut out, project);
        out.push('\n');
    }
    out
}
