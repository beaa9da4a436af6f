//! Build operations: queueing, cancelling, pinning, tagging, search and logs.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use super::build_log::{render_log, LinePattern, LogFilter, Severity};
use super::client::{parse_body, parse_build_id, TeamCityClient};
use super::error::{ClientError, ClientResult};
use super::locator::{calculate_duration, format_teamcity_date, Locator};
use super::models::{string_or_number, Build, BuildList};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TriggerBuildArgs {
    pub build_type_id: String,
    pub branch_name: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub comment: Option<String>,
}

impl TriggerBuildArgs {
    fn request_body(&self) -> Value {
        let mut body = json!({ "buildType": { "id": self.build_type_id } });
        if let Some(branch) = self.branch_name.as_deref().filter(|b| !b.is_empty()) {
            body["branchName"] = json!(branch);
        }
        if let Some(comment) = self.comment.as_deref().filter(|c| !c.is_empty()) {
            body["comment"] = json!({ "text": comment });
        }
        if !self.properties.is_empty() {
            let property: Vec<Value> = self
                .properties
                .iter()
                .map(|(name, value)| json!({ "name": name, "value": value }))
                .collect();
            body["properties"] = json!({ "property": property });
        }
        body
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CancelBuildArgs {
    #[serde(deserialize_with = "string_or_number")]
    pub build_id: Option<String>,
    pub comment: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PinBuildArgs {
    #[serde(deserialize_with = "string_or_number")]
    pub build_id: Option<String>,
    pub pin: Option<bool>,
    pub comment: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SetBuildTagArgs {
    #[serde(deserialize_with = "string_or_number")]
    pub build_id: Option<String>,
    pub tags: Vec<String>,
    pub remove_tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DownloadArtifactArgs {
    #[serde(deserialize_with = "string_or_number")]
    pub build_id: Option<String>,
    pub artifact_path: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchBuildsArgs {
    pub build_type_id: Option<String>,
    pub status: Option<String>,
    pub state: Option<String>,
    pub branch: Option<String>,
    pub agent: Option<String>,
    pub user: Option<String>,
    pub since_build: Option<String>,
    pub since_date: Option<String>,
    pub until_date: Option<String>,
    pub tags: Vec<String>,
    pub personal: Option<bool>,
    pub pinned: Option<bool>,
    pub count: Option<u32>,
    pub project: Option<String>,
    pub number: Option<String>,
    pub hanging: Option<bool>,
    pub canceled: Option<bool>,
    pub failed_to_start: Option<bool>,
    pub composite: Option<bool>,
    pub tag: Option<String>,
    pub property: BTreeMap<String, String>,
    pub compatible_agent: Option<String>,
    pub dates: Option<String>,
}

impl SearchBuildsArgs {
    pub fn locator(&self) -> Locator {
        let mut locator = Locator::with_count(self.count);
        locator
            .push_str("buildType", self.build_type_id.as_deref())
            .push_str("status", self.status.as_deref())
            .push_str("state", self.state.as_deref())
            .push_str("branch", self.branch.as_deref())
            .push_str("agent", self.agent.as_deref())
            .push_str("user", self.user.as_deref())
            .push_str("sinceBuild", self.since_build.as_deref())
            .push_str("sinceDate", self.since_date.as_deref())
            .push_str("untilDate", self.until_date.as_deref())
            .push_bool("personal", self.personal)
            .push_bool("pinned", self.pinned)
            .push_str("project", self.project.as_deref())
            .push_str("number", self.number.as_deref())
            .push_bool("hanging", self.hanging)
            .push_bool("canceled", self.canceled)
            .push_bool("failedToStart", self.failed_to_start)
            .push_bool("composite", self.composite)
            .push_str("compatibleAgent", self.compatible_agent.as_deref());
        for tag in self.tags.iter().filter(|t| !t.is_empty()) {
            locator.push("tag", tag);
        }
        locator.push_str("tag", self.tag.as_deref());
        for (name, value) in &self.property {
            locator.push("property", format!("(name:{},value:{})", name, value));
        }
        locator.push_raw(self.dates.as_deref());
        locator
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FetchBuildLogArgs {
    #[serde(deserialize_with = "string_or_number")]
    pub build_id: Option<String>,
    pub plain: Option<bool>,
    pub archived: Option<bool>,
    pub date_format: Option<String>,
    pub max_lines: Option<usize>,
    pub filter_pattern: Option<String>,
    pub severity: Option<String>,
    pub tail_lines: Option<usize>,
}

impl FetchBuildLogArgs {
    fn download_path(&self, build_id: &str) -> String {
        let mut path = format!(
            "/downloadBuildLog.html?buildId={}",
            urlencoding::encode(build_id)
        );
        if self.plain.unwrap_or(true) {
            path.push_str("&plain=true");
        }
        if self.archived.unwrap_or(false) {
            path.push_str("&archived=true");
        }
        if let Some(format) = self.date_format.as_deref().filter(|f| !f.is_empty()) {
            let _ = write!(path, "&dateFormat={}", urlencoding::encode(format));
        }
        path
    }

    fn filter(&self) -> ClientResult<LogFilter> {
        let severity = match self.severity.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => Some(raw.parse::<Severity>()?),
            None => None,
        };
        Ok(LogFilter {
            pattern: self
                .filter_pattern
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(LinePattern::new),
            severity,
            tail_lines: self.tail_lines,
            max_lines: self.max_lines,
        })
    }
}

fn build_endpoint(build_id: i64) -> String {
    format!("/builds/id:{}", build_id)
}

impl TeamCityClient {
    async fn get_build(&self, build_id: i64) -> ClientResult<Build> {
        let body = self
            .request(Method::GET, &build_endpoint(build_id), None)
            .await
            .map_err(|e| e.during("build not found"))?;
        parse_body(&body, "build")
    }

    pub async fn trigger_build(&self, args: TriggerBuildArgs) -> ClientResult<String> {
        self.timed("trigger_build", async {
            if args.build_type_id.is_empty() {
                return Err(ClientError::MissingArgument("buildTypeId"));
            }
            let body = self
                .request(Method::POST, "/buildQueue", Some(&args.request_body()))
                .await
                .map_err(|e| e.during("failed to trigger build"))?;
            let build: Build = parse_body(&body, "trigger")?;
            Ok(format!(
                "Build #{} queued successfully (ID: {})",
                build.number, build.id
            ))
        })
        .await
    }

    pub async fn cancel_build(&self, args: CancelBuildArgs) -> ClientResult<String> {
        self.timed("cancel_build", async {
            let build_id = parse_build_id(args.build_id.as_deref())?;
            let build = self.get_build(build_id).await?;

            let body = json!({ "comment": args.comment });
            self.request(
                Method::POST,
                &format!("{}/cancelRequest", build_endpoint(build_id)),
                Some(&body),
            )
            .await
            .map_err(|e| e.during("failed to cancel build"))?;

            Ok(format!("Build #{} cancelled successfully", build.number))
        })
        .await
    }

    pub async fn pin_build(&self, args: PinBuildArgs) -> ClientResult<String> {
        self.timed("pin_build", async {
            let build_id = parse_build_id(args.build_id.as_deref())?;
            let pin = args.pin.ok_or(ClientError::MissingArgument("pin"))?;
            let build = self.get_build(build_id).await?;
            let endpoint = format!("{}/pin", build_endpoint(build_id));

            if pin {
                let body = json!({ "comment": args.comment });
                self.request(Method::PUT, &endpoint, Some(&body))
                    .await
                    .map_err(|e| e.during("failed to pin build"))?;
                Ok(format!("Build #{} pinned successfully", build.number))
            } else {
                self.request(Method::DELETE, &endpoint, None)
                    .await
                    .map_err(|e| e.during("failed to unpin build"))?;
                Ok(format!("Build #{} unpinned successfully", build.number))
            }
        })
        .await
    }

    /// Applies each add, then each removal, one upstream call apiece. The first
    /// failing tag aborts the rest; tags already applied stay applied.
    pub async fn set_build_tag(&self, args: SetBuildTagArgs) -> ClientResult<String> {
        self.timed("set_build_tag", async {
            let build_id = parse_build_id(args.build_id.as_deref())?;
            let build = self.get_build(build_id).await?;
            let tags_endpoint = format!("{}/tags", build_endpoint(build_id));

            for tag in &args.tags {
                self.request(Method::POST, &tags_endpoint, Some(&json!({ "name": tag })))
                    .await
                    .map_err(|e| e.during(format!("failed to add tag {}", tag)))?;
            }
            for tag in &args.remove_tags {
                let endpoint = format!("{}/{}", tags_endpoint, urlencoding::encode(tag));
                self.request(Method::DELETE, &endpoint, None)
                    .await
                    .map_err(|e| e.during(format!("failed to remove tag {}", tag)))?;
            }

            Ok(format!("Tags updated for build #{}", build.number))
        })
        .await
    }

    // TODO: stream the artifact from /builds/id:{id}/artifacts/content/{path}
    // once MCP clients can accept binary content blocks.
    pub async fn download_artifact(&self, args: DownloadArtifactArgs) -> ClientResult<String> {
        self.timed("download_artifact", async {
            let build_id = args
                .build_id
                .filter(|id| !id.is_empty())
                .ok_or(ClientError::MissingArgument("buildId"))?;
            if args.artifact_path.is_empty() {
                return Err(ClientError::MissingArgument("artifactPath"));
            }
            Ok(format!(
                "Artifact {} from build {} download initiated",
                args.artifact_path, build_id
            ))
        })
        .await
    }

    pub async fn search_builds(&self, args: SearchBuildsArgs) -> ClientResult<String> {
        self.timed("search_builds", async {
            let endpoint = format!("/builds?locator={}", args.locator());
            let body = self
                .request(Method::GET, &endpoint, None)
                .await
                .map_err(|e| e.during("failed to search builds"))?;
            let list: BuildList = parse_body(&body, "builds")?;
            Ok(render_builds(&list))
        })
        .await
    }

    pub async fn fetch_build_log(&self, args: FetchBuildLogArgs) -> ClientResult<String> {
        self.timed("fetch_build_log", async {
            let build_id = args
                .build_id
                .as_deref()
                .filter(|id| !id.is_empty())
                .ok_or(ClientError::MissingArgument("buildId"))?;
            let filter = args.filter()?;

            let bytes = self.download(&args.download_path(build_id)).await?;
            if args.archived.unwrap_or(false) {
                return Ok(format!(
                    "Build log for build {} downloaded as archive ({} bytes). Archive content is binary data.",
                    build_id,
                    bytes.len()
                ));
            }

            let content = String::from_utf8_lossy(&bytes);
            Ok(render_log(build_id, &content, &filter))
        })
        .await
    }
}

fn render_builds(list: &BuildList) -> String {
    if list.count == 0 {
        return "No builds found matching the specified criteria.".to_string();
    }

    let mut out = format!("Found {} builds:\n\n", list.count);
    for build in &list.build {
        let build_type_name = build
            .build_type
            .as_ref()
            .map(|bt| bt.name.as_str())
            .unwrap_or_default();
        let _ = writeln!(out, "Build #{} (ID: {})", build.number, build.id);
        let _ = writeln!(out, "  Status: {}", build.status);
        let _ = writeln!(out, "  State: {}", build.state);
        let _ = writeln!(
            out,
            "  Build Type: {} ({})",
            build_type_name, build.build_type_id
        );
        if !build.branch_name.is_empty() {
            let _ = writeln!(out, "  Branch: {}", build.branch_name);
        }

        for (label, date) in [
            ("Queued", &build.queued_date),
            ("Started", &build.start_date),
            ("Finished", &build.finish_date),
        ] {
            if !date.is_empty() {
                let _ = writeln!(out, "  {}: {}", label, format_teamcity_date(date));
            }
        }

        for (label, from, to) in [
            ("Queue Time", &build.queued_date, &build.start_date),
            ("Build Time", &build.start_date, &build.finish_date),
            ("Total Time", &build.queued_date, &build.finish_date),
        ] {
            let duration = calculate_duration(from, to);
            if !duration.is_empty() {
                let _ = writeln!(out, "  {}: {}", label, duration);
            }
        }

        out.push('\n');
    }
    out
}
