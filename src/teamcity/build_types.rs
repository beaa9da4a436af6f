//! Build configuration lookups and the two-phase configuration search.

use std::fmt::Write as _;

use serde::Deserialize;
use tracing::warn;

use super::client::TeamCityClient;
use super::error::ClientResult;
use super::locator::Locator;
use super::models::{
    BuildStepList, BuildType, BuildTypeList, DetailedBuildType, ParameterList, VcsRootEntryList,
};

const DETAIL_FIELDS: &str = "id,name,projectName,projectId,href,webUrl,enabled,paused,template";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchBuildConfigurationsArgs {
    pub project_id: Option<String>,
    pub name: Option<String>,
    pub enabled: Option<bool>,
    pub paused: Option<bool>,
    pub template: Option<bool>,
    pub count: Option<u32>,

    pub parameter_name: Option<String>,
    pub parameter_value: Option<String>,
    pub step_type: Option<String>,
    pub step_name: Option<String>,
    pub vcs_type: Option<String>,
    pub include_details: bool,
}

/// Lowercased needle for a case-insensitive `contains`; empty means "any".
fn needle(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

fn contains(haystack: &str, needle: &Option<String>) -> bool {
    needle
        .as_deref()
        .map_or(true, |n| haystack.to_lowercase().contains(n))
}

impl SearchBuildConfigurationsArgs {
    pub fn locator(&self) -> Locator {
        let mut locator = Locator::with_count(self.count);
        locator
            .push_str("project", self.project_id.as_deref())
            .push_str("name", self.name.as_deref())
            .push_bool("enabled", self.enabled)
            .push_bool("paused", self.paused)
            .push_bool("template", self.template);
        locator
    }

    /// Whether phase two (per-configuration detail fetch) is needed.
    pub fn needs_details(&self) -> bool {
        self.include_details
            || [
                &self.parameter_name,
                &self.parameter_value,
                &self.step_type,
                &self.step_name,
                &self.vcs_type,
            ]
            .iter()
            .any(|f| needle(f).is_some())
    }

    /// Every supplied detail filter must match at least one element; the
    /// name/value and type/name pairs must match on the same element.
    pub fn matches(&self, config: &DetailedBuildType) -> bool {
        let (param_name, param_value) = (needle(&self.parameter_name), needle(&self.parameter_value));
        if (param_name.is_some() || param_value.is_some())
            && !config
                .parameters
                .iter()
                .any(|p| contains(&p.name, &param_name) && contains(&p.value, &param_value))
        {
            return false;
        }

        let (step_type, step_name) = (needle(&self.step_type), needle(&self.step_name));
        if (step_type.is_some() || step_name.is_some())
            && !config
                .steps
                .iter()
                .any(|s| contains(&s.step_type, &step_type) && contains(&s.name, &step_name))
        {
            return false;
        }

        let vcs_type = needle(&self.vcs_type);
        if vcs_type.is_some() && !config.vcs_roots.iter().any(|v| contains(&v.vcs_name, &vcs_type))
        {
            return false;
        }

        true
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GetBuildTypesArgs {
    pub id: Option<String>,
    pub project: Option<String>,
    pub affected_project: Option<String>,
    pub name: Option<String>,
    pub paused: Option<bool>,
    pub template: Option<bool>,
    pub template_flag: Option<bool>,
    pub vcs_root: Option<String>,
    pub build: Option<String>,
    pub start: Option<u32>,
    pub count: Option<u32>,
}

impl GetBuildTypesArgs {
    pub fn locator(&self) -> Locator {
        let mut locator = Locator::with_count(self.count);
        locator
            .push_str("project", self.project.as_deref())
            .push_str("affectedProject", self.affected_project.as_deref())
            .push_str("name", self.name.as_deref())
            .push_bool("paused", self.paused)
            .push_bool("template", self.template)
            .push_bool("templateFlag", self.template_flag)
            .push_str("vcsRoot", self.vcs_root.as_deref())
            .push_str("build", self.build.as_deref())
            .push_num("start", self.start);
        locator
    }
}

impl TeamCityClient {
    pub async fn search_build_configurations(
        &self,
        args: SearchBuildConfigurationsArgs,
    ) -> ClientResult<String> {
        self.timed("search_build_configurations", async {
            let endpoint = format!("/buildTypes?locator={}", args.locator());
            let list: BuildTypeList = self
                .get_json(&endpoint, "build configurations")
                .await
                .map_err(|e| e.during("failed to get basic configurations"))?;

            let mut matching = Vec::with_capacity(list.build_type.len());
            if args.needs_details() {
                for config in list.build_type {
                    match self.build_type_details(&config.id).await {
                        Ok(detailed) if args.matches(&detailed) => matching.push(detailed),
                        Ok(_) => {}
                        Err(e) => {
                            warn!(
                                "Failed to get details for build configuration {}: {}",
                                config.id, e
                            );
                        }
                    }
                }
            } else {
                matching.extend(list.build_type.into_iter().map(DetailedBuildType::from));
            }

            Ok(render_configurations(&matching, args.include_details))
        })
        .await
    }

    /// Base fields plus parameters, steps and VCS roots. A failed sub-fetch is
    /// logged and leaves that collection empty.
    async fn build_type_details(&self, id: &str) -> ClientResult<DetailedBuildType> {
        let base = format!("/buildTypes/id:{}", urlencoding::encode(id));
        let mut detailed: DetailedBuildType = self
            .get_json(&format!("{}?fields={}", base, DETAIL_FIELDS), "build type details")
            .await?;

        match self
            .get_json::<ParameterList>(&format!("{}/parameters", base), "parameters")
            .await
        {
            Ok(list) => detailed.parameters = list.property,
            Err(e) => warn!("Failed to get parameters for {}: {}", id, e),
        }
        match self
            .get_json::<BuildStepList>(&format!("{}/steps", base), "steps")
            .await
        {
            Ok(list) => detailed.steps = list.step,
            Err(e) => warn!("Failed to get steps for {}: {}", id, e),
        }
        match self
            .get_json::<VcsRootEntryList>(&format!("{}/vcs-root-entries", base), "VCS roots")
            .await
        {
            Ok(list) => {
                detailed.vcs_roots = list
                    .vcs_root_entry
                    .into_iter()
                    .map(|entry| entry.vcs_root)
                    .collect()
            }
            Err(e) => warn!("Failed to get VCS roots for {}: {}", id, e),
        }

        Ok(detailed)
    }

    pub async fn get_build_types(&self, args: GetBuildTypesArgs) -> ClientResult<String> {
        self.timed("get_build_types", async {
            if let Some(id) = args.id.as_deref().filter(|id| !id.is_empty()) {
                let endpoint = format!("/buildTypes/id:{}", urlencoding::encode(id));
                let build_type: BuildType = self.get_json(&endpoint, "build type").await?;
                let mut out = String::new();
                write_build_type(&mut out, &build_type);
                return Ok(out);
            }

            let endpoint = format!("/buildTypes?locator={}", args.locator());
            let list: BuildTypeList = self.get_json(&endpoint, "build types").await?;
            if list.build_type.is_empty() {
                return Ok("No build configurations found matching the specified criteria.".to_string());
            }
            let mut out = format!("Found {} build configurations:\n\n", list.build_type.len());
            for build_type in &list.build_type {
                write_build_type(&mut out, build_type);
                out.push('\n');
            }
            Ok(out)
        })
        .await
    }
}

fn write_build_type(out: &mut String, build_type: &BuildType) {
    let _ = writeln!(out, "Build Configuration: {} ({})", build_type.name, build_type.id);
    let _ = writeln!(
        out,
        "  Project: {} ({})",
        build_type.display_project_name(),
        build_type.project_id
    );
    if !build_type.description.is_empty() {
        let _ = writeln!(out, "  Description: {}", build_type.description);
    }
    if build_type.paused {
        out.push_str("  Paused: true\n");
    }
    if !build_type.web_url.is_empty() {
        let _ = writeln!(out, "  URL: {}", build_type.web_url);
    }
}

fn render_configurations(configs: &[DetailedBuildType], include_details: bool) -> String {
    if configs.is_empty() {
        return "No build configurations found matching the specified criteria.".to_string();
    }

    let mut out = format!("Found {} build configurations:\n\n", configs.len());
    for config in configs {
        let bt = &config.build_type;
        let _ = writeln!(out, "Configuration: {} ({})", bt.name, bt.id);
        let _ = writeln!(out, "  Project: {} ({})", bt.display_project_name(), bt.project_id);
        if !bt.description.is_empty() {
            let _ = writeln!(out, "  Description: {}", bt.description);
        }

        if include_details {
            if !config.parameters.is_empty() {
                out.push_str("  Parameters:\n");
                for param in &config.parameters {
                    let _ = writeln!(out, "    {} = {}", param.name, param.value);
                }
            }
            if !config.steps.is_empty() {
                out.push_str("  Build Steps:\n");
                for (i, step) in config.steps.iter().enumerate() {
                    let disabled = if step.disabled { " (disabled)" } else { "" };
                    let _ = writeln!(
                        out,
                        "    {}. {} [{}]{}",
                        i + 1,
                        step.name,
                        step.step_type,
                        disabled
                    );
                }
            }
            if !config.vcs_roots.is_empty() {
                out.push_str("  VCS Roots:\n");
                for vcs in &config.vcs_roots {
                    let _ = writeln!(out, "    {} ({})", vcs.name, vcs.vcs_name);
                }
            }
        }

        out.push('\n');
    }
    out
}
