use std::fmt::Write as _;

use serde::Deserialize;

use super::client::{parse_build_id, TeamCityClient};
use super::error::ClientResult;
use super::locator::{Locator, DEFAULT_COUNT};
use super::models::{string_or_number, TestOccurrenceList};

const FAILURE: &str = "FAILURE";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TestResultsArgs {
    #[serde(deserialize_with = "string_or_number")]
    pub build_id: Option<String>,
    pub status: Option<String>,
    pub include_details: bool,
    pub count: Option<u32>,
}

impl TestResultsArgs {
    fn endpoint(&self, build_id: i64) -> String {
        let mut locator = Locator::new();
        locator
            .push("build", format!("(id:{})", build_id))
            .push_str("status", self.status.as_deref())
            .push("count", self.count.filter(|c| *c > 0).unwrap_or(DEFAULT_COUNT));

        let details = if self.include_details { ",details" } else { "" };
        format!(
            "/testOccurrences?locator={}&fields=count,testOccurrence(id,name,status,duration,href{})",
            locator, details
        )
    }
}

impl TeamCityClient {
    pub async fn get_test_results(&self, args: TestResultsArgs) -> ClientResult<String> {
        self.timed("get_test_results", async {
            let build_id = parse_build_id(args.build_id.as_deref())?;
            let list: TestOccurrenceList = self
                .get_json(&args.endpoint(build_id), "test results")
                .await
                .map_err(|e| e.during("failed to get test results"))?;

            if list.count == 0 {
                return Ok("No test results found for this build.".to_string());
            }
            let mut out = format!("Found {} test results:\n", list.count);
            for test in &list.test_occurrence {
                let _ = write!(
                    out,
                    "- {} [{}] (duration: {} ms)",
                    test.name, test.status, test.duration
                );
                if !test.details.is_empty() {
                    let _ = write!(out, ": {}", test.details);
                }
                out.push('\n');
            }
            Ok(out)
        })
        .await
    }

    pub async fn get_test_failures(&self, args: TestResultsArgs) -> ClientResult<String> {
        self.timed("get_test_failures", async {
            let build_id = parse_build_id(args.build_id.as_deref())?;
            let args = TestResultsArgs {
                status: Some(FAILURE.to_string()),
                include_details: true,
                ..args
            };
            let list: TestOccurrenceList = self
                .get_json(&args.endpoint(build_id), "test failures")
                .await
                .map_err(|e| e.during("failed to get test failures"))?;

            if list.count == 0 {
                return Ok("No failing tests found for this build.".to_string());
            }
            let mut out = format!("{} failing tests:\n", list.count);
            for test in &list.test_occurrence {
                let _ = write!(out, "- {} (duration: {} ms)", test.name, test.duration);
                if !test.details.is_empty() {
                    let _ = write!(out, ": {}", test.details);
                }
                out.push('\n');
            }
            Ok(out)
        })
        .await
    }
}
