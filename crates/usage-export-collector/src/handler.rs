//! Function-style entry point: event in, `{ statusCode, body }` out
//!
//! | Condition | Status |
//! |-----------|--------|
//! | missing/unknown service, malformed accounts or regions | 400 |
//! | region discovery failed, or every job failed | 500 |
//! | otherwise (including partial failures) | 200 |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{Instrument, error, info, info_span};
use usage_export_common::{
    AccountId, CarbonFootprintSource, MetricFetcher, ObjectStore, RegionLister, RequestError,
    ResourceEnumerator,
};

use crate::config::{RegionSelection, TargetConfig, parse_accounts};
use crate::dispatch::Service;
use crate::runner::{JobReport, JobRunner};

/// A list given either as a comma-separated string or as an array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListField {
    Csv(String),
    List(Vec<String>),
}

impl ListField {
    pub fn items(&self) -> Vec<String> {
        match self {
            ListField::Csv(s) => s.split(',').map(|item| item.trim().to_string()).collect(),
            ListField::List(items) => items.clone(),
        }
    }
}

/// Incoming event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerRequest {
    #[serde(default)]
    pub service: Option<String>,
    /// Overrides the configured accounts
    #[serde(default)]
    pub accounts: Option<ListField>,
    /// Overrides the configured regions; may be `"all"`
    #[serde(default)]
    pub regions: Option<ListField>,
}

impl HandlerRequest {
    pub fn for_service(service: impl Into<String>) -> Self {
        Self {
            service: Some(service.into()),
            ..Self::default()
        }
    }
}

/// Response in the shape function runtimes expect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON document: job key -> report, or `{"error": ...}`
    pub body: String,
}

impl HandlerResponse {
    pub fn error(status_code: u16, message: &str) -> Self {
        Self {
            status_code,
            body: serde_json::json!({ "error": message }).to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    /// Parse the body as job reports; `None` for error bodies
    pub fn reports(&self) -> Option<BTreeMap<String, JobReport>> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Dispatches events to jobs and folds their reports into one response
#[derive(Debug)]
pub struct Handler<E, F, O, C> {
    runner: JobRunner<E, F, O, C>,
    defaults: TargetConfig,
}

impl<E, F, O, C> Handler<E, F, O, C>
where
    E: ResourceEnumerator + RegionLister,
    F: MetricFetcher,
    O: ObjectStore,
    C: CarbonFootprintSource,
{
    pub fn new(runner: JobRunner<E, F, O, C>, defaults: TargetConfig) -> Self {
        Self { runner, defaults }
    }

    pub fn runner(&self) -> &JobRunner<E, F, O, C> {
        &self.runner
    }

    pub async fn handle(&self, request: HandlerRequest) -> HandlerResponse {
        let service = match parse_service(request.service.as_deref()) {
            Ok(service) => service,
            Err(e) => {
                error!(error = %e, "Rejected request");
                return HandlerResponse::error(400, &e.to_string());
            }
        };

        let (accounts, regions) = match self.resolve_targets(&request).await {
            Ok(targets) => targets,
            Err(response) => return response,
        };

        info!(
            service = %service,
            accounts = accounts.len(),
            regions = regions.len(),
            "Processing service"
        );

        let mut results = BTreeMap::new();
        for job in service.jobs() {
            let key = service.job_key(job);
            let report = match self
                .runner
                .run(job, &accounts, &regions)
                .instrument(info_span!("job", key = %key))
                .await
            {
                Ok(report) => report,
                Err(e) => {
                    error!(job = %key, error = %format!("{e:#}"), "Job failed");
                    JobReport::failed(job.function_name(), &e)
                }
            };
            results.insert(key, report);
        }

        let all_failed = results.values().all(|r| r.status.is_failed());
        let status_code = if all_failed { 500 } else { 200 };
        info!(
            service = %service,
            status_code,
            failed = results.values().filter(|r| r.status.is_failed()).count(),
            total = results.len(),
            "Finished service"
        );

        match serde_json::to_string(&results) {
            Ok(body) => HandlerResponse { status_code, body },
            Err(e) => HandlerResponse::error(500, &format!("Failed to encode results: {e}")),
        }
    }

    /// Accounts and regions for `request`, falling back to the configured
    /// defaults. Errors are returned as ready-made responses.
    pub async fn resolve_targets(
        &self,
        request: &HandlerRequest,
    ) -> Result<(Vec<AccountId>, Vec<String>), HandlerResponse> {
        let accounts = self
            .resolve_accounts(request.accounts.as_ref())
            .map_err(|e| HandlerResponse::error(400, &e.to_string()))?;
        let selection = match &request.regions {
            Some(field) => RegionSelection::parse(field.items()),
            None => self.defaults.regions.clone(),
        };
        let regions = self.resolve_regions(selection, &accounts).await?;
        Ok((accounts, regions))
    }

    fn resolve_accounts(&self, field: Option<&ListField>) -> Result<Vec<AccountId>, RequestError> {
        let accounts = match field {
            Some(field) => parse_accounts(&field.items())?,
            None => self.defaults.accounts.clone(),
        };
        if accounts.is_empty() {
            return Err(RequestError::MissingField("accounts"));
        }
        Ok(accounts)
    }

    /// `all` is resolved against the first account
    async fn resolve_regions(
        &self,
        selection: RegionSelection,
        accounts: &[AccountId],
    ) -> Result<Vec<String>, HandlerResponse> {
        let regions = match selection {
            RegionSelection::Listed(regions) => regions,
            RegionSelection::All => {
                let Some(account) = accounts.first() else {
                    return Err(HandlerResponse::error(400, "accounts cannot be empty"));
                };
                self.runner
                    .collector()
                    .enumerator()
                    .enabled_regions(account)
                    .await
                    .map_err(|e| {
                        error!(account = %account, error = %e, "Region discovery failed");
                        HandlerResponse::error(500, &format!("Failed to list regions: {e}"))
                    })?
            }
        };
        if regions.is_empty() {
            return Err(HandlerResponse::error(
                400,
                &RequestError::MissingField("regions").to_string(),
            ));
        }
        Ok(regions)
    }
}

fn parse_service(name: Option<&str>) -> Result<Service, RequestError> {
    match name.map(str::trim) {
        None | Some("") => Err(RequestError::MissingService),
        Some(name) => name.parse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_string_or_list() {
        let req: HandlerRequest = serde_json::from_str(
            r#"{"service": "network_in", "accounts": "111111111111, 222222222222", "regions": ["ca-central-1"]}"#,
        )
        .unwrap();
        assert_eq!(req.service.as_deref(), Some("network_in"));
        assert_eq!(
            req.accounts.unwrap().items(),
            ["111111111111", "222222222222"]
        );
        assert_eq!(req.regions.unwrap().items(), ["ca-central-1"]);
    }

    #[test]
    fn test_request_defaults() {
        let req: HandlerRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req, HandlerRequest::default());
    }

    #[test]
    fn test_response_shape() {
        let response = HandlerResponse::error(400, "Service ec2 is not supported");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["statusCode"], 400);
        let body: serde_json::Value =
            serde_json::from_str(value["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["error"], "Service ec2 is not supported");
        assert!(response.reports().is_none());
    }

    #[test]
    fn test_parse_service() {
        assert_eq!(parse_service(None), Err(RequestError::MissingService));
        assert_eq!(parse_service(Some(" ")), Err(RequestError::MissingService));
        assert_eq!(parse_service(Some("CPUUtilization")), Ok(Service::CpuUtilization));
        assert_eq!(
            parse_service(Some("s3")),
            Err(RequestError::UnsupportedService("s3".to_string()))
        );
    }
}
