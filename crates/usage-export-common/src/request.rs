//! Account/region targets and collection requests

use std::fmt;

use crate::catalog::{MetricFunction, MetricSpec};
use crate::defaults::METRIC_SERVICE_NAME;
use crate::error::RequestError;

/// Strongly-typed AWS account ID (12-digit string)
///
/// This newtype prevents accidentally mixing account IDs with other strings
/// and ensures account validation happens at specific points in the code.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display, derive_more::Deref,
)]
pub struct AccountId(String);

impl AccountId {
    /// Validate and wrap a 12-digit account id
    pub fn parse(s: &str) -> Result<Self, RequestError> {
        let s = s.trim();
        if s.len() == 12 && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(AccountId(s.to_string()))
        } else {
            Err(RequestError::InvalidAccountId(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One account/region pair: the unit of enumeration fan-out
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Target {
    pub account: AccountId,
    pub region: String,
}

impl Target {
    pub fn new(account: AccountId, region: impl Into<String>) -> Self {
        Self {
            account,
            region: region.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account, self.region)
    }
}

/// Opaque identifier of a resource within one account/region
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display, derive_more::Deref,
)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        ResourceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A resource together with the account/region it lives in.
///
/// Ordering is lexicographic on (account, region, id), which is the order
/// used to truncate enumeration results to the resource cap.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopedResource {
    pub target: Target,
    pub id: ResourceId,
}

/// Immutable description of one metric collection run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRequest {
    accounts: Vec<AccountId>,
    regions: Vec<String>,
    service_name: String,
    function_name: String,
    metric_spec: MetricSpec,
}

impl CollectionRequest {
    pub fn builder() -> CollectionRequestBuilder {
        CollectionRequestBuilder::default()
    }

    /// Request for a catalog function, filed under the `cloudwatch` service
    pub fn for_function(
        function: MetricFunction,
        accounts: Vec<AccountId>,
        regions: Vec<String>,
    ) -> Result<Self, RequestError> {
        Self::builder()
            .accounts(accounts)
            .regions(regions)
            .service_name(METRIC_SERVICE_NAME)
            .function_name(function.name())
            .metric_spec(function.spec())
            .build()
    }

    pub fn accounts(&self) -> &[AccountId] {
        &self.accounts
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn metric_spec(&self) -> &MetricSpec {
        &self.metric_spec
    }

    /// Account × region cross product in declaration order
    pub fn targets(&self) -> Vec<Target> {
        self.accounts
            .iter()
            .flat_map(|account| {
                self.regions
                    .iter()
                    .map(move |region| Target::new(account.clone(), region.clone()))
            })
            .collect()
    }
}

/// Builder for [`CollectionRequest`]
#[derive(Debug, Default)]
pub struct CollectionRequestBuilder {
    accounts: Vec<AccountId>,
    regions: Vec<String>,
    service_name: Option<String>,
    function_name: Option<String>,
    metric_spec: Option<MetricSpec>,
}

impl CollectionRequestBuilder {
    pub fn accounts(mut self, accounts: Vec<AccountId>) -> Self {
        self.accounts = accounts;
        self
    }

    pub fn regions(mut self, regions: Vec<String>) -> Self {
        self.regions = regions;
        self
    }

    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    pub fn function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    pub fn metric_spec(mut self, spec: MetricSpec) -> Self {
        self.metric_spec = Some(spec);
        self
    }

    pub fn build(self) -> Result<CollectionRequest, RequestError> {
        if self.accounts.is_empty() {
            return Err(RequestError::MissingField("accounts"));
        }
        let regions: Vec<String> = self
            .regions
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        if regions.is_empty() {
            return Err(RequestError::MissingField("regions"));
        }
        let service_name = self
            .service_name
            .filter(|s| !s.is_empty())
            .ok_or(RequestError::MissingField("service_name"))?;
        let function_name = self
            .function_name
            .filter(|s| !s.is_empty())
            .ok_or(RequestError::MissingField("function_name"))?;
        let metric_spec = self
            .metric_spec
            .ok_or(RequestError::MissingField("metric_spec"))?;
        if metric_spec.statistics.is_empty() {
            return Err(RequestError::MissingField("statistics"));
        }

        Ok(CollectionRequest {
            accounts: self.accounts,
            regions,
            service_name,
            function_name,
            metric_spec,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(s: &str) -> AccountId {
        AccountId::parse(s).unwrap()
    }

    #[test]
    fn test_account_id_parse() {
        assert_eq!(account("123456789012").as_str(), "123456789012");
        assert_eq!(account(" 123456789012 ").to_string(), "123456789012");
        assert!(AccountId::parse("12345").is_err());
        assert!(AccountId::parse("12345678901a").is_err());
    }

    #[test]
    fn test_targets_cross_product() {
        let request = CollectionRequest::for_function(
            MetricFunction::CpuUtilization,
            vec![account("111111111111"), account("222222222222")],
            vec!["us-east-1".to_string(), "eu-west-1".to_string()],
        )
        .unwrap();

        let targets: Vec<String> = request.targets().iter().map(|t| t.to_string()).collect();
        assert_eq!(
            targets,
            vec![
                "111111111111/us-east-1",
                "111111111111/eu-west-1",
                "222222222222/us-east-1",
                "222222222222/eu-west-1",
            ]
        );
        assert_eq!(request.service_name(), "cloudwatch");
        assert_eq!(request.function_name(), "cpu_utilization");
    }

    #[test]
    fn test_builder_rejects_missing_fields() {
        let err = CollectionRequest::for_function(
            MetricFunction::RdsReadIops,
            vec![],
            vec!["us-east-1".to_string()],
        )
        .unwrap_err();
        assert_eq!(err, RequestError::MissingField("accounts"));

        let err = CollectionRequest::for_function(
            MetricFunction::RdsReadIops,
            vec![account("111111111111")],
            vec![" ".to_string()],
        )
        .unwrap_err();
        assert_eq!(err, RequestError::MissingField("regions"));

        let err = CollectionRequest::builder()
            .accounts(vec![account("111111111111")])
            .regions(vec!["us-east-1".to_string()])
            .service_name("cloudwatch")
            .build()
            .unwrap_err();
        assert_eq!(err, RequestError::MissingField("function_name"));
    }

    #[test]
    fn test_scoped_resource_ordering() {
        let a = ScopedResource {
            target: Target::new(account("111111111111"), "us-east-1"),
            id: ResourceId::new("z"),
        };
        let b = ScopedResource {
            target: Target::new(account("111111111111"), "us-west-2"),
            id: ResourceId::new("a"),
        };
        let c = ScopedResource {
            target: Target::new(account("222222222222"), "af-south-1"),
            id: ResourceId::new("a"),
        };
        let mut all = vec![c.clone(), b.clone(), a.clone()];
        all.sort();
        assert_eq!(all, vec![a, b, c]);
    }
}
