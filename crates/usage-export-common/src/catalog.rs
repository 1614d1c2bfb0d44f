//! CloudWatch metric catalog.
//!
//! This module is the single source of truth for which metrics can be
//! exported, which namespace and metric name each one queries, and which
//! option number the dispatcher uses to select it.

use std::fmt;
use std::str::FromStr;

use crate::defaults::DEFAULT_PERIOD_SECONDS;
use crate::error::RequestError;
use crate::resource_kind::ResourceKind;

/// CloudWatch namespaces with a matching resource enumerator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Ec2,
    CwAgent,
    Ebs,
    Ecs,
    Rds,
}

impl Namespace {
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Ec2 => "AWS/EC2",
            Namespace::CwAgent => "CWAgent",
            Namespace::Ebs => "AWS/EBS",
            Namespace::Ecs => "AWS/ECS",
            Namespace::Rds => "AWS/RDS",
        }
    }

    /// Kind of resource whose identifiers are used as the metric dimension
    pub fn resource_kind(self) -> ResourceKind {
        match self {
            Namespace::Ec2 | Namespace::CwAgent => ResourceKind::Ec2Instance,
            Namespace::Ebs => ResourceKind::EbsVolume,
            Namespace::Ecs => ResourceKind::EcsCluster,
            Namespace::Rds => ResourceKind::RdsInstance,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AWS/EC2" => Ok(Namespace::Ec2),
            "CWAgent" => Ok(Namespace::CwAgent),
            "AWS/EBS" => Ok(Namespace::Ebs),
            "AWS/ECS" => Ok(Namespace::Ecs),
            "AWS/RDS" => Ok(Namespace::Rds),
            other => Err(RequestError::UnsupportedNamespace(other.to_string())),
        }
    }
}

/// CloudWatch aggregation statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Statistic {
    Average,
    Sum,
    Minimum,
    Maximum,
    SampleCount,
}

impl Statistic {
    pub fn as_str(self) -> &'static str {
        match self {
            Statistic::Average => "Average",
            Statistic::Sum => "Sum",
            Statistic::Minimum => "Minimum",
            Statistic::Maximum => "Maximum",
            Statistic::SampleCount => "SampleCount",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Statistic {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Average" => Ok(Statistic::Average),
            "Sum" => Ok(Statistic::Sum),
            "Minimum" => Ok(Statistic::Minimum),
            "Maximum" => Ok(Statistic::Maximum),
            "SampleCount" => Ok(Statistic::SampleCount),
            other => Err(RequestError::UnknownStatistic(other.to_string())),
        }
    }
}

/// What to ask CloudWatch for, independent of any particular resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSpec {
    pub namespace: Namespace,
    pub metric_name: String,
    pub statistics: Vec<Statistic>,
    pub period_seconds: i32,
}

impl MetricSpec {
    /// Spec with the default period and a single `Average` statistic
    pub fn average(namespace: Namespace, metric_name: impl Into<String>) -> Self {
        Self {
            namespace,
            metric_name: metric_name.into(),
            statistics: vec![Statistic::Average],
            period_seconds: DEFAULT_PERIOD_SECONDS,
        }
    }
}

/// Every metric export the dispatcher knows about.
///
/// Option numbers are stable identifiers shared with callers that select
/// exports numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricFunction {
    CpuUtilization,
    MemUsedPercent,
    NetworkIn,
    NetworkOut,
    NetworkPacketsIn,
    NetworkPacketsOut,
    VolumeReadOps,
    VolumeWriteOps,
    VolumeReadBytes,
    VolumeWriteBytes,
    CpuReservation,
    MemoryReservation,
    RdsCpuUtilization,
    RdsDatabaseConnections,
    RdsFreeableMemory,
    RdsFreeStorageSpace,
    RdsReadIops,
    RdsWriteIops,
    RdsReadThroughput,
    RdsWriteThroughput,
    RdsReplicaLag,
    RdsAuroraCapacityUnits,
}

impl MetricFunction {
    pub const ALL: [MetricFunction; 22] = [
        MetricFunction::CpuUtilization,
        MetricFunction::MemUsedPercent,
        MetricFunction::NetworkIn,
        MetricFunction::NetworkOut,
        MetricFunction::NetworkPacketsIn,
        MetricFunction::NetworkPacketsOut,
        MetricFunction::VolumeReadOps,
        MetricFunction::VolumeWriteOps,
        MetricFunction::VolumeReadBytes,
        MetricFunction::VolumeWriteBytes,
        MetricFunction::CpuReservation,
        MetricFunction::MemoryReservation,
        MetricFunction::RdsCpuUtilization,
        MetricFunction::RdsDatabaseConnections,
        MetricFunction::RdsFreeableMemory,
        MetricFunction::RdsFreeStorageSpace,
        MetricFunction::RdsReadIops,
        MetricFunction::RdsWriteIops,
        MetricFunction::RdsReadThroughput,
        MetricFunction::RdsWriteThroughput,
        MetricFunction::RdsReplicaLag,
        MetricFunction::RdsAuroraCapacityUnits,
    ];

    /// Dispatcher option number (3..=24)
    pub fn option(self) -> u8 {
        match self {
            MetricFunction::CpuUtilization => 3,
            MetricFunction::MemUsedPercent => 4,
            MetricFunction::NetworkIn => 5,
            MetricFunction::NetworkOut => 6,
            MetricFunction::NetworkPacketsIn => 7,
            MetricFunction::NetworkPacketsOut => 8,
            MetricFunction::VolumeReadOps => 9,
            MetricFunction::VolumeWriteOps => 10,
            MetricFunction::VolumeReadBytes => 11,
            MetricFunction::VolumeWriteBytes => 12,
            MetricFunction::CpuReservation => 13,
            MetricFunction::MemoryReservation => 14,
            MetricFunction::RdsCpuUtilization => 15,
            MetricFunction::RdsDatabaseConnections => 16,
            MetricFunction::RdsFreeableMemory => 17,
            MetricFunction::RdsFreeStorageSpace => 18,
            MetricFunction::RdsReadIops => 19,
            MetricFunction::RdsWriteIops => 20,
            MetricFunction::RdsReadThroughput => 21,
            MetricFunction::RdsWriteThroughput => 22,
            MetricFunction::RdsReplicaLag => 23,
            MetricFunction::RdsAuroraCapacityUnits => 24,
        }
    }

    pub fn from_option(option: u8) -> Result<Self, RequestError> {
        Self::ALL
            .into_iter()
            .find(|f| f.option() == option)
            .ok_or(RequestError::UnknownOption(option))
    }

    /// Function name used in file names and the `Function_Name` column
    pub fn name(self) -> &'static str {
        match self {
            MetricFunction::CpuUtilization => "cpu_utilization",
            MetricFunction::MemUsedPercent => "mem_used_percent",
            MetricFunction::NetworkIn => "network_in",
            MetricFunction::NetworkOut => "network_out",
            MetricFunction::NetworkPacketsIn => "network_packets_in",
            MetricFunction::NetworkPacketsOut => "network_packets_out",
            MetricFunction::VolumeReadOps => "volume_read_ops",
            MetricFunction::VolumeWriteOps => "volume_write_ops",
            MetricFunction::VolumeReadBytes => "volume_read_bytes",
            MetricFunction::VolumeWriteBytes => "volume_write_bytes",
            MetricFunction::CpuReservation => "cpu_reservation",
            MetricFunction::MemoryReservation => "memory_reservation",
            MetricFunction::RdsCpuUtilization => "rds_cpu_utilization",
            MetricFunction::RdsDatabaseConnections => "rds_database_connections",
            MetricFunction::RdsFreeableMemory => "rds_freeable_memory",
            MetricFunction::RdsFreeStorageSpace => "rds_free_storage_space",
            MetricFunction::RdsReadIops => "rds_read_iops",
            MetricFunction::RdsWriteIops => "rds_write_iops",
            MetricFunction::RdsReadThroughput => "rds_read_throughput",
            MetricFunction::RdsWriteThroughput => "rds_write_throughput",
            MetricFunction::RdsReplicaLag => "rds_replica_lag",
            MetricFunction::RdsAuroraCapacityUnits => "rds_aurora_capacity_units",
        }
    }

    pub fn namespace(self) -> Namespace {
        match self {
            MetricFunction::CpuUtilization
            | MetricFunction::NetworkIn
            | MetricFunction::NetworkOut
            | MetricFunction::NetworkPacketsIn
            | MetricFunction::NetworkPacketsOut => Namespace::Ec2,
            MetricFunction::MemUsedPercent => Namespace::CwAgent,
            MetricFunction::VolumeReadOps
            | MetricFunction::VolumeWriteOps
            | MetricFunction::VolumeReadBytes
            | MetricFunction::VolumeWriteBytes => Namespace::Ebs,
            MetricFunction::CpuReservation | MetricFunction::MemoryReservation => Namespace::Ecs,
            _ => Namespace::Rds,
        }
    }

    /// CloudWatch metric name
    pub fn metric_name(self) -> &'static str {
        match self {
            MetricFunction::CpuUtilization | MetricFunction::RdsCpuUtilization => "CPUUtilization",
            MetricFunction::MemUsedPercent => "mem_used_percent",
            MetricFunction::NetworkIn => "NetworkIn",
            MetricFunction::NetworkOut => "NetworkOut",
            MetricFunction::NetworkPacketsIn => "NetworkPacketsIn",
            MetricFunction::NetworkPacketsOut => "NetworkPacketsOut",
            MetricFunction::VolumeReadOps => "VolumeReadOps",
            MetricFunction::VolumeWriteOps => "VolumeWriteOps",
            MetricFunction::VolumeReadBytes => "VolumeReadBytes",
            MetricFunction::VolumeWriteBytes => "VolumeWriteBytes",
            MetricFunction::CpuReservation => "CPUReservation",
            MetricFunction::MemoryReservation => "MemoryReservation",
            MetricFunction::RdsDatabaseConnections => "DatabaseConnections",
            MetricFunction::RdsFreeableMemory => "FreeableMemory",
            MetricFunction::RdsFreeStorageSpace => "FreeStorageSpace",
            MetricFunction::RdsReadIops => "ReadIOPS",
            MetricFunction::RdsWriteIops => "WriteIOPS",
            MetricFunction::RdsReadThroughput => "ReadThroughput",
            MetricFunction::RdsWriteThroughput => "WriteThroughput",
            MetricFunction::RdsReplicaLag => "ReplicaLag",
            MetricFunction::RdsAuroraCapacityUnits => "ServerlessDatabaseCapacity",
        }
    }

    pub fn spec(self) -> MetricSpec {
        MetricSpec::average(self.namespace(), self.metric_name())
    }

    pub fn resource_kind(self) -> ResourceKind {
        self.namespace().resource_kind()
    }
}

impl fmt::Display for MetricFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricFunction {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| RequestError::UnknownFunction(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn option_numbers_are_unique_and_contiguous() {
        let options: Vec<u8> = MetricFunction::ALL.iter().map(|f| f.option()).collect();
        let unique: HashSet<u8> = options.iter().copied().collect();
        assert_eq!(unique.len(), MetricFunction::ALL.len());
        assert_eq!(options.iter().min(), Some(&3));
        assert_eq!(options.iter().max(), Some(&24));
    }

    #[test]
    fn option_lookup_matches_names() {
        for function in MetricFunction::ALL {
            assert_eq!(MetricFunction::from_option(function.option()).unwrap(), function);
            assert_eq!(function.name().parse::<MetricFunction>().unwrap(), function);
        }
        assert!(matches!(
            MetricFunction::from_option(2),
            Err(RequestError::UnknownOption(2))
        ));
        assert!(matches!(
            MetricFunction::from_option(25),
            Err(RequestError::UnknownOption(25))
        ));
    }

    #[test]
    fn rds_metric_names() {
        assert_eq!(MetricFunction::RdsCpuUtilization.metric_name(), "CPUUtilization");
        assert_eq!(
            MetricFunction::RdsAuroraCapacityUnits.metric_name(),
            "ServerlessDatabaseCapacity"
        );
        assert_eq!(MetricFunction::RdsReadIops.metric_name(), "ReadIOPS");
        for function in MetricFunction::ALL
            .into_iter()
            .filter(|f| f.name().starts_with("rds_"))
        {
            assert_eq!(function.namespace(), Namespace::Rds, "{function}");
            assert_eq!(function.resource_kind(), ResourceKind::RdsInstance);
        }
    }

    #[test]
    fn spec_defaults() {
        let spec = MetricFunction::RdsCpuUtilization.spec();
        assert_eq!(spec.namespace, Namespace::Rds);
        assert_eq!(spec.metric_name, "CPUUtilization");
        assert_eq!(spec.statistics, vec![Statistic::Average]);
        assert_eq!(spec.period_seconds, 300);
    }

    #[test]
    fn namespace_parsing() {
        for ns in [
            Namespace::Ec2,
            Namespace::CwAgent,
            Namespace::Ebs,
            Namespace::Ecs,
            Namespace::Rds,
        ] {
            assert_eq!(ns.as_str().parse::<Namespace>().unwrap(), ns);
        }
        let err = "AWS/Lambda".parse::<Namespace>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported namespace: AWS/Lambda");
    }

    #[test]
    fn memory_metrics_use_instance_dimension() {
        assert_eq!(
            MetricFunction::MemUsedPercent.resource_kind(),
            ResourceKind::Ec2Instance
        );
        assert_eq!(
            MetricFunction::VolumeWriteBytes.resource_kind(),
            ResourceKind::EbsVolume
        );
        assert_eq!(
            MetricFunction::CpuReservation.resource_kind(),
            ResourceKind::EcsCluster
        );
    }
}
