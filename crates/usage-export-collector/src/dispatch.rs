//! Service registry for the function-style entry point
//!
//! Callers name a service; each service expands to a fixed list of jobs. Most
//! services map to one catalog function, the EBS services map to two.

use std::fmt;
use std::str::FromStr;

use usage_export_common::carbon::CARBON_FUNCTION_NAME;
use usage_export_common::{MetricFunction, RequestError};

/// Every service name the handler accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    CpuUtilization,
    MemUsedPercent,
    NetworkIn,
    NetworkOut,
    NetworkPacketsIn,
    NetworkPacketsOut,
    VolumeIops,
    VolumeThroughput,
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
    CarbonFootprint,
}

impl Service {
    pub const ALL: [Service; 21] = [
        Service::CpuUtilization,
        Service::MemUsedPercent,
        Service::NetworkIn,
        Service::NetworkOut,
        Service::NetworkPacketsIn,
        Service::NetworkPacketsOut,
        Service::VolumeIops,
        Service::VolumeThroughput,
        Service::CpuReservation,
        Service::MemoryReservation,
        Service::RdsCpuUtilization,
        Service::RdsDatabaseConnections,
        Service::RdsFreeableMemory,
        Service::RdsFreeStorageSpace,
        Service::RdsReadIops,
        Service::RdsWriteIops,
        Service::RdsReadThroughput,
        Service::RdsWriteThroughput,
        Service::RdsReplicaLag,
        Service::RdsAuroraCapacityUnits,
        Service::CarbonFootprint,
    ];

    /// Name as it appears in event payloads
    pub fn as_str(self) -> &'static str {
        match self {
            Service::CpuUtilization => "CPUUtilization",
            Service::MemUsedPercent => "mem_used_percent",
            Service::NetworkIn => "network_in",
            Service::NetworkOut => "network_out",
            Service::NetworkPacketsIn => "network_packets_in",
            Service::NetworkPacketsOut => "network_packets_out",
            Service::VolumeIops => "VolumeIOPS",
            Service::VolumeThroughput => "VolumeThroughput",
            Service::CpuReservation => "CPUReservation",
            Service::MemoryReservation => "MemoryReservation",
            Service::RdsCpuUtilization => "rds_cpu_utilization",
            Service::RdsDatabaseConnections => "rds_database_connections",
            Service::RdsFreeableMemory => "rds_freeable_memory",
            Service::RdsFreeStorageSpace => "rds_free_storage_space",
            Service::RdsReadIops => "rds_read_iops",
            Service::RdsWriteIops => "rds_write_iops",
            Service::RdsReadThroughput => "rds_read_throughput",
            Service::RdsWriteThroughput => "rds_write_throughput",
            Service::RdsReplicaLag => "rds_replica_lag",
            Service::RdsAuroraCapacityUnits => "rds_aurora_capacity_units",
            Service::CarbonFootprint => CARBON_FUNCTION_NAME,
        }
    }

    /// Catalog functions behind a metric service; empty for carbon footprint
    fn functions(self) -> &'static [MetricFunction] {
        use MetricFunction as F;
        match self {
            Service::CpuUtilization => &[F::CpuUtilization],
            Service::MemUsedPercent => &[F::MemUsedPercent],
            Service::NetworkIn => &[F::NetworkIn],
            Service::NetworkOut => &[F::NetworkOut],
            Service::NetworkPacketsIn => &[F::NetworkPacketsIn],
            Service::NetworkPacketsOut => &[F::NetworkPacketsOut],
            Service::VolumeIops => &[F::VolumeReadOps, F::VolumeWriteOps],
            Service::VolumeThroughput => &[F::VolumeReadBytes, F::VolumeWriteBytes],
            Service::CpuReservation => &[F::CpuReservation],
            Service::MemoryReservation => &[F::MemoryReservation],
            Service::RdsCpuUtilization => &[F::RdsCpuUtilization],
            Service::RdsDatabaseConnections => &[F::RdsDatabaseConnections],
            Service::RdsFreeableMemory => &[F::RdsFreeableMemory],
            Service::RdsFreeStorageSpace => &[F::RdsFreeStorageSpace],
            Service::RdsReadIops => &[F::RdsReadIops],
            Service::RdsWriteIops => &[F::RdsWriteIops],
            Service::RdsReadThroughput => &[F::RdsReadThroughput],
            Service::RdsWriteThroughput => &[F::RdsWriteThroughput],
            Service::RdsReplicaLag => &[F::RdsReplicaLag],
            Service::RdsAuroraCapacityUnits => &[F::RdsAuroraCapacityUnits],
            Service::CarbonFootprint => &[],
        }
    }

    /// Jobs to run, in option order
    pub fn jobs(self) -> Vec<Job> {
        if self == Service::CarbonFootprint {
            return vec![Job::CarbonFootprint];
        }
        self.functions().iter().copied().map(Job::Metric).collect()
    }

    /// Result key for `job`: the service name, suffixed with the option
    /// number when the service runs more than one job.
    pub fn job_key(self, job: Job) -> String {
        match job {
            Job::Metric(function) if self.functions().len() > 1 => {
                format!("{}_{}", self.as_str(), function.option())
            }
            _ => self.as_str().to_string(),
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Service {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Service::ALL
            .into_iter()
            .find(|service| service.as_str() == s)
            .ok_or_else(|| RequestError::UnsupportedService(s.to_string()))
    }
}

/// One unit of dispatched work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Job {
    Metric(MetricFunction),
    CarbonFootprint,
}

impl Job {
    /// Function name used for output files
    pub fn function_name(self) -> &'static str {
        match self {
            Job::Metric(function) => function.name(),
            Job::CarbonFootprint => CARBON_FUNCTION_NAME,
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function_name())
    }
}
