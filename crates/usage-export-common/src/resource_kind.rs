//! Resource kinds and their CloudWatch dimensions
//!
//! Each kind maps to the dimension CloudWatch expects when querying metrics
//! for one resource, and to the column that carries its identifier in
//! exported tables.

use std::fmt;

/// Types of AWS resources whose metrics can be exported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// EC2 instance
    Ec2Instance,
    /// EBS volume
    EbsVolume,
    /// ECS cluster (metrics are keyed by cluster name, not ARN)
    EcsCluster,
    /// RDS database instance
    RdsInstance,
}

impl ResourceKind {
    /// CloudWatch dimension name identifying a single resource
    pub fn dimension_name(self) -> &'static str {
        match self {
            ResourceKind::Ec2Instance => "InstanceId",
            ResourceKind::EbsVolume => "VolumeId",
            ResourceKind::EcsCluster => "ClusterName",
            ResourceKind::RdsInstance => "DBInstanceIdentifier",
        }
    }

    /// Column name holding the resource identifier in exported tables
    pub fn id_column(self) -> &'static str {
        match self {
            ResourceKind::Ec2Instance | ResourceKind::RdsInstance => "Instance_ID",
            ResourceKind::EbsVolume => "Volume_ID",
            ResourceKind::EcsCluster => "Cluster_Name",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Ec2Instance => "ec2-instance",
            ResourceKind::EbsVolume => "ebs-volume",
            ResourceKind::EcsCluster => "ecs-cluster",
            ResourceKind::RdsInstance => "rds-instance",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
