use serde::Deserialize;

use crate::domain::job_state::JobState;

pub const TRES_ARRAY_CPU: usize = 0;
pub const TRES_ARRAY_MEM: usize = 1;
pub const TRES_ARRAY_BILLING: usize = 4;

/// Snapshot of a scheduler job record as handed to the completion hook.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobRecord {
    pub job_id: u32,
    pub user_id: u32,
    pub job_state: JobState,
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub assoc: Option<AssociationRef>,
    #[serde(default)]
    pub partition: Option<PartitionRef>,
    #[serde(default)]
    pub qos: Option<QosRef>,
    #[serde(default)]
    pub tres_alloc_cnt: Option<Vec<u64>>,
    #[serde(default)]
    pub gres_list_alloc: Option<Vec<GresAllocation>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AssociationRef {
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PartitionRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QosRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub usage_factor: f64,
}

/// One generic resource granted to the job, e.g. `gpu:a100`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GresAllocation {
    pub name: String,
    pub total_gres: u64,
}

impl GresAllocation {
    pub fn new(name: impl Into<String>, total_gres: u64) -> Self {
        Self {
            name: name.into(),
            total_gres,
        }
    }
}

impl JobRecord {
    /// Allocated quantity for a TRES slot; a missing table or short table yields zero.
    pub fn tres(&self, slot: usize) -> u64 {
        self.tres_alloc_cnt
            .as_deref()
            .and_then(|counts| counts.get(slot))
            .copied()
            .unwrap_or(0)
    }

    pub fn cluster_name(&self) -> Option<&str> {
        non_empty(self.assoc.as_ref().and_then(|assoc| assoc.cluster.as_deref()))
    }

    pub fn account_name(&self) -> Option<&str> {
        non_empty(self.assoc.as_ref().and_then(|assoc| assoc.account.as_deref()))
    }

    pub fn partition_name(&self) -> Option<&str> {
        non_empty(self.partition.as_ref().and_then(|part| part.name.as_deref()))
    }

    pub fn qos_name(&self) -> Option<&str> {
        non_empty(self.qos.as_ref().and_then(|qos| qos.name.as_deref()))
    }

    pub fn usage_factor(&self) -> Option<f64> {
        self.qos.as_ref().map(|qos| qos.usage_factor)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
