use serde::Deserialize;

const JOB_STATE_BASE: u32 = 0x0000_00ff;

const JOB_PENDING: u32 = 0;
const JOB_RUNNING: u32 = 1;
const JOB_SUSPENDED: u32 = 2;
const JOB_COMPLETE: u32 = 3;
const JOB_CANCELLED: u32 = 4;
const JOB_FAILED: u32 = 5;
const JOB_TIMEOUT: u32 = 6;
const JOB_NODE_FAIL: u32 = 7;
const JOB_PREEMPTED: u32 = 8;
const JOB_BOOT_FAIL: u32 = 9;
const JOB_DEADLINE: u32 = 10;
const JOB_OOM: u32 = 11;

pub const JOB_REQUEUE: u32 = 0x0000_0400;
pub const JOB_REQUEUE_HOLD: u32 = 0x0000_0800;
pub const JOB_SPECIAL_EXIT: u32 = 0x0000_1000;
pub const JOB_RESIZING: u32 = 0x0000_2000;
pub const JOB_CONFIGURING: u32 = 0x0000_4000;
pub const JOB_COMPLETING: u32 = 0x0000_8000;
pub const JOB_STOPPED: u32 = 0x0001_0000;
pub const JOB_REVOKED: u32 = 0x0008_0000;
pub const JOB_REQUEUE_FED: u32 = 0x0010_0000;
pub const JOB_RESV_DEL_HOLD: u32 = 0x0020_0000;
pub const JOB_SIGNALING: u32 = 0x0040_0000;
pub const JOB_STAGE_OUT: u32 = 0x0080_0000;

/// Flags that take precedence over the base state when naming a job state,
/// checked in this order.
const NAMED_FLAGS: &[(u32, &str)] = &[
    (JOB_COMPLETING, "COMPLETING"),
    (JOB_STAGE_OUT, "STAGE_OUT"),
    (JOB_CONFIGURING, "CONFIGURING"),
    (JOB_RESIZING, "RESIZING"),
    (JOB_REQUEUE, "REQUEUED"),
    (JOB_REQUEUE_FED, "REQUEUE_FED"),
    (JOB_REQUEUE_HOLD, "REQUEUE_HOLD"),
    (JOB_SPECIAL_EXIT, "SPECIAL_EXIT"),
    (JOB_STOPPED, "STOPPED"),
    (JOB_REVOKED, "REVOKED"),
    (JOB_RESV_DEL_HOLD, "RESV_DEL_HOLD"),
    (JOB_SIGNALING, "SIGNALING"),
];

/// Raw scheduler state code: a base state in the low byte plus flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct JobState(pub u32);

impl JobState {
    pub const PENDING: Self = Self(JOB_PENDING);
    pub const RUNNING: Self = Self(JOB_RUNNING);
    pub const COMPLETED: Self = Self(JOB_COMPLETE);
    pub const CANCELLED: Self = Self(JOB_CANCELLED);
    pub const FAILED: Self = Self(JOB_FAILED);
    pub const TIMEOUT: Self = Self(JOB_TIMEOUT);

    pub fn base(self) -> u32 {
        self.0 & JOB_STATE_BASE
    }

    pub fn has_flag(self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    pub fn with_flag(self, flag: u32) -> Self {
        Self(self.0 | flag)
    }

    pub fn is_completing(self) -> bool {
        self.has_flag(JOB_COMPLETING)
    }

    /// True for the states that close out a job and therefore get a report.
    pub fn is_reportable(self) -> bool {
        matches!(self.base(), JOB_COMPLETE | JOB_TIMEOUT | JOB_FAILED) || self.is_completing()
    }

    pub fn name(self) -> &'static str {
        if let Some((_, name)) = NAMED_FLAGS.iter().find(|(flag, _)| self.has_flag(*flag)) {
            return *name;
        }

        match self.base() {
            JOB_PENDING => "PENDING",
            JOB_RUNNING => "RUNNING",
            JOB_SUSPENDED => "SUSPENDED",
            JOB_COMPLETE => "COMPLETED",
            JOB_CANCELLED => "CANCELLED",
            JOB_FAILED => "FAILED",
            JOB_TIMEOUT => "TIMEOUT",
            JOB_NODE_FAIL => "NODE_FAIL",
            JOB_PREEMPTED => "PREEMPTED",
            JOB_BOOT_FAIL => "BOOT_FAIL",
            JOB_DEADLINE => "DEADLINE",
            JOB_OOM => "OUT_OF_MEMORY",
            _ => "?",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
