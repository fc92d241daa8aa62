use thiserror::Error;

use crate::domain::job_record::{
    GresAllocation, JobRecord, TRES_ARRAY_BILLING, TRES_ARRAY_CPU, TRES_ARRAY_MEM,
};
use crate::domain::job_state::JobState;

const GPU_GRES_PREFIX: &str = "gpu";
const SECONDS_PER_MINUTE: f64 = 60.0;

/// Accounting summary of one finished job. Built once, then handed to the sinks.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub job_id: u32,
    pub user_id: u32,
    pub account: String,
    pub cluster: String,
    pub partition: String,
    pub job_state: JobState,
    pub cpu: u64,
    pub mem: u64,
    pub gpu: u64,
    pub billing: u64,
    pub start_time: i64,
    pub end_time: i64,
    pub elapsed: i64,
    pub qos_name: String,
    pub usage_factor: f64,
    pub total_cost: u64,
    pub priority: u32,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReportError {
    #[error("job {job_id} ends at {end_time} before it starts at {start_time}")]
    NegativeElapsed {
        job_id: u32,
        start_time: i64,
        end_time: i64,
    },
    #[error("job {job_id} runs from {start_time} to {end_time}, a span that overflows")]
    ElapsedOverflow {
        job_id: u32,
        start_time: i64,
        end_time: i64,
    },
    #[error("job {job_id} has an unusable cost product {product} (usage factor {usage_factor})")]
    InvalidCost {
        job_id: u32,
        product: f64,
        usage_factor: f64,
    },
}

pub fn build_report(job: &JobRecord) -> Result<Report, ReportError> {
    let elapsed = job.end_time.checked_sub(job.start_time).ok_or(
        ReportError::ElapsedOverflow {
            job_id: job.job_id,
            start_time: job.start_time,
            end_time: job.end_time,
        },
    )?;
    if elapsed < 0 {
        return Err(ReportError::NegativeElapsed {
            job_id: job.job_id,
            start_time: job.start_time,
            end_time: job.end_time,
        });
    }

    let billing = job.tres(TRES_ARRAY_BILLING);
    let usage_factor = job.usage_factor().unwrap_or(0.0);
    let total_cost = compute_total_cost(billing, elapsed, usage_factor).ok_or_else(|| {
        ReportError::InvalidCost {
            job_id: job.job_id,
            product: billing as f64 * elapsed as f64 * usage_factor,
            usage_factor,
        }
    })?;

    let report = Report {
        job_id: job.job_id,
        user_id: job.user_id,
        account: job.account_name().unwrap_or_default().to_string(),
        cluster: job.cluster_name().unwrap_or_default().to_string(),
        partition: job.partition_name().unwrap_or_default().to_string(),
        job_state: job.job_state,
        cpu: job.tres(TRES_ARRAY_CPU),
        mem: job.tres(TRES_ARRAY_MEM),
        gpu: find_gpu_count(job.gres_list_alloc.as_deref().unwrap_or_default()),
        billing,
        start_time: job.start_time,
        end_time: job.end_time,
        elapsed,
        qos_name: job.qos_name().unwrap_or_default().to_string(),
        usage_factor,
        total_cost,
        priority: job.priority,
    };

    tracing::debug!(
        job_id = report.job_id,
        user_id = report.user_id,
        account = %report.account,
        cluster = %report.cluster,
        partition = %report.partition,
        state = %report.job_state,
        cpu = report.cpu,
        mem = report.mem,
        gpu = report.gpu,
        billing = report.billing,
        start_time = report.start_time,
        end_time = report.end_time,
        elapsed = report.elapsed,
        qos_name = %report.qos_name,
        usage_factor = report.usage_factor,
        total_cost = report.total_cost,
        "report built"
    );

    Ok(report)
}

/// `round(billing * elapsed * usage_factor / 60)`, rounding half away from zero.
///
/// Returns `None` when the rounded cost is negative, not finite, or beyond `u64::MAX`.
pub fn compute_total_cost(billing: u64, elapsed: i64, usage_factor: f64) -> Option<u64> {
    let cost = ((billing as f64 * elapsed as f64 * usage_factor) / SECONDS_PER_MINUTE).round();
    // u64::MAX as f64 rounds up to 2^64, which is itself out of range.
    if !cost.is_finite() || cost < 0.0 || cost >= u64::MAX as f64 {
        return None;
    }
    Some(cost as u64)
}

/// Total count of the first `gpu*` resource in allocation order, or zero.
pub fn find_gpu_count(allocations: &[GresAllocation]) -> u64 {
    allocations
        .iter()
        .find(|gres| gres.name.starts_with(GPU_GRES_PREFIX))
        .map(|gres| gres.total_gres)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{ReportError, build_report, compute_total_cost, find_gpu_count};
    use crate::domain::job_record::{GresAllocation, QosRef};
    use crate::domain::job_state::JobState;
    use crate::test_support::sample_record;

    #[test]
    fn builds_report_from_complete_record() {
        let report = build_report(&sample_record()).expect("report should build");

        assert_eq!(report.job_id, 42);
        assert_eq!(report.user_id, 7);
        assert_eq!(report.cluster, "c1");
        assert_eq!(report.partition, "p1");
        assert_eq!(report.account, "physics");
        assert_eq!(report.job_state, JobState::COMPLETED);
        assert_eq!(report.cpu, 4);
        assert_eq!(report.mem, 8192);
        assert_eq!(report.gpu, 1);
        assert_eq!(report.billing, 10);
        assert_eq!(report.elapsed, 600);
        assert_eq!(report.elapsed, report.end_time - report.start_time);
        assert_eq!(report.qos_name, "normal");
        assert_eq!(report.usage_factor, 1.5);
        assert_eq!(report.total_cost, 150);
        assert_eq!(report.priority, 4294);
    }

    #[test]
    fn normalizes_missing_references_to_empty_and_zero() {
        let mut record = sample_record();
        record.assoc = None;
        record.partition = None;
        record.qos = None;
        record.tres_alloc_cnt = None;
        record.gres_list_alloc = None;

        let report = build_report(&record).expect("report should build");

        assert_eq!(report.cluster, "");
        assert_eq!(report.partition, "");
        assert_eq!(report.account, "");
        assert_eq!(report.qos_name, "");
        assert_eq!(report.usage_factor, 0.0);
        assert_eq!((report.cpu, report.mem, report.billing, report.gpu), (0, 0, 0, 0));
        assert_eq!(report.total_cost, 0);
    }

    #[test]
    fn keeps_usage_factor_when_qos_name_is_empty() {
        let mut record = sample_record();
        record.qos = Some(QosRef {
            name: Some(String::new()),
            usage_factor: 2.0,
        });

        let report = build_report(&record).expect("report should build");

        assert_eq!(report.qos_name, "");
        assert_eq!(report.total_cost, 200);
    }

    #[test]
    fn rejects_end_before_start() {
        let mut record = sample_record();
        record.end_time = record.start_time - 1;

        let err = build_report(&record).expect_err("negative elapsed must fail");
        assert_eq!(
            err,
            ReportError::NegativeElapsed {
                job_id: 42,
                start_time: 1000,
                end_time: 999,
            }
        );
    }

    #[test]
    fn rejects_timestamps_whose_span_overflows() {
        let mut record = sample_record();
        record.start_time = i64::MIN;
        record.end_time = 1;

        let err = build_report(&record).expect_err("overflowing span must fail");
        assert_eq!(
            err,
            ReportError::ElapsedOverflow {
                job_id: 42,
                start_time: i64::MIN,
                end_time: 1,
            }
        );

        record.start_time = -2;
        record.end_time = i64::MAX;
        let err = build_report(&record).expect_err("overflowing span must fail");
        assert!(matches!(err, ReportError::ElapsedOverflow { .. }));
    }

    #[test]
    fn rejects_cost_beyond_unsigned_range() {
        let mut record = sample_record();
        record.tres_alloc_cnt = Some(vec![4, 8192, 0, 1, u64::MAX]);
        record.end_time = record.start_time + 3600;

        let err = build_report(&record).expect_err("oversized cost must fail");
        assert!(matches!(err, ReportError::InvalidCost { job_id: 42, .. }));
    }

    #[test]
    fn rejects_negative_usage_factor() {
        let mut record = sample_record();
        record.qos = Some(QosRef {
            name: Some("refund".to_string()),
            usage_factor: -1.0,
        });

        let err = build_report(&record).expect_err("negative cost must fail");
        assert!(matches!(err, ReportError::InvalidCost { job_id: 42, .. }));
    }

    #[test]
    fn rounds_cost_half_away_from_zero() {
        // 1 * 90 * 1.0 / 60 = 1.5
        assert_eq!(compute_total_cost(1, 90, 1.0), Some(2));
        // 1 * 30 * 1.0 / 60 = 0.5
        assert_eq!(compute_total_cost(1, 30, 1.0), Some(1));
        // 1 * 29 * 1.0 / 60 = 0.48
        assert_eq!(compute_total_cost(1, 29, 1.0), Some(0));
        assert_eq!(compute_total_cost(10, 600, 1.5), Some(150));
        assert_eq!(compute_total_cost(10, 0, 1.5), Some(0));
        assert_eq!(compute_total_cost(1, 60, f64::NAN), None);
        assert_eq!(compute_total_cost(u64::MAX, 60, 1.0), None);
        assert_eq!(compute_total_cost(1 << 40, 60, 1.0), Some(1 << 40));
    }

    #[test]
    fn first_gpu_resource_wins() {
        let allocations = vec![
            GresAllocation::new("cpu", 5),
            GresAllocation::new("gpu-a100", 2),
            GresAllocation::new("gpu-v100", 4),
        ];

        assert_eq!(find_gpu_count(&allocations), 2);
    }

    #[test]
    fn gpu_match_is_case_sensitive_prefix_only() {
        let allocations = vec![
            GresAllocation::new("GPU", 3),
            GresAllocation::new("mps-gpu", 8),
            GresAllocation::new("shard", 1),
        ];

        assert_eq!(find_gpu_count(&allocations), 0);
        assert_eq!(find_gpu_count(&[]), 0);
    }
}
