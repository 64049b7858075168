use anyhow::{Error, Result, anyhow};
use tokio::time::Instant;
use tracing::{error, info, trace};

use bucket2drive::Config;
use bucket2drive::pipeline::Pipeline;
use bucket2drive::storage::is_fatal_error;
use bucket2drive::types::token::create_pipeline_cancellation_token;
use bucket2drive::types::{TRANSFER_REPORT_SUMMARY_NAME, TransferReport};

mod ctrl_c_handler;
mod indicator;
mod ui_config;

const CREDENTIAL_HINT: &str = "authentication or authorization failed. check that:
  - the Drive credential carries the https://www.googleapis.com/auth/drive scope.
    with application default credentials, log in with
    gcloud auth application-default login --scopes=https://www.googleapis.com/auth/drive,https://www.googleapis.com/auth/cloud-platform
  - a service account (--drive-service-account-file) has access to the destination folder
  - the Drive API is enabled for the --project used for quota
  - the source credential (HMAC key or profile) can list and read the bucket";

/// What a finished run leaves behind: the per-object report and the run-level errors.
struct RunOutcome {
    report: TransferReport,
    errors: Vec<Error>,
}

/// Per-object failures do not fail the run unless they were caused by authentication.
pub async fn run(config: Config) -> Result<()> {
    let cancellation_token = create_pipeline_cancellation_token();

    ctrl_c_handler::spawn_ctrl_c_handler(cancellation_token.clone());

    let start_time = Instant::now();
    trace!("transfer pipeline start.");

    let mut pipeline = Pipeline::new(config.clone(), cancellation_token).await?;
    let indicator_join_handle = indicator::show_indicator(
        pipeline.get_stats_receiver(),
        ui_config::is_progress_indicator_needed(&config),
        ui_config::is_show_result_needed(&config),
        ui_config::is_log_summary_needed(&config),
    );

    pipeline.run().await;
    indicator_join_handle.await?;

    let outcome = summarize(&pipeline);
    let duration_sec = format!("{:.3}", start_time.elapsed().as_secs_f32());

    exit_status(&outcome, &duration_sec)
}

/// The summary and the failures are reported even when the run stopped early.
fn summarize(pipeline: &Pipeline) -> RunOutcome {
    let report = pipeline.get_transfer_report();
    show_transfer_report_summary(&report);
    show_failures(&report);

    RunOutcome {
        report,
        errors: pipeline.get_errors_and_consume().unwrap_or_default(),
    }
}

fn exit_status(outcome: &RunOutcome, duration_sec: &str) -> Result<()> {
    if outcome.errors.iter().any(is_fatal_error) || outcome.report.has_fatal_failure() {
        error!("{CREDENTIAL_HINT}");
    }

    if !outcome.errors.is_empty() {
        error!(duration_sec = duration_sec, "bucket2drive failed.");

        return Err(anyhow!("bucket2drive failed."));
    }

    if outcome.report.has_fatal_failure() {
        error!(
            duration_sec = duration_sec,
            "bucket2drive failed due to authentication errors."
        );

        return Err(anyhow!("bucket2drive failed due to authentication errors."));
    }

    trace!(duration_sec = duration_sec, "bucket2drive has been completed.");

    Ok(())
}

fn show_transfer_report_summary(report: &TransferReport) {
    info!(
        name = TRANSFER_REPORT_SUMMARY_NAME,
        number_of_objects = report.total(),
        copied = report.copied,
        skipped = report.skipped,
        failed = report.failed,
        transferred_bytes = report.transferred_bytes,
    );
}

fn show_failures(report: &TransferReport) {
    for failure in &report.failures {
        error!(
            key = failure.key,
            reason = failure.reason,
            fatal = failure.fatal,
            "object was not transferred."
        );
    }
}
