#![allow(dead_code)]

use bucket2drive::Config;
use bucket2drive::config::args::parse_from_args;
use bucket2drive::pipeline::Pipeline;
use bucket2drive::storage::memory::{MemoryDrive, MemorySource};
use bucket2drive::types::TransferReport;
use bucket2drive::types::token::create_pipeline_cancellation_token;

pub const DRIVE_FOLDER: &str = "Backup";

pub struct TestHelper;

impl TestHelper {
    pub fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dummy=trace")
            .try_init();
    }

    pub fn config(worker_size: u16) -> Config {
        let worker_size = worker_size.to_string();
        let args = vec![
            "bucket2drive",
            "--drive-access-token",
            "ya29.test-token",
            "--worker-size",
            worker_size.as_str(),
            "gs://source-bucket",
            DRIVE_FOLDER,
        ];

        Config::try_from(parse_from_args(args).unwrap()).unwrap()
    }

    /// Runs one transfer from `source` into `drive` and returns the pipeline after it finished.
    pub async fn run(source: &MemorySource, drive: &MemoryDrive, worker_size: u16) -> Pipeline {
        let mut pipeline = Pipeline::with_storage(
            Self::config(worker_size),
            Box::new(source.clone()),
            Box::new(drive.clone()),
            create_pipeline_cancellation_token(),
        );

        pipeline.run().await;
        pipeline
    }

    pub async fn run_and_report(
        source: &MemorySource,
        drive: &MemoryDrive,
        worker_size: u16,
    ) -> TransferReport {
        let pipeline = Self::run(source, drive, worker_size).await;
        assert!(!pipeline.has_error());
        pipeline.get_transfer_report()
    }

    pub fn failed_keys(report: &TransferReport) -> Vec<String> {
        let mut keys: Vec<String> = report
            .failures
            .iter()
            .map(|failure| failure.key.clone())
            .collect();
        keys.sort();
        keys
    }
}
