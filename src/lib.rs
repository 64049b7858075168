/*!
# Overview
bucket2drive copies the contents of a cloud storage bucket into a Google Drive folder.

The bucket's `/`-delimited key hierarchy is reproduced as a tree of Drive folders under one
destination folder. Runs are incremental: a file that already exists under the same name in
the corresponding Drive folder is skipped, so a second run over an unchanged bucket creates and
uploads nothing.

## Features
- Sources
  - Google Cloud Storage (`gs://bucket[/prefix]`) through the Cloud Storage XML
    interoperability API with HMAC keys
  - S3 and S3-compatible storage (`s3://bucket[/prefix]`)
  - Local directories

- Parallel transfer
  Objects are streamed from the source to the Drive upload API by a pool of workers
  (`--worker-size`, default 10). Each object is read and uploaded without being buffered in
  memory.

- One folder per prefix
  Every folder on a key's path is looked up or created exactly once per run, even when many
  workers need it at the same moment.

- Per-object failure isolation
  A failed object, or a folder that cannot be created, never stops the rest of the run. The
  failures are listed in the summary.

## As a library
bucket2drive CLI is a thin wrapper of the bucket2drive library.

Example usage
=============

```Toml
[dependencies]
bucket2drive = "0.3"
tokio = { version = "1", features = ["full"] }
```

```no_run
use bucket2drive::config::Config;
use bucket2drive::config::args::parse_from_args;
use bucket2drive::pipeline::Pipeline;
use bucket2drive::types::TransferStatistics;
use bucket2drive::types::token::create_pipeline_cancellation_token;

#[tokio::main]
async fn main() {
    // You can use all the arguments of the bucket2drive binary here.
    // The first argument is the program name.
    let args = vec![
        "program_name",
        "--source-access-key",
        "GOOG1E...",
        "--source-secret-access-key",
        "secret",
        "--drive-access-token-file",
        "/path/to/token",
        "gs://my-bucket/some/prefix",
        "Backup",
    ];

    let config = Config::try_from(parse_from_args(args).unwrap()).unwrap();

    // Create a cancellation token for the pipeline.
    // You can use this token to cancel the pipeline.
    let cancellation_token = create_pipeline_cancellation_token();
    let mut pipeline = Pipeline::new(config.clone(), cancellation_token)
        .await
        .unwrap();
    let stats_receiver = pipeline.get_stats_receiver();

    pipeline.run().await;

    let mut total_transfer_count = 0;
    while let Ok(stats) = stats_receiver.try_recv() {
        if matches!(stats, TransferStatistics::TransferComplete { .. }) {
            total_transfer_count += 1;
        }
    }

    println!("Total transfer count: {total_transfer_count}");

    // Setup errors (inaccessible bucket, unresolvable destination folder) abort the run.
    if pipeline.has_error() {
        println!("{:?}", pipeline.get_errors_and_consume().unwrap()[0]);
    }

    // Per-object failures are recorded in the report.
    let report = pipeline.get_transfer_report();
    for failure in &report.failures {
        println!("{}: {}", failure.key, failure.reason);
    }
}
```
*/

pub use config::Config;
pub use config::args::CLIArgs;

pub mod config;
pub mod pipeline;
pub mod storage;
pub mod types;
