use std::io;
use std::io::Write;

use async_channel::Receiver;
use bucket2drive::types::TransferStatistics;
use indicatif::{HumanBytes, HumanCount, HumanDuration, ProgressBar, ProgressStyle};
use simple_moving_average::{SMA, SumTreeSMA};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;

const MOVING_AVERAGE_PERIOD_SECS: usize = 10;
const REFRESH_INTERVAL: f32 = 1.0;

#[derive(Default)]
struct Totals {
    copied: u64,
    bytes: u64,
    skipped: u64,
    failed: u64,
}

impl Totals {
    fn record(&mut self, stats: TransferStatistics) -> (u64, u64) {
        match stats {
            TransferStatistics::TransferComplete { .. } => {
                self.copied += 1;
                (0, 1)
            }
            TransferStatistics::TransferBytes(size) => {
                self.bytes += size;
                (size, 0)
            }
            TransferStatistics::TransferSkip { .. } => {
                self.skipped += 1;
                (0, 0)
            }
            TransferStatistics::TransferError { .. } => {
                self.failed += 1;
                (0, 0)
            }
        }
    }
}

/// Renders live throughput until the stats channel is closed by the pipeline.
pub fn show_indicator(
    stats_receiver: Receiver<TransferStatistics>,
    show_progress: bool,
    show_result: bool,
    log_transfer_summary: bool,
) -> JoinHandle<()> {
    let progress_text = ProgressBar::new(0);
    if let Ok(progress_style) = ProgressStyle::with_template("{wide_msg}") {
        progress_text.set_style(progress_style);
    }

    tokio::spawn(async move {
        let start_time = Instant::now();

        let mut ma_transferred_bytes = SumTreeSMA::<_, u64, MOVING_AVERAGE_PERIOD_SECS>::new();
        let mut ma_copied_count = SumTreeSMA::<_, u64, MOVING_AVERAGE_PERIOD_SECS>::new();

        let mut totals = Totals::default();

        loop {
            let mut period_bytes: u64 = 0;
            let mut period_count: u64 = 0;

            let period = Instant::now();
            loop {
                while let Ok(stats) = stats_receiver.try_recv() {
                    let (bytes, count) = totals.record(stats);
                    period_bytes += bytes;
                    period_count += count;
                }

                if REFRESH_INTERVAL < period.elapsed().as_secs_f32() {
                    break;
                }

                if stats_receiver.is_closed() {
                    let elapsed = start_time.elapsed();
                    let elapsed_secs_f64 = elapsed.as_secs_f64();

                    let mut objects_per_sec = (totals.copied as f64 / elapsed_secs_f64) as u64;
                    let mut bytes_per_sec = (totals.bytes as f64 / elapsed_secs_f64) as u64;

                    if elapsed_secs_f64 < REFRESH_INTERVAL as f64 {
                        objects_per_sec = totals.copied;
                        bytes_per_sec = totals.bytes;
                    }

                    if log_transfer_summary {
                        info!(
                            message = "transfer summary",
                            transferred_byte = totals.bytes,
                            transferred_byte_per_sec = bytes_per_sec,
                            copied = totals.copied,
                            copied_per_sec = objects_per_sec,
                            skipped = totals.skipped,
                            failed = totals.failed,
                            duration_sec = elapsed_secs_f64,
                        );
                    }

                    if show_result {
                        if let Ok(result_style) = ProgressStyle::with_template("{msg}") {
                            progress_text.set_style(result_style);
                        }

                        progress_text.finish_with_message(format!(
                            "{:>3} | {:>3}/sec,  copied {:>3} objects | {:>3} objects/sec,  skipped {} objects,  failed {} objects,  duration {}",
                            HumanBytes(totals.bytes),
                            HumanBytes(bytes_per_sec),
                            totals.copied,
                            HumanCount(objects_per_sec),
                            totals.skipped,
                            totals.failed,
                            HumanDuration(elapsed),
                        ));

                        println!();
                        let _ = io::stdout().flush();
                    }

                    return;
                }

                tokio::time::sleep(std::time::Duration::from_secs_f32(0.05)).await;
            }
            ma_transferred_bytes.add_sample(period_bytes);
            ma_copied_count.add_sample(period_count);

            if show_progress {
                progress_text.set_message(format!(
                    "{:>3} | {:>3}/sec,  copied {:>3} objects | {:>3} objects/sec,  skipped {} objects,  failed {} objects",
                    HumanBytes(totals.bytes),
                    HumanBytes(ma_transferred_bytes.get_average()).to_string(),
                    totals.copied,
                    HumanCount(ma_copied_count.get_average()).to_string(),
                    totals.skipped,
                    totals.failed,
                ));
            }
        }
    })
}
