//! Run driver: processes the linearized work list in discovery order.
//!
//! Strictly sequential and fail-stop: items are handed to the pipeline
//! one at a time, and the first error ends the run with everything up to
//! that item durably recorded. There are no retries; rerunning the tool
//! is the retry.

use std::io::IsTerminal;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::discover::SourceItem;
use crate::ledger::Ledger;
use crate::pipeline::{ItemOutcome, Pipeline, PipelineError};

/// Counts reported at the end of a successful run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub transferred: usize,
    pub skipped: usize,
}

/// Process every item in order, stopping at the first failure.
pub async fn run(
    pipeline: &Pipeline<'_>,
    items: &[SourceItem],
    ledger: &mut Ledger,
) -> Result<Summary, PipelineError> {
    let bar = progress_bar(items.len() as u64);
    let mut summary = Summary {
        total: items.len(),
        ..Default::default()
    };

    for item in items {
        bar.set_message(item.relative_path.to_string());
        match pipeline.process(item, ledger).await {
            Ok(ItemOutcome::Transferred) => summary.transferred += 1,
            Ok(ItemOutcome::Skipped) => summary.skipped += 1,
            Err(e) => {
                bar.abandon();
                tracing::error!(path = %item.relative_path, "stopping run: {e}");
                return Err(e);
            }
        }
        bar.inc(1);
    }

    bar.finish_and_clear();
    tracing::info!(
        total = summary.total,
        transferred = summary.transferred,
        skipped = summary.skipped,
        "run complete"
    );
    Ok(summary)
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    if std::io::stderr().is_terminal() {
        bar.set_style(
            ProgressStyle::with_template("{pos}/{len} [{bar:30}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
    } else {
        bar.set_draw_target(ProgressDrawTarget::hidden());
    }
    bar
}
