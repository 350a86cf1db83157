use beamfold::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

const TICK: Duration = Duration::from_millis(100);

/// Shows the phases of a single fold on stderr: a spinner while a phase runs, and a bar
/// counting nucleotides during the sweep.
pub struct SweepProgress {
    bar: ProgressBar,
}

impl SweepProgress {
    pub fn new(visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr())
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    pub fn callback(&self) -> ProgressCallback<'static> {
        let bar = self.bar.clone();
        Box::new(move |event| match event {
            Progress::PhaseStart { name } => {
                bar.reset();
                bar.set_style(phase_style());
                bar.set_prefix(name);
                bar.set_message("");
                bar.enable_steady_tick(TICK);
            }
            Progress::TaskStart { total_steps } => {
                bar.disable_steady_tick();
                bar.set_style(sweep_style());
                bar.set_length(total_steps);
                bar.set_position(0);
            }
            Progress::TaskIncrement => bar.inc(1),
            Progress::TaskFinish => {
                if let Some(length) = bar.length() {
                    bar.set_position(length);
                }
            }
            Progress::PhaseFinish => {
                bar.disable_steady_tick();
                bar.finish_with_message("done");
            }
            Progress::Message(text) => bar.set_message(text),
        })
    }
}

/// Counts finished records when a batch is folded in parallel.
pub fn batch_bar(total: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr());
    bar.set_style(
        ProgressStyle::with_template("records [{bar:40.green/white}] {pos}/{len} ({per_sec})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

fn phase_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {prefix:.bold} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn sweep_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:>14.bold} [{bar:40.cyan/blue}] {pos}/{len} nt ({elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_and_sweep_positions_are_tracked() {
        let progress = SweepProgress::new(false);
        let callback = progress.callback();

        callback(Progress::PhaseStart {
            name: "Inside Sweep",
        });
        assert_eq!(progress.bar.prefix(), "Inside Sweep");
        assert!(!progress.bar.is_finished());

        callback(Progress::TaskStart { total_steps: 9 });
        callback(Progress::TaskIncrement);
        callback(Progress::TaskIncrement);
        assert_eq!(progress.bar.length(), Some(9));
        assert_eq!(progress.bar.position(), 2);

        callback(Progress::TaskFinish);
        assert_eq!(progress.bar.position(), 9);

        callback(Progress::PhaseFinish);
        assert!(progress.bar.is_finished());
        assert_eq!(progress.bar.message(), "done");
    }

    #[test]
    fn a_new_phase_restarts_the_bar() {
        let progress = SweepProgress::new(false);
        let callback = progress.callback();

        callback(Progress::PhaseStart { name: "Inside Sweep" });
        callback(Progress::TaskStart { total_steps: 4 });
        callback(Progress::TaskFinish);
        callback(Progress::PhaseFinish);

        callback(Progress::PhaseStart { name: "Backtrace" });
        assert_eq!(progress.bar.prefix(), "Backtrace");
        assert_eq!(progress.bar.position(), 0);
        assert!(!progress.bar.is_finished());
        callback(Progress::PhaseFinish);
    }

    #[test]
    fn messages_replace_the_status_text() {
        let progress = SweepProgress::new(false);
        let callback = progress.callback();
        callback(Progress::Message("3 structure(s)".to_string()));
        assert_eq!(progress.bar.message(), "3 structure(s)");
    }

    #[test]
    fn callbacks_can_move_to_other_threads() {
        let progress = SweepProgress::new(false);
        let callback = progress.callback();
        std::thread::spawn(move || {
            callback(Progress::PhaseStart { name: "Backtrace" });
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();
        assert!(progress.bar.is_finished());
    }

    #[test]
    fn hidden_batch_bar_still_counts() {
        let bar = batch_bar(3, false);
        bar.inc(2);
        assert_eq!(bar.position(), 2);
    }
}
