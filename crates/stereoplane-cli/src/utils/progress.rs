use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::time::Duration;
use stereoplane::engine::progress::{Progress, ProgressCallback};

const SPINNER_TICK_MS: u64 = 80;

/// Renders core [`Progress`] events as a single `indicatif` bar on stderr.
///
/// Phases show as a spinner; tasks switch the same bar to a frame counter.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: ProgressBar,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// Useful when stderr is not a terminal or in tests.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let pb = ProgressBar::with_draw_target(Some(0), target).with_style(spinner_style());
        pb.finish_and_clear();
        Self { pb }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb = self.pb.clone();
        Box::new(move |progress: Progress| match progress {
            Progress::PhaseStart { name } => {
                pb.reset();
                pb.set_length(0);
                pb.set_style(spinner_style());
                pb.set_message(name.to_string());
                pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
            }
            Progress::PhaseFinish => {
                pb.disable_steady_tick();
                pb.finish_with_message("✓ Done");
            }
            Progress::TaskStart { total_steps } => {
                pb.disable_steady_tick();
                pb.reset();
                pb.set_length(total_steps);
                pb.set_style(frame_style());
            }
            Progress::TaskIncrement => pb.inc(1),
            Progress::TaskFinish => {
                let total = pb.length().unwrap_or(0);
                pb.set_position(total.max(pb.position()));
                pb.finish();
            }
            Progress::Message(msg) => pb.println(format!("  {}", msg)),
        })
    }

    /// Clears whatever is left of the bar.
    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn frame_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<12} [{bar:40.cyan/blue}] {pos}/{len} frames ({rate})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key(
            "rate",
            |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                let _ = write!(w, "{:.0} fps", state.per_sec());
            },
        )
        .progress_chars("##-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn handler_initializes_in_a_clean_state() {
        let handler = CliProgressHandler::hidden();
        assert_eq!(handler.pb.length(), Some(0));
        assert!(handler.pb.is_finished());
    }

    #[test]
    fn callback_tracks_phases_and_frames() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart { name: "Rotation" });
        assert_eq!(handler.pb.message(), "Rotation");
        assert!(!handler.pb.is_finished());

        callback(Progress::TaskStart { total_steps: 120 });
        assert_eq!(handler.pb.length(), Some(120));
        assert_eq!(handler.pb.position(), 0);

        callback(Progress::TaskIncrement);
        callback(Progress::TaskIncrement);
        assert_eq!(handler.pb.position(), 2);

        callback(Progress::TaskFinish);
        assert!(handler.pb.is_finished());
        assert_eq!(handler.pb.position(), 120);

        callback(Progress::PhaseFinish);
        assert_eq!(handler.pb.message(), "✓ Done");
    }

    #[test]
    fn callback_can_move_to_another_thread() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart { name: "Alignment" });
            callback(Progress::Message("plane fixed".to_string()));
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        assert!(handler.pb.is_finished());
        assert_eq!(handler.pb.message(), "✓ Done");
    }
}
