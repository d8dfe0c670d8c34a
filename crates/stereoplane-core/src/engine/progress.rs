//! Progress events emitted by long-running workflows.
//!
//! Workflows are split into named phases; a phase may run one counted task (the spin
//! workflow counts simulated frames). Front ends turn the events into progress bars.

/// One progress notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// A named phase begins ("Alignment", "Rotation").
    PhaseStart { name: &'static str },
    PhaseFinish,

    /// A counted task begins inside the current phase.
    TaskStart { total_steps: u64 },
    /// One step (simulated frame) of the current task is done.
    TaskIncrement,
    TaskFinish,

    /// Something worth showing to a person, such as a rotation pause.
    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards [`Progress`] events to an optional callback. Silent without one.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    pub fn is_silent(&self) -> bool {
        self.callback.is_none()
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(callback) = &self.callback {
            callback(event);
        }
    }

    /// Reports a free-form message.
    pub fn message(&self, text: impl Into<String>) {
        self.report(Progress::Message(text.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reporter_without_callback_discards_events() {
        let reporter = ProgressReporter::new();
        assert!(reporter.is_silent());
        reporter.report(Progress::TaskIncrement);
        reporter.message("ignored");
    }

    #[test]
    fn reporter_forwards_events_to_callback() {
        let seen = Mutex::new(Vec::new());
        {
            let reporter = ProgressReporter::with_callback(Box::new(|event| {
                seen.lock().unwrap().push(format!("{:?}", event));
            }));
            reporter.report(Progress::PhaseStart { name: "Spin" });
            reporter.message("paused at 180°");
            reporter.report(Progress::PhaseFinish);
        }
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].contains("Spin"));
        assert!(seen[1].contains("paused"));
    }
}
