use std::time::Duration;

use enum_dispatch::enum_dispatch;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// The environment variable that selects how progress is reported:
/// `std`/`standard` (spinners), `simple`/`dumb` (plain lines), `off`.
pub(crate) const STACKMATE_PROGRESS_ENV: &str = "STACKMATE_PROGRESS_MODE";

/// Console report API for the commands' named steps.
#[enum_dispatch]
pub(crate) trait Progress: Sized {
    /// Create a subtask report from this task.
    fn subtask(&self, text: &str) -> Self;

    /// When the task is done successfully.
    fn success(&mut self, msg: Option<&str>);

    /// When the task is done with failure.
    fn failure(&mut self, msg: Option<&str>);

    /// When you want to issue a warning on the current task.
    fn warning(&self, msg: &str);

    /// When you want to print a message.
    fn print(&self, msg: &str);
}

/// The way progress is reported on the console.
#[derive(Debug)]
#[enum_dispatch(Progress)]
pub(crate) enum ProgressTracker {
    /// Display dynamic progress with spinners.
    SpinnerProgress(SpinnerProgress),

    /// Display simple human-readable messages in new lines.
    SimpleProgress(SimpleProgress),

    /// Do not output progress.
    NullProgress(NullProgress),
}

impl ProgressTracker {
    /// Get the progress tracker from the environment, defaulting to
    /// [`SpinnerProgress`].
    pub(crate) fn from_env(text: &str) -> Self {
        match std::env::var(STACKMATE_PROGRESS_ENV).as_deref() {
            Ok("simple" | "dumb") => SimpleProgress::new(text).into(),
            Ok("off") => NullProgress.into(),
            _ => SpinnerProgress::new(text).into(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct NullProgress;

impl Progress for NullProgress {
    fn subtask(&self, _: &str) -> NullProgress {
        NullProgress
    }

    fn success(&mut self, _: Option<&str>) {}

    fn failure(&mut self, _: Option<&str>) {}

    fn warning(&self, _: &str) {}

    fn print(&self, _: &str) {}
}

#[derive(Debug)]
pub(crate) struct SimpleProgress;

impl SimpleProgress {
    fn new(text: &str) -> SimpleProgress {
        println!("{text}");
        SimpleProgress
    }
}

impl Progress for SimpleProgress {
    fn subtask(&self, text: &str) -> SimpleProgress {
        println!("{text}");
        SimpleProgress
    }

    fn success(&mut self, msg: Option<&str>) {
        if let Some(msg) = msg {
            println!("✓ {msg}");
        }
    }

    fn failure(&mut self, msg: Option<&str>) {
        if let Some(msg) = msg {
            println!("x {msg}");
        }
    }

    fn warning(&self, msg: &str) {
        println!("! {msg}");
    }

    fn print(&self, msg: &str) {
        println!("{msg}");
    }
}

fn spinner(indent: usize) -> ProgressBar {
    let template = format!("{}{{spinner}} {{msg}}", "  ".repeat(indent));
    ProgressBar::hidden().with_style(
        ProgressStyle::default_spinner()
            .template(&template)
            .expect("static spinner template is valid"),
    )
}

#[derive(Debug)]
pub(crate) struct SpinnerProgress {
    done: bool,
    root_progress: MultiProgress,
    progress: ProgressBar,
    indent: usize,
}

impl SpinnerProgress {
    fn new(text: &str) -> SpinnerProgress {
        let root_progress = MultiProgress::new();
        let progress = spinner(0);
        progress.set_message(text.to_string());
        root_progress.add(progress.clone());
        progress.enable_steady_tick(Duration::from_millis(60));

        SpinnerProgress {
            done: false,
            indent: 0,
            root_progress,
            progress,
        }
    }
}

impl Progress for SpinnerProgress {
    fn subtask(&self, text: &str) -> SpinnerProgress {
        let indent = self.indent + 1;
        let progress = spinner(indent);
        progress.set_message(text.to_string());
        self.root_progress.add(progress.clone());
        progress.enable_steady_tick(Duration::from_millis(60));

        SpinnerProgress {
            done: false,
            root_progress: self.root_progress.clone(),
            indent,
            progress,
        }
    }

    fn success(&mut self, msg: Option<&str>) {
        self.done = true;
        match msg {
            Some(msg) => self.progress.finish_with_message(format!("✓ {msg}")),
            None => self
                .progress
                .finish_with_message(format!("✓ {}", self.progress.message())),
        }
    }

    fn failure(&mut self, msg: Option<&str>) {
        self.done = true;
        match msg {
            Some(msg) => self.progress.abandon_with_message(format!("x {msg}")),
            None => self
                .progress
                .abandon_with_message(format!("x {}", self.progress.message())),
        }
    }

    fn warning(&self, msg: &str) {
        let formatted = format!("! {msg}");
        self.print(&formatted);
        self.progress.set_message(formatted);
    }

    fn print(&self, msg: &str) {
        let _ = self.root_progress.println(msg);
    }
}

impl Drop for SpinnerProgress {
    fn drop(&mut self) {
        if !self.done {
            self.failure(None);
        }
    }
}
