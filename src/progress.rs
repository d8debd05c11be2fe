//! Progress indicators for evpnctl.
//!
//! [`RoleSpinner`] follows the orchestrator role by role; [`BusyReporter`]
//! surfaces busy retries from the session.

use std::time::Duration;

use fabric::{Error, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use restconf::{Method, RetryCallback};

use crate::ui;

/// Create a spinner with a message
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// One spinner per role, replaced by a status line when the role finishes.
pub struct RoleSpinner {
    quiet: bool,
    current: Option<ProgressBar>,
}

impl RoleSpinner {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            current: None,
        }
    }

    fn finish(&mut self) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressCallback for RoleSpinner {
    fn on_group_start(&mut self, resource: &str, group: &str, hosts: usize) {
        self.finish();
        if !self.quiet {
            self.current = Some(spinner(&format!(
                "{resource} on {group} ({})",
                ui::count(hosts, "host")
            )));
        }
    }

    fn on_request(&mut self, method: Method, path: &str, hosts: usize) {
        if let Some(pb) = &self.current {
            pb.set_message(format!("{method} {path} ({})", ui::count(hosts, "host")));
        }
    }

    fn on_group_complete(&mut self, group: &str) {
        self.finish();
        if !self.quiet {
            ui::success(group);
        }
    }

    fn on_group_failed(&mut self, group: &str, error: &Error) {
        self.finish();
        ui::error(&format!("{group}: {error}"));
    }

    fn on_group_skipped(&mut self, group: &str) {
        if !self.quiet {
            ui::dim(&format!("{group}: no hosts, skipped"));
        }
    }
}

impl Drop for RoleSpinner {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Reports busy retries on the terminal.
pub struct BusyReporter;

impl RetryCallback for BusyReporter {
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &restconf::Error, delay: Duration) {
        let host = error.host().unwrap_or("device");
        ui::warn(&format!(
            "{host} busy (attempt {attempt}/{max_attempts}), retrying in {}s",
            delay.as_secs()
        ));
    }
}
