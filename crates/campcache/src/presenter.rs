//! Plain-text list presenter.
//!
//! Re-renders the whole list every time the cache hands over a new
//! snapshot. Output goes to any `Write` so tests can capture it.

use std::io::{self, Write};
use std::sync::Arc;

use campcache_core::cache::feed::Snapshot;
use campcache_core::utils::{format_optional, single_line, truncate_string};
use campcache_core::{CachedData, Campground, SyncStatus, ViewState};

/// Width descriptions are truncated to
const DESCRIPTION_WIDTH: usize = 96;

/// Indent for the detail lines under a campground name
const DETAIL_INDENT: &str = "     ";

pub struct ListPresenter<W: Write> {
    out: W,
    shown: Option<Snapshot>,
}

impl<W: Write> ListPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out, shown: None }
    }

    /// True if `snapshot` is exactly what was rendered last
    pub fn is_showing(&self, snapshot: &Snapshot) -> bool {
        self.shown
            .as_ref()
            .is_some_and(|shown| Arc::ptr_eq(shown, snapshot))
    }

    /// Replace the displayed list with `snapshot`
    pub fn show(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        let campgrounds: Vec<Campground> = snapshot.iter().map(|r| r.to_campground()).collect();

        writeln!(self.out)?;
        writeln!(self.out, "── {} ──", count_label(campgrounds.len()))?;
        for line in render_rows(&campgrounds) {
            writeln!(self.out, "{}", line)?;
        }
        self.out.flush()?;

        self.shown = Some(Arc::clone(snapshot));
        Ok(())
    }

    pub fn show_status(
        &mut self,
        status: &SyncStatus,
        cache: Option<&CachedData<usize>>,
    ) -> io::Result<()> {
        writeln!(self.out, "{}", status_line(status, cache))?;
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

fn count_label(count: usize) -> String {
    match count {
        0 => "No campgrounds".to_string(),
        1 => "1 campground".to_string(),
        n => format!("{} campgrounds", n),
    }
}

/// Render campgrounds as numbered text rows
pub fn render_rows(campgrounds: &[Campground]) -> Vec<String> {
    let mut lines = Vec::with_capacity(campgrounds.len() * 3);
    for (i, campground) in campgrounds.iter().enumerate() {
        let name = if campground.name.is_empty() {
            "(unnamed)"
        } else {
            campground.name.as_str()
        };
        match campground.coordinates() {
            Some(coords) => lines.push(format!("{:>3}. {}  [{}]", i + 1, name, coords)),
            None => lines.push(format!("{:>3}. {}", i + 1, name)),
        }

        let description = single_line(&campground.description);
        if !description.is_empty() {
            lines.push(format!(
                "{}{}",
                DETAIL_INDENT,
                truncate_string(&description, DESCRIPTION_WIDTH)
            ));
        }
        lines.push(format!(
            "{}{}",
            DETAIL_INDENT,
            format_optional(campground.image_url(), "(no image)")
        ));
    }
    lines
}

/// One-line summary of the sync state and cache age
pub fn status_line(status: &SyncStatus, cache: Option<&CachedData<usize>>) -> String {
    let age = match cache {
        Some(info) if info.is_stale() => format!("cached {} (stale)", info.age_display()),
        Some(info) => format!("cached {}", info.age_display()),
        None => "nothing cached yet".to_string(),
    };

    match status.view() {
        ViewState::Loading => format!("… {} ({})", status, age),
        ViewState::Ready if matches!(status, SyncStatus::Idle) => format!("● Offline, {}", age),
        ViewState::Ready => format!("✓ {}", status),
        ViewState::Error => format!("✗ {}; showing {}", status, age),
    }
}
