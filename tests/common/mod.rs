#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Synthetic events dataset exercising all detection heuristics at once:
/// an integer key, a title-ish name, dates, a categorical status, a
/// separate coordinate pair, and free-text notes.
pub fn events_csv() -> String {
    let mut csv = String::from("id,event_name,event_date,status,lat,lng,notes\n");
    let names = [
        "Winter festival",
        "Harbor concert",
        "Open air cinema",
        "Night market",
        "River regatta",
        "Spring parade",
        "Jazz brunch",
        "Museum late night",
    ];
    let statuses = ["confirmed", "cancelled", "postponed"];
    let notes = [
        "An evening of live music and food stalls along the waterfront promenade",
        "Family friendly program with workshops and guided tours throughout the day",
        "Outdoor screening of classic films with seating on the lawn near the gate",
        "Local vendors, street food, and craft stands in the old town square",
    ];
    for i in 0..40usize {
        let lat = 47.5 + (i as f64) * 0.15;
        let lng = 6.2 + (i as f64) * 0.2;
        // Names and notes repeat a little so only `id` is fully unique and
        // neither column trips the enum-cardinality ceiling.
        let name_idx = i % 30;
        let note_idx = i % 28;
        csv.push_str(&format!(
            "{},{} {},2024-06-{:02},{},{:.4},{:.4},\"{} (edition {})\"\n",
            i + 1,
            names[name_idx % names.len()],
            name_idx,
            (i % 25) + 1,
            statuses[i % statuses.len()],
            lat,
            lng,
            notes[note_idx % notes.len()],
            note_idx,
        ));
    }
    csv
}
