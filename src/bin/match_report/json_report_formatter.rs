use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use pema_rs::matching::report::MatchSummary;
use pema_rs::{AcceptanceRecord, FlatMatchRecord};
use serde::Serialize;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
pub struct Report {
    pub schema_version: u32,
    pub meta: Meta,
    pub summary: MatchSummary,
    pub truth: Vec<FlatMatchRecord>,
    pub peaks: Vec<FlatMatchRecord>,
    pub acceptance: Vec<AcceptanceRecord>,
}

#[derive(Debug, Serialize)]
pub struct Meta {
    pub generated_at: String,
    pub truth_count: usize,
    pub peak_count: usize,
    pub fuzz_ns: i64,
    pub no_match_sentinel: i64,
}

pub fn write_report(path: &Path, report: &Report) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            format!(
                "Failed to create report output directory '{}': {err}",
                parent.display()
            )
        })?;
    }

    let mut file = File::create(path)
        .map_err(|err| format!("Failed to create report file '{}': {err}", path.display()))?;
    serde_json::to_writer_pretty(&mut file, report).map_err(|err| {
        format!(
            "Failed to serialize report JSON '{}': {err}",
            path.display()
        )
    })?;
    file.write_all(b"\n")
        .map_err(|err| format!("Failed to finalize report file '{}': {err}", path.display()))?;
    Ok(())
}
