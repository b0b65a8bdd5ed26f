use std::io::Write;

use crate::report::report_model::{InputRecord, Report};

/// One JSON object per discovered input, newline-terminated.
pub fn to_jsonl(report: &Report) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for record in report.records() {
        out.push_str(&serde_json::to_string(&record)?);
        out.push('\n');
    }
    Ok(out)
}

pub fn write_jsonl<W: Write>(report: &Report, writer: &mut W) -> std::io::Result<()> {
    for record in report.records() {
        serde_json::to_writer(&mut *writer, &record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Parse line-delimited records back, skipping blank lines.
pub fn parse_jsonl(input: &str) -> Result<Vec<InputRecord>, serde_json::Error> {
    input
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(serde_json::from_str)
        .collect()
}

/// The full report (descriptors, step kinds, statistics) as pretty JSON.
pub fn to_json_pretty(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
