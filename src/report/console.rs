use crate::report::report_model::Report;

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format an exploration report for terminal output.
///
/// Produces output like:
/// ```text
/// === Discovered inputs: 2 ===
///
/// #1  Amount  [input type=text]  depth 0
///     path: (start view)
/// #2  Address  [input]  depth 1
///     path: Next
///
/// === 2 states visited, 3 clicks, 0 stale, 0 back failures ===
/// ```
pub fn format_console_report(report: &Report) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== Discovered inputs: {} ===\n\n",
        report.total_inputs()
    ));

    for (i, entry) in report.inputs.iter().enumerate() {
        let kind = match &entry.input.input_type {
            Some(t) => format!("{} type={}", entry.input.tag, t),
            None => entry.input.tag.clone(),
        };
        out.push_str(&format!(
            "#{}  {}  [{}]  depth {}\n",
            i + 1,
            entry.input.label,
            kind,
            entry.depth
        ));

        let path = if entry.path.is_empty() {
            "(start view)".to_string()
        } else {
            entry.path_labels().join(" \u{2192} ")
        };
        out.push_str(&format!("    path: {}\n", path));

        if let Some(accepted) = entry.probe_accepted {
            out.push_str(&format!(
                "    probe: {}\n",
                if accepted { "accepted" } else { "rejected" }
            ));
        }
    }

    let stats = &report.stats;
    out.push_str(&format!(
        "\n=== {} states visited, {} clicks, {} stale, {} back failures",
        stats.visited_states, stats.clicks, stats.stale_elements, stats.back_failures
    ));

    if let Some(ms) = stats.duration_ms {
        let secs = ms as f64 / 1000.0;
        out.push_str(&format!(" in {:.1}s", secs));
    }

    out.push_str(" ===\n");

    out
}
