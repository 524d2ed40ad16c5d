//! Human-readable summary renderer for drift analyses.

use crate::model::analysis::DriftAnalysisResult;
use crate::model::change::{DriftCategory, DriftChange};

/// Render a Markdown summary of a [`DriftAnalysisResult`].
///
/// Informational only; the structured result stays authoritative.
pub fn render_human_summary(result: &DriftAnalysisResult) -> String {
    let summary = &result.summary;
    let mut out = String::new();

    out.push_str(&format!(
        "## Drift Analysis: {} / {}\n\n",
        result.tenant_id, result.snapshot_type
    ));
    out.push_str(&format!(
        "**Risk**: {}  \n**Max severity**: {}  \n**Breaking**: {}  \n**Requires review**: {}\n\n",
        summary.risk_text,
        summary.max_severity,
        yes_no(summary.has_breaking_changes),
        yes_no(summary.requires_review),
    ));

    out.push_str("### Snapshots\n\n");
    out.push_str(&format!(
        "| | Snapshot | Captured At |\n\
         |---|---|---|\n\
         | Before | `{}` | {} |\n\
         | After | `{}` | {} |\n\n",
        result.before_snapshot_id,
        result.before_captured_at.to_rfc3339(),
        result.after_snapshot_id,
        result.after_captured_at.to_rfc3339(),
    ));

    if summary.total_changes == 0 {
        out.push_str("_No changes detected._\n");
        return out;
    }

    out.push_str("### Totals\n\n");
    out.push_str(&format!(
        "- **Changes**: {} ({} added, {} removed, {} modified)\n",
        summary.total_changes,
        summary.by_change_type.added,
        summary.by_change_type.removed,
        summary.by_change_type.modified,
    ));
    for category in DriftCategory::ALL {
        let n = summary.count(category);
        if n > 0 {
            out.push_str(&format!("- **{}**: {}\n", category, n));
        }
    }
    out.push('\n');

    out.push_str("### Changes\n\n");
    for change in &result.changes {
        out.push_str(&render_change(change));
    }
    out.push('\n');

    out.push_str(&format!("_Digest: `{}`_\n", short(&result.changes_digest)));
    out
}

fn render_change(change: &DriftChange) -> String {
    format!(
        "- [{}/{}] {} `{}`: {}\n",
        change.severity,
        change.category,
        change.change.change_type,
        change.change.diff_path,
        change.change.description,
    )
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn short(digest: &str) -> &str {
    let end = digest.len().min(12);
    digest.get(..end).unwrap_or(digest)
}
