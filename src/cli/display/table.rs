//! Table rendering for CLI output

use super::colors::table_color_to_colored_str;
use super::{ColorTheme, StatusIcon};
use crate::domain::deploy::batch::UnitReport;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};

/// Table renderer for formatted output
pub struct TableRenderer {
    theme: ColorTheme,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRenderer {
    /// Create a new table renderer with default theme
    pub fn new() -> Self {
        Self {
            theme: ColorTheme::default(),
        }
    }

    /// Render batch results, one row per unit in submission order
    pub fn render_batch_results(&self, reports: &[UnitReport]) -> String {
        if reports.is_empty() {
            return "Nothing to deploy".to_string();
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("KIND").set_alignment(CellAlignment::Left),
                Cell::new("NAME").set_alignment(CellAlignment::Left),
                Cell::new("STATUS").set_alignment(CellAlignment::Center),
                Cell::new("DETAILS").set_alignment(CellAlignment::Left),
                Cell::new("STARTED").set_alignment(CellAlignment::Left),
                Cell::new("TIME").set_alignment(CellAlignment::Right),
            ]);

        for report in reports {
            let (icon, status, details) = match &report.outcome {
                Ok(summary) => (StatusIcon::SUCCESS, "Deployed", summary.clone()),
                Err(e) => (StatusIcon::ERROR, "Failed", e.to_string()),
            };
            let color = self.theme.outcome_color(report.is_success());

            table.add_row(vec![
                Cell::new(report.kind.kind()),
                Cell::new(&report.label),
                Cell::new(format!("{} {}", icon, status)).fg(color),
                Cell::new(details),
                Cell::new(report.started.format("%H:%M:%S").to_string()).fg(self.theme.muted),
                Cell::new(format!("{:.1}s", report.elapsed_ms() as f64 / 1000.0))
                    .set_alignment(CellAlignment::Right),
            ]);
        }

        let failed = reports.iter().filter(|r| !r.is_success()).count();
        let summary = format!(
            "{} {} deployed, {} failed",
            StatusIcon::for_summary(failed, reports.len()),
            reports.len() - failed,
            failed
        );
        let summary = summary.color(table_color_to_colored_str(
            self.theme.summary_color(failed, reports.len()),
        ));

        let mut output = String::new();
        output.push_str(&format!(
            "╭─ Deploy Results {} ─╮\n",
            format!("[{} units]", reports.len()).bright_black()
        ));
        output.push_str(&table.to_string());
        output.push('\n');
        output.push_str(&format!("{}\n", summary));
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::kubernetes::objects::ResourceKind;
    use crate::shared::error::TmError;
    use chrono::Utc;

    fn report(label: &str, outcome: Result<String, TmError>) -> UnitReport {
        let now = Utc::now();
        UnitReport {
            label: label.to_string(),
            kind: ResourceKind::Task,
            outcome,
            started: now,
            finished: now,
        }
    }

    #[test]
    fn test_render_empty_results() {
        let renderer = TableRenderer::new();
        assert!(renderer.render_batch_results(&[]).contains("Nothing to deploy"));
    }

    #[test]
    fn test_render_mixed_results() {
        colored::control::set_override(false);
        let renderer = TableRenderer::new();
        let output = renderer.render_batch_results(&[
            report("lint", Ok("lint created".to_string())),
            report("build", Err(TmError::Conflict("stale".to_string()))),
        ]);

        assert!(output.contains("lint created"));
        assert!(output.contains("Conflict: stale"));
        assert!(output.contains("Task"));
        assert!(output.contains("1 deployed, 1 failed"));
    }
}
