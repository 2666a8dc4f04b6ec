use crate::report::{EvaluationReport, ReportError};

pub fn render_metrics_json(report: &EvaluationReport) -> Result<String, ReportError> {
    let mut out = serde_json::to_string_pretty(report)?;
    out.push('\n');
    Ok(out)
}
