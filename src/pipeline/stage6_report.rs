use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::model::case::CaseMetrics;
use crate::pipeline::stage5_aggregate::Stage5Output;
use crate::report::json::render_metrics_json;
use crate::report::text::render_summary_text;
use crate::report::{EvaluationReport, ReportError, SummaryData, format_metric};

pub const METRICS_JSON: &str = "metrics.json";
pub const SUMMARY_TXT: &str = "summary.txt";
pub const CASES_TSV: &str = "cases.tsv";

#[derive(Debug, Clone)]
pub struct Stage6Input<'a> {
    pub cases: &'a BTreeMap<String, CaseMetrics>,
    pub aggregate: &'a Stage5Output,
    pub n_cases_with_mask: usize,
    pub n_cases_with_hazy: usize,
    pub fid_source: String,
}

pub fn write_reports(input: &Stage6Input<'_>, out_dir: &Path) -> Result<(), ReportError> {
    fs::create_dir_all(out_dir)?;

    let report = EvaluationReport {
        case: input.cases.clone(),
        aggregates: input.aggregate.aggregates,
        final_score: input.aggregate.final_score.value,
    };
    let metrics_path = out_dir.join(METRICS_JSON);
    write_text(&metrics_path, &render_metrics_json(&report)?)?;

    let summary = SummaryData {
        tool_name: "dehaze-eval".to_string(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        n_cases: input.cases.len(),
        n_cases_with_mask: input.n_cases_with_mask,
        n_cases_with_hazy: input.n_cases_with_hazy,
        fid_source: input.fid_source.clone(),
        aggregates: input.aggregate.aggregates,
        final_score: input.aggregate.final_score,
    };
    let summary_path = out_dir.join(SUMMARY_TXT);
    write_text(&summary_path, &render_summary_text(&summary))?;

    let cases_path = out_dir.join(CASES_TSV);
    write_cases_tsv(input.cases, &cases_path)?;

    tracing::info!(
        "wrote {}, {}, {} to {}",
        METRICS_JSON,
        SUMMARY_TXT,
        CASES_TSV,
        out_dir.display()
    );
    Ok(())
}

fn write_cases_tsv(cases: &BTreeMap<String, CaseMetrics>, path: &Path) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    let header = [
        "case",
        "cnr",
        "gcnr",
        "ks_a_statistic",
        "ks_a_p_value",
        "ks_b_statistic",
        "ks_b_p_value",
    ];
    writeln!(w, "{}", header.join("\t"))?;
    for (id, m) in cases {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            id,
            format_metric(m.cnr),
            format_metric(m.gcnr),
            format_metric(m.ks_a_statistic),
            format_metric(m.ks_a_p_value),
            format_metric(m.ks_b_statistic),
            format_metric(m.ks_b_p_value)
        )?;
    }
    w.flush()
}

fn write_text(path: &Path, text: &str) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    w.write_all(text.as_bytes())?;
    w.flush()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage6_report.rs"]
mod tests;
