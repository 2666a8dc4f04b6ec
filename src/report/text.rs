use crate::model::aggregates::AGGREGATE_KEYS;
use crate::report::{SummaryData, format_f64_6, format_metric};

pub fn render_summary_text(data: &SummaryData) -> String {
    let mut out = String::new();

    out.push_str("Dehazing Evaluation Summary\n");
    out.push_str("===========================\n\n");
    out.push_str(&format!("Tool: {} {}\n", data.tool_name, data.tool_version));
    out.push_str(&format!("Cases: {}\n", data.n_cases));
    out.push_str(&format!(
        "Cases with mask: {}\nCases with hazy input: {}\n",
        data.n_cases_with_mask, data.n_cases_with_hazy
    ));
    out.push_str(&format!("FID source: {}\n\n", data.fid_source));

    out.push_str("Aggregates\n");
    for key in AGGREGATE_KEYS {
        out.push_str(&format!(
            "{:<10} {}\n",
            key,
            format_metric(data.aggregates.get(key))
        ));
    }
    out.push('\n');

    out.push_str("Final score (5:3:2)\n");
    out.push_str(&format!(
        "Group 1 (FID + CNR + gCNR): {}\n",
        format_f64_6(data.final_score.group1)
    ));
    out.push_str(&format!(
        "Group 2 (KS^A + KS^B): {}\n",
        format_f64_6(data.final_score.group2)
    ));
    out.push_str(&format!(
        "Group 3 (Dice + ASD): {}\n",
        format_f64_6(data.final_score.group3)
    ));
    out.push_str(&format!("Final: {}\n", format_f64_6(data.final_score.value)));
    out
}
