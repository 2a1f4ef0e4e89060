use anyhow::Result;
use scour_common::OutputFormat;
use scour_web::ScanReport;

/// Render the scan report for stdout.
///
/// Text mode prints one line per matched URL, in input order, then the
/// elapsed time. JSON mode prints the whole report, failures included.
pub fn render(report: &ScanReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            for m in &report.matches {
                out.push_str(&format!("Keyword '{}' found in URL: {}\n", m.keyword, m.url));
            }
            out.push_str(&format!(
                "Time taken: {} seconds\n",
                report.elapsed.as_secs_f64()
            ));
            Ok(out)
        }
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(report)?;
            out.push('\n');
            Ok(out)
        }
    }
}
