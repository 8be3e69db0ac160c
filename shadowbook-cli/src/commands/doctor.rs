//! Doctor command - run ledger health checks

use anyhow::{bail, Result};
use colored::Colorize;
use comfy_table::{Cell, Color};
use serde_json::Value;

use super::{get_context, logged};
use crate::output;

/// Format a detail JSON value for display
fn format_detail(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            // Snapshots are too wide for a table cell
            let parts: Vec<String> = map
                .iter()
                .filter(|(k, v)| !v.is_null() && *k != "stored" && *k != "replayed")
                .map(|(k, v)| {
                    let display_val = match v {
                        Value::String(s) if s.len() > 40 => format!("{}...", &s[..37]),
                        Value::String(s) => s.clone(),
                        _ => v.to_string(),
                    };
                    format!("{}: {}", k, display_val)
                })
                .collect();
            parts.join(", ")
        }
        Value::String(s) => s.clone(),
        _ => value.to_string(),
    }
}

pub fn run(verbose: bool, json: bool) -> Result<()> {
    let result = logged("doctor", || {
        let ctx = get_context()?;
        Ok(ctx.doctor_service.run_checks()?)
    })?;

    if json {
        output::json(&result)?;
    } else {
        println!("{}", "Ledger Health Check".bold());
        println!();

        let mut table = output::create_table();
        table.set_header(vec!["Check", "Status", "Message"]);

        for (check_name, check_result) in &result.checks {
            let status_cell = match check_result.status.as_str() {
                "pass" => Cell::new("PASS").fg(Color::Green),
                "warning" => Cell::new("WARN").fg(Color::Yellow),
                "error" => Cell::new("ERROR").fg(Color::Red),
                _ => Cell::new(&check_result.status),
            };

            table.add_row(vec![
                Cell::new(check_name),
                status_cell,
                Cell::new(&check_result.message),
            ]);

            if verbose {
                if let Some(details) = &check_result.details {
                    for detail in details {
                        table.add_row(vec![
                            Cell::new(""),
                            Cell::new(""),
                            Cell::new(format!("  - {}", format_detail(detail))),
                        ]);
                    }
                }
            }
        }

        println!("{}", table);
        println!();

        println!(
            "Summary: {} passed, {} warnings, {} errors",
            result.summary.passed.to_string().green(),
            result.summary.warnings.to_string().yellow(),
            result.summary.errors.to_string().red(),
        );
    }

    if result.summary.errors > 0 {
        bail!("{} check(s) failed", result.summary.errors);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_detail_skips_snapshots() {
        let detail = json!({
            "owner": "alice",
            "stored": {"usdc": "1"},
            "replayed": {"usdc": "0"},
        });
        assert_eq!(format_detail(&detail), "owner: alice");
    }

    #[test]
    fn test_format_detail_truncates_long_values() {
        let detail = json!({"owner": "x".repeat(64)});
        assert_eq!(format_detail(&detail), format!("owner: {}...", "x".repeat(37)));
    }
}
