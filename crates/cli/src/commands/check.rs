use std::path::Path;
use std::process;

use crate::commands::build_or_exit;
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_check(template: &Path, output: OutputFormat, quiet: bool) {
    let dictionary = build_or_exit(template, output, quiet);

    let queries = match policydoc_eval::validate_paths(&dictionary) {
        Ok(n) => n,
        Err(failures) => {
            for (field, error) in &failures {
                let msg = format!("error: field '{}': {}", field, error);
                report_error(&msg, output, quiet);
            }
            process::exit(1);
        }
    };

    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => {
            println!(
                "ok: {} fields, {} path queries in {}",
                dictionary.len(),
                queries,
                template.display()
            );
        }
        OutputFormat::Json => {
            let fields: Vec<&str> = dictionary.names().collect();
            let summary = serde_json::json!({
                "template": template.display().to_string(),
                "fields": fields,
                "path_queries": queries,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&summary)
                    .unwrap_or_else(|e| format!("serialization error: {}", e))
            );
        }
    }
}
