pub(crate) mod check;
pub(crate) mod path;
pub(crate) mod resolve;

use std::path::Path;
use std::process;

use policydoc_mapping::MappingDictionary;

use crate::{report_error, OutputFormat};

/// Read a file or exit with status 1.
pub(crate) fn read_or_exit(path: &Path, what: &str, output: OutputFormat, quiet: bool) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => {
            let msg = format!("error: {} file not found: {}", what, path.display());
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

/// Read and parse a JSON file or exit with status 1.
pub(crate) fn load_json_or_exit(
    path: &Path,
    what: &str,
    output: OutputFormat,
    quiet: bool,
) -> serde_json::Value {
    let text = read_or_exit(path, what, output, quiet);
    match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("error: invalid JSON in {}: {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

/// Build a mapping template or exit with status 1.
pub(crate) fn build_or_exit(path: &Path, output: OutputFormat, quiet: bool) -> MappingDictionary {
    let text = read_or_exit(path, "template", output, quiet);
    match policydoc_mapping::build_str(&text) {
        Ok(dictionary) => dictionary,
        Err(e) => {
            let msg = format!("error: {}: {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}
