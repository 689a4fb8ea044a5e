#![allow(dead_code)]

use std::{fs, path::Path};

use serde_json::Value;

pub const PREAMBLE: &str = "The system configuration is:";

/// Builds the text of a run file with `total` rows, `failed` of them ending false
pub fn run_file(config: &Value, total: usize, failed: usize) -> String {
    let config = serde_json::to_string_pretty(config).unwrap();
    let mut text = format!("{PREAMBLE}\n{config}\nCSV FILE STARTS BELOW\n");
    text.push_str("entity_id,arrival,state@end\n");
    for i in 0..total {
        let state = if i < failed { "False" } else { "True" };
        text.push_str(&format!("{i},{}.5,{state}\n", i * 2));
    }
    text
}

pub fn write_run(dir: &Path, name: &str, config: &Value, total: usize, failed: usize) {
    fs::write(dir.join(name), run_file(config, total, failed)).unwrap();
}
