use std::io::IsTerminal;
use std::path::Path;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use tabsfinder_pipe::PIPE_PREFIX;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PipesOutput {
    count: usize,
    pipes: Vec<PipeEntry>,
}

#[derive(Serialize)]
struct PipeEntry {
    instance: String,
    path: String,
}

pub fn print_pipes(pipes: &[std::path::PathBuf], format: OutputFormat) {
    let entries: Vec<PipeEntry> = pipes
        .iter()
        .map(|path| PipeEntry {
            instance: instance_id(path),
            path: path.display().to_string(),
        })
        .collect();

    match format {
        OutputFormat::Json => {
            let out = PipesOutput {
                count: entries.len(),
                pipes: entries,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["INSTANCE", "PIPE"]);
            for entry in &entries {
                table.add_row(vec![entry.instance.clone(), entry.path.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for entry in &entries {
                println!("instance={} pipe={}", entry.instance, entry.path);
            }
        }
    }
}

/// The `<id>` from `chrometabsfinder.<id>.pipe`, or the whole file name if
/// it doesn't follow the scheme.
fn instance_id(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.strip_prefix(PIPE_PREFIX)
        .and_then(|rest| rest.strip_prefix('.'))
        .and_then(|rest| rest.strip_suffix(".pipe"))
        .map(str::to_string)
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_id_extracted_from_pipe_name() {
        let path = Path::new("/tmp/chrometabsfinder.4242.pipe");
        assert_eq!(instance_id(path), "4242");
    }

    #[test]
    fn instance_id_falls_back_to_file_name() {
        let path = Path::new("/tmp/odd-name.pipe");
        assert_eq!(instance_id(path), "odd-name.pipe");
    }
}
