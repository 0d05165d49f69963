//! External compiler commands run as child processes

use super::{CompileOutcome, CompileRequest, CompilerAdapter, OutputTarget};
use crate::config::CompilerCommand;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

const FILES_PLACEHOLDER: &str = "{files}";
const OUTPUT_PLACEHOLDER: &str = "{output}";
const OUTPUT_DIR_PLACEHOLDER: &str = "{output_dir}";

/// Runs a configured command line.
///
/// `{files}` expands to one argument per input file, `{output}` to the output path
/// and `{output_dir}` to its directory. File outputs are staged next to the final
/// path and only renamed into place after the command succeeds.
#[derive(Debug, Clone)]
pub struct ProcessAdapter {
    name: String,
    program: String,
    args: Vec<String>,
    pass_options: Vec<String>,
    stdout_output: bool,
}

impl ProcessAdapter {
    pub fn new(name: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
            pass_options: Vec::new(),
            stdout_output: false,
        }
    }

    pub fn from_command(name: &str, command: &CompilerCommand) -> Self {
        Self {
            name: name.to_string(),
            program: command.program.clone(),
            args: command.args.clone(),
            pass_options: command.pass_options.clone(),
            stdout_output: command.stdout_output,
        }
    }

    /// Forward these option keys to the command as `--key=value` flags
    pub fn with_pass_options(mut self, keys: Vec<String>) -> Self {
        self.pass_options = keys;
        self
    }

    /// The command prints its result on stdout instead of writing `{output}`
    pub fn with_stdout_output(mut self, stdout_output: bool) -> Self {
        self.stdout_output = stdout_output;
        self
    }

    fn build_args(&self, request: &CompileRequest, output: &Path) -> Vec<String> {
        let output_dir = match &request.output {
            OutputTarget::File(_) => output.parent().unwrap_or_else(|| Path::new(".")),
            OutputTarget::Directory(dir) => dir.as_path(),
        };

        let mut args = Vec::with_capacity(self.args.len() + request.files.len());
        for arg in &self.args {
            if arg == FILES_PLACEHOLDER {
                args.extend(request.files.iter().map(|f| f.display().to_string()));
                continue;
            }
            args.push(
                arg.replace(OUTPUT_DIR_PLACEHOLDER, &output_dir.display().to_string())
                    .replace(OUTPUT_PLACEHOLDER, &output.display().to_string()),
            );
        }

        for key in &self.pass_options {
            match request.options.get(key) {
                Some(Value::Bool(true)) => args.push(format!("--{}", key)),
                Some(Value::Array(values)) => {
                    args.extend(values.iter().map(|v| format!("--{}={}", key, flag_value(v))))
                }
                Some(Value::Bool(false)) | Some(Value::Null) | None => {}
                Some(value) => args.push(format!("--{}={}", key, flag_value(value))),
            }
        }

        args
    }
}

fn flag_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn staging_path(output: &Path) -> PathBuf {
    let file_name = output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!(
        ".{}.{}.partial",
        file_name,
        uuid::Uuid::new_v4().simple()
    ))
}

#[async_trait]
impl CompilerAdapter for ProcessAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn compile(&self, request: CompileRequest) -> CompileOutcome {
        let final_path = request.output.path().to_path_buf();
        let staged = match &request.output {
            OutputTarget::File(path) => Some(staging_path(path)),
            OutputTarget::Directory(_) => None,
        };
        let write_path = staged.clone().unwrap_or_else(|| final_path.clone());
        let args = self.build_args(&request, &write_path);

        debug!(
            compiler = %self.name,
            program = %self.program,
            files = request.files.len(),
            "Running compiler"
        );

        let output = match Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                return CompileOutcome::failure(format!(
                    "Failed to start '{}': {}",
                    self.program, e
                ))
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();

        if !output.status.success() {
            if let Some(staged) = &staged {
                let _ = tokio::fs::remove_file(staged).await;
            }
            let errors = if stderr.is_empty() {
                format!("'{}' exited with {}", self.program, output.status)
            } else {
                stderr
            };
            return CompileOutcome::failure(errors);
        }

        let Some(staged) = staged else {
            let outcome = CompileOutcome::success(final_path, None);
            return if stderr.is_empty() {
                outcome
            } else {
                outcome.with_warnings(stderr)
            };
        };

        if self.stdout_output {
            if let Err(e) = tokio::fs::write(&staged, &stdout).await {
                return CompileOutcome::failure(format!(
                    "Failed to write {}: {}",
                    staged.display(),
                    e
                ));
            }
        }

        let content = match tokio::fs::read_to_string(&staged).await {
            Ok(content) => content,
            Err(e) => {
                warn!(compiler = %self.name, error = %e, "Compiler produced no output file");
                return CompileOutcome::failure(format!(
                    "'{}' reported success but wrote no output: {}",
                    self.program, e
                ));
            }
        };

        if let Err(e) = tokio::fs::rename(&staged, &final_path).await {
            let _ = tokio::fs::remove_file(&staged).await;
            return CompileOutcome::failure(format!(
                "Failed to move output into {}: {}",
                final_path.display(),
                e
            ));
        }

        let outcome = CompileOutcome::success(final_path, Some(content));
        if stderr.is_empty() {
            outcome
        } else {
            outcome.with_warnings(stderr)
        }
    }
}
