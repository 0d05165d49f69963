//! Built-in stylesheet compiler: ordered concatenation

use super::{CompileOutcome, CompileRequest, CompilerAdapter, OutputTarget};
use crate::fs::FileSystem;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

const WRAPPER_PLACEHOLDER: &str = "%output%";

/// Concatenates its inputs in order, prefixed by the `license` and `banner`
/// options and wrapped by `output_wrapper`. The result is written atomically.
pub struct ConcatAdapter {
    file_system: Arc<dyn FileSystem>,
}

impl ConcatAdapter {
    pub fn new(file_system: Arc<dyn FileSystem>) -> Self {
        Self { file_system }
    }

    fn render(&self, request: &CompileRequest) -> Result<String, String> {
        let mut parts = Vec::with_capacity(request.files.len());
        for file in &request.files {
            let content = self
                .file_system
                .read_to_string(file)
                .map_err(|e| format!("{:#}", e))?;
            parts.push(content.trim_end_matches('\n').to_string());
        }

        let mut body = parts.join("\n");
        if let Some(wrapper) = request.option_str("output_wrapper") {
            body = wrapper.replace(WRAPPER_PLACEHOLDER, &body);
        }

        let mut output = String::new();
        for header in ["license", "banner"] {
            if let Some(text) = request.option_str(header) {
                output.push_str(text.trim_end_matches('\n'));
                output.push('\n');
            }
        }
        output.push_str(&body);
        output.push('\n');
        Ok(output)
    }
}

#[async_trait]
impl CompilerAdapter for ConcatAdapter {
    fn name(&self) -> &str {
        "concat"
    }

    async fn compile(&self, request: CompileRequest) -> CompileOutcome {
        let OutputTarget::File(path) = &request.output else {
            return CompileOutcome::failure(format!(
                "Concatenation needs a file target, got directory {}",
                request.output.path().display()
            ));
        };

        let content = match self.render(&request) {
            Ok(content) => content,
            Err(errors) => return CompileOutcome::failure(errors),
        };

        if let Err(e) = self.file_system.write_atomic(path, &content) {
            return CompileOutcome::failure(format!("{:#}", e));
        }

        debug!(
            output = %path.display(),
            files = request.files.len(),
            bytes = content.len(),
            "Concatenated stylesheets"
        );
        CompileOutcome::success(path.clone(), Some(content))
    }
}
