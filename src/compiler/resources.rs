//! Built-in resource "compiler": copies inputs into the output directory

use super::{CompileOutcome, CompileRequest, CompilerAdapter};
use crate::resources::ResourceCopier;
use async_trait::async_trait;

pub struct ResourceAdapter {
    copier: ResourceCopier,
}

impl ResourceAdapter {
    pub fn new(copier: ResourceCopier) -> Self {
        Self { copier }
    }
}

#[async_trait]
impl CompilerAdapter for ResourceAdapter {
    fn name(&self) -> &str {
        "resources"
    }

    async fn compile(&self, request: CompileRequest) -> CompileOutcome {
        let dest = request.output.dir().to_path_buf();
        match self.copier.copy(&request.files, &dest, |_| {}).await {
            Ok(written) => {
                let content = written
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join("\n");
                CompileOutcome::success(dest, Some(content))
            }
            Err(e) => CompileOutcome::failure(e.to_string()),
        }
    }
}
