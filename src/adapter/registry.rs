use crate::adapter::languages::{
    c::CAdapter, cpp::CppAdapter, csharp::CSharpAdapter, java::JavaAdapter, python::PythonAdapter,
};
use crate::adapter::{AdapterContext, AdapterSource, LanguageAdapter};
use crate::compiler::Compiler;
use crate::config::JudgeConfig;
use crate::error::JudgeError;
use crate::executor::Executor;
use crate::toolchain::ToolchainRegistry;
use crate::types::Language;
use std::sync::Arc;

/// Production adapter source backed by the discovered toolchains
#[derive(Debug, Clone)]
pub struct AdapterRegistry {
    toolchains: Arc<ToolchainRegistry>,
    compiler: Compiler,
    executor: Executor,
}

impl AdapterRegistry {
    pub fn new(toolchains: Arc<ToolchainRegistry>, config: &JudgeConfig) -> Self {
        Self {
            toolchains,
            compiler: Compiler::new(config.compile_timeout()),
            executor: Executor::new(config.case_timeout(), config.max_output_bytes),
        }
    }

    pub fn toolchains(&self) -> &ToolchainRegistry {
        &self.toolchains
    }
}

impl AdapterSource for AdapterRegistry {
    fn adapter_for(&self, language: Language) -> Result<Box<dyn LanguageAdapter>, JudgeError> {
        let toolchain = self
            .toolchains
            .get(language)
            .cloned()
            .ok_or(JudgeError::ToolchainUnavailable(language))?;
        let ctx = AdapterContext {
            toolchain,
            compiler: self.compiler.clone(),
            executor: self.executor.clone(),
        };
        Ok(match language {
            Language::Python | Language::Python3 => Box::new(PythonAdapter::new(language, ctx)),
            Language::Cpp => Box::new(CppAdapter::new(ctx)),
            Language::C => Box::new(CAdapter::new(ctx)),
            Language::Java => Box::new(JavaAdapter::new(ctx)),
            Language::CSharp => Box::new(CSharpAdapter::new(ctx)),
        })
    }
}
