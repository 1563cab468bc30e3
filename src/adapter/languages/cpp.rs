use crate::adapter::languages::executable_name;
use crate::adapter::{AdapterContext, Artifact, LanguageAdapter};
use crate::compiler::{write_source, PrepareError};
use crate::executor::{ExecutionResult, ProcessSpec};
use crate::sandbox::Sandbox;
use crate::types::Language;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

const PRELUDE: &str = r#"#include <algorithm>
#include <cmath>
#include <cstddef>
#include <iomanip>
#include <iostream>
#include <map>
#include <set>
#include <sstream>
#include <string>
#include <unordered_map>
#include <unordered_set>
#include <vector>

namespace judge {
template <typename T> void emit(std::ostream& os, const T& value);
template <typename T> void emit(std::ostream& os, const std::vector<T>& values);
template <typename T> void emit_item(std::ostream& os, const T& value);
void emit(std::ostream& os, bool value);
void emit(std::ostream& os, double value);
void emit(std::ostream& os, float value);
void emit(std::ostream& os, const std::string& value);
void emit(std::ostream& os, const char* value);
void emit_item(std::ostream& os, const std::string& value);

template <typename T> void emit(std::ostream& os, const T& value) { os << value; }

void emit(std::ostream& os, bool value) { os << (value ? "True" : "False"); }

void emit(std::ostream& os, double value) {
    if (std::isfinite(value) && value == std::floor(value) && std::fabs(value) < 1e15) {
        os << std::fixed << std::setprecision(1) << value;
        os.unsetf(std::ios_base::floatfield);
    } else {
        os << std::setprecision(12) << value;
    }
}

void emit(std::ostream& os, float value) { emit(os, static_cast<double>(value)); }

void emit(std::ostream& os, const std::string& value) { os << value; }

void emit(std::ostream& os, const char* value) { os << value; }

template <typename T> void emit_item(std::ostream& os, const T& value) { emit(os, value); }

void emit_item(std::ostream& os, const std::string& value) { os << '"' << value << '"'; }

template <typename T> void emit(std::ostream& os, const std::vector<T>& values) {
    os << '[';
    for (std::size_t i = 0; i < values.size(); ++i) {
        if (i > 0) os << ',';
        emit_item(os, values[i]);
    }
    os << ']';
}
}  // namespace judge

using namespace std;

"#;

const ENTRY: &str = r#"

int main() {
    std::string input;
    std::getline(std::cin, input);
    if (!input.empty() && input.back() == '\r') input.pop_back();
    auto result = solution(input);
    judge::emit(std::cout, result);
    std::cout << std::endl;
    return 0;
}
"#;

/// Translation unit: support code, the candidate's `solution(std::string)`, then `main`
pub fn harness(source: &str) -> String {
    format!("{}{}{}", PRELUDE, source, ENTRY)
}

#[derive(Debug, Clone)]
pub struct CppAdapter {
    ctx: AdapterContext,
}

impl CppAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl LanguageAdapter for CppAdapter {
    fn language(&self) -> Language {
        Language::Cpp
    }

    async fn prepare(&self, source: &str, sandbox: &Sandbox) -> Result<Artifact, PrepareError> {
        let dir = sandbox.working_dir();
        let source_path = write_source(dir, "solution.cpp", &harness(source)).await?;
        let executable_path = dir.join(executable_name("solution"));

        let build = self
            .ctx
            .toolchain
            .primary
            .spec()
            .args(["-std=c++17", "-O2", "-pipe", "-o"])
            .arg(&executable_path)
            .arg(&source_path)
            .current_dir(dir);
        self.ctx.compiler.compile(&build).await?;

        Ok(Artifact {
            run: ProcessSpec::new(executable_path).current_dir(dir),
        })
    }

    async fn execute(
        &self,
        artifact: &Artifact,
        input: &str,
        time_limit: Duration,
    ) -> Result<ExecutionResult> {
        self.ctx.run(artifact, input, time_limit).await
    }
}
