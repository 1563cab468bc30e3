use crate::adapter::languages::executable_name;
use crate::adapter::{AdapterContext, Artifact, LanguageAdapter};
use crate::compiler::{write_source, PrepareError};
use crate::executor::{ExecutionResult, ProcessSpec};
use crate::sandbox::Sandbox;
use crate::types::Language;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

const PRELUDE: &str = r#"#include <ctype.h>
#include <limits.h>
#include <math.h>
#include <stdbool.h>
#include <stdio.h>
#include <stdlib.h>
#include <string.h>

static void judge_emit_bool(_Bool v) { fputs(v ? "True" : "False", stdout); }
static void judge_emit_char(char v) { putchar(v); }
static void judge_emit_signed(long long v) { printf("%lld", v); }
static void judge_emit_unsigned(unsigned long long v) { printf("%llu", v); }
static void judge_emit_double(double v) {
    if (isfinite(v) && v == floor(v) && fabs(v) < 1e15) {
        printf("%.1f", v);
    } else {
        printf("%.12g", v);
    }
}
static void judge_emit_long_double(long double v) { judge_emit_double((double)v); }
static void judge_emit_string(const char *v) { fputs(v ? v : "None", stdout); }

#define JUDGE_EMIT(x) _Generic((x), \
    _Bool: judge_emit_bool, \
    char: judge_emit_char, \
    signed char: judge_emit_signed, \
    short: judge_emit_signed, \
    int: judge_emit_signed, \
    long: judge_emit_signed, \
    long long: judge_emit_signed, \
    unsigned char: judge_emit_unsigned, \
    unsigned short: judge_emit_unsigned, \
    unsigned int: judge_emit_unsigned, \
    unsigned long: judge_emit_unsigned, \
    unsigned long long: judge_emit_unsigned, \
    float: judge_emit_double, \
    double: judge_emit_double, \
    long double: judge_emit_long_double, \
    char *: judge_emit_string, \
    const char *: judge_emit_string)(x)

"#;

const ENTRY: &str = r#"

static char *judge_read_line(void) {
    size_t cap = 256, len = 0;
    char *buf = malloc(cap);
    int c;
    if (!buf) return NULL;
    while ((c = getchar()) != EOF && c != '\n') {
        if (len + 1 >= cap) {
            char *grown = realloc(buf, cap * 2);
            if (!grown) {
                free(buf);
                return NULL;
            }
            buf = grown;
            cap *= 2;
        }
        buf[len++] = (char)c;
    }
    if (len > 0 && buf[len - 1] == '\r') len--;
    buf[len] = '\0';
    return buf;
}

int main(void) {
    char *input = judge_read_line();
    if (!input) {
        fputs("could not allocate input buffer\n", stderr);
        return 1;
    }
    JUDGE_EMIT(solution(input));
    putchar('\n');
    free(input);
    return 0;
}
"#;

/// Translation unit: support code, the candidate's `solution(char *)`, then `main`.
/// The result is printed through `_Generic`, so any scalar or string return type works.
pub fn harness(source: &str) -> String {
    format!("{}{}{}", PRELUDE, source, ENTRY)
}

#[derive(Debug, Clone)]
pub struct CAdapter {
    ctx: AdapterContext,
}

impl CAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl LanguageAdapter for CAdapter {
    fn language(&self) -> Language {
        Language::C
    }

    async fn prepare(&self, source: &str, sandbox: &Sandbox) -> Result<Artifact, PrepareError> {
        let dir = sandbox.working_dir();
        let source_path = write_source(dir, "solution.c", &harness(source)).await?;
        let executable_path = dir.join(executable_name("solution"));

        // gnu11 rather than c11: _Generic plus the POSIX helpers people expect
        let build = self
            .ctx
            .toolchain
            .primary
            .spec()
            .args(["-std=gnu11", "-O2", "-pipe", "-o"])
            .arg(&executable_path)
            .arg(&source_path)
            .arg("-lm")
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
