use crate::adapter::{AdapterContext, Artifact, LanguageAdapter};
use crate::compiler::{write_source, PrepareError};
use crate::executor::ExecutionResult;
use crate::sandbox::Sandbox;
use crate::types::Language;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

const ENTRY_CLASS: &str = "JudgeMain";

/// Entry point compiled next to the candidate's `Solution.java`
const ENTRY: &str = r#"import java.io.BufferedReader;
import java.io.InputStreamReader;
import java.lang.reflect.Array;
import java.util.Collection;
import java.util.Locale;

public class JudgeMain {
    public static void main(String[] args) throws Exception {
        BufferedReader reader = new BufferedReader(new InputStreamReader(System.in, "UTF-8"));
        String line = reader.readLine();
        if (line == null) {
            line = "";
        }
        Object result = new Solution().solution(line);
        System.out.println(render(result, false));
    }

    static String render(Object value, boolean nested) {
        if (value == null) {
            return "None";
        }
        if (value instanceof Boolean) {
            return ((Boolean) value) ? "True" : "False";
        }
        if (value instanceof String || value instanceof Character) {
            return nested ? "\"" + value + "\"" : value.toString();
        }
        if (value instanceof Double || value instanceof Float) {
            double d = ((Number) value).doubleValue();
            if (!Double.isInfinite(d) && !Double.isNaN(d) && d == Math.floor(d) && Math.abs(d) < 1e15) {
                return String.format(Locale.ROOT, "%.1f", d);
            }
            return String.valueOf(d);
        }
        StringBuilder sb = new StringBuilder("[");
        if (value.getClass().isArray()) {
            int n = Array.getLength(value);
            for (int i = 0; i < n; i++) {
                if (i > 0) {
                    sb.append(',');
                }
                sb.append(render(Array.get(value, i), true));
            }
            return sb.append(']').toString();
        }
        if (value instanceof Collection) {
            boolean first = true;
            for (Object item : (Collection<?>) value) {
                if (!first) {
                    sb.append(',');
                }
                sb.append(render(item, true));
                first = false;
            }
            return sb.append(']').toString();
        }
        return String.valueOf(value);
    }
}
"#;

/// Managed family: `javac` builds both classes, `java` runs `JudgeMain`.
///
/// The candidate's file is kept verbatim so it may carry its own imports; it
/// must declare a class `Solution` with a `solution(String)` method.
#[derive(Debug, Clone)]
pub struct JavaAdapter {
    ctx: AdapterContext,
}

impl JavaAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl LanguageAdapter for JavaAdapter {
    fn language(&self) -> Language {
        Language::Java
    }

    async fn prepare(&self, source: &str, sandbox: &Sandbox) -> Result<Artifact, PrepareError> {
        let dir = sandbox.working_dir();
        let solution = write_source(dir, "Solution.java", source).await?;
        let entry = write_source(dir, "JudgeMain.java", ENTRY).await?;

        let build = self
            .ctx
            .toolchain
            .primary
            .spec()
            .args(["-encoding", "UTF-8", "-d"])
            .arg(dir)
            .arg(solution)
            .arg(entry)
            .current_dir(dir);
        self.ctx.compiler.compile(&build).await?;

        let run = self
            .ctx
            .launcher()
            .arg("-cp")
            .arg(dir)
            .arg(ENTRY_CLASS)
            .current_dir(dir);
        Ok(Artifact { run })
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
