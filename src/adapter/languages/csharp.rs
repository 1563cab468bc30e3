use crate::adapter::{AdapterContext, Artifact, LanguageAdapter};
use crate::compiler::{write_source, PrepareError};
use crate::executor::{ExecutionResult, ProcessSpec};
use crate::sandbox::Sandbox;
use crate::types::Language;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Entry point compiled with the candidate's `Solution.cs`. `solution` is
/// found by reflection so static and instance methods both work.
const ENTRY: &str = r#"using System;
using System.Collections;
using System.Globalization;
using System.Reflection;
using System.Text;

public static class JudgeMain
{
    public static int Main()
    {
        string line = Console.ReadLine() ?? "";
        MethodInfo method = typeof(Solution).GetMethod("solution",
            BindingFlags.Public | BindingFlags.NonPublic | BindingFlags.Static | BindingFlags.Instance);
        if (method == null)
        {
            Console.Error.WriteLine("Solution.solution was not found");
            return 1;
        }
        object target = method.IsStatic ? null : Activator.CreateInstance(typeof(Solution), true);
        object result;
        try
        {
            result = method.Invoke(target, new object[] { line });
        }
        catch (TargetInvocationException e)
        {
            Console.Error.WriteLine(e.InnerException);
            return 1;
        }
        Console.WriteLine(Render(result, false));
        return 0;
    }

    static string Render(object value, bool nested)
    {
        if (value == null) return "None";
        if (value is bool) return (bool)value ? "True" : "False";
        if (value is string || value is char) return nested ? "\"" + value + "\"" : value.ToString();
        if (value is double || value is float || value is decimal)
        {
            double d = Convert.ToDouble(value, CultureInfo.InvariantCulture);
            if (!double.IsInfinity(d) && !double.IsNaN(d) && d == Math.Floor(d) && Math.Abs(d) < 1e15)
                return d.ToString("F1", CultureInfo.InvariantCulture);
            return d.ToString("R", CultureInfo.InvariantCulture);
        }
        if (value is IEnumerable)
        {
            StringBuilder sb = new StringBuilder("[");
            bool first = true;
            foreach (object item in (IEnumerable)value)
            {
                if (!first) sb.Append(',');
                sb.Append(Render(item, true));
                first = false;
            }
            return sb.Append(']').ToString();
        }
        return Convert.ToString(value, CultureInfo.InvariantCulture);
    }
}
"#;

#[derive(Debug, Clone)]
pub struct CSharpAdapter {
    ctx: AdapterContext,
}

impl CSharpAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl LanguageAdapter for CSharpAdapter {
    fn language(&self) -> Language {
        Language::CSharp
    }

    async fn prepare(&self, source: &str, sandbox: &Sandbox) -> Result<Artifact, PrepareError> {
        let dir = sandbox.working_dir();
        let solution = write_source(dir, "Solution.cs", source).await?;
        let entry = write_source(dir, "JudgeMain.cs", ENTRY).await?;
        let assembly = dir.join("Solution.exe");

        let mut out_flag = std::ffi::OsString::from("-out:");
        out_flag.push(&assembly);
        let build = self
            .ctx
            .toolchain
            .primary
            .spec()
            .arg(out_flag)
            .arg("-main:JudgeMain")
            .arg(solution)
            .arg(entry)
            .current_dir(dir);
        self.ctx.compiler.compile(&build).await?;

        let run = match &self.ctx.toolchain.runtime {
            Some(runtime) => runtime.spec().arg(&assembly),
            None => ProcessSpec::new(&assembly),
        };
        Ok(Artifact {
            run: run.current_dir(dir),
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
