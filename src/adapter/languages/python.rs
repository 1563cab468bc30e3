use crate::adapter::{AdapterContext, Artifact, LanguageAdapter};
use crate::compiler::{write_source, PrepareError};
use crate::executor::ExecutionResult;
use crate::sandbox::Sandbox;
use crate::types::Language;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Support code placed before the candidate's `solution`. Must stay valid
/// for both Python 2 and Python 3 interpreters.
const PRELUDE: &str = r#"import sys
import ast
import json


class TreeNode(object):
    def __init__(self, val=0, left=None, right=None):
        self.val = val
        self.left = left
        self.right = right


def build_tree(nodes):
    if not nodes:
        return None
    root = TreeNode(nodes[0])
    queue = [root]
    i = 1
    while queue and i < len(nodes):
        node = queue.pop(0)
        if nodes[i] is not None:
            node.left = TreeNode(nodes[i])
            queue.append(node.left)
        i += 1
        if i < len(nodes) and nodes[i] is not None:
            node.right = TreeNode(nodes[i])
            queue.append(node.right)
        i += 1
    return root


def _judge_parse(text):
    text = text.strip()
    try:
        return json.loads(text)
    except ValueError:
        pass
    try:
        return ast.literal_eval(text)
    except (ValueError, SyntaxError):
        return text

"#;

const ENTRY: &str = r#"

def _judge_render(result):
    if isinstance(result, (list, tuple, dict)):
        return json.dumps(result)
    return str(result)


def _judge_main():
    data = sys.stdin.read().strip()
    lines = data.splitlines()
    if len(lines) > 1:
        result = solution(*[_judge_parse(line) for line in lines])
    else:
        value = _judge_parse(data)
        if isinstance(value, list):
            result = solution(build_tree(value))
        elif isinstance(value, tuple):
            result = solution(*value)
        else:
            result = solution(value)
    sys.stdout.write(_judge_render(result) + '\n')


if __name__ == '__main__':
    try:
        _judge_main()
    except Exception as e:
        sys.stderr.write('%s: %s\n' % (type(e).__name__, e))
        sys.exit(1)
"#;

/// Wrap user code so it reads stdin, calls `solution` and prints the result
pub fn harness(source: &str, language: Language) -> String {
    let shebang = match language {
        Language::Python3 => "#!/usr/bin/env python3",
        _ => "#!/usr/bin/env python",
    };
    format!("{}\n# -*- coding: utf-8 -*-\n{}\n{}\n{}", shebang, PRELUDE, source, ENTRY)
}

/// Interpreted families: no build step, one interpreter process per case
#[derive(Debug, Clone)]
pub struct PythonAdapter {
    language: Language,
    ctx: AdapterContext,
}

impl PythonAdapter {
    pub fn new(language: Language, ctx: AdapterContext) -> Self {
        Self { language, ctx }
    }
}

#[async_trait]
impl LanguageAdapter for PythonAdapter {
    fn language(&self) -> Language {
        self.language
    }

    async fn prepare(&self, source: &str, sandbox: &Sandbox) -> Result<Artifact, PrepareError> {
        let dir = sandbox.working_dir();
        let script = write_source(dir, "solution.py", &harness(source, self.language)).await?;
        let run = self
            .ctx
            .toolchain
            .primary
            .spec()
            .arg("-B")
            .arg(script)
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
