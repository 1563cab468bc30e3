//! End-to-end judging against whatever toolchains this machine has.
//! Each test returns early when its family is missing.

use hackathon_judge::{
    Judge, JudgeConfig, JudgeError, Language, OverallStatus, Problem, Submission, TestCase,
    ToolchainRegistry, Verdict,
};
use std::sync::Arc;
use std::time::Duration;

async fn judge_for(language: Language, config: JudgeConfig) -> Option<Judge> {
    let toolchains = ToolchainRegistry::global(Duration::from_secs(5)).await;
    if !toolchains.is_available(language) {
        eprintln!("skipping: no {} toolchain", language);
        return None;
    }
    Some(Judge::with_registry(config, Arc::clone(&toolchains)))
}

fn palindrome() -> Problem {
    Problem::new(
        "palindrome",
        vec![
            TestCase::new("racecar", "True", 4.0),
            TestCase::new("hello", "False", 3.0),
            TestCase::new("abba", "True", 3.0),
        ],
        10.0,
    )
}

#[tokio::test]
async fn python_palindrome_scores_full_marks() {
    let Some(judge) = judge_for(Language::Python3, JudgeConfig::default()).await else {
        return;
    };
    let submission = Submission::new("def solution(s):\n    return s == s[::-1]\n", Language::Python3);

    let outcome = judge.submit_final(&palindrome(), &submission).await.unwrap();
    assert_eq!(outcome.result.verdicts(), vec![Verdict::Passed; 3]);
    assert_eq!(outcome.result.total_score, 10.0);
    assert!(outcome.result.qualified(0.5));
}

#[tokio::test]
async fn python_structured_output_ignores_spacing() {
    let Some(judge) = judge_for(Language::Python3, JudgeConfig::default()).await else {
        return;
    };
    let problem = Problem::new(
        "reverse",
        vec![TestCase::new("[1, 2, 3]", "[3,2,1]", 5.0)],
        5.0,
    );
    let submission = Submission::new(
        "def solution(root):\n    return [root.right.val, root.left.val, root.val]\n",
        Language::Python3,
    );

    let outcome = judge.submit_final(&problem, &submission).await.unwrap();
    assert_eq!(outcome.result.verdicts(), vec![Verdict::Passed]);
}

#[tokio::test]
async fn python_exception_is_a_runtime_error() {
    let Some(judge) = judge_for(Language::Python3, JudgeConfig::default()).await else {
        return;
    };
    let problem = Problem::new("div", vec![TestCase::new("0", "1", 2.0), TestCase::new("1", "1.0", 2.0)], 4.0);
    let submission = Submission::new("def solution(n):\n    return 1 / n\n", Language::Python3);

    let outcome = judge.submit_final(&problem, &submission).await.unwrap();
    assert_eq!(outcome.result.verdicts(), vec![Verdict::RuntimeError, Verdict::Passed]);
    assert!(outcome.result.cases[0]
        .detail
        .as_deref()
        .unwrap()
        .contains("ZeroDivisionError"));
    assert_eq!(outcome.result.total_score, 2.0);
}

#[tokio::test]
async fn infinite_loop_times_out_and_later_cases_still_run() {
    let config = JudgeConfig {
        case_timeout_ms: 1_000,
        ..JudgeConfig::default()
    };
    let Some(judge) = judge_for(Language::Python3, config).await else {
        return;
    };
    let problem = Problem::new(
        "loop",
        vec![TestCase::new("1", "1", 1.0), TestCase::new("2", "2", 1.0)],
        2.0,
    );
    let submission = Submission::new(
        "def solution(n):\n    while n == 1:\n        pass\n    return n\n",
        Language::Python3,
    );

    let started = std::time::Instant::now();
    let outcome = judge.submit_final(&problem, &submission).await.unwrap();
    assert_eq!(outcome.result.verdicts(), vec![Verdict::Timeout, Verdict::Passed]);
    assert_eq!(outcome.result.total_score, 1.0);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn cpp_palindrome_passes() {
    let Some(judge) = judge_for(Language::Cpp, JudgeConfig::default()).await else {
        return;
    };
    let submission = Submission::new(
        "bool solution(string s) {\n    return s == string(s.rbegin(), s.rend());\n}\n",
        Language::Cpp,
    );

    let outcome = judge.submit_final(&palindrome(), &submission).await.unwrap();
    assert_eq!(outcome.result.total_score, 10.0);
    assert!(outcome.transcript.lines().iter().any(|l| l == "Compilation successful!"));
}

#[tokio::test]
async fn cpp_syntax_error_fails_every_case() {
    let Some(judge) = judge_for(Language::Cpp, JudgeConfig::default()).await else {
        return;
    };
    let submission = Submission::new("bool solution(string s) { return s == }", Language::Cpp);

    let response = judge
        .judge(hackathon_judge::JudgeRequest {
            problem: palindrome(),
            submission,
            mode: Default::default(),
            team: None,
            round: None,
        })
        .await;
    assert!(response.success);
    assert_eq!(response.status, OverallStatus::CompileError);
    let result = response.result.unwrap();
    assert_eq!(result.verdicts(), vec![Verdict::CompileError; 3]);
    assert_eq!(result.total_score, 0.0);
    assert!(result.compile_error.unwrap().contains("error"));
}

#[tokio::test]
async fn c_integer_results_are_compared_as_text() {
    let Some(judge) = judge_for(Language::C, JudgeConfig::default()).await else {
        return;
    };
    let problem = Problem::new(
        "length",
        vec![TestCase::new("hello", "5", 1.0), TestCase::new("", "0", 1.0)],
        2.0,
    );
    let submission = Submission::new("int solution(char *s) { return (int)strlen(s); }", Language::C);

    let outcome = judge.submit_final(&problem, &submission).await.unwrap();
    assert_eq!(outcome.result.verdicts(), vec![Verdict::Passed, Verdict::Passed]);
}

#[tokio::test]
async fn java_instance_method_is_called() {
    let Some(judge) = judge_for(Language::Java, JudgeConfig::default()).await else {
        return;
    };
    let submission = Submission::new(
        "class Solution {\n    public boolean solution(String s) {\n        return new StringBuilder(s).reverse().toString().equals(s);\n    }\n}\n",
        Language::Java,
    );

    let outcome = judge.run_trial(&palindrome(), &submission, Some(vec![0, 1])).await.unwrap();
    assert_eq!(outcome.result.verdicts(), vec![Verdict::Passed, Verdict::Passed]);
    assert_eq!(outcome.result.max_score, 7.0);
}

#[tokio::test]
async fn oversized_source_never_reaches_a_toolchain() {
    let config = JudgeConfig {
        max_source_bytes: 16,
        ..JudgeConfig::default()
    };
    let judge = Judge::with_registry(config, Arc::new(ToolchainRegistry::default()));
    let submission = Submission::new("def solution(s):\n    return s\n", Language::Python3);

    let err = judge.submit_final(&palindrome(), &submission).await.unwrap_err();
    assert!(matches!(err, JudgeError::SourceTooLarge { limit: 16, .. }));
}

async fn python_cases(cases: Vec<TestCase>, source: &str) -> Option<Vec<Verdict>> {
    let judge = judge_for(Language::Python3, JudgeConfig::default()).await?;
    let points = cases.len() as f64;
    let problem = Problem::new("input-shapes", cases, points);
    let submission = Submission::new(source, Language::Python3);
    let outcome = judge.submit_final(&problem, &submission).await.unwrap();
    Some(outcome.result.verdicts())
}

#[tokio::test]
async fn python_multi_line_input_is_one_argument_per_line() {
    let Some(verdicts) = python_cases(
        vec![TestCase::new("[1,2,3]\n2", "3", 1.0)],
        "def solution(items, index):\n    return items[index]\n",
    )
    .await
    else {
        return;
    };
    assert_eq!(verdicts, vec![Verdict::Passed]);
}

#[tokio::test]
async fn python_single_list_with_nulls_builds_a_tree() {
    let Some(verdicts) = python_cases(
        vec![TestCase::new("[1,null,2]", "[1, None, 2]", 1.0)],
        "def solution(root):\n    return str([root.val, root.left, root.right.val])\n",
    )
    .await
    else {
        return;
    };
    assert_eq!(verdicts, vec![Verdict::Passed]);
}

#[tokio::test]
async fn python_tuple_input_spreads_into_arguments() {
    let Some(verdicts) = python_cases(
        vec![TestCase::new("[1,3], [2]", "[1,3,2]", 1.0)],
        "def solution(a, b):\n    return a + b\n",
    )
    .await
    else {
        return;
    };
    assert_eq!(verdicts, vec![Verdict::Passed]);
}

#[tokio::test]
async fn python_unparseable_input_is_passed_as_text() {
    let Some(verdicts) = python_cases(
        vec![TestCase::new("hello world", "HELLO WORLD", 1.0)],
        "def solution(s):\n    return s.upper()\n",
    )
    .await
    else {
        return;
    };
    assert_eq!(verdicts, vec![Verdict::Passed]);
}

#[cfg(unix)]
#[tokio::test]
async fn python_background_child_does_not_turn_into_a_timeout() {
    let config = JudgeConfig {
        case_timeout_ms: 2_000,
        ..JudgeConfig::default()
    };
    let Some(judge) = judge_for(Language::Python3, config).await else {
        return;
    };
    let problem = Problem::new("detach", vec![TestCase::new("1", "1", 1.0)], 1.0);
    let submission = Submission::new(
        "import subprocess\n\ndef solution(n):\n    subprocess.Popen(['sleep', '7'])\n    return n\n",
        Language::Python3,
    );

    let started = std::time::Instant::now();
    let outcome = judge.submit_final(&problem, &submission).await.unwrap();
    assert_eq!(outcome.result.verdicts(), vec![Verdict::Passed]);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn c_reads_input_lines_longer_than_any_fixed_buffer() {
    let Some(judge) = judge_for(Language::C, JudgeConfig::default()).await else {
        return;
    };
    let problem = Problem::new(
        "long-line",
        vec![TestCase::new("a".repeat(100_000), "100000", 1.0)],
        1.0,
    );
    let submission = Submission::new("int solution(char *s) { return (int)strlen(s); }", Language::C);

    let outcome = judge.submit_final(&problem, &submission).await.unwrap();
    assert_eq!(outcome.result.verdicts(), vec![Verdict::Passed]);
}
