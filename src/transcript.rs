use crate::types::{CaseResult, TestCase, Verdict};
use serde::{Deserialize, Serialize};

/// Line-oriented account of a judging run, for display only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    lines: Vec<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::trace!(target: "hackathon_judge::transcript", "{}", line);
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn compile_started(&mut self, language: &str) {
        self.push(format!("Compiling {} code...", language));
    }

    pub fn compile_succeeded(&mut self) {
        self.push("Compilation successful!");
    }

    pub fn compile_failed(&mut self, message: &str) {
        self.push(format!("Compilation Error:\n{}", message));
    }

    /// Header lines written before a case runs; `number` is 1-based
    pub fn case_started(&mut self, number: usize, case: &TestCase) {
        self.push(format!("=== Test Case {} ===", number));
        self.push(format!("Input: {}", case.input));
        self.push(format!("Expected Output: {}", case.expected_output));
    }

    pub fn case_finished(&mut self, result: &CaseResult) {
        if let Some(detail) = &result.detail {
            self.push(format!("Error:\n{}", detail));
        }
        if matches!(result.verdict, Verdict::Passed | Verdict::WrongAnswer) {
            self.push(format!("Your Output: {}", result.actual_output));
        }
        match result.verdict {
            Verdict::Passed => self.push("Result: \u{2713} Passed"),
            other => self.push(format!("Result: \u{2717} Failed ({})", other.label())),
        }
    }

    pub fn summary(&mut self, passed: usize, total: usize, score: f64, total_points: f64) {
        self.push(format!(
            "Passed {} of {} test cases. Score: {}/{}",
            passed, total, score, total_points
        ));
    }
}

impl std::fmt::Display for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_lines_show_input_expected_actual_and_verdict() {
        let mut transcript = Transcript::new();
        let case = TestCase::new("racecar", "True", 3.0);
        transcript.case_started(1, &case);
        transcript.case_finished(&CaseResult {
            case_index: 0,
            verdict: Verdict::WrongAnswer,
            points_awarded: 0.0,
            actual_output: "False".to_string(),
            detail: None,
        });
        assert_eq!(
            transcript.lines(),
            [
                "=== Test Case 1 ===",
                "Input: racecar",
                "Expected Output: True",
                "Your Output: False",
                "Result: \u{2717} Failed (Wrong Answer)",
            ]
        );
    }

    #[test]
    fn runtime_errors_show_detail_not_output() {
        let mut transcript = Transcript::new();
        transcript.case_finished(&CaseResult {
            case_index: 0,
            verdict: Verdict::RuntimeError,
            points_awarded: 0.0,
            actual_output: String::new(),
            detail: Some("Error: division by zero".to_string()),
        });
        assert_eq!(transcript.lines()[0], "Error:\nError: division by zero");
        assert_eq!(transcript.lines()[1], "Result: \u{2717} Failed (Runtime Error)");
        assert_eq!(transcript.to_string().lines().count(), 3);
    }
}
