use crate::error::JudgeError;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

const POINTS_EPSILON: f64 = 1e-9;

/// Language families the judge knows how to build and run.
///
/// Serialized as the canonical tag; deserialized through `FromStr`, so every
/// alias and casing accepted there is accepted on the wire too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Language {
    #[serde(rename = "python")]
    Python,
    #[serde(rename = "python3")]
    Python3,
    #[serde(rename = "cpp")]
    Cpp,
    #[serde(rename = "java")]
    Java,
    #[serde(rename = "c")]
    C,
    #[serde(rename = "csharp")]
    CSharp,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Python,
        Language::Python3,
        Language::Cpp,
        Language::Java,
        Language::C,
        Language::CSharp,
    ];

    /// Canonical lowercase tag, as used on the wire
    pub fn tag(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Python3 => "python3",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::C => "c",
            Language::CSharp => "csharp",
        }
    }

    /// Whether submissions in this family go through a separate compile step
    pub fn is_compiled(self) -> bool {
        !matches!(self, Language::Python | Language::Python3)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(de::Error::custom)
    }
}

impl FromStr for Language {
    type Err = JudgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "python3" | "py3" => Ok(Language::Python3),
            "cpp" | "c++" | "cxx" => Ok(Language::Cpp),
            "java" => Ok(Language::Java),
            "c" => Ok(Language::C),
            "csharp" | "c#" | "cs" => Ok(Language::CSharp),
            _ => Err(JudgeError::UnsupportedLanguage(s.to_string())),
        }
    }
}

/// One input/expected-output pair with its point value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    #[serde(alias = "output")]
    pub expected_output: String,
    pub points: f64,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>, points: f64) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
            points,
        }
    }
}

/// Represents a programming problem.
///
/// `description`, `input_format` and `output_format` are display-only; the
/// engine never reads them. `total_points` is the declared cap for the
/// problem and must be at least the sum of the case point values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub input_format: Option<String>,
    #[serde(default)]
    pub output_format: Option<String>,
    /// Per-case wall clock limit overriding the configured default
    #[serde(default)]
    pub time_limit_ms: Option<u64>,
    pub test_cases: Vec<TestCase>,
    pub total_points: f64,
}

impl Problem {
    pub fn new(id: impl Into<String>, test_cases: Vec<TestCase>, total_points: f64) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            description: String::new(),
            input_format: None,
            output_format: None,
            time_limit_ms: None,
            test_cases,
            total_points,
        }
    }

    /// Sum of the per-case point values
    pub fn case_points(&self) -> f64 {
        self.test_cases.iter().map(|t| t.points).sum()
    }

    /// Check the point invariants before a problem is judged
    pub fn validate(&self) -> Result<(), JudgeError> {
        if !self.total_points.is_finite() || self.total_points < 0.0 {
            return Err(JudgeError::InvalidProblem(format!(
                "total_points must be a non-negative number, got {}",
                self.total_points
            )));
        }
        for (i, case) in self.test_cases.iter().enumerate() {
            if !case.points.is_finite() || case.points < 0.0 {
                return Err(JudgeError::InvalidProblem(format!(
                    "test case {} has invalid point value {}",
                    i + 1,
                    case.points
                )));
            }
        }
        let sum = self.case_points();
        if sum > self.total_points + POINTS_EPSILON {
            return Err(JudgeError::InvalidProblem(format!(
                "test cases award {} points but the problem declares only {}",
                sum, self.total_points
            )));
        }
        Ok(())
    }
}

/// Candidate source code together with its declared language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(alias = "code")]
    pub source: String,
    pub language: Language,
}

impl Submission {
    pub fn new(source: impl Into<String>, language: Language) -> Self {
        Self {
            source: source.into(),
            language,
        }
    }

    /// Stable SHA-1 of the language tag and source text
    pub fn fingerprint(&self) -> String {
        let mut hasher = sha1_smol::Sha1::new();
        hasher.update(self.language.tag().as_bytes());
        hasher.update(b"\0");
        hasher.update(self.source.as_bytes());
        hasher.digest().to_string()
    }
}

/// Classified outcome of one test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    WrongAnswer,
    RuntimeError,
    CompileError,
    Timeout,
}

impl Verdict {
    pub fn is_passed(self) -> bool {
        self == Verdict::Passed
    }

    /// Short label used in transcripts
    pub fn label(self) -> &'static str {
        match self {
            Verdict::Passed => "Passed",
            Verdict::WrongAnswer => "Wrong Answer",
            Verdict::RuntimeError => "Runtime Error",
            Verdict::CompileError => "Compilation Error",
            Verdict::Timeout => "Time Limit Exceeded",
        }
    }
}

/// Result of test case evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    /// Index of the case within the problem
    pub case_index: usize,
    pub verdict: Verdict,
    pub points_awarded: f64,
    pub actual_output: String,
    /// stderr, adapter error or timeout note, when there is one
    pub detail: Option<String>,
}

/// Terminal artifact of one judging run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgingResult {
    pub total_score: f64,
    /// Sum of the point values of the cases that were judged
    pub max_score: f64,
    pub total_points: f64,
    pub cases: Vec<CaseResult>,
    pub compile_error: Option<String>,
}

impl JudgingResult {
    pub fn verdicts(&self) -> Vec<Verdict> {
        self.cases.iter().map(|c| c.verdict).collect()
    }

    pub fn passed_count(&self) -> usize {
        self.cases.iter().filter(|c| c.verdict.is_passed()).count()
    }

    /// Round gate: the score reaches `threshold` of the problem total
    pub fn qualified(&self, threshold: f64) -> bool {
        self.total_score + POINTS_EPSILON >= self.total_points * threshold
    }
}

/// How a session was requested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunMode {
    /// Feedback run, optionally restricted to some case indices
    Trial {
        #[serde(default)]
        cases: Option<Vec<usize>>,
    },
    /// The run whose result is recorded
    Final,
}

impl Default for RunMode {
    fn default() -> Self {
        RunMode::Final
    }
}

impl RunMode {
    pub fn is_final(&self) -> bool {
        matches!(self, RunMode::Final)
    }
}

/// Request to compile and run code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeRequest {
    pub problem: Problem,
    pub submission: Submission,
    #[serde(default)]
    pub mode: RunMode,
    /// Team identifier used by the activity log and score relay
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub round: Option<String>,
}

/// Summary status of a whole judging request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Ok,
    WrongAnswer,
    Timeout,
    RuntimeError,
    CompileError,
    UnsupportedLanguage,
    ToolchainUnavailable,
    InvalidRequest,
    Cancelled,
    InternalError,
}

impl OverallStatus {
    pub fn from_result(result: &JudgingResult) -> Self {
        if result.compile_error.is_some() {
            OverallStatus::CompileError
        } else if result.passed_count() == result.cases.len() {
            OverallStatus::Ok
        } else if result.cases.iter().any(|c| c.verdict == Verdict::Timeout) {
            OverallStatus::Timeout
        } else if result.cases.iter().any(|c| c.verdict == Verdict::RuntimeError) {
            OverallStatus::RuntimeError
        } else {
            OverallStatus::WrongAnswer
        }
    }
}

/// Response from judge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeResponse {
    pub success: bool,
    pub status: OverallStatus,
    pub result: Option<JudgingResult>,
    pub transcript: Vec<String>,
    pub error: Option<String>,
    pub fingerprint: String,
}
