use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::round::{apply_edit, Edit, RoundDetails, RoundKind, RoundTask};
use crate::util::percent;

/// A check the submitted solution must satisfy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    /// Fragments that must all appear in the solution
    pub requires: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub title: String,
    pub statement: String,
    #[serde(default)]
    pub starter: String,
    pub tests: Vec<TestCase>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TestRun {
    pub passed: usize,
    pub total: usize,
    pub failures: Vec<String>,
}

impl TestRun {
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

/// Evaluates a solution against a problem's tests
pub trait Judge {
    fn run(&self, problem: &Problem, code: &str) -> TestRun;
}

/// Passes a test when every required fragment occurs in the code,
/// ignoring whitespace differences
#[derive(Debug, Default, Clone, Copy)]
pub struct FragmentJudge;

impl Judge for FragmentJudge {
    fn run(&self, problem: &Problem, code: &str) -> TestRun {
        let squashed: String = code.chars().filter(|c| !c.is_whitespace()).collect();
        let mut run = TestRun {
            total: problem.tests.len(),
            ..Default::default()
        };
        for test in &problem.tests {
            let ok = test.requires.iter().all(|fragment| {
                let f: String = fragment.chars().filter(|c| !c.is_whitespace()).collect();
                squashed.contains(&f)
            });
            if ok {
                run.passed += 1;
            } else {
                run.failures.push(test.name.clone());
            }
        }
        run
    }
}

pub struct CodingRound {
    problems: Vec<Problem>,
    code: Vec<String>,
    last_runs: BTreeMap<usize, TestRun>,
    runs: usize,
    current: usize,
    judge: Box<dyn Judge>,
}

impl std::fmt::Debug for CodingRound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodingRound")
            .field("problems", &self.problems.len())
            .field("runs", &self.runs)
            .field("current", &self.current)
            .finish()
    }
}

impl CodingRound {
    pub fn new(problems: Vec<Problem>, judge: Box<dyn Judge>) -> Self {
        let code = problems.iter().map(|p| p.starter.clone()).collect();
        Self {
            problems,
            code,
            last_runs: BTreeMap::new(),
            runs: 0,
            current: 0,
            judge,
        }
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_problem(&self) -> Option<&Problem> {
        self.problems.get(self.current)
    }

    pub fn code(&self, index: usize) -> Option<&str> {
        self.code.get(index).map(String::as_str)
    }

    pub fn last_run(&self, index: usize) -> Option<&TestRun> {
        self.last_runs.get(&index)
    }

    pub fn edit(&mut self, edit: Edit) {
        if let Some(buf) = self.code.get_mut(self.current) {
            apply_edit(buf, edit);
        }
    }

    pub fn set_code(&mut self, index: usize, code: impl Into<String>) {
        if let Some(buf) = self.code.get_mut(index) {
            *buf = code.into();
        }
    }

    /// Runs the tests for the problem under the cursor
    pub fn run_tests(&mut self) -> Option<&TestRun> {
        let problem = self.problems.get(self.current)?;
        let run = self.judge.run(problem, &self.code[self.current]);
        debug!(
            problem = %problem.title,
            passed = run.passed,
            total = run.total,
            "test run"
        );
        self.runs += 1;
        self.last_runs.insert(self.current, run);
        self.last_runs.get(&self.current)
    }

    pub fn next(&mut self) {
        if self.current + 1 < self.problems.len() {
            self.current += 1;
        }
    }

    pub fn previous(&mut self) {
        self.current = self.current.saturating_sub(1);
    }
}

impl RoundTask for CodingRound {
    fn kind(&self) -> RoundKind {
        RoundKind::Coding
    }

    /// A problem counts once its tests have been run at least once
    fn progress(&self) -> (usize, usize) {
        (self.last_runs.len(), self.problems.len())
    }

    /// Grades the final code of every problem, run or not
    fn grade(&self) -> (u8, RoundDetails) {
        let (passed, total) = self
            .problems
            .iter()
            .zip(&self.code)
            .map(|(p, c)| self.judge.run(p, c))
            .fold((0, 0), |(p, t), run| (p + run.passed, t + run.total));
        (
            percent(passed, total),
            RoundDetails::Coding {
                passed_tests: passed,
                total_tests: total,
                runs: self.runs,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem() -> Problem {
        Problem {
            title: "Sum".into(),
            statement: "Return the sum of a slice".into(),
            starter: "fn sum(xs: &[i32]) -> i32 {\n}\n".into(),
            tests: vec![
                TestCase {
                    name: "iterates".into(),
                    requires: vec![".iter()".into()],
                },
                TestCase {
                    name: "sums".into(),
                    requires: vec![".sum()".into()],
                },
            ],
        }
    }

    #[test]
    fn judge_ignores_whitespace() {
        let run = FragmentJudge.run(&problem(), "xs . iter ( ) . sum ( )");
        assert_eq!(run.passed, 2);
        assert!(run.all_passed());
    }

    #[test]
    fn judge_lists_failures() {
        let run = FragmentJudge.run(&problem(), "xs.iter().fold(0, |a, b| a + b)");
        assert_eq!(run.passed, 1);
        assert_eq!(run.failures, vec!["sums".to_string()]);
    }

    #[test]
    fn complete_after_each_problem_is_run() {
        let mut round = CodingRound::new(vec![problem(), problem()], Box::new(FragmentJudge));
        assert!(!round.is_complete());
        round.run_tests();
        assert_eq!(round.progress(), (1, 2));
        round.next();
        round.run_tests();
        assert!(round.is_complete());
    }

    #[test]
    fn grade_uses_final_code() {
        let mut round = CodingRound::new(vec![problem()], Box::new(FragmentJudge));
        round.run_tests();
        round.set_code(0, "xs.iter().sum()");
        let (score, details) = round.grade();
        assert_eq!(score, 100);
        assert_eq!(
            details,
            RoundDetails::Coding {
                passed_tests: 2,
                total_tests: 2,
                runs: 1
            }
        );
    }

    #[test]
    fn edits_apply_to_current_buffer() {
        let mut round = CodingRound::new(vec![problem(), problem()], Box::new(FragmentJudge));
        round.next();
        round.edit(Edit::Clear);
        for c in "ok".chars() {
            round.edit(Edit::Char(c));
        }
        round.edit(Edit::Backspace);
        assert_eq!(round.code(1), Some("o"));
        assert_eq!(round.code(0), Some(problem().starter.as_str()));
    }
}
