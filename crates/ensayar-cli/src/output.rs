//! Report rendering.

use console::style;
use ensayar::{CaseStatus, SuiteReport};

/// Line-oriented suite report printer
#[derive(Debug)]
pub struct Reporter {
    use_color: bool,
    quiet: bool,
}

impl Reporter {
    /// Create a reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self { use_color, quiet }
    }

    /// Announce the run
    pub fn suite_started(&self, name: &str, cases: usize, base_url: &str) {
        if self.quiet {
            return;
        }
        println!(
            "{} {name} ({cases} cases) against {base_url}",
            self.paint_bold("running"),
        );
    }

    /// Print per-case lines, the failure details, and the summary
    pub fn render(&self, report: &SuiteReport) {
        if !self.quiet {
            println!();
            for case in &report.cases {
                let millis = case.duration.as_millis();
                match &case.status {
                    CaseStatus::Passed => {
                        println!("  {} {} ({millis}ms)", self.paint_green("PASS"), case.name);
                    }
                    CaseStatus::Failed { category, .. } => {
                        println!(
                            "  {} {} [{category}] ({millis}ms)",
                            self.paint_red("FAIL"),
                            case.name
                        );
                    }
                }
            }
        }

        let failures = report.failures();
        if !failures.is_empty() {
            println!();
            println!("{}", self.paint_bold("failures:"));
            for case in failures {
                if let CaseStatus::Failed { category, message } = &case.status {
                    println!(
                        "  {} ({} during {}):\n      {message}",
                        self.paint_red(&case.name),
                        category,
                        case.phase_reached
                    );
                }
            }
        }

        println!();
        let summary = format!(
            "{} passed, {} failed, {} total in {:.1}s",
            report.passed_count(),
            report.failed_count(),
            report.total(),
            report.duration.as_secs_f64()
        );
        if report.all_passed() {
            println!("{}", self.paint_green(&summary));
        } else {
            println!("{}", self.paint_red(&summary));
        }
    }

    fn paint_green(&self, text: &str) -> String {
        if self.use_color {
            style(text).green().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_red(&self, text: &str) -> String {
        if self.use_color {
            style(text).red().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_bold(&self, text: &str) -> String {
        if self.use_color {
            style(text).bold().to_string()
        } else {
            text.to_string()
        }
    }
}
