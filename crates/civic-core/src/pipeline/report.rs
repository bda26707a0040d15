use std::time::Duration;

use chrono::{DateTime, Local};

/// Outcome of one executed step.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub step_id: String,
    pub step_name: String,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub duration: Duration,
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Summary of a pipeline run that reached the end.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub results: Vec<StepResult>,
    /// Wall-clock time from the first step's start to the last step's end.
    pub total: Duration,
}

/// One row of the per-step timing breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingRow {
    pub name: String,
    pub duration: Duration,
    pub percent: f64,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// Share of steps that succeeded, 0–100. An empty run counts as 100.
    pub fn success_percentage(&self) -> f64 {
        if self.results.is_empty() {
            return 100.0;
        }
        self.succeeded() as f64 * 100.0 / self.results.len() as f64
    }

    pub fn steps_duration(&self) -> Duration {
        self.results.iter().map(|r| r.duration).sum()
    }

    /// Per-step durations with their share of the total wall-clock time.
    pub fn breakdown(&self) -> Vec<TimingRow> {
        let total = self.total.as_secs_f64();
        self.results
            .iter()
            .map(|r| TimingRow {
                name: r.step_name.clone(),
                duration: r.duration,
                percent: if total > 0.0 {
                    r.duration.as_secs_f64() * 100.0 / total
                } else {
                    0.0
                },
            })
            .collect()
    }
}

/// `[██████░░░░] 2/3 (67%)`
pub fn progress_bar(current: usize, total: usize, width: usize) -> String {
    let total = total.max(1);
    let current = current.min(total);
    let filled = current * width / total;
    let percent = (current * 100 + total / 2) / total;
    format!(
        "[{}{}] {current}/{total} ({percent}%)",
        "█".repeat(filled),
        "░".repeat(width - filled)
    )
}

/// `850ms`, `12.3s`, `2m 05s`
pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        let secs = d.as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, ms: u64, success: bool) -> StepResult {
        let now = Local::now();
        StepResult {
            step_id: name.to_string(),
            step_name: name.to_string(),
            started_at: now,
            finished_at: now,
            duration: Duration::from_millis(ms),
            stdout: String::new(),
            stderr: String::new(),
            success,
            error: None,
        }
    }

    #[test]
    fn progress_bar_renders_fraction() {
        assert_eq!(progress_bar(1, 4, 8), "[██░░░░░░] 1/4 (25%)");
        assert_eq!(progress_bar(2, 3, 3), "[██░] 2/3 (67%)");
        assert_eq!(progress_bar(3, 3, 4), "[████] 3/3 (100%)");
    }

    #[test]
    fn progress_bar_tolerates_empty_pipeline() {
        assert_eq!(progress_bar(0, 0, 2), "[░░] 0/1 (0%)");
    }

    #[test]
    fn durations_are_human_readable() {
        assert_eq!(format_duration(Duration::from_millis(850)), "850ms");
        assert_eq!(format_duration(Duration::from_millis(12_340)), "12.3s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 05s");
    }

    #[test]
    fn breakdown_percentages_follow_total() {
        let report = RunReport {
            results: vec![result("a", 250, true), result("b", 750, true)],
            total: Duration::from_millis(1000),
        };
        let rows = report.breakdown();
        assert_eq!(rows.len(), 2);
        assert!((rows[0].percent - 25.0).abs() < 1e-9);
        assert!((rows[1].percent - 75.0).abs() < 1e-9);
        assert_eq!(report.steps_duration(), Duration::from_millis(1000));
        assert!((report.success_percentage() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn success_percentage_counts_failures() {
        let report = RunReport {
            results: vec![result("a", 1, true), result("b", 1, false)],
            total: Duration::from_millis(2),
        };
        assert_eq!(report.succeeded(), 1);
        assert!((report.success_percentage() - 50.0).abs() < f64::EPSILON);
    }
}
