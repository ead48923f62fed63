// src/models/analytics.rs

use serde::Serialize;

/// One row of a course or group ranking. Derived on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub student_id: i64,
    /// Mean of score/total_points*100 across the student's records in scope.
    pub average_score: f64,
    pub test_count: usize,
    /// 1-based position after a stable descending sort by average_score.
    /// Ties keep consecutive positional ranks.
    pub rank: usize,
}

/// Enrollment totals broken down by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrollmentCounts {
    pub active: usize,
    pub blocked: usize,
    pub restricted: usize,
}

/// Course-level dashboard aggregates. All fields reduce to zero when the
/// underlying collections are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CourseAnalytics {
    pub enrollments: EnrollmentCounts,
    pub assessment_count: usize,
    pub submission_count: usize,
    /// Flat mean of per-submission percentages across all submissions in the
    /// course, not weighted by total_points.
    pub average_test_score: f64,
    pub video_completions: usize,
    pub pdf_downloads: usize,
    pub distinct_pdf_downloaders: usize,
}
