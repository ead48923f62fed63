// src/ranking.rs

use std::collections::{HashMap, HashSet};

use crate::models::{
    analytics::{CourseAnalytics, EnrollmentCounts, RankingEntry},
    course::{Enrollment, EnrollmentStatus, MaterialEvent, MaterialEventKind},
    submission::SubmissionRecord,
};

/// Percentage value of one submission. Records with a non-positive total
/// reduce to 0 rather than dividing by zero; banks are non-empty by
/// construction so this only guards corrupted rows.
fn percentage(record: &SubmissionRecord) -> f64 {
    if record.total_points <= 0 {
        return 0.0;
    }
    record.score as f64 / record.total_points as f64 * 100.0
}

/// Computes the per-student ranking over a pre-scoped record set.
///
/// * Records must already be restricted to the scope (course, optional
///   group, active enrollments); students with zero records never appear.
/// * Students are grouped in first-appearance order, sorted descending by
///   average percentage with a stable sort, then assigned positional
///   1-based ranks. Two students with an equal average receive consecutive
///   ranks, not the same rank.
pub fn rank_students(records: &[SubmissionRecord]) -> Vec<RankingEntry> {
    let mut order: Vec<i64> = Vec::new();
    let mut totals: HashMap<i64, (f64, usize)> = HashMap::new();

    for record in records {
        let entry = totals.entry(record.student_id).or_insert_with(|| {
            order.push(record.student_id);
            (0.0, 0)
        });
        entry.0 += percentage(record);
        entry.1 += 1;
    }

    let mut entries: Vec<RankingEntry> = order
        .into_iter()
        .map(|student_id| {
            let (sum, count) = totals[&student_id];
            RankingEntry {
                student_id,
                average_score: sum / count as f64,
                test_count: count,
                rank: 0,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.average_score
            .partial_cmp(&a.average_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for (idx, entry) in entries.iter_mut().enumerate() {
        entry.rank = idx + 1;
    }

    entries
}

/// Restricts submission records to a set of students.
pub fn scope_records(
    records: &[SubmissionRecord],
    students: &HashSet<i64>,
) -> Vec<SubmissionRecord> {
    records
        .iter()
        .filter(|r| students.contains(&r.student_id))
        .cloned()
        .collect()
}

/// Reduces a course's collections into dashboard aggregates.
/// Every input may be empty; all counters then reduce to zero.
pub fn course_analytics(
    enrollments: &[Enrollment],
    assessment_count: usize,
    records: &[SubmissionRecord],
    events: &[MaterialEvent],
) -> CourseAnalytics {
    let mut counts = EnrollmentCounts::default();
    for enrollment in enrollments {
        match enrollment.status {
            EnrollmentStatus::Active => counts.active += 1,
            EnrollmentStatus::Blocked => counts.blocked += 1,
            EnrollmentStatus::Restricted => counts.restricted += 1,
        }
    }

    let average_test_score = if records.is_empty() {
        0.0
    } else {
        records.iter().map(percentage).sum::<f64>() / records.len() as f64
    };

    let video_completions = events
        .iter()
        .filter(|e| e.kind == MaterialEventKind::VideoCompleted)
        .count();

    let downloads: Vec<&MaterialEvent> = events
        .iter()
        .filter(|e| e.kind == MaterialEventKind::PdfDownloaded)
        .collect();
    let distinct_downloaders: HashSet<i64> = downloads.iter().map(|e| e.student_id).collect();

    CourseAnalytics {
        enrollments: counts,
        assessment_count,
        submission_count: records.len(),
        average_test_score,
        video_completions,
        pdf_downloads: downloads.len(),
        distinct_pdf_downloaders: distinct_downloaders.len(),
    }
}
