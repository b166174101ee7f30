//! Grade derivation from a matched activity

use crate::report::aggregate::{Activity, ActivityStatus};

/// Derive a normalized grade in [0, 1] from an activity.
///
/// Preference order: the activity's own best scaled score, then the passed
/// fraction of its children, then a status-derived constant. The result is
/// clamped defensively regardless of source.
pub fn calculate_grade(activity: &Activity) -> f64 {
    let grade = if let Some(score) = activity.highest_score {
        score
    } else if !activity.children.is_empty() {
        activity.passed_children() as f64 / activity.children.len() as f64
    } else {
        match activity.status {
            ActivityStatus::Passed | ActivityStatus::Completed => 1.0,
            ActivityStatus::Failed | ActivityStatus::Attempted => 0.0,
        }
    };

    grade.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(status: ActivityStatus, score: Option<f64>) -> Activity {
        Activity {
            id: "a".to_string(),
            name: "A".to_string(),
            status,
            highest_score: score,
            best_attempt: None,
            attempts: Vec::new(),
            children: Vec::new(),
            latest_timestamp: String::new(),
        }
    }

    #[test]
    fn test_score_takes_precedence() {
        let mut a = activity(ActivityStatus::Failed, Some(0.85));
        a.children.push(activity(ActivityStatus::Failed, None));
        assert_eq!(calculate_grade(&a), 0.85);
    }

    #[test]
    fn test_children_fraction() {
        let mut a = activity(ActivityStatus::Attempted, None);
        a.children.push(activity(ActivityStatus::Passed, None));
        a.children.push(activity(ActivityStatus::Failed, None));
        assert_eq!(calculate_grade(&a), 0.5);
    }

    #[test]
    fn test_status_fallback() {
        assert_eq!(calculate_grade(&activity(ActivityStatus::Passed, None)), 1.0);
        assert_eq!(calculate_grade(&activity(ActivityStatus::Completed, None)), 1.0);
        assert_eq!(calculate_grade(&activity(ActivityStatus::Failed, None)), 0.0);
        assert_eq!(calculate_grade(&activity(ActivityStatus::Attempted, None)), 0.0);
    }

    #[test]
    fn test_out_of_range_score_clamped() {
        assert_eq!(calculate_grade(&activity(ActivityStatus::Passed, Some(1.4))), 1.0);
        assert_eq!(calculate_grade(&activity(ActivityStatus::Passed, Some(-0.2))), 0.0);
    }
}
