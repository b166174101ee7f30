//! Assignment-to-activity matching
//!
//! Resolves which aggregated activity corresponds to the LMS assignment
//! driving the current launch. Matching is a pluggable strategy so stricter
//! exact-id matching can replace the heuristics without touching the
//! aggregator.

use crate::report::aggregate::Activity;

/// Strategy seam for assignment matching
pub trait MatchStrategy: Send + Sync {
    /// Find the activity for the current assignment. Activities are scanned
    /// in the aggregator's sorted order, so more recent activities win ties.
    /// No match is an informational state, not an error.
    fn find_match<'a>(
        &self,
        activities: &'a [Activity],
        resource_link_title: Option<&str>,
        custom_lab_id: Option<&str>,
    ) -> Option<&'a Activity>;
}

/// Default heuristic matcher: custom id substring, then title containment or
/// similarity, then long title tokens.
pub struct HeuristicMatcher;

/// Length of the longest common substring of two strings (byte-wise over
/// their lowercase forms)
fn longest_common_substring_len(a: &str, b: &str) -> usize {
    let a: Vec<u8> = a.bytes().collect();
    let b: Vec<u8> = b.bytes().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut best = 0;
    for i in 1..=a.len() {
        let mut row = vec![0usize; b.len() + 1];
        for j in 1..=b.len() {
            if a[i - 1] == b[j - 1] {
                row[j] = prev[j - 1] + 1;
                best = best.max(row[j]);
            }
        }
        prev = row;
    }
    best
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl MatchStrategy for HeuristicMatcher {
    fn find_match<'a>(
        &self,
        activities: &'a [Activity],
        resource_link_title: Option<&str>,
        custom_lab_id: Option<&str>,
    ) -> Option<&'a Activity> {
        // Priority 1: custom lab id as substring of the activity id
        if let Some(lab_id) = custom_lab_id.filter(|s| !s.is_empty()) {
            if let Some(found) = activities.iter().find(|a| contains_ci(&a.id, lab_id)) {
                return Some(found);
            }
        }

        let title = resource_link_title.filter(|s| !s.is_empty())?;
        let title_lower = title.to_lowercase();

        // Priority 2: containment in either direction, or a longest common
        // substring exceeding 60% of the shorter string
        for activity in activities {
            let name_lower = activity.name.to_lowercase();
            let shorter = name_lower.len().min(title_lower.len());
            if name_lower.contains(&title_lower)
                || title_lower.contains(&name_lower)
                || (shorter > 0
                    && longest_common_substring_len(&name_lower, &title_lower) * 10
                        > shorter * 6)
            {
                return Some(activity);
            }
        }

        // Priority 3: any title token longer than 3 characters
        let tokens: Vec<&str> = title_lower
            .split(|c: char| c.is_whitespace() || matches!(c, '-' | '_' | ':'))
            .filter(|t| t.len() > 3)
            .collect();
        for activity in activities {
            let name_lower = activity.name.to_lowercase();
            if tokens.iter().any(|t| name_lower.contains(t)) {
                return Some(activity);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::aggregate::ActivityStatus;

    fn activity(id: &str, name: &str) -> Activity {
        Activity {
            id: id.to_string(),
            name: name.to_string(),
            status: ActivityStatus::Attempted,
            highest_score: None,
            best_attempt: None,
            attempts: Vec::new(),
            children: Vec::new(),
            latest_timestamp: String::new(),
        }
    }

    #[test]
    fn test_custom_lab_id_first_substring_match_wins() {
        let activities = vec![
            activity("http://labs/lab-3-intro", "Lab 3 Intro"),
            activity("http://labs/lab-30-final", "Lab 30 Final"),
        ];
        let found = HeuristicMatcher
            .find_match(&activities, None, Some("lab-3"))
            .unwrap();
        assert_eq!(found.id, "http://labs/lab-3-intro");
    }

    #[test]
    fn test_title_containment_either_direction() {
        let activities = vec![activity("http://labs/networking", "Networking Basics")];

        // Title contains the name
        let found = HeuristicMatcher
            .find_match(&activities, Some("Week 4: Networking Basics Lab"), None)
            .unwrap();
        assert_eq!(found.id, "http://labs/networking");

        // Name contains the title
        let found = HeuristicMatcher
            .find_match(&activities, Some("networking"), None)
            .unwrap();
        assert_eq!(found.id, "http://labs/networking");
    }

    #[test]
    fn test_similarity_match() {
        // No containment, but a long shared substring
        let activities = vec![activity("http://labs/intro", "Networking Fundamentals")];
        let found = HeuristicMatcher.find_match(&activities, Some("Fundamentals Quiz"), None);
        assert!(found.is_some());
    }

    #[test]
    fn test_token_fallback_skips_short_tokens() {
        let activities = vec![activity("http://labs/dns", "Advanced DNS Configuration")];
        // Long title keeps the similarity ratio under 60%, so only the
        // token scan can match, via "configuration" (> 3 chars)
        let found = HeuristicMatcher
            .find_match(&activities, Some("review unit about configuration and more"), None)
            .unwrap();
        assert_eq!(found.id, "http://labs/dns");

        // "dns" is in the name but too short to count as a token
        let none = HeuristicMatcher.find_match(&activities, Some("unrelated title dns"), None);
        assert!(none.is_none());
    }

    #[test]
    fn test_no_hints_no_match() {
        let activities = vec![activity("http://labs/a", "A")];
        assert!(HeuristicMatcher.find_match(&activities, None, None).is_none());
    }

    #[test]
    fn test_longest_common_substring() {
        assert_eq!(longest_common_substring_len("abcdef", "zabcy"), 3);
        assert_eq!(longest_common_substring_len("", "abc"), 0);
        assert_eq!(longest_common_substring_len("same", "same"), 4);
    }
}
