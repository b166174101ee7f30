//! Statement aggregation into an activity tree
//!
//! Two passes over the statement list: the first collects every id that is
//! referenced as a parent, the second accumulates each statement into a root
//! or child [`Activity`]. A third step attaches child maps to their parents
//! and derives parent status from children. The final tree shape is
//! independent of input order for a fixed statement set; only the `attempts`
//! sequences preserve encounter order.

use serde::Serialize;
use std::collections::HashSet;

use crate::lrs::statement::Statement;

/// Derived activity status. `Attempted` is the initial state; transitions
/// are monotone and never regress from `Passed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Attempted,
    Completed,
    Passed,
    Failed,
}

/// An aggregation node keyed by xAPI object id
#[derive(Debug, Clone, Serialize)]
pub struct Activity {
    pub id: String,
    pub name: String,
    pub status: ActivityStatus,
    /// Highest scaled score seen; ties keep the first-seen best
    pub highest_score: Option<f64>,
    /// The statement that produced `highest_score`
    pub best_attempt: Option<Statement>,
    /// All contributing statements in encounter order
    pub attempts: Vec<Statement>,
    pub children: Vec<Activity>,
    /// Max timestamp across attempts, used for display ordering
    pub latest_timestamp: String,
}

impl Activity {
    fn new(statement: &Statement) -> Self {
        Self {
            id: statement.object_id.clone(),
            name: statement.object_name.clone(),
            status: ActivityStatus::Attempted,
            highest_score: None,
            best_attempt: None,
            attempts: Vec::new(),
            children: Vec::new(),
            latest_timestamp: statement.timestamp.clone(),
        }
    }

    /// Fold one statement into this activity: append the attempt, advance
    /// the latest timestamp, apply the monotone status rule, and track the
    /// strictly-highest score.
    pub fn apply_attempt(&mut self, statement: &Statement) {
        if statement.timestamp > self.latest_timestamp {
            self.latest_timestamp = statement.timestamp.clone();
        }

        match statement.verb.as_str() {
            "passed" | "mastered" => {
                self.status = ActivityStatus::Passed;
            }
            "failed" => {
                if self.status != ActivityStatus::Passed {
                    self.status = ActivityStatus::Failed;
                }
            }
            "completed" | "finished" => {
                if self.status != ActivityStatus::Passed && self.status != ActivityStatus::Failed {
                    self.status = ActivityStatus::Completed;
                }
            }
            _ => {}
        }

        if let Some(score) = statement.score_scaled {
            if self.highest_score.map_or(true, |best| score > best) {
                self.highest_score = Some(score);
                self.best_attempt = Some(statement.clone());
            }
        }

        self.attempts.push(statement.clone());
    }

    /// Derive status from children: all passed means passed, any failed
    /// means failed, anything else leaves the verb-derived status alone.
    /// Children always take precedence over the parent's own attempts.
    pub fn recompute_from_children(&mut self) {
        if self.children.is_empty() {
            return;
        }
        let all_passed = self
            .children
            .iter()
            .all(|c| c.status == ActivityStatus::Passed);
        let any_failed = self
            .children
            .iter()
            .any(|c| c.status == ActivityStatus::Failed);

        if all_passed {
            self.status = ActivityStatus::Passed;
        } else if any_failed {
            self.status = ActivityStatus::Failed;
        }
    }

    pub fn passed_children(&self) -> usize {
        self.children
            .iter()
            .filter(|c| c.status == ActivityStatus::Passed)
            .count()
    }
}

/// Accumulate a statement into an ordered list of activities, creating the
/// node on first encounter.
fn accumulate(list: &mut Vec<Activity>, statement: &Statement) {
    if let Some(existing) = list.iter_mut().find(|a| a.id == statement.object_id) {
        existing.apply_attempt(statement);
    } else {
        let mut activity = Activity::new(statement);
        activity.apply_attempt(statement);
        list.push(activity);
    }
}

/// Fold a statement list into root activities with nested children, sorted
/// most-recent first.
pub fn aggregate_statements(statements: &[Statement]) -> Vec<Activity> {
    // Pass 1: every id referenced as a parent by at least one statement
    let parent_ids: HashSet<&str> = statements
        .iter()
        .filter_map(|s| s.parent_activity_id.as_deref())
        .collect();

    // Pass 2: roots are statements whose object is referenced as a parent
    // or which have no parent themselves; everything else groups under its
    // resolved parent id. Both lists keep encounter order.
    let mut roots: Vec<Activity> = Vec::new();
    let mut child_groups: Vec<(String, Vec<Activity>)> = Vec::new();

    for statement in statements {
        let is_root = parent_ids.contains(statement.object_id.as_str())
            || statement.parent_activity_id.is_none();

        if is_root {
            accumulate(&mut roots, statement);
        } else {
            let parent_id = statement.parent_activity_id.clone().unwrap_or_default();
            let group = match child_groups.iter_mut().find(|(id, _)| *id == parent_id) {
                Some((_, group)) => group,
                None => {
                    child_groups.push((parent_id, Vec::new()));
                    &mut child_groups.last_mut().unwrap().1
                }
            };
            accumulate(group, statement);
        }
    }

    // Attach children; a parent id that never appeared as its own statement
    // gets its children promoted to roots (incomplete data from the LRS)
    for (parent_id, children) in child_groups {
        if let Some(parent) = roots.iter_mut().find(|a| a.id == parent_id) {
            parent.children = children;
            parent.recompute_from_children();
        } else {
            roots.extend(children);
        }
    }

    // Most recent first; lexical comparison of the timestamp itself breaks
    // ties, which can leave equal keys adjacent in input order
    roots.sort_by(|a, b| b.latest_timestamp.cmp(&a.latest_timestamp));
    roots
}
