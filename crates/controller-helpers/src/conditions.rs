//! Condition management helpers following Kubernetes API conventions

use chrono::Utc;
use crds::{Condition, ConditionStatus};

/// Update or add a condition to the conditions list
///
/// Reason, message and observed generation are always refreshed. The
/// transition time only moves when the status actually changes.
pub fn set_status_condition(
    conditions: &mut Vec<Condition>,
    type_: &str,
    status: ConditionStatus,
    reason: &str,
    message: &str,
    observed_generation: Option<i64>,
) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.type_ == type_) {
        if existing.status != status {
            existing.status = status;
            existing.last_transition_time = Utc::now();
        }

        existing.reason = reason.to_string();
        existing.message = message.to_string();
        existing.observed_generation = observed_generation;
        return;
    }

    conditions.push(Condition {
        type_: type_.to_string(),
        status,
        observed_generation,
        last_transition_time: Utc::now(),
        reason: reason.to_string(),
        message: message.to_string(),
    });
}

/// Find a condition by type
pub fn find_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn old_condition(status: ConditionStatus) -> Condition {
        Condition {
            type_: "Prewarmed".to_string(),
            status,
            observed_generation: Some(1),
            last_transition_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            reason: "Old".to_string(),
            message: "old message".to_string(),
        }
    }

    #[test]
    fn test_set_adds_missing_condition() {
        let mut conditions = Vec::new();
        set_status_condition(
            &mut conditions,
            "Prewarmed",
            ConditionStatus::True,
            "AsExpected",
            "",
            Some(3),
        );

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].type_, "Prewarmed");
        assert_eq!(conditions[0].observed_generation, Some(3));
        assert!(Utc::now() - conditions[0].last_transition_time < Duration::minutes(1));
    }

    #[test]
    fn test_same_status_keeps_transition_time() {
        let mut conditions = vec![old_condition(ConditionStatus::True)];
        let before = conditions[0].last_transition_time;

        set_status_condition(
            &mut conditions,
            "Prewarmed",
            ConditionStatus::True,
            "AsExpected",
            "",
            Some(2),
        );

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].last_transition_time, before);
        assert_eq!(conditions[0].reason, "AsExpected");
        assert_eq!(conditions[0].message, "");
        assert_eq!(conditions[0].observed_generation, Some(2));
    }

    #[test]
    fn test_status_change_moves_transition_time() {
        let mut conditions = vec![old_condition(ConditionStatus::True)];
        let before = conditions[0].last_transition_time;

        set_status_condition(
            &mut conditions,
            "Prewarmed",
            ConditionStatus::False,
            "NotAllNodesPrewarmed",
            "1 of 3 nodes not prewarmed",
            Some(2),
        );

        assert_eq!(conditions[0].status, ConditionStatus::False);
        assert!(conditions[0].last_transition_time > before);
    }

    #[test]
    fn test_find_condition_by_type() {
        let conditions = vec![old_condition(ConditionStatus::True)];
        assert_eq!(
            find_condition(&conditions, "Prewarmed").map(|c| c.status),
            Some(ConditionStatus::True)
        );
        assert!(find_condition(&conditions, "Available").is_none());
    }
}
