//! Booking calendars with their assigned team members.

use super::entity::EntitySpec;

pub const TEAM_MEMBER: EntitySpec = EntitySpec {
    entity_type: "team_member",
    collection_key: "team_members",
    path_segment: "team_members",
    children: &[],
};

pub const CALENDAR: EntitySpec = EntitySpec {
    entity_type: "calendar",
    collection_key: "calendars",
    path_segment: "calendar",
    children: &[TEAM_MEMBER],
};

#[cfg(test)]
mod tests {
    use crate::compare::{CompareContext, Comparator};
    use crate::model::SnapshotType;
    use serde_json::json;

    #[test]
    fn test_working_hours_and_member_changes() {
        let before = json!({"calendars": [{"id": "C1",
            "working_hours": {"mon": "09-17"},
            "team_members": [{"id": "u1"}, {"id": "u2"}]}]});
        let after = json!({"calendars": [{"id": "C1",
            "working_hours": {"mon": "10-18"},
            "team_members": [{"id": "u1"}]}]});

        let ctx = CompareContext::new(SnapshotType::Calendar);
        let changes = Comparator::Calendar.compare(&before, &after, &ctx).unwrap();
        let paths: Vec<&str> = changes.iter().map(|c| c.diff_path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["calendar[C1].working_hours", "calendar[C1].team_members[u2]"]
        );
    }
}
