//! Sales pipelines and their ordered stages.

use super::entity::EntitySpec;

pub const STAGE: EntitySpec = EntitySpec {
    entity_type: "stage",
    collection_key: "stages",
    path_segment: "stages",
    children: &[],
};

pub const PIPELINE: EntitySpec = EntitySpec {
    entity_type: "pipeline",
    collection_key: "pipelines",
    path_segment: "pipeline",
    children: &[STAGE],
};

#[cfg(test)]
mod tests {
    use crate::compare::{CompareContext, Comparator};
    use crate::model::{ChangeType, SnapshotType};
    use serde_json::json;

    #[test]
    fn test_stage_removed_and_renamed() {
        let before = json!({"pipelines": [{"id": "P", "name": "Sales", "stages": [
            {"id": "A", "name": "New"},
            {"id": "B", "name": "Qualified"},
            {"id": "C", "name": "Won"}
        ]}]});
        let after = json!({"pipelines": [{"id": "P", "name": "Sales", "stages": [
            {"id": "A", "name": "New"},
            {"id": "C", "name": "Closed Won"}
        ]}]});

        let ctx = CompareContext::new(SnapshotType::Pipeline);
        let changes = Comparator::Pipeline.compare(&before, &after, &ctx).unwrap();

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].change_type, ChangeType::Removed);
        assert_eq!(changes[0].entity_type, "stage");
        assert_eq!(changes[0].diff_path, "pipeline[P].stages[B]");
        assert_eq!(changes[1].change_type, ChangeType::Modified);
        assert_eq!(changes[1].diff_path, "pipeline[P].stages[C].name");
        assert_eq!(changes[1].before_value, Some(json!("Won")));
        assert_eq!(changes[1].after_value, Some(json!("Closed Won")));
    }

    #[test]
    fn test_pipeline_field_change_precedes_stage_changes() {
        let before = json!({"pipelines": [{"id": "P", "name": "Sales", "stages": [{"id": "A"}]}]});
        let after = json!({"pipelines": [{"id": "P", "name": "Revenue", "stages": [{"id": "A"}, {"id": "Z"}]}]});

        let ctx = CompareContext::new(SnapshotType::Pipeline);
        let changes = Comparator::Pipeline.compare(&before, &after, &ctx).unwrap();
        let paths: Vec<&str> = changes.iter().map(|c| c.diff_path.as_str()).collect();
        assert_eq!(paths, vec!["pipeline[P].name", "pipeline[P].stages[Z]"]);
    }
}
