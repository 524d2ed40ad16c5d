//! Business locations (sub-accounts) and their settings.

use super::entity::EntitySpec;

pub const LOCATION: EntitySpec = EntitySpec {
    entity_type: "location",
    collection_key: "locations",
    path_segment: "location",
    children: &[],
};
