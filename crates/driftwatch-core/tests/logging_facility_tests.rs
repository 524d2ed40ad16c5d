#![allow(clippy::unwrap_used, clippy::expect_used)]

use driftwatch_core::errors::{DriftError, ExError, ExErrorKind};
use driftwatch_core::logging_facility::test_capture::init_test_capture;
use driftwatch_core::{log_op_end, log_op_error, log_op_start};
use driftwatch_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_ERR_CODE, FIELD_ERR_KIND, FIELD_ERR_MESSAGE,
};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    assert_eq!(capture.find(op_name, EVENT_START).len(), 1);
}

#[test]
fn test_log_op_end_records_duration() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let end_events = capture.find(op_name, EVENT_END);
    assert_eq!(end_events.len(), 1, "Should have exactly one end event");
    assert_eq!(end_events[0].field("duration_ms"), Some("42"));
}

#[test]
fn test_log_op_error_includes_code_and_kind() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err: ExError = DriftError::SnapshotNotFound {
        snapshot_id: "s-404".to_string(),
    }
    .into();
    log_op_error!(op_name, &err, duration_ms = 10);

    let error_events = capture.find(op_name, EVENT_END_ERROR);
    assert_eq!(error_events.len(), 1, "Should have exactly one error event");

    let event = &error_events[0];
    assert_eq!(event.field("err.code"), Some("ERR_NOT_FOUND"));
    assert_eq!(event.field("err.kind"), Some("NotFound"));
    assert!(event.field("err.message").unwrap().contains("s-404"));
}

#[test]
fn test_boundary_ownership_single_start_end() {
    let capture = init_test_capture();
    let op_name = "test_boundary_ownership_unique_4";

    log_op_start!(op_name, tenant_id = "t1");
    log_op_end!(op_name, duration_ms = 7, total_changes = 3);

    assert_eq!(capture.find(op_name, EVENT_START).len(), 1);
    assert_eq!(capture.find(op_name, EVENT_END).len(), 1);
    assert_eq!(
        capture.find(op_name, EVENT_END)[0].field("total_changes"),
        Some("3")
    );
}

#[test]
fn test_log_macros_with_multiple_fields() {
    let capture = init_test_capture();
    let op_name = "test_log_macros_fields_unique_5";

    log_op_start!(op_name, tenant_id = "t-multi", snapshot_type = "pipeline");

    let start_event = capture
        .events()
        .into_iter()
        .find(|e| e.op.as_deref() == Some(op_name))
        .expect("Should have start event");
    assert_eq!(start_event.field("tenant_id"), Some("t-multi"));
    assert_eq!(start_event.field("snapshot_type"), Some("pipeline"));
}

#[test]
fn test_bool_fields_are_captured() {
    let capture = init_test_capture();
    let op_name = "test_bool_fields_unique_6";

    log_op_end!(op_name, duration_ms = 1, success = true);

    assert_eq!(capture.find(op_name, EVENT_END)[0].field("success"), Some("true"));
}

#[test]
#[should_panic(expected = "Expected event")]
fn test_assert_event_exists_fails_for_unknown_op() {
    let capture = init_test_capture();
    capture.assert_event_exists("nonexistent_op_truly_unique_999", EVENT_START);
}

#[test]
fn test_count_events() {
    let capture = init_test_capture();
    let op1 = "test_count_events_op1_unique_7";
    let op2 = "test_count_events_op2_unique_7";

    log_op_start!(op1);
    log_op_start!(op2);
    log_op_end!(op1, duration_ms = 10);

    let starts = capture.count_events(|e| {
        e.event.as_deref() == Some(EVENT_START)
            && (e.op.as_deref() == Some(op1) || e.op.as_deref() == Some(op2))
    });
    let ends = capture.count_events(|e| {
        e.event.as_deref() == Some(EVENT_END)
            && (e.op.as_deref() == Some(op1) || e.op.as_deref() == Some(op2))
    });

    assert_eq!(starts, 2);
    assert_eq!(ends, 1);
}

#[test]
fn test_error_without_message_logs_empty_message() {
    let capture = init_test_capture();
    let op_name = "test_error_empty_message_unique_8";

    let err = ExError::new(ExErrorKind::Internal);
    log_op_error!(op_name, &err, duration_ms = 0);

    let event = &capture.find(op_name, EVENT_END_ERROR)[0];
    assert_eq!(event.field("err.code"), Some("ERR_INTERNAL"));
    assert_eq!(event.field("err.message"), Some(""));
}

#[test]
fn test_error_fields_use_schema_names() {
    let capture = init_test_capture();
    let op_name = "test_error_field_names_unique_9";

    let err = ExError::new(ExErrorKind::Config).with_message("bad window");
    log_op_error!(op_name, &err, duration_ms = 1, tenant_id = "t1");

    let event = &capture.find(op_name, EVENT_END_ERROR)[0];
    assert_eq!(event.field(FIELD_ERR_KIND), Some("Config"));
    assert_eq!(event.field(FIELD_ERR_CODE), Some("ERR_CONFIG"));
    assert_eq!(event.field(FIELD_ERR_MESSAGE), Some("bad window"));
    assert_eq!(event.field("tenant_id"), Some("t1"));
    assert_eq!(event.field("err_kind"), None);
    assert_eq!(event.field("err_code"), None);
}
