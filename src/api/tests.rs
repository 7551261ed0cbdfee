use super::*;

// Exercises the global handle; kept in one test so ordering is deterministic.
#[test]
fn test_global_tracker_lifecycle() {
    report_sensor_available(true);
    report_permission(false);
    assert!(needs_permission_request());

    let started = start_tracking().unwrap();
    assert!(started.is_tracking);
    assert_eq!(started.step_count, 0);

    // Denied permission: the stream never produces events
    assert_eq!(push_step_reading(19, 1, 4200.0), 0);
    assert_eq!(get_session_snapshot().unwrap().step_count, 0);

    report_permission(true);
    assert!(!needs_permission_request());
    assert_eq!(push_step_reading(19, 2, 4200.0), 1);
    push_step_reading(19, 3, 4203.0);
    // Foreign sensor types are ignored
    push_step_reading(1, 4, 9999.0);
    push_step_reading(19, 5, 4207.0);

    let snapshot = get_session_snapshot().unwrap();
    assert_eq!(snapshot.step_count, 7);
    assert_eq!(snapshot.distance_label(), "5.32");

    let stopped = stop_tracking().unwrap();
    assert!(!stopped.is_tracking);
    assert_eq!(push_step_reading(19, 6, 5000.0), 0);
    assert_eq!(get_session_snapshot().unwrap().step_count, 7);

    let reset = reset_counters().unwrap();
    assert_eq!(reset.step_count, 0);
}

#[test]
fn test_get_version() {
    let result = get_version().unwrap();
    assert_eq!(result, "0.1.0");
}

#[test]
fn test_error_code_accessors() {
    let _tracking = get_tracking_error_codes();
    let _sensor = get_sensor_error_codes();
    assert_eq!(TrackingErrorCodes::LOCK_POISONED, 1001);
    assert_eq!(SensorErrorCodes::SENSOR_UNAVAILABLE, 2001);
}
