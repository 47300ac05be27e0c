use servitor::core::Label;

/// Exit code the test service reports from `onStop`.
pub const EXIT_CODE_VAR: &str = "TEST_SERVICE_EXIT_CODE";
/// Makes `onStart` fail when set.
pub const FAIL_START_VAR: &str = "TEST_SERVICE_FAIL_START";
/// Pid file location, shared with the configuration layer.
pub const PID_FILE_VAR: &str = "SERVITOR_PID_FILE";

pub fn label() -> Label {
    Label::new("io", "servitor", "servitor_test")
}
