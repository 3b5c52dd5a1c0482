use std::time::Duration;

/// Scenario run when no identifier is given.
pub const DEFAULT_FQN: &str = "loads::dummy::test_dummy";

pub const DEFAULT_PROJECT_NAME: &str = "N/A";

/// Default log destination for workers started without an explicit log file.
pub const DEFAULT_LOGFILE: &str = "/tmp/loads-worker.log";

/// Interval between two refreshes of the run outputs.
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// Process exit code: no recorded errors or failures.
pub const EXIT_SUCCESS: u8 = 0;

/// Process exit code: at least one recorded error or failure.
pub const EXIT_FAILURE: u8 = 1;

/// Process exit code: the run was aborted before completing.
pub const EXIT_ABORTED: u8 = 2;
