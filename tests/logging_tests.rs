//! Logging initialisation tests
//!
//! The tracing dispatcher is process-global, so everything touching it
//! lives in this one test binary and one test.

use gc_individual_tests::error::Error;
use gc_individual_tests::logging::LoggingContext;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_init_once_per_process() {
    let temp = TempDir::new().unwrap();
    let log_dir = temp.path().join("logs");

    let mut logging = LoggingContext::new();
    let first = logging.init(false, &log_dir).unwrap();
    assert!(logging.is_initialized());
    assert!(first.starts_with(&log_dir));
    assert!(first.to_string_lossy().ends_with(".log"));

    let second = logging.init(true, &temp.path().join("elsewhere")).unwrap();
    assert_eq!(second, first);
    assert_eq!(logging.log_file(), Some(first.as_path()));
    assert!(!temp.path().join("elsewhere").exists());

    tracing::info!("written after init");
    let content = fs::read_to_string(&first).unwrap();
    assert!(content.contains("Initializing logger"));
    assert!(content.contains("written after init"));

    // A second context cannot install another global subscriber
    let mut other = LoggingContext::new();
    assert!(matches!(other.init(false, &log_dir), Err(Error::Logging(_))));
    assert!(!other.is_initialized());
}
