//! xUnit-style XML test result parsing
//!
//! The test wrappers write a report whose root holds one `assembly` element
//! per test assembly:
//!
//! ```xml
//! <assemblies>
//!   <assembly name="GC" total="10" passed="9" failed="1">
//!     <collection>
//!       <test name="GC/API/GC/Collect.cmd" result="Fail" />
//!       <test name="GC/API/GC/KeepAlive.cmd" result="Pass" />
//!     </collection>
//!   </assembly>
//! </assemblies>
//! ```

use crate::error::{Error, Result};
use roxmltree::{Document, Node};
use std::fs;
use std::io;
use std::path::Path;

/// Value of the `result` attribute that marks a failed test
pub const FAIL_RESULT: &str = "Fail";

/// Aggregated counts for one result file
///
/// `passed + failed == total` is whatever the report says; it is not checked.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Names of failing tests, in document order
    pub failed_test_names: Vec<String>,
}

impl TestSuiteResult {
    pub fn has_failures(&self) -> bool {
        !self.failed_test_names.is_empty()
    }
}

/// Parse the result file at `path`.
///
/// A file that does not exist yields [`Error::MissingResultFile`]; anything
/// that is not a well-formed report yields [`Error::MalformedReport`].
pub fn parse_results(path: &Path) -> Result<TestSuiteResult> {
    let content = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::MissingResultFile(path.to_path_buf()));
        }
        Err(e) => return Err(Error::Io(e)),
    };

    let text = String::from_utf8(content).map_err(|e| Error::MalformedReport {
        path: path.to_path_buf(),
        reason: format!("not valid UTF-8: {}", e),
    })?;

    parse_str(&text).map_err(|reason| Error::MalformedReport {
        path: path.to_path_buf(),
        reason,
    })
}

/// Parse report content held in memory; errors are returned as a reason string.
pub fn parse_str(content: &str) -> std::result::Result<TestSuiteResult, String> {
    let document = Document::parse(content).map_err(|e| e.to_string())?;
    let root = document.root_element();

    let mut summary = TestSuiteResult::default();
    for assembly in root.children().filter(|n| n.has_tag_name("assembly")) {
        add_count(&mut summary.total, &assembly, "total")?;
        add_count(&mut summary.passed, &assembly, "passed")?;
        add_count(&mut summary.failed, &assembly, "failed")?;

        for test in assembly
            .descendants()
            .filter(|n| n.has_tag_name("test") && n.attribute("result") == Some(FAIL_RESULT))
        {
            let name = test.attribute("name").ok_or_else(|| {
                format!(
                    "failed test at byte {} has no name attribute",
                    test.range().start
                )
            })?;
            summary.failed_test_names.push(name.to_string());
        }
    }

    Ok(summary)
}

/// Add a count attribute of `node` to the running `sum`
fn add_count(sum: &mut usize, node: &Node, name: &str) -> std::result::Result<(), String> {
    let count = count_attribute(node, name)?;
    *sum = sum
        .checked_add(count)
        .ok_or_else(|| format!("sum of {} counts overflows", name))?;
    Ok(())
}

/// Read a count attribute, treating a missing attribute as zero
fn count_attribute(node: &Node, name: &str) -> std::result::Result<usize, String> {
    match node.attribute(name) {
        None => Ok(0),
        Some(value) => value.trim().parse::<usize>().map_err(|e| {
            format!(
                "attribute {}=\"{}\" of <{}> is not a count: {}",
                name,
                value,
                node.tag_name().name(),
                e
            )
        }),
    }
}
