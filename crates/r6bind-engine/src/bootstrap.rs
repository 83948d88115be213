//! Bootstrap checks against the foreign runtime

use crate::error::BindResult;
use crate::gate::ForeignGate;

/// Outcome of the package version check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionStatus {
    /// Installed version starts with the expected prefix
    Compatible {
        /// Installed version
        found: String,
    },
    /// Installed version does not start with the expected prefix
    Mismatch {
        /// Expected prefix
        expected: String,
        /// Installed version
        found: String,
    },
    /// The runtime does not know the package version
    Unknown,
    /// The check was disabled
    Skipped,
}

impl VersionStatus {
    /// Whether the check found nothing to warn about
    pub fn is_compatible(&self) -> bool {
        matches!(self, VersionStatus::Compatible { .. } | VersionStatus::Skipped)
    }
}

/// Compare the installed version of `package` with `expected_prefix`.
///
/// A mismatch is only a warning; the binding keeps working.
pub fn check_package_version(
    gate: &ForeignGate,
    package: &str,
    expected_prefix: &str,
) -> BindResult<VersionStatus> {
    let status = match gate.package_version(package)? {
        Some(found) if found.starts_with(expected_prefix) => VersionStatus::Compatible { found },
        Some(found) => {
            tracing::warn!(
                package,
                expected = expected_prefix,
                found = %found,
                "designed for {package} versions starting with {expected_prefix} but {found} is installed"
            );
            VersionStatus::Mismatch {
                expected: expected_prefix.to_string(),
                found,
            }
        }
        None => {
            tracing::warn!(package, "could not determine the installed version of {package}");
            VersionStatus::Unknown
        }
    };
    Ok(status)
}
