//! Shared `Result` alias for the studentcollab crates.
//!
//! There is no workspace-wide error enum. The access layer, the backend
//! client and the web layer each own their error types and wrap them in a
//! rootcause [`Report`], so a failure carries its domain context (an
//! `AuthError`, a `ProfileError`, ...) along with whatever attachments the
//! caller adds on the way up.

use rootcause::Report;

/// Result whose error is a rootcause report over the context type `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Offline;

    impl fmt::Display for Offline {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "backend offline")
        }
    }

    impl std::error::Error for Offline {}

    fn fetch(fail: bool) -> Result<u32, Offline> {
        if fail {
            return Err(Offline.into());
        }
        Ok(7)
    }

    #[test]
    fn ok_values_pass_through() {
        assert_eq!(fetch(false).expect("should be ok"), 7);
    }

    #[test]
    fn domain_errors_become_reports() {
        let report = fetch(true).expect_err("should fail");
        assert!(report.to_string().contains("backend offline"));
    }
}
