//! Output file naming.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use icp_shared::ReportMonth;

use super::error::IcpError;

/// Time stamp appended to generated names: day of month, then `HHMMSS`.
pub const STAMP_FORMAT: &str = "%d%H%M%S";

/// An ICP workbook name: `{owner}_{YYYYMM}_{stamp}.xlsx`.
///
/// The owner is the duty party, or `VAT{number}` for VAT-scoped files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcpFileName {
    owner: String,
    month: ReportMonth,
    name: String,
}

impl IcpFileName {
    /// Names a freshly generated workbook.
    #[must_use]
    pub fn generate(owner: &str, month: ReportMonth, now: &NaiveDateTime) -> Self {
        let name = format!(
            "{owner}_{}_{}.xlsx",
            month.compact(),
            now.format(STAMP_FORMAT)
        );
        Self {
            owner: owner.to_string(),
            month,
            name,
        }
    }

    /// Recovers the owner and month from an existing workbook name.
    ///
    /// # Errors
    ///
    /// Returns [`IcpError::InvalidFileName`] when the name has no owner, no `YYYYMM`
    /// segment, or contains path separators.
    pub fn parse(name: &str) -> Result<Self, IcpError> {
        let invalid = || IcpError::InvalidFileName(name.to_string());
        if name.contains(['/', '\\']) || name.contains("..") {
            return Err(invalid());
        }

        let mut parts = name.split('_');
        let owner = parts.next().filter(|p| !p.is_empty()).ok_or_else(invalid)?;
        let month = parts
            .next()
            .map(|p| p.trim_end_matches(".xlsx"))
            .ok_or_else(invalid)
            .and_then(|p| ReportMonth::parse_compact(p).map_err(|_| invalid()))?;

        Ok(Self {
            owner: owner.to_string(),
            month,
            name: name.to_string(),
        })
    }

    /// Duty party (or `VAT{number}`).
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Reporting month encoded in the name.
    #[must_use]
    pub const fn month(&self) -> ReportMonth {
        self.month
    }

    /// The file name itself.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Directory the workbook lives in: `{root}/{YYYY}/{MM}`.
    #[must_use]
    pub fn directory(&self, root: &Path) -> PathBuf {
        root.join(format!("{:04}", self.month.year()))
            .join(self.month.month_dir())
    }

    /// Full path of the workbook under `root`.
    #[must_use]
    pub fn path(&self, root: &Path) -> PathBuf {
        self.directory(root).join(&self.name)
    }

    /// Sheet name for one of the workbook's sheets, e.g. `ICP_BE0796544895_202209`.
    #[must_use]
    pub fn sheet_name(&self, prefix: &str) -> String {
        format!("{prefix}_{}_{}", self.owner, self.month.compact())
    }
}

impl fmt::Display for IcpFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// `{YYYY-MM}.xlsx`
#[must_use]
pub fn audit_file_name(month: ReportMonth) -> String {
    format!("{month}.xlsx")
}

/// `{YYYY-MM}-{dutyParty}-vatnote.zip`
#[must_use]
pub fn vat_note_archive_name(month: ReportMonth, duty_party: &str) -> String {
    format!("{month}-{duty_party}-vatnote.zip")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn month(s: &str) -> ReportMonth {
        ReportMonth::parse(s).unwrap()
    }

    #[test]
    fn test_generate() {
        let now = NaiveDate::from_ymd_opt(2022, 10, 1)
            .unwrap()
            .and_hms_opt(15, 40, 20)
            .unwrap();
        let name = IcpFileName::generate("BE0796544895", month("2022-09"), &now);
        assert_eq!(name.as_str(), "BE0796544895_202209_01154020.xlsx");
        assert_eq!(
            name.path(Path::new("/data/icp")),
            PathBuf::from("/data/icp/2022/09/BE0796544895_202209_01154020.xlsx")
        );
        assert_eq!(name.sheet_name("POD"), "POD_BE0796544895_202209");
    }

    #[rstest]
    #[case("BE0796544895_202209_01154020.xlsx", "BE0796544895", "2022-09")]
    #[case("NL001_200601_02150405.xlsx", "NL001", "2006-01")]
    #[case("VATNL123_202312.xlsx", "VATNL123", "2023-12")]
    fn test_parse(#[case] input: &str, #[case] owner: &str, #[case] expected: &str) {
        let parsed = IcpFileName::parse(input).unwrap();
        assert_eq!(parsed.owner(), owner);
        assert_eq!(parsed.month(), month(expected));
        assert_eq!(parsed.as_str(), input);
    }

    #[rstest]
    #[case("")]
    #[case("report.xlsx")]
    #[case("_202209_01.xlsx")]
    #[case("BE01_2022-09_01.xlsx")]
    #[case("BE01_202213_01.xlsx")]
    #[case("BE01_202é1_01.xlsx")]
    #[case("../BE01_202209_01.xlsx")]
    #[case("BE01_202209/../../etc.xlsx")]
    fn test_parse_invalid(#[case] input: &str) {
        let err = IcpFileName::parse(input).unwrap_err();
        assert!(err.to_string().contains("BE0796544895_200601_02150405.xlsx"));
    }

    #[test]
    fn test_archive_and_audit_names() {
        assert_eq!(audit_file_name(month("2022-09")), "2022-09.xlsx");
        assert_eq!(
            vat_note_archive_name(month("2022-09"), "BE0796544895"),
            "2022-09-BE0796544895-vatnote.zip"
        );
    }
}
