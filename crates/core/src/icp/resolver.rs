//! Tax line resolution with precedence fallback.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, warn};

use super::error::IcpError;
use super::repository::DeclarationRepository;
use super::types::{DeclarationKind, ProcessCode, TaxLine, TaxQuery};

/// Tax lines selected for one declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTax {
    /// How the declaration was filed.
    pub kind: DeclarationKind,
    /// Query variant that produced the lines.
    pub query: TaxQuery,
    /// Process code of the first line after sorting.
    pub process_code: String,
    /// Lines sorted by item number, then tax type.
    pub lines: Vec<TaxLine>,
}

impl ResolvedTax {
    /// Parsed process code, when it is one of the known stages.
    #[must_use]
    pub fn stage(&self) -> Option<ProcessCode> {
        ProcessCode::parse(&self.process_code)
    }
}

/// Resolves the best available tax lines for a declaration.
///
/// Precedence, stopping at the first non-empty answer:
/// EU-linked TAX, EU-linked TMP_TAX, non-EU TAX, non-EU TMP_TAX.
/// Split filings use the supply-article query with TAX, then TMP_TAX, and nothing else.
pub struct TaxResolver<R: DeclarationRepository> {
    repo: Arc<R>,
}

impl<R: DeclarationRepository> TaxResolver<R> {
    /// Create a new resolver.
    #[must_use]
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Decides once whether the declaration is split. A failed lookup counts as ordinary.
    pub async fn declaration_kind(&self, customs_id: &str) -> DeclarationKind {
        match self.repo.declaration_kind(customs_id).await {
            Ok(kind) => kind,
            Err(e) => {
                warn!(customs_id, error = %e, "Split lookup failed, treating as ordinary");
                DeclarationKind::Ordinary
            }
        }
    }

    /// Walks the fallback chain for one declaration.
    ///
    /// # Errors
    ///
    /// Returns [`IcpError::TaxUnresolved`] when every query is empty or fails.
    pub async fn resolve(&self, customs_id: &str) -> Result<ResolvedTax, IcpError> {
        let kind = self.declaration_kind(customs_id).await;

        for &query in TaxQuery::chain(kind) {
            for code in ProcessCode::CHAIN {
                match self.repo.tax_lines(query, customs_id, code).await {
                    Ok(mut lines) if !lines.is_empty() => {
                        sort_lines(&mut lines);
                        let process_code = lines[0].process_code.clone();
                        debug!(
                            customs_id,
                            ?query,
                            process_code = %process_code,
                            lines = lines.len(),
                            "Resolved tax lines"
                        );
                        return Ok(ResolvedTax {
                            kind,
                            query,
                            process_code,
                            lines,
                        });
                    }
                    Ok(_) => {
                        debug!(customs_id, ?query, code = code.as_str(), "No tax lines");
                    }
                    Err(e) => {
                        warn!(
                            customs_id,
                            ?query,
                            code = code.as_str(),
                            error = %e,
                            "Tax query failed, trying next"
                        );
                    }
                }
            }
        }

        Err(IcpError::TaxUnresolved(customs_id.to_string()))
    }
}

/// Sorts lines by (item number, tax type) ascending.
///
/// Item numbers compare numerically when both parse as integers.
pub fn sort_lines(lines: &mut [TaxLine]) {
    lines.sort_by(|a, b| {
        compare_item_numbers(&a.item_number, &b.item_number).then_with(|| a.tax_type.cmp(&b.tax_type))
    });
}

fn compare_item_numbers(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<u64>(), b.trim().parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
