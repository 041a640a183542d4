//! Audit row types.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// One audit row: the first article of a submitted declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    /// Bill number.
    pub bill_no: String,
    /// Customs declaration id, shown as the invoice number.
    pub customs_id: String,
    /// Invoice date, usually empty.
    pub invoice_date: String,
    /// Movement reference number.
    pub mrn: String,
    /// Article item number.
    pub item_number: String,
    /// HS code, value-process override first.
    pub hs_code: String,
    /// Duty rate fixed during value processing, as a fraction.
    pub duty_rate_override: Option<Decimal>,
    /// Duty charged on the article.
    pub duty_amount: Decimal,
    /// Final declared value of the article.
    pub declared_value: Decimal,
    /// Product number.
    pub product_no: String,
    /// Product web page.
    pub web_link: String,
    /// Product description.
    pub description: String,
    /// Price screenshot: a storage key or an absolute URL.
    pub price_screenshot: Option<String>,
}

/// Where a row's price screenshot lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screenshot<'a> {
    /// No screenshot recorded.
    Absent,
    /// Already a link; written as text.
    Url(&'a str),
    /// Object storage key; downloaded and embedded.
    Stored(&'a str),
}

impl AuditRecord {
    /// Duty rate as a percentage with two decimals, e.g. `12.50%`.
    ///
    /// Uses the value-process override when present, otherwise `duty / declared`.
    /// Empty when neither is available.
    #[must_use]
    pub fn duty_rate(&self) -> String {
        let fraction = match self.duty_rate_override {
            Some(rate) => rate,
            None if self.declared_value.is_zero() => return String::new(),
            None => self.duty_amount / self.declared_value,
        };
        let percent = (fraction * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("{percent:.2}%")
    }

    /// Classifies the screenshot reference.
    #[must_use]
    pub fn screenshot(&self) -> Screenshot<'_> {
        match self.price_screenshot.as_deref().map(str::trim) {
            None | Some("") => Screenshot::Absent,
            Some(link) if link.starts_with("http") => Screenshot::Url(link),
            Some(key) => Screenshot::Stored(key),
        }
    }
}
