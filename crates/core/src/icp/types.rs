//! ICP domain types.

use rust_decimal::Decimal;
use serde::Serialize;

/// Service key marking declarations whose POD comes from the first tracking row only.
pub const DECLARATION_ONLY: &str = "DECLARATION ONLY";

/// Tax computation stage recorded in the clearance process log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProcessCode {
    /// Official tax computation.
    Tax,
    /// Provisional tax computation.
    TmpTax,
}

impl ProcessCode {
    /// Precedence order used when resolving tax lines.
    pub const CHAIN: [Self; 2] = [Self::Tax, Self::TmpTax];

    /// Code as stored in `log_clearance_process.process_code`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tax => "TAX",
            Self::TmpTax => "TMP_TAX",
        }
    }

    /// `base_customs_tax.processing_status` that belongs to this stage.
    #[must_use]
    pub const fn processing_status(self) -> u32 {
        match self {
            Self::Tax => 4,
            Self::TmpTax => 115,
        }
    }

    /// Parses a stored process code.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "TAX" => Some(Self::Tax),
            "TMP_TAX" => Some(Self::TmpTax),
            _ => None,
        }
    }
}

/// Whether a declaration was filed whole or split into master and child declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeclarationKind {
    /// Filed as a single declaration.
    #[default]
    Ordinary,
    /// Master of a split filing; articles come from the supply-article table.
    Split,
}

/// Tax line query variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxQuery {
    /// Joins through the value-process table (possibly overridden HS code).
    EuLinked,
    /// Joins descriptions directly by product number and country.
    NonEu,
    /// Joins through supply articles of a split filing.
    SplitArticles,
}

impl TaxQuery {
    /// Query variants tried, in order, for a declaration of the given kind.
    ///
    /// Split filings have no non-EU fallback.
    #[must_use]
    pub const fn chain(kind: DeclarationKind) -> &'static [Self] {
        match kind {
            DeclarationKind::Ordinary => &[Self::EuLinked, Self::NonEu],
            DeclarationKind::Split => &[Self::SplitArticles],
        }
    }
}

/// Base customs information for one declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseInfo {
    /// Customs declaration id.
    pub customs_id: String,
    /// Declaring country (`NL`, `BE`, ...).
    pub declare_country: String,
    /// Movement reference number.
    pub mrn: String,
    /// Duty party VAT number.
    pub duty_party: String,
    /// Bill number.
    pub bill_no: String,
    /// Transport mode.
    pub mode: String,
    /// Tax agency name.
    pub partner_name: String,
}

/// One tax line item of a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxLine {
    /// Tax type code (`A00`, `B00`, ...).
    pub tax_type: String,
    /// Item number within the declaration.
    pub item_number: String,
    /// Destined number (`3b` / `4a`).
    pub destined: String,
    /// Declared value in local currency.
    pub declared_amount: Decimal,
    /// Import duty fee.
    pub import_duty: Decimal,
    /// Dutch costs column.
    pub dutch_cost: String,
    /// Dutch VAT column.
    pub dutch_vat: String,
    /// Country prefix.
    pub country_prefix: String,
    /// `TAX` or `TMP_TAX`.
    pub process_code: String,
    /// `YYYY/MM/DD`.
    pub invoice_date: String,
    /// Product number.
    pub product_no: String,
    /// HS commodity code.
    pub hs_code: String,
    /// Net weight in kilograms.
    pub net_weight: Decimal,
    /// Number of pieces.
    pub quantity: i64,
    /// Product description.
    pub description: String,
    /// Currency code.
    pub currency: String,
}

/// Importer address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Importer {
    /// Importer VAT number.
    pub vat_no: String,
    /// Importer EORI number.
    pub eori_no: String,
    /// Importer address code.
    pub address_code: String,
}

/// Delivery address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Address code.
    pub address_code: String,
    /// Destination country.
    pub country: String,
    /// City.
    pub city: String,
    /// Address lines concatenated.
    pub address_detail: String,
    /// Postal code.
    pub postal_code: String,
}

/// One row of the ICP tax sheet.
///
/// Fields follow the sheet's column order; the serial number and the blank Xml Id column are
/// produced by the writer.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaxObject {
    pub bill_no: String,
    pub tax_type: String,
    pub item_number: String,
    pub destined: String,
    pub process_code: String,
    pub customs_id: String,
    pub invoice_date: String,
    pub currency: String,
    pub local_currency_value: Decimal,
    pub import_duty: Decimal,
    pub dutch_cost: String,
    pub dutch_vat: String,
    pub hs_code: String,
    pub net_weight: Decimal,
    pub quantity: i64,
    pub country_prefix: String,
    pub duty_party: String,
    pub partner_name: String,
    pub country_of_destination: String,
    pub vat_no: String,
    pub eori_no: String,
    pub importer_address_code: String,
    pub address_code: String,
    pub address_detail: String,
    pub postal_code: String,
    pub city: String,
    pub product_no: String,
    pub description: String,
    pub mrn: String,
    pub company_name: String,
    pub mode: String,
    /// Comma-joined names of earlier ICP files containing this declaration.
    pub in_icp_files: String,
    /// `"Yes"` when an inspection fine was logged, otherwise empty.
    pub has_inspection_fine: String,
}

/// One row of the tax receipt sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxFileObject {
    /// Customs declaration id.
    pub customs_id: String,
    /// Movement reference number.
    pub mrn: String,
    /// Processing status the receipt belongs to.
    pub tax_type: u32,
    /// Link to the tax receipt.
    pub link: String,
}

/// One row of the proof-of-delivery sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PodFileObject {
    /// Bill number.
    pub bill_no: String,
    /// Customs declaration id.
    pub customs_id: String,
    /// Movement reference number.
    pub mrn: String,
    /// Parcel tracking number.
    pub tracking_no: String,
    /// POD file URI, when one was uploaded.
    pub pod_link: Option<String>,
}

/// Which tracking rows feed the POD sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PodQuery {
    /// Every tracking row of the declaration.
    AllTracking,
    /// Only the lowest-index tracking row (declaration-only service).
    FirstTracking,
}

impl PodQuery {
    /// Picks the POD query for a reference service key.
    #[must_use]
    pub fn for_service_key(service_key: Option<&str>) -> Self {
        match service_key {
            Some(key) if key == DECLARATION_ONLY => Self::FirstTracking,
            _ => Self::AllTracking,
        }
    }
}
