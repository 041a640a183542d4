//! Row assembly: joins declaration records into flat sheet rows.

use std::sync::Arc;

use tracing::warn;

use super::error::{Collected, IcpError};
use super::repository::DeclarationRepository;
use super::resolver::{ResolvedTax, TaxResolver};
use super::types::{
    BaseInfo, Delivery, Importer, PodFileObject, PodQuery, ProcessCode, TaxFileObject, TaxLine,
    TaxObject,
};

const CUSTOMS_ID_PLACEHOLDER: &str = "{customs_id}";

/// Tax receipt link templates per declaring country.
#[derive(Debug, Clone)]
pub struct ReceiptLinks {
    nl: String,
    be: String,
}

impl ReceiptLinks {
    /// Templates containing a `{customs_id}` placeholder.
    #[must_use]
    pub fn new(nl: impl Into<String>, be: impl Into<String>) -> Self {
        Self {
            nl: nl.into(),
            be: be.into(),
        }
    }

    /// Link for a declaration, or `None` for countries without online receipts.
    #[must_use]
    pub fn link_for(&self, declare_country: &str, customs_id: &str) -> Option<String> {
        let template = match declare_country {
            "NL" => &self.nl,
            "BE" => &self.be,
            _ => return None,
        };
        Some(fill(template, customs_id))
    }

    /// NL link regardless of country, used by the VAT-scoped variant.
    #[must_use]
    pub fn nl_link(&self, customs_id: &str) -> String {
        fill(&self.nl, customs_id)
    }
}

fn fill(template: &str, customs_id: &str) -> String {
    template.replace(CUSTOMS_ID_PLACEHOLDER, customs_id)
}

/// Everything one declaration contributes to a workbook.
#[derive(Debug, Clone)]
pub struct AssembledDeclaration {
    /// Customs declaration id.
    pub customs_id: String,
    /// Process code of the selected tax data.
    pub process_code: String,
    /// One row per tax line.
    pub rows: Vec<TaxObject>,
    /// Tax receipt row, when the declaring country has one.
    pub tax_file: Option<TaxFileObject>,
    /// Proof-of-delivery rows.
    pub pods: Vec<PodFileObject>,
}

impl AssembledDeclaration {
    /// Processing status recorded in the membership table.
    #[must_use]
    pub fn tax_type(&self) -> u32 {
        ProcessCode::parse(&self.process_code)
            .unwrap_or(ProcessCode::TmpTax)
            .processing_status()
    }
}

/// Joins base, tax, importer, delivery, and company data into sheet rows.
///
/// Produces one row per tax line; declaration-level fields repeat on every row.
#[must_use]
pub fn combine_rows(
    base: &BaseInfo,
    lines: &[TaxLine],
    importer: &Importer,
    delivery: &Delivery,
    company_name: &str,
    in_icp_files: &str,
    has_inspection_fine: bool,
) -> Vec<TaxObject> {
    let fine = if has_inspection_fine { "Yes" } else { "" };

    lines
        .iter()
        .map(|line| TaxObject {
            bill_no: base.bill_no.clone(),
            tax_type: line.tax_type.clone(),
            item_number: line.item_number.clone(),
            destined: line.destined.clone(),
            process_code: line.process_code.clone(),
            customs_id: base.customs_id.clone(),
            invoice_date: line.invoice_date.clone(),
            currency: line.currency.clone(),
            local_currency_value: line.declared_amount,
            import_duty: line.import_duty,
            dutch_cost: line.dutch_cost.clone(),
            dutch_vat: line.dutch_vat.clone(),
            hs_code: line.hs_code.clone(),
            net_weight: line.net_weight,
            quantity: line.quantity,
            country_prefix: line.country_prefix.clone(),
            duty_party: base.duty_party.clone(),
            partner_name: base.partner_name.clone(),
            country_of_destination: delivery.country.clone(),
            vat_no: importer.vat_no.clone(),
            eori_no: importer.eori_no.clone(),
            importer_address_code: importer.address_code.clone(),
            address_code: delivery.address_code.clone(),
            address_detail: delivery.address_detail.clone(),
            postal_code: delivery.postal_code.clone(),
            city: delivery.city.clone(),
            product_no: line.product_no.clone(),
            description: line.description.clone(),
            mrn: base.mrn.clone(),
            company_name: company_name.to_string(),
            mode: base.mode.clone(),
            in_icp_files: in_icp_files.to_string(),
            has_inspection_fine: fine.to_string(),
        })
        .collect()
}

/// Gathers and joins everything one declaration contributes.
pub struct DeclarationAssembler<R: DeclarationRepository> {
    repo: Arc<R>,
    resolver: TaxResolver<R>,
    links: ReceiptLinks,
}

impl<R: DeclarationRepository> DeclarationAssembler<R> {
    /// Create a new assembler.
    #[must_use]
    pub fn new(repo: Arc<R>, links: ReceiptLinks) -> Self {
        Self {
            resolver: TaxResolver::new(Arc::clone(&repo)),
            repo,
            links,
        }
    }

    /// Assembles one declaration.
    ///
    /// Missing or failed auxiliary lookups become accumulated errors and empty fields.
    ///
    /// # Errors
    ///
    /// Returns [`IcpError::TaxUnresolved`] when no tax data could be resolved; the declaration
    /// then contributes nothing and that single error is all that is reported for it.
    pub async fn assemble(
        &self,
        customs_id: &str,
    ) -> Result<Collected<AssembledDeclaration>, IcpError> {
        let ResolvedTax {
            process_code,
            lines,
            ..
        } = self.resolver.resolve(customs_id).await?;

        let mut errors = Vec::new();
        let base = required(
            self.repo.base_info(customs_id).await,
            "base info",
            customs_id,
            &mut errors,
        );
        let importer = required(
            self.repo.importer(customs_id).await,
            "importer",
            customs_id,
            &mut errors,
        );
        let delivery = required(
            self.repo.delivery(customs_id).await,
            "delivery address",
            customs_id,
            &mut errors,
        );
        let company = required(
            self.repo.company_name(customs_id).await,
            "company",
            customs_id,
            &mut errors,
        );
        let has_fine = match self.repo.inspection_fine_count(customs_id).await {
            Ok(count) => count > 0,
            Err(e) => {
                errors.push(IcpError::lookup("inspection fine", customs_id, &e));
                false
            }
        };
        let in_icp = match self.repo.icp_names_containing(customs_id).await {
            Ok(names) => names.unwrap_or_default(),
            Err(e) => {
                warn!(customs_id, error = %e, "ICP membership lookup failed");
                String::new()
            }
        };

        let mut base = base;
        if base.customs_id.is_empty() {
            base.customs_id = customs_id.to_string();
        }

        let rows = combine_rows(
            &base, &lines, &importer, &delivery, &company, &in_icp, has_fine,
        );

        let tax_type = ProcessCode::parse(&process_code)
            .unwrap_or(ProcessCode::TmpTax)
            .processing_status();
        let tax_file = self
            .links
            .link_for(&base.declare_country, customs_id)
            .map(|link| TaxFileObject {
                customs_id: customs_id.to_string(),
                mrn: base.mrn.clone(),
                tax_type,
                link,
            });

        let pods = match self.pods(customs_id).await {
            Ok(pods) => pods,
            Err(e) => {
                warn!(customs_id, error = %e, "Tracking POD lookup failed");
                Vec::new()
            }
        };

        Ok(Collected {
            value: AssembledDeclaration {
                customs_id: customs_id.to_string(),
                process_code,
                rows,
                tax_file,
                pods,
            },
            errors,
        })
    }

    /// Tracking rows, following the declaration-only rule when the service key says so.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracking query fails.
    pub async fn pods(&self, customs_id: &str) -> Result<Vec<PodFileObject>, IcpError> {
        pods_for(self.repo.as_ref(), customs_id).await
    }
}

/// Tracking rows of a declaration. A failed service key lookup counts as an ordinary service.
pub(crate) async fn pods_for<R: DeclarationRepository>(
    repo: &R,
    customs_id: &str,
) -> Result<Vec<PodFileObject>, IcpError> {
    let service_key = match repo.service_key(customs_id).await {
        Ok(key) => key,
        Err(e) => {
            warn!(customs_id, error = %e, "Service key lookup failed");
            None
        }
    };
    let query = PodQuery::for_service_key(service_key.as_deref());
    repo.pod_records(customs_id, query).await
}

fn required<T: Default>(
    result: Result<Option<T>, IcpError>,
    what: &'static str,
    customs_id: &str,
    errors: &mut Vec<IcpError>,
) -> T {
    match result {
        Ok(Some(value)) => value,
        Ok(None) => {
            errors.push(IcpError::missing(what, customs_id));
            T::default()
        }
        Err(e) => {
            errors.push(IcpError::lookup(what, customs_id, &e));
            T::default()
        }
    }
}
