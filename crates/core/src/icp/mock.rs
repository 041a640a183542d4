//! In-memory repositories for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use icp_shared::ReportMonth;
use rust_decimal::Decimal;

use super::error::IcpError;
use super::generation::{GenerationMembership, GenerationRecord, PeriodKey};
use super::repository::{DeclarationRepository, GenerationRepository};
use super::types::{
    BaseInfo, DeclarationKind, Delivery, Importer, PodFileObject, PodQuery, ProcessCode, TaxLine,
    TaxQuery,
};

type TaxKey = (TaxQuery, String, ProcessCode);

/// A tax line with the given item number, tax type, and process code.
pub fn line(item: &str, tax_type: &str, process_code: &str) -> TaxLine {
    TaxLine {
        tax_type: tax_type.to_string(),
        item_number: item.to_string(),
        destined: "4a".to_string(),
        declared_amount: Decimal::new(10_050, 2),
        import_duty: Decimal::new(1_256, 2),
        dutch_cost: "0.00".to_string(),
        dutch_vat: "0.00".to_string(),
        country_prefix: "NL".to_string(),
        process_code: process_code.to_string(),
        invoice_date: "2022/09/01".to_string(),
        product_no: format!("P-{item}"),
        hs_code: "6109100010".to_string(),
        net_weight: Decimal::new(1_500, 3),
        quantity: 2,
        description: "T-shirt".to_string(),
        currency: "EUR".to_string(),
    }
}

/// Mock declaration source.
#[derive(Default)]
pub struct MockDeclarations {
    pub duty_parties: Vec<String>,
    pub eligible: HashMap<String, Vec<String>>,
    pub kinds: HashMap<String, DeclarationKind>,
    pub kind_failures: HashSet<String>,
    pub tax: HashMap<TaxKey, Vec<TaxLine>>,
    pub tax_failures: HashSet<TaxKey>,
    pub bases: HashMap<String, BaseInfo>,
    pub importers: HashMap<String, Importer>,
    pub deliveries: HashMap<String, Delivery>,
    pub companies: HashMap<String, String>,
    pub fines: HashMap<String, u64>,
    pub icp_names: HashMap<String, String>,
    pub service_keys: HashMap<String, String>,
    pub pods: HashMap<(String, PodQuery), Vec<PodFileObject>>,
    pub pod_failures: HashSet<String>,
    pub vat_note_parties: HashSet<String>,
    calls: Mutex<Vec<(TaxQuery, ProcessCode)>>,
}

impl MockDeclarations {
    pub fn tax_rows(&mut self, query: TaxQuery, id: &str, code: ProcessCode, rows: Vec<TaxLine>) {
        self.tax.insert((query, id.to_string(), code), rows);
    }

    pub fn fail_tax(&mut self, query: TaxQuery, id: &str, code: ProcessCode) {
        self.tax_failures.insert((query, id.to_string(), code));
    }

    /// Registers a fully populated declaration with official EU-linked tax lines.
    pub fn declaration(&mut self, id: &str, duty_party: &str, country: &str, items: &[&str]) {
        self.bases.insert(
            id.to_string(),
            BaseInfo {
                customs_id: id.to_string(),
                declare_country: country.to_string(),
                mrn: format!("MRN-{id}"),
                duty_party: duty_party.to_string(),
                bill_no: format!("BILL-{id}"),
                mode: "AIR".to_string(),
                partner_name: "Agency BV".to_string(),
            },
        );
        self.importers.insert(
            id.to_string(),
            Importer {
                vat_no: "DE123456789".to_string(),
                eori_no: "DE1234567890123".to_string(),
                address_code: format!("IMP-{id}"),
            },
        );
        self.deliveries.insert(
            id.to_string(),
            Delivery {
                address_code: format!("DLV-{id}"),
                country: "DE".to_string(),
                city: "Berlin".to_string(),
                address_detail: "Hauptstrasse 1".to_string(),
                postal_code: "10115".to_string(),
            },
        );
        self.companies
            .insert(id.to_string(), "Shipper Ltd".to_string());
        let lines = items.iter().map(|item| line(item, "A00", "TAX")).collect();
        self.tax_rows(TaxQuery::EuLinked, id, ProcessCode::Tax, lines);
    }

    pub fn tax_calls(&self) -> Vec<(TaxQuery, ProcessCode)> {
        self.calls.lock().unwrap().clone()
    }
}

impl DeclarationRepository for MockDeclarations {
    async fn duty_parties_for_month(&self, _month: ReportMonth) -> Result<Vec<String>, IcpError> {
        Ok(self.duty_parties.clone())
    }

    async fn eligible_customs_ids(
        &self,
        duty_party: &str,
        _month: ReportMonth,
    ) -> Result<Vec<String>, IcpError> {
        Ok(self.eligible.get(duty_party).cloned().unwrap_or_default())
    }

    async fn declaration_kind(&self, customs_id: &str) -> Result<DeclarationKind, IcpError> {
        if self.kind_failures.contains(customs_id) {
            return Err(IcpError::repository("stats lookup failed"));
        }
        Ok(self.kinds.get(customs_id).copied().unwrap_or_default())
    }

    async fn tax_lines(
        &self,
        query: TaxQuery,
        customs_id: &str,
        code: ProcessCode,
    ) -> Result<Vec<TaxLine>, IcpError> {
        self.calls.lock().unwrap().push((query, code));
        let key = (query, customs_id.to_string(), code);
        if self.tax_failures.contains(&key) {
            return Err(IcpError::repository("connection reset"));
        }
        Ok(self.tax.get(&key).cloned().unwrap_or_default())
    }

    async fn base_info(&self, customs_id: &str) -> Result<Option<BaseInfo>, IcpError> {
        Ok(self.bases.get(customs_id).cloned())
    }

    async fn importer(&self, customs_id: &str) -> Result<Option<Importer>, IcpError> {
        Ok(self.importers.get(customs_id).cloned())
    }

    async fn delivery(&self, customs_id: &str) -> Result<Option<Delivery>, IcpError> {
        Ok(self.deliveries.get(customs_id).cloned())
    }

    async fn company_name(&self, customs_id: &str) -> Result<Option<String>, IcpError> {
        Ok(self.companies.get(customs_id).cloned())
    }

    async fn inspection_fine_count(&self, customs_id: &str) -> Result<u64, IcpError> {
        Ok(self.fines.get(customs_id).copied().unwrap_or(0))
    }

    async fn icp_names_containing(&self, customs_id: &str) -> Result<Option<String>, IcpError> {
        Ok(self.icp_names.get(customs_id).cloned())
    }

    async fn service_key(&self, customs_id: &str) -> Result<Option<String>, IcpError> {
        Ok(self.service_keys.get(customs_id).cloned())
    }

    async fn pod_records(
        &self,
        customs_id: &str,
        query: PodQuery,
    ) -> Result<Vec<PodFileObject>, IcpError> {
        if self.pod_failures.contains(customs_id) {
            return Err(IcpError::repository("tracking lookup failed"));
        }
        Ok(self
            .pods
            .get(&(customs_id.to_string(), query))
            .cloned()
            .unwrap_or_default())
    }

    async fn needs_vat_note(&self, duty_party: &str) -> Result<bool, IcpError> {
        Ok(self.vat_note_parties.contains(duty_party))
    }
}

/// Mock generation store.
#[derive(Default)]
pub struct MockGenerations {
    pub records: Mutex<Vec<GenerationRecord>>,
    pub memberships: Mutex<Vec<GenerationMembership>>,
}

impl MockGenerations {
    pub fn records(&self) -> Vec<GenerationRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn memberships(&self) -> Vec<GenerationMembership> {
        self.memberships.lock().unwrap().clone()
    }
}

impl GenerationRepository for MockGenerations {
    async fn count_for_period(&self, key: &PeriodKey) -> Result<u64, IcpError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().filter(|r| r.period() == *key).count() as u64)
    }

    async fn clear_newest(&self, key: &PeriodKey) -> Result<u64, IcpError> {
        let mut records = self.records.lock().unwrap();
        let mut changed = 0;
        for record in records.iter_mut().filter(|r| r.period() == *key) {
            record.is_newest = false;
            changed += 1;
        }
        Ok(changed)
    }

    async fn insert_record(&self, record: &GenerationRecord) -> Result<(), IcpError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn insert_memberships(
        &self,
        memberships: &[GenerationMembership],
    ) -> Result<(), IcpError> {
        self.memberships
            .lock()
            .unwrap()
            .extend_from_slice(memberships);
        Ok(())
    }
}
