//! MySQL statements.
//!
//! Every statement binds positional `?` parameters. Columns are aliased to the field names of
//! the row structs that decode them; integers are cast to `SIGNED` and amounts to `DECIMAL`
//! so decoding does not depend on the column types of a particular schema revision.

// ============================================================
// Declarations
// ============================================================

pub const DUTY_PARTIES_FOR_MONTH: &str = r"
SELECT DISTINCT c.duty_party AS value
FROM log_clearance_process lcp
         INNER JOIN base_customs c ON lcp.customs_id = c.customs_id
WHERE LENGTH(c.duty_party) > 5
  AND DATE_FORMAT(lcp.gmt_create, '%Y-%m') = ?
  AND lcp.process_code IN ('TAX', 'TMP_TAX')";

/// Master declarations only; children of a split filing are excluded.
pub const ELIGIBLE_CUSTOMS_IDS: &str = r"
SELECT DISTINCT c.customs_id AS value
FROM base_customs c
         INNER JOIN stats_customs_info sci ON c.customs_id = sci.customs_id
         INNER JOIN log_clearance_process lcp ON lcp.customs_id = c.customs_id
WHERE c.declare_version = 0
  AND c.duty_party = ?
  AND sci.is_master = 1
  AND DATE_FORMAT(lcp.gmt_create, '%Y-%m') = ?
  AND lcp.process_code IN ('TAX', 'TMP_TAX')";

pub const HAS_SPLIT: &str = r"
SELECT CAST(has_split AS SIGNED) AS total
FROM stats_customs_info
WHERE customs_id = ?";

const TAX_COLUMNS: &str = r"
SELECT bct.tax_type,
       CAST(bct.itemnr AS CHAR)                         AS item_number,
       IF(bct.tax_type = 'B00', '3b', '4a')             AS destined,
       CAST(bct.declared_amount AS DECIMAL(20, 6))      AS declared_amount,
       CAST(bct.tax_fee AS DECIMAL(20, 6))              AS import_duty,
       IF(bct.tax_type = 'A00', '0.00', 't.b.d.')       AS dutch_cost,
       '0.00'                                           AS dutch_vat,
       IF(bct.tax_type = 'A00', 'NL', '')               AS country_prefix,
       lcp.process_code,
       DATE_FORMAT(lcp.gmt_create, '%Y/%m/%d')          AS invoice_date,
       sca.product_no,";

/// Articles joined through their value process; the HS code may be overridden there.
pub fn eu_linked_tax() -> String {
    format!(
        "{TAX_COLUMNS}
       IFNULL(scvp.hs_code, sca.hs_code)                AS hs_code,
       CAST(sca.net_weight AS DECIMAL(20, 6))           AS net_weight,
       CAST(sca.quantity AS SIGNED)                     AS quantity,
       bd.description,
       'EUR'                                            AS currency
FROM log_clearance_process lcp
         INNER JOIN base_customs_tax bct ON bct.customs_id = lcp.customs_id AND
                                            IF(lcp.process_code = 'TAX', bct.processing_status = 4,
                                               bct.processing_status = 115)
         INNER JOIN service_customs_article sca ON bct.customs_id = sca.customs_id AND bct.itemnr = sca.item_number
         INNER JOIN service_customs_value_process scvp ON sca.customs_value_process_id = scvp.id
         INNER JOIN base_description bd ON scvp.description_id = bd.id
WHERE lcp.customs_id = ? AND lcp.process_code = ?
ORDER BY bct.itemnr, bct.tax_type"
    )
}

/// Articles joined to descriptions by product number and country.
pub fn non_eu_tax() -> String {
    format!(
        "{TAX_COLUMNS}
       sca.hs_code,
       CAST(sca.net_weight AS DECIMAL(20, 6))           AS net_weight,
       CAST(sca.quantity AS SIGNED)                     AS quantity,
       bd.description,
       'EUR'                                            AS currency
FROM log_clearance_process lcp
         INNER JOIN base_customs_tax bct ON bct.customs_id = lcp.customs_id AND
                                            IF(lcp.process_code = 'TAX', bct.processing_status = 4,
                                               bct.processing_status = 115)
         INNER JOIN service_customs_article sca ON bct.customs_id = sca.customs_id AND bct.itemnr = sca.item_number
         INNER JOIN base_description bd ON sca.product_no = bd.product_no AND bd.country = sca.country
WHERE lcp.customs_id = ? AND lcp.process_code = ?
ORDER BY bct.itemnr, bct.tax_type"
    )
}

/// Split filings map tax items to articles through the supply-article table.
pub fn split_tax() -> String {
    format!(
        "{TAX_COLUMNS}
       IFNULL(scvp.hs_code, sca.hs_code)                AS hs_code,
       CAST(sca.net_weight AS DECIMAL(20, 6))           AS net_weight,
       CAST(sca.quantity AS SIGNED)                     AS quantity,
       bd.description,
       'EUR'                                            AS currency
FROM log_clearance_process lcp
         INNER JOIN base_customs_tax bct ON bct.customs_id = lcp.customs_id AND
                                            IF(lcp.process_code = 'TAX', bct.processing_status = 4,
                                               bct.processing_status = 115)
         INNER JOIN service_customs_supply_article scsa ON bct.customs_id = scsa.customs_id AND bct.itemnr = scsa.item
         INNER JOIN service_customs_article sca ON scsa.article_id = sca.id
         INNER JOIN service_customs_value_process scvp ON sca.customs_value_process_id = scvp.id
         INNER JOIN base_description bd ON scvp.description_id = bd.id
WHERE lcp.customs_id = ? AND lcp.process_code = ?
ORDER BY bct.itemnr, bct.tax_type"
    )
}

pub const BASE_INFO: &str = r"
SELECT bc.customs_id,
       bc.declare_country,
       bc.mrn,
       bc.duty_party,
       bb.bill_no,
       bb.mode,
       cta.name AS partner_name
FROM base_customs bc
         INNER JOIN service_bill_customs sbc ON sbc.is_removed = 0 AND bc.customs_id = sbc.customs_id
         INNER JOIN base_bill bb ON sbc.bill_id = bb.bill_id
         LEFT JOIN config_tax_agency cta ON bc.duty_party = cta.vat_number
WHERE bc.customs_id = ?
LIMIT 1";

pub const IMPORTER: &str = r"
SELECT bc.vat_no,
       a.eori_no,
       a.address_code
FROM service_customs_address sca
         INNER JOIN base_customs bc ON sca.customs_id = bc.customs_id
         INNER JOIN base_address a ON sca.address_code = a.address_code
WHERE sca.customs_id = ?
  AND sca.type = 'IMPORTER'
LIMIT 1";

pub const DELIVERY: &str = r"
SELECT a.address_code,
       a.country,
       a.city,
       CONCAT(IFNULL(a.address_line1, ''), IFNULL(a.address_line2, ''), IFNULL(a.address_line3, '')) AS address_detail,
       a.postal_code
FROM service_customs_address sca
         INNER JOIN base_address a ON sca.address_code = a.address_code
WHERE sca.customs_id = ?
  AND sca.type = 'DELIVERY'
LIMIT 1";

pub const COMPANY_NAME: &str = r"
SELECT bc.name AS value
FROM base_customs c
         INNER JOIN base_declaration_log bdl ON c.declaration_id = bdl.declaration_id
         INNER JOIN base_company bc ON bdl.company_id = bc.id
WHERE c.customs_id = ?
LIMIT 1";

pub const INSPECTION_FINE_COUNT: &str = r"
SELECT COUNT(1) AS total
FROM log_clearance_process
WHERE customs_id = ?
  AND process_code = 'INSPECTION_FINE'";

pub const ICP_NAMES_CONTAINING: &str = r"
SELECT CAST(GROUP_CONCAT(DISTINCT sic.icp_name) AS CHAR) AS value
FROM service_icp_customs sic
WHERE sic.customs_id = ?
GROUP BY sic.customs_id";

pub const SERVICE_KEY: &str = r"
SELECT br.service_key AS value
FROM base_reference_tracking t
         INNER JOIN base_reference br ON t.reference = br.reference
WHERE t.customs_id = ?
ORDER BY t.index_no
LIMIT 1";

const POD_COLUMNS: &str = r"
SELECT b.bill_no,
       c.customs_id,
       c.mrn,
       t.tracking_no,
       bf.uri AS pod_link
FROM base_reference_tracking t
         INNER JOIN base_bill b ON t.bill_id = b.bill_id
         INNER JOIN base_customs c ON t.customs_id = c.customs_id
         LEFT JOIN base_track_logistics_info btli ON t.tracking_no = btli.tracking_no AND btli.index_no = 0
         LEFT JOIN base_file bf ON bf.id = btli.file_id
WHERE t.customs_id = ?";

pub fn pod_all_tracking() -> String {
    format!("{POD_COLUMNS}\nORDER BY t.index_no")
}

/// Declaration-only service: the lowest-index tracking row alone.
pub fn pod_first_tracking() -> String {
    format!("{POD_COLUMNS}\nORDER BY t.index_no\nLIMIT 1")
}

pub const NEEDS_VAT_NOTE: &str = r"
SELECT CAST(is_need_vat_note AS SIGNED) AS total
FROM config_tax_agency
WHERE vat_number = ?
LIMIT 1";

// ============================================================
// Generation ledger
// ============================================================

pub const COUNT_FOR_PERIOD: &str = r"
SELECT COUNT(*) AS total
FROM service_icp
WHERE duty_part = ? AND year = ? AND month = ?";

pub const CLEAR_NEWEST: &str = r"
UPDATE service_icp SET is_newest = 0
WHERE duty_part = ? AND year = ? AND month = ?";

pub const INSERT_GENERATION: &str = r"
INSERT INTO service_icp (duty_part, name, year, month, icp_date, total, status, vat_note, is_newest)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";

pub const INSERT_MEMBERSHIP: &str = r"
INSERT INTO service_icp_customs (icp_name, xml_id, customs_id, tax_type, in_excel)
VALUES (?, '', ?, ?, ?)";

// ============================================================
// Audit
// ============================================================

pub const SUBMITTED_CUSTOMS_IDS: &str = r"
SELECT DISTINCT customs_id AS value
FROM log_customs_state
WHERE state = 'SUBMITTED'
  AND DATE_FORMAT(gmt_create, '%Y-%m') = ?";

pub const AUDIT_RECORD: &str = r"
SELECT bb.bill_no,
       sca.customs_id,
       bc.mrn,
       CAST(sca.item_number AS CHAR)                    AS item_number,
       IFNULL(scvp.hs_code, sca.hs_code)                AS hs_code,
       CAST(scvp.eu_duty_rate AS DECIMAL(20, 6))        AS duty_rate_override,
       CAST(sca.duty_amount AS DECIMAL(20, 6))          AS duty_amount,
       CAST(sca.final_declared_value AS DECIMAL(20, 6)) AS declared_value,
       sca.product_no,
       bd.web_link,
       bd.description,
       scvp.price_screenshot
FROM service_customs_article sca
         INNER JOIN base_description bd ON sca.product_no = bd.product_no AND sca.country = bd.country
         INNER JOIN base_customs bc ON sca.customs_id = bc.customs_id
         LEFT JOIN service_bill_customs sbc ON sca.customs_id = sbc.customs_id
         LEFT JOIN base_bill bb ON sbc.bill_id = bb.bill_id
         LEFT JOIN service_customs_value_process scvp ON sca.customs_value_process_id = scvp.id
WHERE sca.customs_id = ?
ORDER BY sca.id
LIMIT 1";

// ============================================================
// VAT history (declarations filed before the split schema)
// ============================================================

pub const CUSTOMS_IDS_FOR_VAT: &str = r"
SELECT DISTINCT c.customs_id AS value
FROM base_address a
         LEFT JOIN base_customs c ON a.address_code = c.importer
WHERE a.vat_no = ?
  AND c.declare_version = 1
  AND c.declare_status = 'NORMAL'
  AND c.customs_id IS NOT NULL
  AND c.mrn IS NOT NULL";

pub const HISTORICAL_ROWS: &str = r"
SELECT b.bill_no,
       ta.tax_type,
       CAST(ta.itemnr AS CHAR)                                  AS item_number,
       IF(ta.tax_type = 'A00', '4a', '3b')                      AS destined,
       CAST(ta.processing_status AS SIGNED)                     AS processing_status,
       IF(ta.processing_status = 4, 'TAX', 'TMP_TAX')           AS process_code,
       c.customs_id,
       DATE_FORMAT(sct.status_time, '%Y/%m/%d')                 AS invoice_date,
       'EUR'                                                    AS currency,
       CAST(ta.declared_amount AS DECIMAL(20, 6))               AS local_currency_value,
       CAST(ta.tax_fee AS DECIMAL(20, 6))                       AS import_duty,
       IF(ta.tax_type = 'A00', '0.00', 't.b.d.')                AS dutch_cost,
       '0.00'                                                   AS dutch_vat,
       bdc.commodity_code                                       AS hs_code,
       CAST(cii.net_weight AS DECIMAL(20, 6))                   AS net_weight,
       CAST(cd.product_qty AS SIGNED)                           AS quantity,
       IF(ta.tax_type = 'A00', 'NL', '')                        AS country_prefix,
       cid.domestic_duty_taxparty                               AS duty_party,
       cdd.name                                                 AS partner_name,
       IF(ta.tax_type = 'A00', 'NL', ca.country)                AS country_of_destination,
       vat_a.vat_no,
       vat_a.eori_no,
       vat_a.address_code                                       AS importer_address_code,
       ca.address_code,
       CONCAT(IFNULL(ca.address_line1, ''), IFNULL(ca.address_line2, ''),
              IFNULL(ca.address_line3, ''))                     AS address_detail,
       ca.postal_code,
       ca.city,
       cd.product_no,
       d.description,
       c.mrn,
       IFNULL(com.name, '')                                     AS company_name,
       b.mode
FROM base_customs c
         INNER JOIN base_declaration_log dl ON dl.declaration_id = c.declaration_id
         INNER JOIN base_company com ON com.id = dl.company_id
         INNER JOIN base_reference_tracking t
                    ON t.customs_id = c.customs_id AND IF(c.type = 0, t.index_no = 1, t.tracking_no = c.customs_id)
         INNER JOIN base_bill b ON b.bill_id = t.bill_id
         INNER JOIN base_reference r ON r.reference = t.reference
         INNER JOIN base_address ca ON ca.address_code = r.consignee_address_code
         INNER JOIN service_customs_tax sct ON c.customs_id = sct.customs_id
         INNER JOIN base_customs_tax ta ON ta.xml_id = sct.xml_id AND ta.processing_status = c.tax_type
         LEFT JOIN base_customs_import_declaration cid ON cid.dossiernr = c.customs_id
         LEFT JOIN base_config_domestic_duty cdd ON cdd.domestic_duty_part = cid.domestic_duty_taxparty
         LEFT JOIN base_address vat_a ON cid.importer_code = vat_a.address_code
         LEFT JOIN base_customs_description cd ON cd.customs_id = c.customs_id AND cd.index_no = ta.itemnr
         INNER JOIN base_customs_import_item cii ON cii.customs_id = cd.customs_id AND cii.itemnr = cd.index_no
         LEFT JOIN base_description_code bdc ON bdc.status = 0 AND bdc.country = IF(
                c.sales_channel = 'OTHER' OR c.sales_channel = 'B2B', 'NL', ca.country) AND bdc.asin_no = cd.product_no
         LEFT JOIN base_description d ON d.product_no = bdc.asin_no AND d.country = IF(
                c.sales_channel = 'OTHER' OR c.sales_channel = 'B2B', 'NL', ca.country)
WHERE c.customs_id = ?
ORDER BY c.id, cd.index_no, ta.tax_type";
