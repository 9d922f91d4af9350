use crate::error::{Result, StoreError};
use dialdesk_core::domain::company::validate_contacts;
use dialdesk_core::domain::{Company, CompanyDraft, CompanyId, ContactPair, MAX_CONTACT_PAIRS};
use dialdesk_core::CoreError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::str::FromStr;

const COMPANY_COLUMNS: &str = "id, identification_code, name,
    contact1_person, contact1_phone, contact2_person, contact2_phone, contact3_person, contact3_phone,
    tender, created_at, updated_at";

#[derive(Debug, Clone, Default)]
pub struct CompanyUpdate {
    pub identification_code: Option<String>,
    pub name: Option<String>,
    pub contacts: Option<Vec<ContactPair>>,
    pub tender: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

pub struct CompaniesRepo<'a> {
    conn: &'a Connection,
}

impl<'a> CompaniesRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn create(&self, now_utc: i64, draft: CompanyDraft) -> Result<Company> {
        let draft = draft.validated()?;
        if self.find_by_code(&draft.identification_code)?.is_some() {
            return Err(StoreError::DuplicateIdentificationCode(
                draft.identification_code,
            ));
        }
        let company = Company {
            id: CompanyId::new(),
            identification_code: draft.identification_code,
            name: draft.name,
            contacts: draft.contacts,
            tender: draft.tender,
            created_at: now_utc,
            updated_at: now_utc,
        };
        let slots = contact_slots(&company.contacts);
        self.conn.execute(
            "INSERT INTO companies
             (id, identification_code, name,
              contact1_person, contact1_phone, contact2_person, contact2_phone, contact3_person, contact3_phone,
              tender, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
            params![
                company.id.to_string(),
                company.identification_code,
                company.name,
                slots[0].0,
                slots[0].1,
                slots[1].0,
                slots[1].1,
                slots[2].0,
                slots[2].1,
                serde_json::to_string(&company.tender)?,
                company.created_at,
                company.updated_at
            ],
        )?;
        Ok(company)
    }

    pub fn get(&self, id: &CompanyId) -> Result<Option<Company>> {
        self.conn
            .query_row(
                &format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = ?1;"),
                [id.to_string()],
                read_company_row,
            )
            .optional()?
            .map(CompanyRow::into_company)
            .transpose()
    }

    pub fn find_by_code(&self, identification_code: &str) -> Result<Option<Company>> {
        self.conn
            .query_row(
                &format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE identification_code = ?1;"),
                [identification_code.trim()],
                read_company_row,
            )
            .optional()?
            .map(CompanyRow::into_company)
            .transpose()
    }

    pub fn update(&self, now_utc: i64, id: &CompanyId, update: CompanyUpdate) -> Result<Company> {
        let mut company = self
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(format!("company {id}")))?;

        if let Some(code) = update.identification_code {
            let code = code.trim().to_string();
            if code.is_empty() {
                return Err(CoreError::EmptyIdentificationCode.into());
            }
            if let Some(existing) = self.find_by_code(&code)? {
                if existing.id != company.id {
                    return Err(StoreError::DuplicateIdentificationCode(code));
                }
            }
            company.identification_code = code;
        }
        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(CoreError::EmptyCompanyName.into());
            }
            company.name = name;
        }
        if let Some(contacts) = update.contacts {
            company.contacts = validate_contacts(contacts)?;
        }
        if let Some(tender) = update.tender {
            company.tender = tender;
        }
        company.updated_at = now_utc;

        let slots = contact_slots(&company.contacts);
        self.conn.execute(
            "UPDATE companies
             SET identification_code = ?2, name = ?3,
                 contact1_person = ?4, contact1_phone = ?5,
                 contact2_person = ?6, contact2_phone = ?7,
                 contact3_person = ?8, contact3_phone = ?9,
                 tender = ?10, updated_at = ?11
             WHERE id = ?1;",
            params![
                company.id.to_string(),
                company.identification_code,
                company.name,
                slots[0].0,
                slots[0].1,
                slots[1].0,
                slots[1].1,
                slots[2].0,
                slots[2].1,
                serde_json::to_string(&company.tender)?,
                company.updated_at
            ],
        )?;
        Ok(company)
    }

    /// Creates the company, or replaces name and contacts of the one with the
    /// same identification code. Tender metadata is merged key by key.
    pub fn upsert_by_code(
        &self,
        now_utc: i64,
        draft: CompanyDraft,
    ) -> Result<(Company, UpsertOutcome)> {
        let draft = draft.validated()?;
        match self.find_by_code(&draft.identification_code)? {
            Some(existing) => {
                let mut tender = existing.tender.clone();
                tender.extend(draft.tender);
                let company = self.update(
                    now_utc,
                    &existing.id,
                    CompanyUpdate {
                        identification_code: None,
                        name: Some(draft.name),
                        contacts: Some(draft.contacts),
                        tender: Some(tender),
                    },
                )?;
                Ok((company, UpsertOutcome::Updated))
            }
            None => Ok((self.create(now_utc, draft)?, UpsertOutcome::Created)),
        }
    }

    pub fn delete(&self, id: &CompanyId) -> Result<()> {
        let removed = self
            .conn
            .execute("DELETE FROM companies WHERE id = ?1;", [id.to_string()])?;
        if removed == 0 {
            return Err(StoreError::NotFound(format!("company {id}")));
        }
        Ok(())
    }

    /// Lists companies by name. `search` matches name, code or any contact.
    pub fn list(&self, search: Option<&str>) -> Result<Vec<Company>> {
        let term = search.map(str::trim).filter(|term| !term.is_empty());
        let mut stmt = match term {
            Some(_) => self.conn.prepare(&format!(
                "SELECT {COMPANY_COLUMNS} FROM companies
                 WHERE name LIKE ?1 OR identification_code LIKE ?1
                    OR contact1_person LIKE ?1 OR contact1_phone LIKE ?1
                    OR contact2_person LIKE ?1 OR contact2_phone LIKE ?1
                    OR contact3_person LIKE ?1 OR contact3_phone LIKE ?1
                 ORDER BY name COLLATE NOCASE ASC, identification_code ASC;"
            ))?,
            None => self.conn.prepare(&format!(
                "SELECT {COMPANY_COLUMNS} FROM companies
                 ORDER BY name COLLATE NOCASE ASC, identification_code ASC;"
            ))?,
        };
        let rows = match term {
            Some(term) => stmt.query_map([format!("%{term}%")], read_company_row)?,
            None => stmt.query_map([], read_company_row)?,
        };
        let mut companies = Vec::new();
        for row in rows {
            companies.push(row?.into_company()?);
        }
        Ok(companies)
    }
}

type ContactSlot = (Option<String>, Option<String>);

fn contact_slots(contacts: &[ContactPair]) -> [ContactSlot; MAX_CONTACT_PAIRS] {
    let mut slots: [ContactSlot; MAX_CONTACT_PAIRS] = Default::default();
    for (slot, pair) in slots.iter_mut().zip(contacts) {
        *slot = (non_empty(&pair.person), non_empty(&pair.phone));
    }
    slots
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

struct CompanyRow {
    id: String,
    identification_code: String,
    name: String,
    slots: [ContactSlot; MAX_CONTACT_PAIRS],
    tender: String,
    created_at: i64,
    updated_at: i64,
}

impl CompanyRow {
    fn into_company(self) -> Result<Company> {
        let id = CompanyId::from_str(&self.id).map_err(|_| StoreError::InvalidId(self.id.clone()))?;
        let contacts = self
            .slots
            .into_iter()
            .map(|(person, phone)| ContactPair {
                person: person.unwrap_or_default(),
                phone: phone.unwrap_or_default(),
            })
            .filter(|pair| !pair.is_empty())
            .collect();
        Ok(Company {
            id,
            identification_code: self.identification_code,
            name: self.name,
            contacts,
            tender: serde_json::from_str(&self.tender)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn read_company_row(row: &Row<'_>) -> rusqlite::Result<CompanyRow> {
    Ok(CompanyRow {
        id: row.get(0)?,
        identification_code: row.get(1)?,
        name: row.get(2)?,
        slots: [
            (row.get(3)?, row.get(4)?),
            (row.get(5)?, row.get(6)?),
            (row.get(7)?, row.get(8)?),
        ],
        tender: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}
