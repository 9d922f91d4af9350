use crate::commands::{print_json, Context};
use crate::error::{invalid_input, not_found};
use crate::util::{format_timestamp_datetime, now_utc, parse_company_id, parse_contact, parse_key_value};
use anyhow::Result;
use clap::{Args, Subcommand};
use dialdesk_core::domain::{Company, CompanyDraft, ContactPair, MAX_CONTACT_PAIRS};
use dialdesk_store::repo::CompanyUpdate;
use std::collections::BTreeMap;

#[derive(Debug, Subcommand)]
pub enum CompanyCommand {
    Add(AddCompanyArgs),
    Edit(EditCompanyArgs),
    Show(CompanyRefArgs),
    List(ListCompaniesArgs),
    Delete(CompanyRefArgs),
}

#[derive(Debug, Args)]
pub struct AddCompanyArgs {
    #[arg(long)]
    pub code: String,
    #[arg(long)]
    pub name: String,
    /// Contact person and phone, up to three
    #[arg(long, value_name = "PERSON=PHONE")]
    pub contact: Vec<String>,
    #[arg(long, value_name = "KEY=VALUE")]
    pub tender: Vec<String>,
}

#[derive(Debug, Args)]
pub struct EditCompanyArgs {
    /// Company id or identification code
    pub company: String,
    #[arg(long)]
    pub code: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    /// Replaces every contact
    #[arg(long, value_name = "PERSON=PHONE")]
    pub contact: Vec<String>,
    #[arg(long, conflicts_with = "contact")]
    pub clear_contacts: bool,
    #[arg(long, value_name = "KEY=VALUE")]
    pub tender: Vec<String>,
    #[arg(long, value_name = "KEY")]
    pub remove_tender: Vec<String>,
}

#[derive(Debug, Args)]
pub struct CompanyRefArgs {
    /// Company id or identification code
    pub company: String,
}

#[derive(Debug, Args)]
pub struct ListCompaniesArgs {
    /// Matches name, code, contact person or phone
    #[arg(long)]
    pub search: Option<String>,
}

pub fn add_company(ctx: &Context<'_>, args: AddCompanyArgs) -> Result<()> {
    let draft = CompanyDraft {
        identification_code: args.code,
        name: args.name,
        contacts: parse_contacts(&args.contact)?,
        tender: parse_tender(&args.tender)?,
    };
    let company = ctx.store.companies().create(now_utc(), draft)?;
    if ctx.json {
        print_json(&company)?;
    } else {
        println!("created {} {}", company.identification_code, company.name);
    }
    Ok(())
}

pub fn edit_company(ctx: &Context<'_>, args: EditCompanyArgs) -> Result<()> {
    let existing = resolve_company(ctx, &args.company)?;

    let mut update = CompanyUpdate {
        identification_code: args.code,
        name: args.name,
        ..Default::default()
    };
    if args.clear_contacts {
        update.contacts = Some(Vec::new());
    } else if !args.contact.is_empty() {
        update.contacts = Some(parse_contacts(&args.contact)?);
    }
    if !args.tender.is_empty() || !args.remove_tender.is_empty() {
        let mut tender = existing.tender.clone();
        tender.extend(parse_tender(&args.tender)?);
        for key in &args.remove_tender {
            tender.remove(key.trim());
        }
        update.tender = Some(tender);
    }

    if update.identification_code.is_none()
        && update.name.is_none()
        && update.contacts.is_none()
        && update.tender.is_none()
    {
        return Err(invalid_input("no updates provided"));
    }

    let company = ctx.store.companies().update(now_utc(), &existing.id, update)?;
    if ctx.json {
        print_json(&company)?;
    } else {
        println!("updated {} {}", company.identification_code, company.name);
    }
    Ok(())
}

pub fn show_company(ctx: &Context<'_>, args: CompanyRefArgs) -> Result<()> {
    let company = resolve_company(ctx, &args.company)?;
    if ctx.json {
        return print_json(&company);
    }

    println!("{} ({})", company.name, company.identification_code);
    println!("id: {}", company.id);
    for (index, contact) in company.contacts.iter().enumerate() {
        println!("contact {}: {}", index + 1, format_contact(contact));
    }
    for (key, value) in &company.tender {
        println!("{key}: {value}");
    }
    println!("updated: {}", format_timestamp_datetime(company.updated_at));
    Ok(())
}

pub fn list_companies(ctx: &Context<'_>, args: ListCompaniesArgs) -> Result<()> {
    let companies = ctx.store.companies().list(args.search.as_deref())?;
    if ctx.json {
        return print_json(&companies);
    }
    if companies.is_empty() {
        println!("No companies.");
        return Ok(());
    }
    for company in &companies {
        let contacts: Vec<String> = company.contacts.iter().map(format_contact).collect();
        println!(
            "{}  {}  {}",
            company.identification_code,
            company.name,
            contacts.join("; ")
        );
    }
    Ok(())
}

pub fn delete_company(ctx: &Context<'_>, args: CompanyRefArgs) -> Result<()> {
    let company = resolve_company(ctx, &args.company)?;
    ctx.store.companies().delete(&company.id)?;
    if ctx.json {
        return print_json(&company);
    }
    println!("deleted {} {}", company.identification_code, company.name);
    Ok(())
}

fn resolve_company(ctx: &Context<'_>, reference: &str) -> Result<Company> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(invalid_input("company id or code cannot be empty"));
    }
    let by_id = match parse_company_id(reference) {
        Some(id) => ctx.store.companies().get(&id)?,
        None => None,
    };
    match by_id {
        Some(company) => Ok(company),
        None => ctx
            .store
            .companies()
            .find_by_code(reference)?
            .ok_or_else(|| not_found(format!("company {reference}"))),
    }
}

fn parse_contacts(raw: &[String]) -> Result<Vec<ContactPair>> {
    if raw.len() > MAX_CONTACT_PAIRS {
        return Err(invalid_input(format!(
            "at most {MAX_CONTACT_PAIRS} contacts are allowed"
        )));
    }
    raw.iter().map(|value| parse_contact(value)).collect()
}

fn parse_tender(raw: &[String]) -> Result<BTreeMap<String, String>> {
    raw.iter().map(|value| parse_key_value(value)).collect()
}

fn format_contact(contact: &ContactPair) -> String {
    match (contact.person.is_empty(), contact.phone.is_empty()) {
        (false, false) => format!("{} {}", contact.person, contact.phone),
        (false, true) => contact.person.clone(),
        _ => contact.phone.clone(),
    }
}
