use crate::commands::{print_json, Context};
use crate::error::not_found;
use crate::util::{format_timestamp_datetime, now_utc};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// Register an admin account with an already hashed password
    Add(AddAdminArgs),
    List,
    Delete(DeleteAdminArgs),
}

#[derive(Debug, Args)]
pub struct AddAdminArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password_hash: String,
}

#[derive(Debug, Args)]
pub struct DeleteAdminArgs {
    pub email: String,
}

pub fn add_admin(ctx: &Context<'_>, args: AddAdminArgs) -> Result<()> {
    let user = ctx
        .store
        .admin_users()
        .create(now_utc(), &args.email, &args.password_hash)?;
    if ctx.json {
        print_json(&user)?;
    } else {
        println!("created admin {}", user.email);
    }
    Ok(())
}

pub fn list_admins(ctx: &Context<'_>) -> Result<()> {
    let users = ctx.store.admin_users().list()?;
    if ctx.json {
        return print_json(&users);
    }
    if users.is_empty() {
        println!("No admin users.");
        return Ok(());
    }
    for user in &users {
        println!("{}  added {}", user.email, format_timestamp_datetime(user.created_at));
    }
    Ok(())
}

pub fn delete_admin(ctx: &Context<'_>, args: DeleteAdminArgs) -> Result<()> {
    let user = ctx
        .store
        .admin_users()
        .find_by_email(&args.email)?
        .ok_or_else(|| not_found(format!("admin user {}", args.email.trim())))?;
    ctx.store.admin_users().delete(&user.id)?;
    if ctx.json {
        return print_json(&user);
    }
    println!("deleted admin {}", user.email);
    Ok(())
}
