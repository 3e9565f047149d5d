//! Local user command implementations

use anyhow::Result;
use spendwise_core::{Database, Session};

use super::storage;

pub fn cmd_login(db: &Database, email: &str, name: Option<&str>) -> Result<()> {
    let user = Session::new(storage(db)).login(email, name.unwrap_or_default())?;
    println!("👋 Logged in as {} <{}>", user.name, user.email);
    Ok(())
}

pub fn cmd_logout(db: &Database) -> Result<()> {
    Session::new(storage(db)).logout()?;
    println!("👋 Logged out");
    Ok(())
}

pub fn cmd_whoami(db: &Database) -> Result<()> {
    match Session::new(storage(db)).current_user()? {
        Some(user) => println!("{} <{}>", user.name, user.email),
        None => println!("Not logged in. Use: spendwise login <email>"),
    }
    Ok(())
}
