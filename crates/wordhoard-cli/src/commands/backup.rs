//! The `wordhoard backup` command.

use anyhow::{Context, Result};

use super::{finish, Session};

pub async fn execute(session: &Session) -> Result<()> {
    let engine = session.open().await?;
    finish(&engine).await?;

    let info = engine.backup().await.context("backup failed")?;
    println!("Backup written to {}", info.location.display());
    Ok(())
}
