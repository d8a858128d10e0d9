//! The `wordhoard update` command.

use anyhow::{bail, Result};

use super::{finish, resolve, FieldArgs, Session};

pub async fn execute(
    session: &Session,
    word: String,
    headword: Option<String>,
    set_tags: Vec<String>,
    fields: FieldArgs,
) -> Result<()> {
    let mut update = fields.into_update()?;
    if let Some(headword) = headword {
        update = update.headword(headword);
    }
    if !set_tags.is_empty() {
        update = update.tags(set_tags);
    }
    if update.is_empty() {
        bail!("nothing to update; pass at least one field flag");
    }

    let engine = session.open().await?;
    let target = resolve(&engine, &word)?;
    let updated = engine.update(target.id, &update)?;
    finish(&engine).await?;

    if updated.status != target.status {
        println!(
            "Updated '{}' ({} -> {})",
            updated.headword, target.status, updated.status
        );
    } else {
        println!("Updated '{}'", updated.headword);
    }
    Ok(())
}
