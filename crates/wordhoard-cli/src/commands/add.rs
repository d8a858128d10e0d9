//! The `wordhoard add` command.

use anyhow::Result;

use super::{finish, short_id, FieldArgs, Session};

pub async fn execute(session: &Session, headword: String, fields: FieldArgs) -> Result<()> {
    let update = fields.into_update()?;
    let engine = session.open().await?;

    let word = engine.add(&headword, update)?;
    finish(&engine).await?;

    println!(
        "Added '{}' ({}) as {}, {:.0}% complete",
        word.headword,
        short_id(&word.id),
        word.status,
        word.completeness() * 100.0
    );
    Ok(())
}
