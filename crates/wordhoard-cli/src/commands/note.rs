//! The `wordhoard note` command.

use anyhow::Result;

use super::{finish, resolve, Session};

pub async fn execute(
    session: &Session,
    word: String,
    content: String,
    tags: Vec<String>,
    context: Option<String>,
    review: bool,
) -> Result<()> {
    let engine = session.open().await?;
    let target = resolve(&engine, &word)?;

    let note = if review {
        engine.add_note_during_review(target.id, &content)?
    } else if let Some(context) = context {
        engine.add_note_with_context(target.id, &content, &context)?
    } else {
        engine.add_note(target.id, &content, tags)?
    };
    finish(&engine).await?;

    let width = engine.config().note_simplified_length;
    println!("Noted on '{}': {}", target.headword, note.simplified(width));
    Ok(())
}
