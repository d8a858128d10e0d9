//! The `wordhoard review` and `wordhoard due` commands.

use anyhow::Result;

use wordhoard_core::{timestamp, Performance};

use super::{finish, resolve, word_table, Session};

pub async fn execute(session: &Session, word: String, performance: String) -> Result<()> {
    let performance: Performance = performance.parse().map_err(anyhow::Error::msg)?;
    let engine = session.open().await?;
    let target = resolve(&engine, &word)?;

    let outcome = engine.review(target.id, performance)?;
    finish(&engine).await?;

    let data = &outcome.word.learning_data;
    println!(
        "Reviewed '{}' ({performance}): {}/{} correct, next review {}",
        outcome.word.headword,
        data.correct_count(),
        data.review_count(),
        timestamp::format(&outcome.next_review)
    );
    if let Some(status) = outcome.promoted {
        println!("Promoted: {} -> {status}", outcome.previous_status);
    }
    Ok(())
}

pub async fn due(session: &Session) -> Result<()> {
    let engine = session.open().await?;
    let due = engine.words_for_review();

    if due.is_empty() {
        println!("Nothing due for review");
        return Ok(());
    }
    println!("{}", word_table(&due));
    println!("{} word(s) due for review", due.len());
    Ok(())
}
