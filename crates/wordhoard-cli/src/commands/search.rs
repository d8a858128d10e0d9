//! The `wordhoard search` command.

use anyhow::Result;

use super::{word_table, Session};

pub async fn execute(session: &Session, query: String, limit: Option<usize>) -> Result<()> {
    let engine = session.open().await?;
    let hits = engine.search(&query, limit);

    if hits.is_empty() {
        println!("No matches for '{query}'");
        return Ok(());
    }
    println!("{}", word_table(&hits));
    println!("{} match(es)", hits.len());
    Ok(())
}
