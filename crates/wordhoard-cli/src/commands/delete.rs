//! The `wordhoard delete` command.

use anyhow::Result;

use super::{finish, resolve, Session};

pub async fn execute(session: &Session, words: Vec<String>) -> Result<()> {
    let engine = session.open().await?;

    let mut ids = Vec::new();
    let mut unresolved = 0;
    for key in &words {
        match resolve(&engine, key) {
            Ok(word) => ids.push(word.id),
            Err(e) => {
                eprintln!("skipping: {e}");
                unresolved += 1;
            }
        }
    }

    let outcome = engine.delete_batch(&ids);
    finish(&engine).await?;

    let (deleted, failed) = outcome.counts();
    println!("Deleted {deleted}, failed {}", failed + unresolved);
    Ok(())
}
