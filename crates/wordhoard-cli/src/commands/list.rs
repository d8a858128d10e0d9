//! The `wordhoard list` command.

use anyhow::Result;

use wordhoard_core::{SortKey, WordStatus};

use super::{word_table, Session};

pub async fn execute(
    session: &Session,
    page: usize,
    page_size: usize,
    sort: String,
    reverse: bool,
    status: Option<String>,
    tag: Option<String>,
) -> Result<()> {
    let key: SortKey = sort.parse().map_err(anyhow::Error::msg)?;
    let status: Option<WordStatus> = status
        .map(|s| s.parse().map_err(anyhow::Error::msg))
        .transpose()?;

    let engine = session.open().await?;

    if let Some(status) = status {
        let words = engine.words_by_status(status);
        println!("{}", word_table(&words));
        println!("{} word(s) {status}", words.len());
        return Ok(());
    }
    if let Some(tag) = tag {
        let words = engine.words_by_tag(&tag);
        println!("{}", word_table(&words));
        println!("{} word(s) tagged '{tag}'", words.len());
        return Ok(());
    }

    let listing = engine.paginate(page, page_size, key, reverse);
    if listing.total_count == 0 {
        println!("No words yet. Add one with `wordhoard add <word>`.");
        return Ok(());
    }
    if listing.items.is_empty() {
        println!(
            "Page {} is empty ({} page(s), {} word(s))",
            listing.page, listing.total_pages, listing.total_count
        );
        return Ok(());
    }

    println!("{}", word_table(&listing.items));
    println!(
        "Page {}/{} ({} word(s), sorted by {key}{})",
        listing.page,
        listing.total_pages,
        listing.total_count,
        if reverse { ", reversed" } else { "" }
    );
    Ok(())
}
