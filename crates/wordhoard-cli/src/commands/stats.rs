//! The `wordhoard stats` and `wordhoard tags` commands.

use anyhow::Result;
use comfy_table::{Cell, Table};

use wordhoard_core::{timestamp, WordStatus};

use super::Session;

pub async fn execute(session: &Session, json: bool) -> Result<()> {
    let engine = session.open().await?;
    let stats = engine.statistics();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![Cell::new("Total words"), Cell::new(stats.total_words)]);
    for status in WordStatus::ALL {
        table.add_row(vec![
            Cell::new(format!("  {status}")),
            Cell::new(stats.count(status)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Average completeness"),
        Cell::new(format!("{:.1}%", stats.average_completeness * 100.0)),
    ]);
    table.add_row(vec![Cell::new("Due for review"), Cell::new(stats.due_for_review)]);
    table.add_row(vec![Cell::new("Notes"), Cell::new(stats.total_notes)]);
    table.add_row(vec![Cell::new("Tags"), Cell::new(stats.total_tags)]);
    table.add_row(vec![
        Cell::new("Reviews"),
        Cell::new(match stats.accuracy() {
            Some(acc) => format!("{} ({:.0}% correct)", stats.total_reviews, acc * 100.0),
            None => "0".to_string(),
        }),
    ]);
    let when = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map(|t| timestamp::format(&t)).unwrap_or_else(|| "-".into())
    };
    table.add_row(vec![Cell::new("Last added"), Cell::new(when(stats.last_added))]);
    table.add_row(vec![Cell::new("Last reviewed"), Cell::new(when(stats.last_reviewed))]);

    println!("{table}");
    Ok(())
}

pub async fn tags(session: &Session) -> Result<()> {
    let engine = session.open().await?;
    let tags = engine.all_tags();

    if tags.is_empty() {
        println!("No tags yet");
        return Ok(());
    }
    for tag in &tags {
        println!("{tag} ({})", engine.words_by_tag(tag).len());
    }
    Ok(())
}
