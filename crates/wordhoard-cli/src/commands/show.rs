//! The `wordhoard show` command.

use anyhow::Result;

use wordhoard_core::timestamp;
use wordhoard_core::Word;

use super::{resolve, Session};

pub async fn execute(session: &Session, word: String) -> Result<()> {
    let engine = session.open().await?;
    let word = resolve(&engine, &word)?;
    print_word(&word);
    Ok(())
}

fn line(label: &str, value: &str) {
    if !value.is_empty() {
        println!("  {label:<14} {value}");
    }
}

fn list(label: &str, values: &[String]) {
    if !values.is_empty() {
        line(label, &values.join("; "));
    }
}

fn print_word(word: &Word) {
    let core = &word.core_info;
    let ext = &word.extended_info;
    let data = &word.learning_data;

    println!("{} [{}]", word.headword, word.status);
    line("id", &word.id.to_string());
    line("pronunciation", &core.pronunciation);
    line("part of speech", &core.part_of_speech);
    line("definition", &core.primary_definition);
    list("definitions", &ext.definitions);
    list("examples", &ext.examples);
    list("synonyms", &ext.synonyms);
    list("antonyms", &ext.antonyms);
    line("etymology", &ext.etymology);
    line("memory tip", &ext.memory_tips);
    if !word.tags.is_empty() {
        let tags: Vec<&str> = word.tags.iter().map(String::as_str).collect();
        line("tags", &tags.join(", "));
    }

    println!();
    line("completeness", &format!("{:.0}%", word.completeness() * 100.0));
    line("difficulty", data.difficulty.as_str());
    line("source", &data.source);
    line("context", &data.context);
    line("added", &timestamp::format(&data.added_at));
    line(
        "reviews",
        &format!("{} ({} correct)", data.review_count(), data.correct_count()),
    );
    if let Some(last) = &data.last_reviewed {
        line("last reviewed", &timestamp::format(last));
    }
    if let Some(next) = &data.next_review {
        line("next review", &timestamp::format(next));
    }

    if !word.notes.is_empty() {
        println!("\nNotes:");
        for note in &word.notes {
            println!("  {}", note.full());
        }
    }
}
