//! The `wordhoard init` command.

use std::path::Path;

use anyhow::Result;

use wordhoard_core::config::{LOCAL_CONFIG_FILE, SAMPLE_CONFIG};

pub fn execute() -> Result<()> {
    if Path::new(LOCAL_CONFIG_FILE).exists() {
        println!("{LOCAL_CONFIG_FILE} already exists, skipping.");
    } else {
        std::fs::write(LOCAL_CONFIG_FILE, SAMPLE_CONFIG)?;
        println!("Created {LOCAL_CONFIG_FILE}");
    }

    println!("\nNext steps:");
    println!("  1. Add a word: wordhoard add serendipity -d \"a happy accident\"");
    println!("  2. See what is due: wordhoard due");
    println!("  3. Record a review: wordhoard review serendipity good");

    Ok(())
}
