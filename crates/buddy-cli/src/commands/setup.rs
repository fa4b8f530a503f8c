//! `studybuddy setup` - interactive learner profile editor.

use anyhow::Result;
use buddy_core::{EducationLevel, ProfileStore};
use buddy_infrastructure::TomlProfileStore;
use colored::Colorize;
use rustyline::DefaultEditor;
use std::str::FromStr;
use strum::IntoEnumIterator;

pub fn run() -> Result<()> {
    let store = TomlProfileStore::new()?;
    let mut profile = store.load()?;

    println!("{}", "Set up your Study Buddy".bold());
    println!();

    let mut editor = DefaultEditor::new()?;

    profile.topic = prompt_text(&mut editor, "Main topic", &profile.topic)?;
    profile.education = prompt_education(&mut editor, profile.education)?;
    profile.grade = prompt_text(&mut editor, "Grade/Year (optional)", &profile.grade)?;

    store.save(&profile)?;
    println!();
    if profile.is_complete() {
        println!("{} Profile saved. Run {} to start.", "✓".green(), "studybuddy chat".bold());
    } else {
        println!(
            "{} Profile saved, but topic and education level are both needed before chatting.",
            "!".yellow()
        );
    }

    Ok(())
}

/// Reads one line, keeping the current value when the input is empty.
fn prompt_text(editor: &mut DefaultEditor, label: &str, current: &str) -> Result<String> {
    let hint = if current.is_empty() {
        String::new()
    } else {
        format!(" [{current}]")
    };
    let line = editor.readline(&format!("{label}{hint}: "))?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Ok(current.to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

/// Shows the fixed education enumeration and reads a choice.
fn prompt_education(
    editor: &mut DefaultEditor,
    current: Option<EducationLevel>,
) -> Result<Option<EducationLevel>> {
    println!("Education levels:");
    for level in EducationLevel::iter() {
        println!("  {} - {}", level.to_string().cyan(), level.label());
    }

    loop {
        let hint = current.map(|c| format!(" [{c}]")).unwrap_or_default();
        let line = editor.readline(&format!("Education level{hint}: "))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(current);
        }
        match EducationLevel::from_str(trimmed) {
            Ok(level) => return Ok(Some(level)),
            Err(_) => {
                println!("{} Unknown level '{trimmed}'. Pick one from the list.", "!".yellow())
            }
        }
    }
}
