//! `studybuddy personalities` - lists the personality registry.

use buddy_core::PersonalityRegistry;
use colored::Colorize;

pub fn run() {
    let registry = PersonalityRegistry::with_defaults();

    println!("{}", "Available personalities".bold());
    println!();
    for personality in registry.list() {
        let voice = if personality.voice_id.is_some() {
            "🔊".to_string()
        } else {
            String::new()
        };
        println!(
            "  {} {} {}",
            personality.name.cyan().bold(),
            format!("({})", personality.key).dimmed(),
            voice
        );
        println!("      {}", personality.description);
    }
    println!();
    println!(
        "Start a chat with: {}",
        "studybuddy chat --personality <key>".bold()
    );
}
