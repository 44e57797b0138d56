//! Terminal output helpers.

use owo_colors::OwoColorize;

/// Formatted terminal output. Progress goes to stdout, problems to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn print(&self, text: &str) {
        println!("{text}");
    }

    pub fn section(&self, title: &str) {
        println!();
        println!("{}", title.bold().underline());
    }

    pub fn status(&self, message: &str) {
        println!("{} {message}", "→".bright_blue());
    }

    pub fn success(&self, message: &str) {
        println!("{} {message}", "✓".bright_green());
    }

    pub fn kv(&self, key: &str, value: &str) {
        println!("  {}: {value}", key.dimmed());
    }

    pub fn list_item(&self, item: &str) {
        println!("  • {item}");
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{} {message}", "⚠".yellow());
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {message}", "✗".bright_red());
    }
}
