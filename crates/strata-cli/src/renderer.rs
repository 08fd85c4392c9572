//! Terminal rendering of the markdown produced by the core display types.

use anyhow::Result;
use termimad::{crossterm::style::Color, MadSkin};

/// Renders markdown with termimad styling, or prints it untouched.
pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();

        skin.set_headers_fg(Color::Blue);
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::Magenta);
        skin.code_block.set_bg(Color::AnsiValue(238));
        skin.inline_code.set_bg(Color::AnsiValue(238));

        Self { rich_enabled, skin }
    }

    /// Render markdown to stdout.
    ///
    /// Headers keep their hash marks. Lines inside fenced blocks are commands
    /// meant to be copied, so they are printed verbatim without the fences.
    pub fn render(&self, markdown: &str) -> Result<()> {
        if !self.rich_enabled {
            print!("{markdown}");
            return Ok(());
        }

        let mut in_fence = false;
        for line in markdown.lines() {
            if line.starts_with("```") {
                in_fence = !in_fence;
            } else if in_fence {
                println!("    {line}");
            } else if line.starts_with('#') {
                println!("\x1b[34m{line}\x1b[0m");
            } else {
                self.skin.print_inline(line);
                println!();
            }
        }
        Ok(())
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}
