//! Console destination

const RULE_WIDTH: usize = 50;

/// Prints the content instead of publishing it
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunDestination;

impl DryRunDestination {
    /// The framed block written to stdout
    pub fn render(content: &str) -> String {
        let rule = "─".repeat(RULE_WIDTH);
        format!("\nProcessed Content:\n{rule}\n{content}\n{rule}")
    }

    pub fn post(&self, content: &str) -> bool {
        println!("{}", Self::render(content));
        tracing::info!("Content displayed in dry run mode");
        true
    }
}
