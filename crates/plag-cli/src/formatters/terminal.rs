use colored::Colorize;
use plag_core::model::ASTFeatures;
use plag_core::utils::hash::short_hash;

pub fn format_terminal(works: &[ASTFeatures]) -> String {
    if works.is_empty() {
        return "No works processed.".dimmed().to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    let header = "─ works ";
    let pad_len = 55usize.saturating_sub(header.chars().count());
    lines.push(format!("┌{header}{}", "─".repeat(pad_len)).dimmed().to_string());
    lines.push("│".dimmed().to_string());

    for work in works {
        lines.push(format!(
            "{}  {} {} {}",
            "│".dimmed(),
            short_hash(&work.sha256, 12).yellow(),
            work.id.as_str().bold(),
            format!("({} nodes)", work.features.count_of_nodes).dimmed(),
        ));
        if !work.features.head_nodes.is_empty() {
            lines.push(format!(
                "{}      {}",
                "│".dimmed(),
                work.features.head_nodes.join(", ").dimmed()
            ));
        }
    }

    lines.push("│".dimmed().to_string());
    lines.push(format!("└{}", "─".repeat(55)).dimmed().to_string());
    lines.push(format!("{} works", works.len()));
    lines.join("\n")
}
