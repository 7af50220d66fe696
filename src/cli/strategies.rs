use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::{PricewiseError, Result};
use crate::strategy::{StrategyBoard, StrategyStatus};

pub fn run(json: bool) -> Result<()> {
    let board = StrategyBoard::seeded();
    if json {
        let out = serde_json::to_string_pretty(&board.strategies)
            .map_err(|e| PricewiseError::Other(e.to_string()))?;
        println!("{out}");
    } else {
        println!("{}", format_board(&board));
    }
    Ok(())
}

fn status_heading(status: StrategyStatus) -> String {
    let label = status.label();
    match status {
        StrategyStatus::Proposed => label.yellow().bold().to_string(),
        StrategyStatus::Approved => label.blue().bold().to_string(),
        StrategyStatus::Implemented => label.green().bold().to_string(),
        StrategyStatus::Rejected => label.red().bold().to_string(),
    }
}

/// One table per status, in board order. Empty groups are omitted.
pub fn format_board(board: &StrategyBoard) -> String {
    let mut sections = Vec::new();
    for status in StrategyStatus::ALL {
        let strategies = board.by_status(status);
        if strategies.is_empty() {
            continue;
        }
        let mut table = Table::new();
        table.set_header(vec!["ID", "Name", "Category", "Region", "Change", "Impact", "Date", "Team"]);
        for s in strategies {
            table.add_row(vec![
                Cell::new(&s.id),
                Cell::new(&s.name),
                Cell::new(&s.target_category),
                Cell::new(s.target_region.as_deref().unwrap_or("All")),
                Cell::new(s.change_label()),
                Cell::new(format!("{:+.1}%", s.expected_impact)),
                Cell::new(&s.implementation_date),
                Cell::new(s.collaborators.join(", ")),
            ]);
        }
        sections.push(format!("{} ({})\n{table}", status_heading(status), table.row_count()));
    }
    if sections.is_empty() {
        return "No pricing strategies.".to_string();
    }
    format!("Pricing Strategies\n\n{}", sections.join("\n\n"))
}
