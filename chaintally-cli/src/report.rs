//! Report rendering for milestone and age results.

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;

use chaintally_engine::{AgeTrajectory, MilestoneReport, MilestoneRow, RewardCategory};

/// Everything a rendered report draws from, in one serializable document.
/// The JSON format emits this struct verbatim; the other formats walk it.
#[derive(Debug, Serialize)]
pub struct ReportDocument {
    pub generated_at: String,
    pub save_file: String,
    pub character_id: String,
    pub character_name: String,
    pub milestones: MilestoneReport,
    pub ages: Vec<AgeTrajectory>,
}

/// UTC timestamp for report headers.
pub fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn write_console_report(out: &mut dyn Write, document: &ReportDocument) -> Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{} {}",
        "📊 PT Milestones".bright_cyan().bold(),
        document.character_name.bold()
    )?;
    writeln!(out, "{}", "=".repeat(40).cyan())?;
    writeln!(out, "Save: {}", document.save_file)?;
    writeln!(
        out,
        "Character: {} (id {})",
        document.character_name, document.character_id
    )?;
    if !document.milestones.declared_order {
        writeln!(
            out,
            "{}",
            "⚠️  Save has no jumpList; rows follow sorted jump keys".yellow()
        )?;
    }
    writeln!(out)?;

    writeln!(
        out,
        "{:>3}  {:<30} {:<12} {:<12} {:<12} {:<12} {:>4} {:>6}",
        "#", "Jump", "Items", "Alt-Forms", "Drawbacks", "Exterm.", "PT", "Total"
    )?;
    for row in &document.milestones.rows {
        writeln!(
            out,
            "{:>3}  {:<30} {:<12} {:<12} {:<12} {:<12} {:>4} {:>6}",
            sequence_label(row),
            row_label(row),
            cell_label(row, RewardCategory::Items),
            cell_label(row, RewardCategory::AltForms),
            cell_label(row, RewardCategory::Drawbacks),
            cell_label(row, RewardCategory::Exterminations),
            row.pt,
            row.pt_to_date
        )?;
    }

    let totals = &document.milestones.totals;
    writeln!(out)?;
    writeln!(
        out,
        "{} {}",
        "Total PT:".bold(),
        totals.pt.to_string().green().bold()
    )?;
    for category in RewardCategory::ALL {
        let total = totals.total(category);
        writeln!(
            out,
            "    {:<15} {:>5} units {:>4} PT",
            category.label(),
            total.count,
            total.pt
        )?;
    }

    for trajectory in &document.ages {
        write_console_ages(out, document, trajectory)?;
    }
    Ok(())
}

fn write_console_ages(
    out: &mut dyn Write,
    document: &ReportDocument,
    trajectory: &AgeTrajectory,
) -> Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        format!("🕰 Ages ({})", trajectory.mode).bright_yellow().bold()
    )?;
    writeln!(out, "{}", "-".repeat(40).yellow())?;
    writeln!(
        out,
        "{:>3}  {:<30} {:^3}  {:<20} {}",
        "#", "Jump", "In", "Chain Time", "Age"
    )?;
    // Milestone rows carry the traversal order and display names, so the
    // age table follows them instead of the unordered trajectory map.
    for row in &document.milestones.rows {
        let Some(age_row) = trajectory.rows.get(&row.jump_id) else {
            continue;
        };
        let marker = if age_row.included { "✓" } else { "·" };
        writeln!(
            out,
            "{:>3}  {:<30} {:^3}  {:<20} {}",
            sequence_label(row),
            row_label(row),
            marker,
            compact_or_dash(&age_row.duration_text.compact),
            age_row.age_text.verbose_clean
        )?;
    }

    let summary = &trajectory.summary;
    match &summary.source_jump {
        Some(jump_id) => writeln!(
            out,
            "Current age: {} (after {})",
            summary.age_text.verbose_clean.bold(),
            jump_name(document, jump_id)
        )?,
        None => writeln!(
            out,
            "Current age: {} (no jumps counted)",
            summary.age_text.verbose_clean.bold()
        )?,
    }
    writeln!(
        out,
        "Time in chain: {}",
        compact_or_dash(&summary.duration_text.compact)
    )?;
    Ok(())
}

pub fn write_json_report(out: &mut dyn Write, document: &ReportDocument) -> Result<()> {
    let json_output = serde_json::to_string_pretty(document)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn write_markdown_report(out: &mut dyn Write, document: &ReportDocument) -> Result<()> {
    writeln!(out, "# Chaintally Report\n")?;
    writeln!(out, "- **Save**: {}", md_escape(&document.save_file))?;
    writeln!(
        out,
        "- **Character**: {} (id {})",
        md_escape(&document.character_name),
        document.character_id
    )?;
    writeln!(out, "- **Generated**: {}\n", document.generated_at)?;
    if !document.milestones.declared_order {
        writeln!(
            out,
            "> ⚠️ Save has no jumpList; rows follow sorted jump keys.\n"
        )?;
    }

    writeln!(out, "## PT Milestones\n")?;
    writeln!(
        out,
        "| # | Jump | Items | Alt-Forms | Drawbacks | Exterminations | PT | Total |"
    )?;
    writeln!(out, "|--:|:-----|:-----:|:---------:|:---------:|:--------------:|--:|------:|")?;
    for row in &document.milestones.rows {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} | {} |",
            sequence_label(row),
            md_escape(&row_label(row)),
            cell_label(row, RewardCategory::Items),
            cell_label(row, RewardCategory::AltForms),
            cell_label(row, RewardCategory::Drawbacks),
            cell_label(row, RewardCategory::Exterminations),
            row.pt,
            row.pt_to_date
        )?;
    }

    let totals = &document.milestones.totals;
    writeln!(out)?;
    writeln!(
        out,
        "**Total: {} PT** (Items {}, Alt-Forms {}, Drawbacks {}, Exterminations {})\n",
        totals.pt, totals.items.pt, totals.alt_forms.pt, totals.drawbacks.pt,
        totals.exterminations.pt
    )?;

    for trajectory in &document.ages {
        writeln!(out, "## Ages ({})\n", trajectory.mode)?;
        writeln!(out, "| # | Jump | Included | Chain Time | Age |")?;
        writeln!(out, "|--:|:-----|:--------:|:-----------|:----|")?;
        for row in &document.milestones.rows {
            let Some(age_row) = trajectory.rows.get(&row.jump_id) else {
                continue;
            };
            writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                sequence_label(row),
                md_escape(&row_label(row)),
                if age_row.included { "✓" } else { "" },
                compact_or_dash(&age_row.duration_text.compact),
                age_row.age_text.verbose_clean
            )?;
        }
        writeln!(out)?;
        writeln!(
            out,
            "**Current age**: {}\n",
            trajectory.summary.age_text.verbose_clean
        )?;
    }
    Ok(())
}

/// CSV covers the milestone table only; age trajectories are structured
/// per-mode and belong to the JSON format.
pub fn write_csv_report(out: &mut dyn Write, document: &ReportDocument) -> Result<()> {
    writeln!(
        out,
        "sequence,jump_id,jump,supplement,items,items_cum,items_pt,alt_forms,alt_forms_cum,alt_forms_pt,drawbacks,drawbacks_cum,drawbacks_pt,exterminations,exterminations_cum,exterminations_pt,pt,pt_to_date"
    )?;
    for row in &document.milestones.rows {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            sequence_label(row),
            csv_field(&row.jump_id),
            csv_field(&row.name),
            row.supplement,
            row.items.count,
            row.items.cumulative,
            row.items.pt,
            row.alt_forms.count,
            row.alt_forms.cumulative,
            row.alt_forms.pt,
            row.drawbacks.count,
            row.drawbacks.cumulative,
            row.drawbacks.pt,
            row.exterminations.count,
            row.exterminations.cumulative,
            row.exterminations.pt,
            row.pt,
            row.pt_to_date
        )?;
    }
    Ok(())
}

fn sequence_label(row: &MilestoneRow) -> String {
    row.sequence.map_or_else(String::new, |n| n.to_string())
}

fn row_label(row: &MilestoneRow) -> String {
    if row.supplement {
        format!("↳ {}", row.name)
    } else {
        row.name.clone()
    }
}

fn cell_label(row: &MilestoneRow, category: RewardCategory) -> String {
    let cell = row.cell(category);
    format!("{} (+{})", cell.count, cell.pt)
}

fn compact_or_dash(compact: &str) -> String {
    if compact.is_empty() {
        "-".to_string()
    } else {
        compact.to_string()
    }
}

fn jump_name(document: &ReportDocument, jump_id: &str) -> String {
    document
        .milestones
        .rows
        .iter()
        .find(|row| row.jump_id == jump_id)
        .map_or_else(|| format!("Jump {jump_id}"), |row| row.name.clone())
}

fn md_escape(text: &str) -> String {
    text.replace('|', "\\|")
}

fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}
