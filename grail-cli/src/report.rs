use anyhow::{Result, bail};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use std::io::{Write, stdout};

use grail_core::{
    AccountView, Catalog, CategoryProgress, GrailMode, GrailStats, Leaderboard, PartyRoster,
    PartyView, SiteStatistics,
};

use crate::OutputFormat;

pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn json<T: Serialize>(value: &T) -> Result<()> {
        let mut out = stdout().lock();
        serde_json::to_writer_pretty(&mut out, value)?;
        writeln!(out)?;
        Ok(())
    }

    pub fn account(&self, view: &AccountView) -> Result<()> {
        if matches!(self.format, OutputFormat::Json) {
            return Self::json(view);
        }
        println!("{} {}", "Grail".bright_cyan().bold(), view.address.as_str().bold());
        println!("  token:   {}", view.token.as_str().yellow());
        println!("  updates: {}", view.update_count);
        println!("  changed: {}", view.modified_at.to_rfc3339());
        for mode in GrailMode::ALL {
            match view.trees.get(mode) {
                Some(tree) => println!("  {mode:<9} {} found", tree.found_count()),
                None => println!("  {mode:<9} {}", "never saved".dimmed()),
            }
        }
        if view.has_party {
            println!("  {}", "leads a party".green());
        }
        Ok(())
    }

    pub fn stats(
        &self,
        address: &str,
        mode: GrailMode,
        stats: &GrailStats,
        progress: &[CategoryProgress],
    ) -> Result<()> {
        if matches!(self.format, OutputFormat::Json) {
            return Self::json(stats);
        }
        println!("{} {address} ({mode})", "Stats".bright_cyan().bold());
        print_progress(progress);
        println!("  {:<16} {}", "score", stats.item_score.to_string().bold());
        Ok(())
    }

    pub fn roster(&self, roster: &PartyRoster) -> Result<()> {
        if matches!(self.format, OutputFormat::Json) {
            return Self::json(roster);
        }
        println!("{} led by {}", "Party".bright_cyan().bold(), roster.leader.as_str().bold());
        for member in roster.members() {
            println!("  - {member}");
        }
        Ok(())
    }

    pub fn party(&self, view: &PartyView, mode: GrailMode) -> Result<()> {
        if matches!(self.format, OutputFormat::Json) {
            return Self::json(view);
        }
        let Some(stats) = view.stats_for(mode) else {
            bail!("party view has no {mode} statistics");
        };
        println!(
            "{} led by {} ({} members, {} updates)",
            "Party".bright_cyan().bold(),
            view.leader.as_str().bold(),
            view.members.len(),
            view.update_count
        );
        for (key, category) in &stats.categories {
            println!(
                "  {key:<16} {:>4}/{:<4} missing {}",
                category.found(),
                category.len(),
                missing_label(category.missing)
            );
        }
        println!("  {:<16} {} ({mode})", "score", stats.item_score.to_string().bold());
        Ok(())
    }

    /// Checklists are documents, so both formats print JSON.
    pub fn checklist(&self, checklist: &Value) -> Result<()> {
        Self::json(checklist)
    }

    pub fn leaderboard(&self, board: &Leaderboard) -> Result<()> {
        if matches!(self.format, OutputFormat::Json) {
            return Self::json(board);
        }
        let columns: Vec<&str> = board.totals.missing.iter().map(|(k, _)| k.as_str()).collect();
        print!("{:<20}", "member".bold());
        for column in &columns {
            print!(" {column:>14}");
        }
        println!(" {:>6} {:>6}", "total", "score");
        for row in board.rows.iter().chain(std::iter::once(&board.totals)) {
            print!("{:<20}", row.name);
            for (_, missing) in &row.missing {
                print!(" {missing:>14}");
            }
            println!(" {:>6} {:>6}", missing_label(row.total), row.item_score);
        }
        Ok(())
    }

    pub fn site(&self, site: &SiteStatistics) -> Result<()> {
        if matches!(self.format, OutputFormat::Json) {
            return Self::json(site);
        }
        println!("{} {} grails", "Site".bright_cyan().bold(), site.total_grails);
        for stat in &site.modified_stats {
            println!("  {} ({} updates)", stat.modified.to_rfc3339(), stat.update_count);
        }
        Ok(())
    }

    pub fn catalog(&self, catalog: &Catalog) -> Result<()> {
        if matches!(self.format, OutputFormat::Json) {
            let counts: Vec<(String, usize)> = catalog
                .categories()
                .iter()
                .map(|def| (def.key.clone(), catalog.slots_under(&def.path).len()))
                .collect();
            return Self::json(&counts);
        }
        println!(
            "{} {} v{} ({} slots)",
            "Catalog".bright_cyan().bold(),
            catalog.mode(),
            catalog.version(),
            catalog.slot_count()
        );
        for def in catalog.categories() {
            println!(
                "  {:<16} {:>4}  {}",
                def.key,
                catalog.slots_under(&def.path).len(),
                def.path.join("/").dimmed()
            );
        }
        Ok(())
    }
}

fn print_progress(progress: &[CategoryProgress]) {
    for row in progress {
        println!(
            "  {:<16} {:>4}/{:<4} perfect {:>4}  missing {}",
            row.key,
            row.found,
            row.total,
            row.perfects,
            missing_label(row.total - row.found)
        );
    }
}

fn missing_label(missing: usize) -> colored::ColoredString {
    if missing == 0 {
        "0".green()
    } else {
        missing.to_string().red()
    }
}
