use anyhow::Result;
use colored::Colorize;
use frontline_game::MissionResult;
use std::io::Write;
use std::time::Duration;

use super::SuiteReport;
use super::diagnostics::CATEGORIES;
use super::simulation::CampaignRun;

#[allow(clippy::cast_precision_loss)]
fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

pub fn generate_console_report<W: Write + ?Sized>(
    out: &mut W,
    report: &SuiteReport,
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Frontline Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=================================".cyan())?;

    if !report.checks.is_empty() {
        let total = report.checks.len();
        let failed = report.failed_checks();
        writeln!(out, "Field manual checks: {total}")?;
        writeln!(out, "Passed: {}", (total - failed).to_string().green())?;
        writeln!(out, "Failed: {}", failed.to_string().red())?;
        writeln!(out, "Success rate: {:.1}%", percent(total - failed, total))?;
        writeln!(out)?;

        for category in CATEGORIES {
            let rows: Vec<_> = report
                .checks
                .iter()
                .filter(|c| c.category == category)
                .collect();
            if rows.is_empty() {
                continue;
            }
            writeln!(out, "{}", category.bold())?;
            for check in rows {
                let status = if check.passed {
                    "✅ PASS".green()
                } else {
                    "❌ FAIL".red()
                };
                match &check.message {
                    Some(message) => writeln!(out, "  {status} {} ({message})", check.name)?,
                    None => writeln!(out, "  {status} {}", check.name)?,
                }
            }
        }
        writeln!(out)?;
    }

    if !report.campaigns.is_empty() {
        writeln!(out, "{}", "⚔️  Campaign Simulation".bright_yellow().bold())?;
        writeln!(out, "{}", "======================".yellow())?;
        for run in &report.campaigns {
            write_campaign_line(out, run)?;
        }
        let wars_won = report.campaigns.iter().filter(|r| r.war_won).count();
        writeln!(
            out,
            "Wars won: {wars_won}/{} ({:.1}%)",
            report.campaigns.len(),
            percent(wars_won, report.campaigns.len())
        )?;
        writeln!(out)?;
    }

    writeln!(out, "Total time: {total_duration:?}")?;
    Ok(())
}

fn write_campaign_line<W: Write + ?Sized>(out: &mut W, run: &CampaignRun) -> Result<()> {
    let status = if run.passed {
        "✅".green()
    } else {
        "❌".red()
    };
    let outcome = if run.war_won {
        "WAR WON".green().bold()
    } else {
        "fell short".yellow()
    };
    writeln!(
        out,
        "{status} {} seed {} [{}]: {} victories, {} defeats, {outcome}",
        run.faction.as_str().bold(),
        run.seed,
        run.strategy,
        run.victories(),
        run.defeats(),
    )?;
    for failure in &run.failures {
        writeln!(out, "     • {}", failure.red())?;
    }
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(out: &mut W, report: &SuiteReport) -> Result<()> {
    let json_output = serde_json::to_string_pretty(report)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    out: &mut W,
    report: &SuiteReport,
) -> Result<()> {
    writeln!(out, "# Frontline Test Results\n")?;

    writeln!(out, "## Summary\n")?;
    let total = report.checks.len();
    let failed = report.failed_checks();
    writeln!(out, "- **Field manual checks**: {total}")?;
    writeln!(out, "- **Failed checks**: {failed}")?;
    writeln!(out, "- **Campaign runs**: {}", report.campaigns.len())?;
    writeln!(out, "- **Failed runs**: {}\n", report.failed_campaigns())?;

    if !report.checks.is_empty() {
        writeln!(out, "## Field Manual\n")?;
        writeln!(out, "| Category | Check | Result | Notes |")?;
        writeln!(out, "|---|---|---|---|")?;
        for check in &report.checks {
            let status = if check.passed { "✅" } else { "❌" };
            writeln!(
                out,
                "| {} | {} | {status} | {} |",
                check.category,
                check.name,
                check.message.as_deref().unwrap_or("")
            )?;
        }
        writeln!(out)?;
    }

    if !report.campaigns.is_empty() {
        writeln!(out, "## Campaigns\n")?;
        for run in &report.campaigns {
            let status = if run.passed { "✅" } else { "❌" };
            writeln!(out, "### {status} {} seed {}\n", run.faction, run.seed)?;
            writeln!(out, "- **Strategy**: {}", run.strategy)?;
            writeln!(out, "- **War won**: {}", run.war_won)?;
            for battle in &run.battles {
                let result = match battle.result {
                    Some(MissionResult::Victory) => "victory",
                    Some(MissionResult::Defeat) => "defeat",
                    None => "unfinished",
                };
                writeln!(
                    out,
                    "- {} {} (attempt {}): {result}, {} moves, peak threat {:.1}",
                    battle.battle_id,
                    battle.name,
                    battle.attempt + 1,
                    battle.moves,
                    battle.peak_threat
                )?;
            }
            if !run.failures.is_empty() {
                writeln!(out, "- **Failures**:")?;
                for failure in &run.failures {
                    writeln!(out, "  - {failure}")?;
                }
            }
            writeln!(out)?;
        }
    }
    Ok(())
}
