//! Organ Match CLI Tool
//!
//! Rank donors for waiting patients, inspect a single pair, or check the
//! transport distance estimate between two places.
//!
//! Usage:
//!   organ-match match --patients <file> --donors <file> [--min-score <n>] [--top <n>]
//!   organ-match pair --patients <file> --donors <file> --patient-id <id> --donor-id <id>
//!   organ-match distance <from> <to>

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::*;
use organ_match_core::intake::{load_donors, load_patients};
use organ_match_core::{geo, Impact, Match, MatchConfig, MatchDetail, MatchSummary, Matcher, Reason};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "organ-match")]
#[command(version = "0.1.0")]
#[command(about = "Score donor/recipient compatibility and rank matches", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: json, compact, or table
    #[arg(short, long, default_value = "json", global = true)]
    format: String,

    /// Output file (stdout if not specified)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Reference date for ages (YYYY-MM-DD, defaults to today)
    #[arg(long, global = true)]
    as_of: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Best donor for every active patient, ranked by score
    Match {
        /// Patients file (JSON array of records)
        #[arg(short, long)]
        patients: PathBuf,

        /// Donors file (JSON array of records)
        #[arg(short, long)]
        donors: PathBuf,

        /// Drop matches scoring below this
        #[arg(long, default_value = "0")]
        min_score: u8,

        /// Keep only the top N matches
        #[arg(long)]
        top: Option<usize>,
    },

    /// Full breakdown for one patient/donor pair
    Pair {
        #[arg(short, long)]
        patients: PathBuf,

        #[arg(short, long)]
        donors: PathBuf,

        #[arg(long)]
        patient_id: String,

        #[arg(long)]
        donor_id: String,
    },

    /// Estimated transport distance between two places
    Distance {
        from: String,
        to: String,
    },
}

#[derive(Serialize)]
struct MatchReport {
    summary: MatchSummary,
    matches: Vec<Match>,
}

#[derive(Serialize)]
struct DistanceReport {
    from: String,
    to: String,
    distance_km: u32,
    known_coordinates: bool,
}

enum Report {
    Matches(MatchReport),
    Pair(MatchDetail),
    Distance(DistanceReport),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => MatchConfig::from_file(path)?,
        None => MatchConfig::default(),
    };
    if let Some(date) = &cli.as_of {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| format!("Invalid --as-of date '{}': {}", date, e))?;
        config = config.with_as_of(date);
    }
    let matcher = Matcher::new(&config);

    let report = match cli.command {
        Commands::Match { patients, donors, min_score, top } => {
            let patients = load_patients(&patients)?;
            let donors = load_donors(&donors)?;

            let mut matches: Vec<Match> = matcher
                .find_all_matches(&patients, &donors)
                .into_iter()
                .filter(|m| m.score >= min_score)
                .collect();
            if let Some(n) = top {
                matches.truncate(n);
            }

            let summary = MatchSummary::from_matches(&matches, config.high_score_threshold);
            Report::Matches(MatchReport { summary, matches })
        }

        Commands::Pair { patients, donors, patient_id, donor_id } => {
            let patients = load_patients(&patients)?;
            let donors = load_donors(&donors)?;

            let patient = patients
                .iter()
                .find(|p| p.patient_id == patient_id)
                .ok_or_else(|| format!("Patient not found: {}", patient_id))?;
            let donor = donors
                .iter()
                .find(|d| d.donor_id == donor_id)
                .ok_or_else(|| format!("Donor not found: {}", donor_id))?;

            Report::Pair(matcher.pair_detail(patient, donor))
        }

        Commands::Distance { from, to } => Report::Distance(DistanceReport {
            distance_km: geo::distance_km(&from, &to),
            known_coordinates: geo::coordinates(&from).is_some() && geo::coordinates(&to).is_some(),
            from,
            to,
        }),
    };

    if cli.output.is_some() {
        colored::control::set_override(false);
    }

    let output_str = match cli.format.as_str() {
        "json" => to_json(&report, true)?,
        "compact" => to_json(&report, false)?,
        "table" => to_table(&report),
        other => return Err(format!("Unknown format: {}", other).into()),
    };

    if let Some(output_path) = cli.output {
        fs::write(&output_path, &output_str)?;
        eprintln!("Output written to: {}", output_path.display());
    } else {
        println!("{}", output_str);
    }

    Ok(())
}

fn to_json(report: &Report, pretty: bool) -> Result<String, serde_json::Error> {
    let value = match report {
        Report::Matches(r) => serde_json::to_value(r)?,
        Report::Pair(r) => serde_json::to_value(r)?,
        Report::Distance(r) => serde_json::to_value(r)?,
    };
    if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
}

fn to_table(report: &Report) -> String {
    match report {
        Report::Matches(r) => matches_table(r),
        Report::Pair(detail) => pair_table(detail),
        Report::Distance(r) => format!(
            "{} -> {}: {} km{}",
            r.from,
            r.to,
            r.distance_km.to_string().bold(),
            if r.known_coordinates { "" } else { " (estimated)" }
        ),
    }
}

fn score_label(score: u8, threshold: u8) -> ColoredString {
    let text = format!("{:>5}", score);
    if score >= threshold {
        text.green().bold()
    } else if score >= 50 {
        text.yellow()
    } else {
        text.red()
    }
}

fn reason_line(reason: &Reason) -> String {
    let marker = match reason.impact {
        Impact::Positive => "+".green(),
        Impact::Caution => "!".yellow(),
        Impact::Negative => "x".red().bold(),
        Impact::Info => "i".cyan(),
    };
    format!("  {} {}", marker, reason)
}

fn matches_table(report: &MatchReport) -> String {
    let summary = &report.summary;
    let mut lines = vec![
        "─".repeat(78),
        "ORGAN MATCHES".green().bold().to_string(),
        "─".repeat(78),
        format!(
            "{:<18} {:<18} {:<9} {:>5} {:>8} {:>7}",
            "Patient", "Donor", "Organ", "Score", "Urgency", "Km"
        )
        .bold()
        .to_string(),
    ];

    for m in &report.matches {
        lines.push(format!(
            "{:<18} {:<18} {:<9} {} {:>8} {:>7}",
            m.patient_id,
            m.donor_id,
            m.organ,
            score_label(m.score, summary.high_score_threshold),
            m.urgency_score,
            m.distance_km
        ));
    }

    lines.push("─".repeat(78));
    lines.push(format!(
        "{} matches, average score {:.1}, {} at or above {}, {} critical",
        summary.total_matches,
        summary.average_score,
        summary.high_score_count,
        summary.high_score_threshold,
        summary.critical_patients
    ));
    lines.join("\n")
}

fn pair_table(detail: &MatchDetail) -> String {
    let mut lines = vec![
        "─".repeat(60),
        format!("{} <- {}", detail.patient_id, detail.donor_id)
            .green()
            .bold()
            .to_string(),
        "─".repeat(60),
        format!("{:<16} {:<12} {:<12}", "", "Patient", "Donor"),
        format!(
            "{:<16} {:<12} {:<12}",
            "Organ", detail.patient_organ, detail.donor_organ
        ),
        format!(
            "{:<16} {:<12} {:<12}",
            "Blood group", detail.patient_blood_group, detail.donor_blood_group
        ),
        format!("{:<16} {:<12} {:<12}", "Age", detail.patient_age, detail.donor_age),
        format!("{:<16} {:<12} {:<12}", "BMI", detail.patient_bmi, detail.donor_bmi),
        format!("{:<16} {} km", "Distance", detail.distance_km),
        format!(
            "{:<16} {}",
            "Score",
            if detail.is_viable() {
                detail.score.to_string().green().bold()
            } else {
                "0 (not viable)".red().bold()
            }
        ),
        String::new(),
        "Reasons:".cyan().bold().to_string(),
    ];
    lines.extend(detail.reasons.iter().map(reason_line));
    lines.join("\n")
}
