//! trustgate CLI - presence trust scoring and credential proofs.
//!
//! Every subcommand reads one JSON document, runs a single engine operation
//! and prints the result as text or JSON.

use std::path::{Path, PathBuf};
use std::process;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use trustgate_core::{
    generate_salt, issue_commitments, EventVerdict, HistoricalEvent, HistorySummary, LeaveClaim,
    LeaveHistory, PolicyConfig, PrivateCredential, Proof, ProofRequest, SensitiveCalendar,
    SessionDescriptor, TrustEngine, VerificationRequest, VerifyError,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// trustgate - trust scoring for presence claims and credential proofs.
///
/// Verifies attendance check-ins from location, network, device and time
/// signals, looks for spoofing patterns across past check-ins, scores leave
/// claims for risk and issues selective-disclosure proofs over committed
/// credentials.
#[derive(Parser)]
#[command(name = "trustgate")]
#[command(version = VERSION)]
#[command(about = "Presence trust scoring and selective-disclosure proofs")]
#[command(long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Policy file (JSON); unspecified fields keep their defaults
    #[arg(long)]
    policy: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify and classify one presence event
    Verify {
        /// JSON file with `request`, `session` and optional `history`
        input: PathBuf,
    },

    /// Scan past events for cross-event anomalies
    Anomalies {
        /// JSON array of past events
        events: PathBuf,
    },

    /// Assess the risk of a leave claim
    LeaveRisk {
        /// JSON file with `claim`, `history` and `calendar`
        input: PathBuf,
    },

    /// Generate a fresh credential salt
    Salt,

    /// Compute the public commitments for a credential
    Issue {
        /// JSON file with the private credential fields and salt
        credential: PathBuf,
    },

    /// Generate a selective-disclosure proof
    Prove {
        /// JSON proof request
        request: PathBuf,
    },

    /// Verify a previously generated proof
    CheckProof {
        /// JSON proof
        proof: PathBuf,

        /// Check at this RFC 3339 time instead of now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Print the effective policy
    Policy,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("cannot render output: {0}")]
    Render(#[from] serde_json::Error),

    #[error(transparent)]
    Verify(#[from] VerifyError),
}

#[derive(Deserialize)]
struct VerifyInput {
    request: VerificationRequest,
    session: SessionDescriptor,
    #[serde(default)]
    history: Option<HistorySummary>,
    #[serde(default)]
    past_events: Vec<HistoricalEvent>,
    #[serde(default)]
    server_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct LeaveInput {
    claim: LeaveClaim,
    #[serde(default)]
    history: LeaveHistory,
    #[serde(default)]
    calendar: SensitiveCalendar,
}

#[derive(Serialize)]
struct SaltOutput {
    salt: String,
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })
}

fn parse_error(path: &Path) -> impl FnOnce(serde_json::Error) -> CliError + '_ {
    move |source| CliError::Parse {
        path: path.display().to_string(),
        source,
    }
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    serde_json::from_str(&read(path)?).map_err(parse_error(path))
}

fn load_policy(path: Option<&Path>) -> Result<PolicyConfig, CliError> {
    match path {
        Some(path) => PolicyConfig::from_json(&read(path)?).map_err(parse_error(path)),
        None => Ok(PolicyConfig::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// Text rendering
// =============================================================================

fn mark(ok: bool) -> &'static str {
    if ok {
        "\x1b[32m[PASS]\x1b[0m"
    } else {
        "\x1b[31m[FAIL]\x1b[0m"
    }
}

fn print_verdict(verdict: &EventVerdict) {
    let o = &verdict.outcome;
    println!("\nPRESENCE VERIFICATION");
    println!("=====================\n");
    if let Some(id) = &verdict.session_id {
        println!("Session: {}", id);
    }
    println!(
        "  {} Location   {:.1} m from center (accuracy {:.0} m){}",
        mark(o.geo.within_geofence && !o.geo.is_mock_location),
        o.geo.distance_m,
        o.geo.accuracy_m,
        if o.geo.is_mock_location { ", mock suspected" } else { "" }
    );
    println!("  {} Network    {:?}", mark(o.network.is_verified()), o.network.status);
    println!(
        "  {} Device     registered={} emulator={} rooted={}",
        mark(o.device.fingerprint_match && !o.device.is_emulator && !o.device.is_rooted),
        o.device.is_registered,
        o.device.is_emulator,
        o.device.is_rooted
    );
    println!(
        "  {} Time       drift {} ms",
        mark(o.time.within_window && !o.time.drift_flagged),
        o.time.client_drift_ms
    );
    println!();
    println!("Score:   {}/100 ({})", o.score, if o.passed { "passed" } else { "failed" });
    for reason in o.failure_reasons() {
        println!("  - {}", reason);
    }
    println!(
        "Verdict: {:?} ({}/100)",
        verdict.classification.verdict, verdict.classification.score
    );
    for pattern in &verdict.classification.patterns {
        println!("  - {}", pattern);
    }
    println!("Status:  {:?}", verdict.status);
    println!("Hash:    {}", verdict.verification_hash);
}

fn run(cli: Cli, json: bool) -> Result<(), CliError> {
    let engine = TrustEngine::with_policy(load_policy(cli.policy.as_deref())?);

    match cli.command {
        Commands::Verify { input } => {
            let input: VerifyInput = load(&input)?;
            let history = match input.history {
                Some(history) => Some(history),
                None if !input.past_events.is_empty() => {
                    Some(engine.summarize_history(&input.past_events))
                },
                None => None,
            };
            let verdict = engine.evaluate_event_at(
                &input.request,
                &input.session,
                history.as_ref(),
                input.server_time.unwrap_or_else(Utc::now),
            )?;
            if json {
                print_json(&verdict)?;
            } else {
                print_verdict(&verdict);
            }
        },
        Commands::Anomalies { events } => {
            let events: Vec<HistoricalEvent> = load(&events)?;
            let findings = engine.detect_anomalies(&events);
            if json {
                print_json(&findings)?;
            } else if findings.is_empty() {
                println!("No anomalies across {} events.", events.len());
            } else {
                for f in &findings {
                    println!(
                        "[{}] {} {:?}: {}",
                        f.severity,
                        f.subject_name.as_deref().unwrap_or(&f.subject_id),
                        f.kind,
                        f.description
                    );
                    for e in &f.evidence {
                        println!("    {}", e);
                    }
                }
            }
        },
        Commands::LeaveRisk { input } => {
            let input: LeaveInput = load(&input)?;
            let assessment = engine.assess_leave_risk(&input.claim, &input.history, &input.calendar)?;
            if json {
                print_json(&assessment)?;
            } else {
                println!(
                    "Risk: {}/100 ({}) -> {:?}",
                    assessment.score, assessment.level, assessment.recommendation
                );
                for p in &assessment.patterns {
                    println!("  [{}] {}", p.severity, p.description);
                }
                println!("{}", assessment.explanation);
            }
        },
        Commands::Salt => {
            let salt = generate_salt();
            if json {
                print_json(&SaltOutput {
                    salt: salt.as_str().to_string(),
                })?;
            } else {
                println!("{}", salt.as_str());
            }
        },
        Commands::Issue { credential } => {
            let credential: PrivateCredential = load(&credential)?;
            let commitments = issue_commitments(&credential);
            if json {
                print_json(&commitments)?;
            } else {
                println!("date-range:  {}", commitments.date_range);
                println!("issuer:      {}", commitments.issuer);
                println!("cred-type:   {}", commitments.credential_type);
            }
        },
        Commands::Prove { request } => {
            let request: ProofRequest = load(&request)?;
            let proof = engine.generate_proof(&request)?;
            // The proof is the artifact callers store, so it is always JSON.
            print_json(&proof)?;
        },
        Commands::CheckProof { proof, at } => {
            let proof: Proof = load(&proof)?;
            let result = engine.verify_proof_at(&proof, at.unwrap_or_else(Utc::now));
            if json {
                print_json(&result)?;
            } else {
                println!("{} Proof {}", mark(result.is_valid), proof.id);
                for reason in result.failure_reasons() {
                    println!("  - {}", reason);
                }
            }
        },
        Commands::Policy => print_json(engine.policy())?,
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let json_output = cli.format == "json";

    // Initialize logging (suppress for JSON output)
    if json_output {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::ERROR)
            .with_target(false)
            .init();
    } else if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_target(false)
            .init();
    }

    if let Err(e) = run(cli, json_output) {
        eprintln!("error: {}", e);
        process::exit(2);
    }
}
