// Coding room CLI client
// Joins a competition room, runs code against the judge, and tracks the session

use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{interval, sleep_until, Duration, Instant};
use tokio_tungstenite::connect_async;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use coderoom::config::Config;
use coderoom::error::RoomError;
use coderoom::gateway::GatewayConnection;
use coderoom::judge::{JudgeClient, Language, RunVerdict};
use coderoom::room::{Difficulty, Question, RunReport, SessionController, SessionNotice};

#[derive(Parser)]
#[command(name = "coderoom-cli")]
#[command(about = "Coding room competition client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway and judge service connectivity
    Health,

    /// Compute a score locally from a submission's raw numbers
    Score {
        /// Question difficulty: easy, medium or hard
        #[arg(short, long)]
        difficulty: String,

        /// Number of passed test cases
        #[arg(short, long)]
        passed: u32,

        /// Total number of test cases
        #[arg(short, long)]
        total: u32,

        /// Failed run attempts before this submission
        #[arg(short, long, default_value_t = 0)]
        wrong: u32,

        /// Whole minutes spent on the question
        #[arg(short, long, default_value_t = 0)]
        elapsed: u32,
    },

    /// Join a room and work through its questions interactively
    Join {
        /// Six-digit room code
        #[arg(short, long)]
        room_id: String,

        /// Display name inside the room
        #[arg(short, long)]
        username: String,

        /// Starting language: c, cpp, java, python or javascript
        #[arg(short, long, default_value = "python")]
        language: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Health => {
            check_health(&config).await;
        }
        Commands::Score {
            difficulty,
            passed,
            total,
            wrong,
            elapsed,
        } => {
            score_offline(&difficulty, passed, total, wrong, elapsed);
        }
        Commands::Join {
            room_id,
            username,
            language,
        } => {
            let language = match language.parse::<Language>() {
                Ok(language) => language,
                Err(e) => {
                    println!("{} {}", "✗".red(), e);
                    return;
                }
            };
            join_room(&config, room_id, username, language).await;
        }
    }
}

async fn check_health(config: &Config) {
    println!("{}", "Checking service connectivity...".cyan());

    let judge = JudgeClient::new(&config.judge);
    if judge.health().await {
        println!("{} Judge service is healthy", "✓".green());
    } else {
        println!(
            "{} Judge service unreachable at {}",
            "✗".red(),
            config.judge.url
        );
    }

    match connect_async(&config.gateway.url).await {
        Ok((ws_stream, _)) => {
            println!("{} Gateway accepting connections", "✓".green());
            drop(ws_stream);
        }
        Err(e) => {
            println!(
                "{} Gateway unreachable at {}: {}",
                "✗".red(),
                config.gateway.url,
                e
            );
        }
    }
}

fn score_offline(difficulty: &str, passed: u32, total: u32, wrong: u32, elapsed: u32) {
    let difficulty = match parse_difficulty(difficulty) {
        Some(d) => d,
        None => {
            println!(
                "{} Unknown difficulty '{}', expected easy, medium or hard",
                "✗".red(),
                difficulty
            );
            return;
        }
    };

    let score = coderoom::room::scoring::score(difficulty, passed, total, wrong, elapsed);
    println!(
        "{} {:?}, {}/{} passed, {} wrong, {} min: {}",
        "Score".bold(),
        difficulty,
        passed,
        total,
        wrong,
        elapsed,
        score.to_string().green().bold()
    );
}

fn parse_difficulty(raw: &str) -> Option<Difficulty> {
    match raw.to_lowercase().as_str() {
        "easy" => Some(Difficulty::Easy),
        "medium" => Some(Difficulty::Medium),
        "hard" => Some(Difficulty::Hard),
        _ => None,
    }
}

async fn join_room(config: &Config, room_id: String, username: String, language: Language) {
    println!("{}", "Connecting to room...".cyan());

    let mut connection = match GatewayConnection::connect(&config.gateway, &room_id, &username).await
    {
        Ok(connection) => connection,
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            return;
        }
    };
    println!("{} Joined room {}", "✓".green(), room_id.bold());
    print_help();

    let judge = Arc::new(JudgeClient::new(&config.judge));
    let mut session =
        SessionController::new(room_id.clone(), username.clone(), language, connection.sender());

    let (verdict_tx, mut verdict_rx) = mpsc::unbounded_channel::<RunVerdict>();
    let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = interval(Duration::from_secs(1));
    let mut last_remaining: Option<u32> = None;

    loop {
        let presence_deadline = session.next_presence_deadline();
        let presence_sleep = async {
            match presence_deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => futures::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = ticker.tick() => {
                let remaining = session.tick();
                if remaining == Some(0) && last_remaining.map_or(false, |r| r > 0) {
                    println!("{}", "⏱ Time is up for this question. Use :next to move on.".yellow());
                }
                last_remaining = remaining;
            }

            event = connection.recv() => {
                match event {
                    Some(event) => match session.apply_server_event(event) {
                        Ok(Some(notice)) => print_notice(&session, notice),
                        Ok(None) => {}
                        Err(e) => println!("{} {}", "✗".red(), e),
                    },
                    None => {
                        println!("{}", "✗ Gateway connection lost".red());
                        break;
                    }
                }
            }

            Some(verdict) = verdict_rx.recv() => {
                match session.apply_run(verdict) {
                    Ok(report) => print_run_report(&session, &report),
                    Err(e) => println!("{} {}", "✗".red(), e),
                }
            }

            _ = presence_sleep => {
                session.poll_presence(Instant::now());
            }

            line = stdin_lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if !handle_line(&mut session, &judge, &verdict_tx, line.as_str()).await {
                            break;
                        }
                        last_remaining = session.remaining_secs();
                    }
                    Ok(None) | Err(_) => break,
                }
            }
        }
    }

    connection.leave(&room_id, &username);
    println!("{} Left room {}", "✓".green(), room_id);
}

/// Dispatches one stdin line. Returns false when the session should end.
async fn handle_line(
    session: &mut SessionController,
    judge: &Arc<JudgeClient>,
    verdict_tx: &mpsc::UnboundedSender<RunVerdict>,
    line: &str,
) -> bool {
    let now = Instant::now();
    session.activity(now);

    match line.trim() {
        ":leave" | ":quit" => return false,
        ":help" => print_help(),
        ":status" => print_status(session),
        ":question" => match session.current_question() {
            Ok(question) => print_question(question, session.current_index()),
            Err(e) => println!("{} {}", "✗".red(), e),
        },
        ":code" => println!("{}", session.code()),
        ":next" => match session.handle_next() {
            Ok(question) => {
                let question = question.clone();
                print_question(&question, session.current_index());
            }
            Err(e) => print_error(&e),
        },
        ":prev" => match session.handle_previous() {
            Ok(question) => {
                let question = question.clone();
                print_question(&question, session.current_index());
            }
            Err(e) => print_error(&e),
        },
        ":run" => match session.begin_run() {
            Ok(request) => {
                let question = match session.current_question() {
                    Ok(question) => question.clone(),
                    Err(e) => {
                        print_error(&e);
                        return true;
                    }
                };
                println!("{}", "Running code against test cases...".cyan());
                let judge = Arc::clone(judge);
                let tx = verdict_tx.clone();
                tokio::spawn(async move {
                    let verdict = judge
                        .run(&request.source_code, request.language, &question)
                        .await;
                    let _ = tx.send(verdict);
                });
            }
            Err(e) => print_error(&e),
        },
        ":submit" => match session.submit_code() {
            Ok(estimate) => {
                println!(
                    "{} Submitted! Estimated score: {}",
                    "✓".green(),
                    estimate.to_string().green().bold()
                );
            }
            Err(e) => print_error(&e),
        },
        command if command.starts_with(":lang") => {
            let raw = command.trim_start_matches(":lang").trim();
            match raw.parse::<Language>() {
                Ok(language) => match session.set_language(language) {
                    Ok(()) => println!("{} Language set to {}", "✓".green(), language),
                    Err(e) => print_error(&e),
                },
                Err(e) => print_error(&e),
            }
        }
        command if command.starts_with(':') => {
            println!("{} Unknown command: {}", "✗".yellow(), command);
        }
        _ => {
            // Anything else is a line of code appended to the editor
            if let Err(e) = session.edit(line, now) {
                print_error(&e);
            }
        }
    }
    true
}

fn print_error(error: &RoomError) {
    if error.is_guard_violation() {
        println!("{} {}", "✗".yellow(), error);
    } else {
        println!("{} {}", "✗".red(), error);
    }
}

fn print_notice(session: &SessionController, notice: SessionNotice) {
    match notice {
        SessionNotice::QuestionsLoaded(count) => {
            println!("{} Received {} questions", "✓".green(), count);
            if let Ok(question) = session.current_question() {
                print_question(question, session.current_index());
            }
        }
        SessionNotice::UserJoined(username) => {
            println!("{} {} joined the room", "▶".green(), username.bold());
        }
        SessionNotice::UserLeft(username) => {
            println!("{} {} left the room", "◀".yellow(), username.bold());
        }
    }
}

fn print_question(question: &Question, index: usize) {
    println!("\n{}", "═".repeat(50).cyan());
    println!(
        "{} {} ({:?})",
        format!("Q{}:", index + 1).bold(),
        question.title.bold(),
        question.difficulty
    );
    println!("{}", "═".repeat(50).cyan());
    println!("{}", question.description);
    if question.example_input.is_some() || question.example_output.is_some() {
        println!("\n{}", question.example_text());
    }
    println!();
}

fn print_status(session: &SessionController) {
    if let Some(remaining) = session.remaining_secs() {
        println!(
            "Question {}/{}, {}:{:02} remaining, status: {}",
            session.current_index() + 1,
            session.question_count(),
            remaining / 60,
            remaining % 60,
            session.status().label()
        );
    }
    println!("{}", "Participants:".bold());
    for participant in session.leaderboard() {
        let estimate = participant
            .local_estimate
            .map(|s| format!(" (~{})", s))
            .unwrap_or_default();
        println!(
            "  {:<16} {:>5}{}  {}  {}",
            participant.name,
            participant.score,
            estimate,
            participant.status.label(),
            participant.time_spent
        );
    }
}

fn print_run_report(session: &SessionController, report: &RunReport) {
    if report.discarded {
        println!("{}", "Run result for a previous question discarded".yellow());
        return;
    }
    if let Some(failure) = &report.failure {
        print_error(failure);
    }
    for (i, case) in session.results().iter().enumerate() {
        let mark = if case.passed == Some(true) {
            "✓".green()
        } else {
            "✗".red()
        };
        println!("  {} Test case {}", mark, i + 1);
    }
    if report.total > 0 && report.passed == report.total {
        println!(
            "{} All {} test cases passed. Use :submit to lock in your score.",
            "✓".green().bold(),
            report.total
        );
    } else {
        println!(
            "{} {}/{} test cases passed",
            "✗".red(),
            report.passed,
            report.total
        );
    }
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  :run       run your code against the test cases");
    println!("  :submit    submit once all test cases pass");
    println!("  :next      move to the next question");
    println!("  :prev      go back one question");
    println!("  :lang <l>  switch language (c, cpp, java, python, javascript)");
    println!("  :question  reprint the current question");
    println!("  :code      show the editor buffer");
    println!("  :status    show timer and participants");
    println!("  :leave     leave the room");
    println!("  anything else is appended to your code");
}
