//! Interactive research shell.
//!
//! Plain text runs a search; slash commands open results, manage the
//! document collection, and generate reports.

use crate::commands::save_report;
use crate::markdown::{render_document, render_report, render_results};
use deepread_core::config::DeepReadConfig;
use deepread_core::error::ResearchError;
use deepread_core::research::{ResearchSession, Settled};
use deepread_core::types::ReportMode;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const HELP: &str = "\
Commands:
  <text>                 Search the web for <text>
  /search <query>        Same as typing the query
  /open <n|url>          Open result n (or any URL) in the reader
  /results               Show the current search results
  /docs                  List collected documents
  /drop <n>              Remove document n from the collection
  /close                 Close the reader view
  /analyze [topic]       Generate a report from the collected documents
  /research <topic>      Search, fetch the top results, and generate a report
  /mode [long_form|sections]  Show or set the report mode
  /report                Show the last report
  /save <file>           Save the last report (.json or Markdown)
  /export <file>         Save the whole session as JSON
  /reset                 Clear results, documents and the report
  /help                  Show this help
  /quit                  Exit";

/// Where `/open` should go.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OpenTarget {
    Result(usize),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Search(String),
    Open(OpenTarget),
    Results,
    Docs,
    Drop(usize),
    Close,
    Analyze(Option<String>),
    Research(String),
    Mode(Option<ReportMode>),
    Report,
    Save(PathBuf),
    Export(PathBuf),
    Reset,
    Help,
    Quit,
    Invalid(String),
}

fn parse_number(arg: &str, usage: &str) -> Result<usize, ShellCommand> {
    arg.parse::<usize>()
        .map_err(|_| ShellCommand::Invalid(format!("Usage: {usage}")))
}

/// Parse one line of input. `None` for a blank line.
fn parse_command(input: &str) -> Option<ShellCommand> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    let Some(rest) = input.strip_prefix('/') else {
        return Some(ShellCommand::Search(input.to_string()));
    };

    let (cmd, arg) = match rest.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (rest, ""),
    };

    let command = match (cmd, arg) {
        ("search" | "s", "") => ShellCommand::Invalid("Usage: /search <query>".into()),
        ("search" | "s", query) => ShellCommand::Search(query.to_string()),
        ("open" | "o", "") => ShellCommand::Invalid("Usage: /open <n|url>".into()),
        ("open" | "o", target) => match target.parse::<usize>() {
            Ok(n) => ShellCommand::Open(OpenTarget::Result(n)),
            Err(_) => ShellCommand::Open(OpenTarget::Url(target.to_string())),
        },
        ("results" | "r", _) => ShellCommand::Results,
        ("docs" | "d", _) => ShellCommand::Docs,
        ("drop", n) => match parse_number(n, "/drop <n>") {
            Ok(n) => ShellCommand::Drop(n),
            Err(invalid) => invalid,
        },
        ("close", _) => ShellCommand::Close,
        ("analyze" | "a", "") => ShellCommand::Analyze(None),
        ("analyze" | "a", topic) => ShellCommand::Analyze(Some(topic.to_string())),
        ("research", "") => ShellCommand::Invalid("Usage: /research <topic>".into()),
        ("research", topic) => ShellCommand::Research(topic.to_string()),
        ("mode", "") => ShellCommand::Mode(None),
        ("mode", mode) => match mode.parse::<ReportMode>() {
            Ok(mode) => ShellCommand::Mode(Some(mode)),
            Err(e) => ShellCommand::Invalid(e),
        },
        ("report", _) => ShellCommand::Report,
        ("save", "") => ShellCommand::Invalid("Usage: /save <file>".into()),
        ("save", path) => ShellCommand::Save(PathBuf::from(path)),
        ("export", "") => ShellCommand::Invalid("Usage: /export <file>".into()),
        ("export", path) => ShellCommand::Export(PathBuf::from(path)),
        ("reset", _) => ShellCommand::Reset,
        ("help" | "?", _) => ShellCommand::Help,
        ("quit" | "exit" | "q", _) => ShellCommand::Quit,
        (other, _) => ShellCommand::Invalid(format!("Unknown command: /{other} (try /help)")),
    };
    Some(command)
}

/// Run the interactive shell until `/quit` or end of input.
pub async fn run_shell(session: ResearchSession, config: &DeepReadConfig) -> anyhow::Result<()> {
    let mut mode = config.research.mode;

    println!("\x1b[1;32mdeepread\x1b[0m {}", env!("CARGO_PKG_VERSION"));
    println!(
        "  Model: {} | Mode: {} | Fetch count: {}",
        config.generation.model, mode, config.research.default_fetch_count
    );
    if session.api_key().is_none() {
        println!(
            "  \x1b[33mNo generation API key configured.\x1b[0m Run `deepread auth set` or export {}.",
            config.generation.api_key_env
        );
    }
    println!("  Type a query to search, /help for commands, /quit to exit\n");

    let stdin = io::stdin();
    loop {
        print!("\x1b[1;34m> \x1b[0m");
        io::stdout().flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input).is_err() || input.is_empty() {
            break;
        }

        let Some(command) = parse_command(&input) else {
            continue;
        };
        if command == ShellCommand::Quit {
            println!("Goodbye!");
            break;
        }
        if let Err(e) = execute(command, &session, &mut mode).await {
            println!("\x1b[31mError:\x1b[0m {e}");
        }
    }
    Ok(())
}

async fn execute(
    command: ShellCommand,
    session: &ResearchSession,
    mode: &mut ReportMode,
) -> anyhow::Result<()> {
    match command {
        ShellCommand::Search(query) => {
            if let Settled::Applied(results) = session.search(&query).await? {
                if results.is_empty() {
                    println!("No results found for \"{query}\".");
                } else {
                    print!("{}", render_results(&results));
                    println!("Use /open <n> to read a result.");
                }
            }
        }
        ShellCommand::Open(target) => {
            let settled = match target {
                OpenTarget::Result(n) => session.open_result(n).await?,
                OpenTarget::Url(url) => session.open(&url).await?,
            };
            if let Settled::Applied(document) = settled {
                print!("{}", render_document(&document));
                println!(
                    "\nAdded to collection ({} documents). Use /analyze to generate a report.",
                    session.documents().len()
                );
            }
        }
        ShellCommand::Results => {
            let results = session.results();
            match session.query() {
                Some(query) if !results.is_empty() => {
                    println!("Results for \"{query}\":\n");
                    print!("{}", render_results(&results));
                }
                _ => println!("No search results. Type a query to search."),
            }
        }
        ShellCommand::Docs => {
            let documents = session.documents();
            if documents.is_empty() {
                println!("No documents collected. Use /open <n> after a search.");
            }
            let current = session.current_document().map(|d| d.url);
            for (i, doc) in documents.iter().enumerate() {
                let marker = if current.as_deref() == Some(doc.url.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{marker}{:>3}. {} ({} words)\n      {}",
                    i + 1,
                    doc.title,
                    doc.word_count(),
                    doc.url
                );
            }
        }
        ShellCommand::Drop(n) => {
            let documents = session.documents();
            let doc = n.checked_sub(1).and_then(|i| documents.get(i)).ok_or_else(|| {
                anyhow::anyhow!("No document #{n}; the collection has {}", documents.len())
            })?;
            if let Some(removed) = session.remove_document(&doc.url) {
                println!("Removed \"{}\".", removed.title);
            }
        }
        ShellCommand::Close => {
            session.close_document();
            println!("Reader closed.");
        }
        ShellCommand::Analyze(topic) => {
            let topic = topic
                .or_else(|| session.query())
                .ok_or_else(|| anyhow::anyhow!("Usage: /analyze <topic> (no search to take it from)"))?;
            println!(
                "Analyzing {} documents on \"{topic}\"...",
                session.documents().len()
            );
            let report = session.analyze(&topic, Some(*mode)).await?;
            print!("{}", render_report(&report));
        }
        ShellCommand::Research(topic) => {
            println!("Researching \"{topic}\"...");
            match session.research(&topic, None, Some(*mode)).await {
                Ok(report) => print!("{}", render_report(&report)),
                Err(ResearchError::Superseded) => {}
                Err(e) => return Err(e.into()),
            }
        }
        ShellCommand::Mode(None) => println!("Report mode: {mode}"),
        ShellCommand::Mode(Some(new_mode)) => {
            *mode = new_mode;
            println!("Report mode set to {mode}.");
        }
        ShellCommand::Report => match session.report() {
            Some(report) => print!("{}", render_report(&report)),
            None => println!("No report yet. Use /analyze or /research."),
        },
        ShellCommand::Save(path) => {
            let report = session
                .report()
                .ok_or_else(|| anyhow::anyhow!("No report to save"))?;
            save_report(&report, &path)?;
            println!("Report saved to {}", path.display());
        }
        ShellCommand::Export(path) => {
            let json = serde_json::to_string_pretty(&session.snapshot())?;
            std::fs::write(&path, json)?;
            println!("Session exported to {}", path.display());
        }
        ShellCommand::Reset => {
            session.reset();
            println!("Session cleared.");
        }
        ShellCommand::Help => println!("{HELP}"),
        ShellCommand::Quit => {}
        ShellCommand::Invalid(message) => println!("{message}"),
    }
    Ok(())
}
