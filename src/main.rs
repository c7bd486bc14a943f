use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use todostore::{Config, DeleteUndoController, FileStorage, Filter, Session, TodoStore, now_ms};

#[derive(Parser)]
#[command(name = "todostore")]
#[command(about = "todostore - Persistent todo list with timed undo-delete")]
#[command(version)]
struct Cli {
    /// Directory holding todos.json (overrides the config file)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// One line typed at the prompt
#[derive(Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a new todo (max 100 chars)
    Add {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        title: Vec<String>,
    },

    /// Replace the title of the todo at a list position
    Edit {
        index: usize,
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        title: Vec<String>,
    },

    /// Mark a todo done, or not done
    Toggle { index: usize },

    /// Delete a todo; it can be restored with `undo` for a few seconds
    #[command(alias = "rm")]
    Delete { index: usize },

    /// Restore the most recently deleted todo
    Undo,

    /// Remove all completed todos
    Clear,

    /// Show all, active or completed todos
    Filter { filter: Filter },

    /// Print the list
    #[command(alias = "ls")]
    List,

    /// Leave the prompt
    #[command(alias = "exit")]
    Quit,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(path) = cli.store_path {
        config.store_path = path;
    }

    // Open store
    let storage = FileStorage::open(&config.store_path)?;
    let store = TodoStore::open(storage)?;
    let mut session = Session::new(store, DeleteUndoController::new(config.undo_seconds));

    println!("todostore {} ({})", env!("CARGO_PKG_VERSION"), config.store_path.display());
    println!("Type `help` for commands.\n");
    render(&session);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{} ", ">".bold());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        if let Some(todo) = session.tick(now_ms()) {
            println!("{} {}", "Deleted for good:".dimmed(), todo.title.dimmed());
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        let command = match Line::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                e.print()?;
                continue;
            }
        };

        if matches!(command, Command::Quit) {
            break;
        }

        match run(&mut session, command, &line) {
            Ok(()) => render(&session),
            Err(e) => println!("{} {:#}", "Error:".red().bold(), e),
        }
    }

    Ok(())
}

fn run(session: &mut Session<FileStorage>, command: Command, line: &str) -> Result<()> {
    match command {
        // Titles come from the raw line so their spacing is kept as typed
        Command::Add { .. } => {
            session.add(text_after(line, 1))?;
        }
        Command::Edit { index, .. } => {
            let id = id_at(session, index)?;
            session.begin_edit(&id)?;
            session.set_edit_text(text_after(line, 2));
            if let Err(e) = session.save_edit() {
                session.cancel_edit();
                return Err(e.into());
            }
        }
        Command::Toggle { index } => {
            let id = id_at(session, index)?;
            session.toggle(&id)?;
        }
        Command::Delete { index } => {
            let id = id_at(session, index)?;
            session.delete(&id, now_ms())?;
        }
        Command::Undo => {
            session.undo_delete()?;
        }
        Command::Clear => {
            let removed = session.clear_completed()?;
            println!("Cleared {} completed todo(s)", removed);
        }
        Command::Filter { filter } => session.set_filter(filter),
        Command::List | Command::Quit => {}
    }

    Ok(())
}

/// Resolve a 1-based position in the visible list to a todo id
fn id_at(session: &Session<FileStorage>, index: usize) -> Result<String> {
    let visible = session.visible();
    index
        .checked_sub(1)
        .and_then(|i| visible.get(i))
        .map(|todo| todo.id.clone())
        .ok_or_else(|| eyre!("No todo at position {} (showing {})", index, visible.len()))
}

fn render(session: &Session<FileStorage>) {
    let filters: Vec<String> = Filter::ALL
        .iter()
        .map(|f| {
            if *f == session.filter() {
                f.as_str().blue().bold().to_string()
            } else {
                f.as_str().dimmed().to_string()
            }
        })
        .collect();
    println!("[{}]", filters.join(" | "));

    let visible = session.visible();
    if visible.is_empty() {
        println!("  {}", "(nothing here)".dimmed());
    }
    for (i, todo) in visible.iter().enumerate() {
        if todo.completed {
            println!("{:>3}. [x] {}", i + 1, todo.title.strikethrough().dimmed());
        } else {
            println!("{:>3}. [ ] {}", i + 1, todo.title);
        }
    }

    if let Some(banner) = session.undo_banner() {
        println!(
            "\n{} {}  {}",
            "Todo deleted:".yellow(),
            banner.title,
            format!("`undo` ({}s)", banner.seconds_remaining).yellow().bold()
        );
    }
    println!();
}

/// The rest of a line after its first `words` whitespace-separated words
fn text_after(line: &str, words: usize) -> &str {
    let mut rest = line.trim_start();
    for _ in 0..words {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = rest[end..].trim_start();
    }
    rest
}
