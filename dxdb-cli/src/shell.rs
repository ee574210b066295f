/// Interactive shell for dxdb
///
/// Statements run when a line ends with `;`. Lines starting with `.` are
/// meta commands.

use crate::table::{self, OutputFormat};
use anyhow::{Context, Result};
use colored::Colorize;
use dxdb_api::Database;
use dxdb_core::QueryResult;
use rustyline::error::ReadlineError;
use rustyline::{
    completion::{Completer, Pair},
    highlight::Highlighter,
    hint::Hinter,
    validate::Validator,
    Helper,
};
use std::path::PathBuf;

const META_COMMANDS: &[&str] = &[
    ".help", ".tables", ".sequences", ".indices", ".desc", ".format", ".exit", ".quit",
];

const KEYWORDS: &[&str] = &[
    "SELECT", "DISTINCT", "FROM", "WHERE", "ORDER", "BY", "LIMIT", "OFFSET", "INSERT", "INTO",
    "VALUES", "VALUE", "UPDATE", "SET", "DELETE", "CREATE", "TABLE", "SEQUENCE", "INDEX", "ON",
    "USING", "DROP", "ALTER", "ADD", "COLUMN", "RENAME", "TO", "DESC", "SHOW", "TABLES",
    "SEQUENCES", "INDICES", "NEXTVAL", "AND", "OR", "NOT", "NULL", "LIKE", "IN", "BETWEEN",
];

/// Autocomplete for SQL keywords and meta commands
#[derive(Clone)]
struct DxdbCompleter;

impl Completer for DxdbCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];

        if prefix.starts_with('.') {
            let candidates = META_COMMANDS
                .iter()
                .filter(|cmd| cmd.starts_with(prefix))
                .map(|cmd| Pair {
                    display: cmd.to_string(),
                    replacement: cmd.to_string(),
                })
                .collect();
            return Ok((0, candidates));
        }

        let start = prefix
            .rfind(|c: char| c.is_whitespace() || c == '(' || c == ',')
            .map(|i| i + 1)
            .unwrap_or(0);
        let word = prefix[start..].to_uppercase();
        if word.is_empty() {
            return Ok((start, Vec::new()));
        }
        let candidates = KEYWORDS
            .iter()
            .filter(|kw| kw.starts_with(&word))
            .map(|kw| Pair {
                display: kw.to_string(),
                replacement: kw.to_string(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for DxdbCompleter {
    type Hint = String;
}

impl Highlighter for DxdbCompleter {}

impl Validator for DxdbCompleter {}

impl Helper for DxdbCompleter {}

/// Interactive shell session state
pub struct Shell {
    db: Database,
    location: String,
    editor: rustyline::Editor<DxdbCompleter, rustyline::history::FileHistory>,
    format: OutputFormat,
}

/// Print a failed command; the session continues
fn report(result: Result<()>) {
    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
    }
}

fn history_path() -> PathBuf {
    dirs::home_dir()
        .map(|p| p.join(".dxdb_history"))
        .unwrap_or_else(|| ".dxdb_history".into())
}

impl Shell {
    pub fn new(db: Database, location: String) -> Result<Self> {
        let mut editor = rustyline::Editor::new().context("Failed to initialize line editor")?;
        editor.set_helper(Some(DxdbCompleter));

        let history = history_path();
        if history.exists() {
            let _ = editor.load_history(&history);
        }

        Ok(Self {
            db,
            location,
            editor,
            format: OutputFormat::Table,
        })
    }

    /// Run the REPL until `.exit` or Ctrl+D
    pub fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let mut buffer = String::new();
        loop {
            let prompt = if buffer.is_empty() {
                format!("{} ", "dxdb>".green().bold())
            } else {
                format!("{}  ", "...>".dimmed())
            };

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(line);

                    if buffer.is_empty() && line.starts_with('.') {
                        if line == ".exit" || line == ".quit" {
                            break;
                        }
                        let result = self.execute_meta_command(line);
                        report(result);
                        continue;
                    }

                    if !buffer.is_empty() {
                        buffer.push('\n');
                    }
                    buffer.push_str(line);

                    if buffer.ends_with(';') {
                        let script = std::mem::take(&mut buffer);
                        report(self.execute_script(&script));
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    buffer.clear();
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("Error reading line: {}", err);
                    break;
                }
            }
        }

        self.db.close();
        self.save_history()
    }

    fn print(&self, result: &QueryResult) -> Result<()> {
        println!("{}", table::render(result, self.format)?);
        Ok(())
    }

    fn execute_script(&self, script: &str) -> Result<()> {
        let results = self.db.execute_script(script)?;
        for result in &results {
            self.print(result)?;
        }
        Ok(())
    }

    fn execute_meta_command(&mut self, command: &str) -> Result<()> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        match parts.as_slice() {
            [".help"] => {
                self.show_help();
                Ok(())
            }
            [".tables"] => self.print(&QueryResult::Names(self.db.list_tables()?)),
            [".sequences"] => self.print(&QueryResult::Names(self.db.list_sequences()?)),
            [".indices"] => self.print(&QueryResult::Indices(self.db.list_indices(None)?)),
            [".indices", table] => {
                self.print(&QueryResult::Indices(self.db.list_indices(Some(*table))?))
            }
            [".desc", name] => self.print(&QueryResult::Description(self.db.desc(*name)?)),
            [".format", "table"] => {
                self.format = OutputFormat::Table;
                Ok(())
            }
            [".format", "json"] => {
                self.format = OutputFormat::Json;
                Ok(())
            }
            [".format", ..] => {
                println!("Usage: .format <table|json>");
                Ok(())
            }
            [".desc"] => {
                println!("Usage: .desc <table|sequence>");
                Ok(())
            }
            _ => {
                println!("{} {}", "Unknown command:".yellow(), command);
                println!("Type .help for available commands");
                Ok(())
            }
        }
    }

    fn show_help(&self) {
        println!("\n{}", "Meta commands:".cyan());
        println!("  .help               Show this help message");
        println!("  .tables             List tables");
        println!("  .sequences          List sequences");
        println!("  .indices [table]    List indices");
        println!("  .desc <name>        Describe a table or sequence");
        println!("  .format <type>      Set output format (table|json)");
        println!("  .exit, .quit        Exit the shell");

        println!("\n{}", "SQL (end statements with ;):".cyan());
        println!("  CREATE TABLE cars (brand VARCHAR(64), sedan BOOLEAN);");
        println!("  INSERT INTO cars (brand, sedan) VALUES ('Mazda', true);");
        println!("  SELECT brand FROM cars WHERE sedan = true ORDER BY brand;");
        println!("  UPDATE cars SET sedan = false WHERE brand = 'Mazda';");
        println!("  DELETE FROM cars WHERE brand = 'Mazda';");
        println!("  CREATE SEQUENCE ids; SELECT NEXTVAL('ids');");
        println!();
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", format!("dxdb shell v{}", env!("CARGO_PKG_VERSION")).cyan().bold());
        println!("  {} {} ({})", "Database:".cyan(), self.db.name(), self.location);
        println!("  Type {} for commands, end statements with {}", ".help".bold(), ";".bold());
        println!();
    }

    fn save_history(&mut self) -> Result<()> {
        self.editor
            .save_history(&history_path())
            .context("Failed to save command history")
    }
}
