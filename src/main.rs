mod collaborators;
mod controller;
mod db;
mod error;
mod models;
mod operations;

use clap::Parser;
use std::io;

use collaborators::{OcrEngine, SpeechRecognizer};
use controller::Controller;
use db::expense_store::ExpenseStore;
use error::{AppError, AppResult};
use models::expense::ExpenseRecord;
use operations::add::{parse_expense_input, today};
use operations::dashboard::run_dashboard;
use operations::history::run_history;

#[derive(Parser)]
#[command(name = "spense", about = "Record and review personal expenses")]
struct Cli {
    /// Path to the expense database file
    #[arg(long, default_value = "expenses.db")]
    database: String,
}

pub enum UserCommands {
    Add,
    Voice,
    Scan,
    Edit,
    Remove,
    Search,
    Print,
    History,
    Dashboard,
    Import,
    Help,
    Exit,
}

/// Placeholder used when no OCR engine is compiled in. Real engines plug
/// in through the same trait.
struct UnavailableOcr;

impl OcrEngine for UnavailableOcr {
    fn extract_text(&self, image_path: &str) -> AppResult<String> {
        Err(AppError::Ocr(format!(
            "No OCR engine is configured to read '{}'",
            image_path
        )))
    }
}

/// Reads one typed utterance in place of a microphone. Real speech
/// backends plug in through the same trait and must bound their wait.
struct TerminalSpeech;

impl SpeechRecognizer for TerminalSpeech {
    fn capture_and_transcribe(&self) -> AppResult<String> {
        println!("Speak something like 'add 100 groceries' (type the utterance):");
        let transcript = read_user_input().map_err(AppError::Speech)?;
        if transcript.is_empty() {
            return Err(AppError::Speech("No speech was recognized".to_string()));
        }
        Ok(transcript)
    }
}

fn main() {
    let cli = Cli::parse();

    println!("Welcome to the expense tracker!");
    let store = ExpenseStore::open(&cli.database).expect("Failed to open the expense database");
    let mut controller = Controller::new(store);

    loop {
        println!(
            "Please enter a command (add, voice, scan, edit, remove, search, print, history, dashboard, import, exit):"
        );

        let input = match read_user_input() {
            Ok(cmd) => cmd,
            Err(e) => {
                println!("Error reading input: {}", e);
                continue;
            }
        };
        if input.is_empty() {
            continue;
        }

        match check_for_command(&input) {
            UserCommands::Add => {
                println!(
                    "Add command selected. Enter the expense in the format:\ndate(YYYY-MM-DD, blank for today), category, description, amount"
                );
                let line = match read_user_input() {
                    Ok(details) => details,
                    Err(e) => {
                        println!("Error reading input: {}", e);
                        continue;
                    }
                };
                let result = parse_expense_input(&line).and_then(|input| {
                    controller.submit_add(
                        &input.date,
                        &input.category,
                        &input.description,
                        &input.amount_text,
                    )
                });
                match result {
                    Ok(id) => println!(
                        "Expense {} added! {} expenses on record.",
                        id,
                        controller.rows().len()
                    ),
                    Err(e) => println!("Error adding expense: {}", e),
                }
            }
            UserCommands::Voice => {
                let prefill = match controller.voice_prefill(&TerminalSpeech) {
                    Ok(prefill) => prefill,
                    Err(e) => {
                        println!("Could not understand. {}", e);
                        continue;
                    }
                };
                println!(
                    "Heard category '{}' and amount {}.",
                    prefill.category, prefill.amount
                );

                println!("Complete the entry: date(YYYY-MM-DD, blank for today), description");
                let line = match read_user_input() {
                    Ok(details) => details,
                    Err(e) => {
                        println!("Error reading input: {}", e);
                        continue;
                    }
                };
                let (date, description) = split_date_and_description(&line);

                match controller.submit_add(
                    &date,
                    &prefill.category,
                    &description,
                    &prefill.amount.to_string(),
                ) {
                    Ok(id) => println!("Expense {} added!", id),
                    Err(e) => println!("Error adding expense: {}", e),
                }
            }
            UserCommands::Scan => {
                println!("Scan command selected. Provide the receipt image path:");
                let path = match read_user_input() {
                    Ok(details) => details,
                    Err(e) => {
                        println!("Error reading input: {}", e);
                        continue;
                    }
                };
                match controller.scan_receipt(&UnavailableOcr, &path) {
                    Ok(text) => {
                        println!("Extracted receipt text:");
                        println!("{}", text);
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            UserCommands::Edit => {
                println!("Edit command selected. Provide the expense ID to edit:");
                let id = match read_expense_id() {
                    Ok(id) => id,
                    Err(e) => {
                        println!("Error: {}", e);
                        continue;
                    }
                };
                println!(
                    "Enter the new values in the format:\ndate(YYYY-MM-DD, blank for today), category, description, amount"
                );
                let line = match read_user_input() {
                    Ok(details) => details,
                    Err(e) => {
                        println!("Error reading input: {}", e);
                        continue;
                    }
                };
                let result = parse_expense_input(&line).and_then(|input| {
                    controller.submit_edit(
                        id,
                        &input.date,
                        &input.category,
                        &input.description,
                        &input.amount_text,
                    )
                });
                match result {
                    Ok(()) => println!("Expense updated!"),
                    Err(e) => println!("Error updating expense: {}", e),
                }
            }
            UserCommands::Remove => {
                println!("Remove command selected. Provide the expense ID to remove:");
                let id = match read_expense_id() {
                    Ok(id) => id,
                    Err(e) => {
                        println!("Error: {}", e);
                        continue;
                    }
                };
                println!("Are you sure you want to delete expense {}? (y/n)", id);
                let answer = read_user_input().unwrap_or_default();
                if !answer.eq_ignore_ascii_case("y") {
                    println!("Delete cancelled.");
                    continue;
                }
                match controller.submit_delete(id) {
                    Ok(()) => println!("Expense deleted!"),
                    Err(e) => println!("Error: {}", e),
                }
            }
            UserCommands::Search => {
                println!("Search command selected. Provide a term to search for:");
                let term = match read_user_input() {
                    Ok(details) => details,
                    Err(e) => {
                        println!("Error reading input: {}", e);
                        continue;
                    }
                };
                match controller.request_search(&term) {
                    Ok(rows) => {
                        if rows.is_empty() {
                            println!("No expenses found matching '{}'.", term);
                        } else {
                            print_rows(rows);
                        }
                    }
                    Err(e) => println!("Error searching expenses: {}", e),
                }
            }
            UserCommands::Print => match controller.request_search("") {
                Ok(rows) => {
                    if rows.is_empty() {
                        println!("No expenses recorded yet.");
                    } else {
                        print_rows(rows);
                    }
                }
                Err(e) => println!("Error listing expenses: {}", e),
            },
            UserCommands::History => {
                if let Err(e) = run_history(&mut controller) {
                    println!("Error in history view: {}", e);
                }
            }
            UserCommands::Dashboard => match controller.request_dashboard_data() {
                Ok(totals) => {
                    if let Err(e) = run_dashboard(&totals) {
                        println!("Error in dashboard view: {}", e);
                    }
                }
                Err(e) => println!("Error loading dashboard data: {}", e),
            },
            UserCommands::Import => {
                println!(
                    "Import command selected. Provide the file path to import from (CSV, date,category,description,amount):"
                );
                let path = match read_user_input() {
                    Ok(details) => details,
                    Err(e) => {
                        println!("Error reading input: {}", e);
                        continue;
                    }
                };
                match controller.import_from_csv(&path) {
                    Ok(count) => println!("Successfully imported {} expenses.", count),
                    Err(e) => println!("Error importing expenses: {}", e),
                }
            }
            UserCommands::Help => {
                println!(
                    "Unknown command. Available commands: add, voice, scan, edit, remove, search, print, history, dashboard, import, exit."
                );
            }
            UserCommands::Exit => {
                println!("Exiting the application.");
                break;
            }
        }
    }
}

fn read_user_input() -> Result<String, String> {
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .map_err(|_| "Failed to read line".to_string())?;
    Ok(input.trim().to_string())
}

fn read_expense_id() -> Result<i64, String> {
    let input = read_user_input()?;
    input
        .parse()
        .map_err(|_| format!("Invalid expense ID '{}'. Provide a numeric id.", input))
}

fn split_date_and_description(line: &str) -> (String, String) {
    let (date, description) = match line.split_once(',') {
        Some((date, description)) => (date.trim(), description.trim()),
        None => (line.trim(), ""),
    };

    let date = if date.is_empty() {
        today()
    } else {
        date.to_string()
    };
    (date, description.to_string())
}

fn print_rows(rows: &[ExpenseRecord]) {
    println!(
        "{:>5}  {:<10}  {:<14}  {:<30}  {:>10}",
        "ID", "Date", "Category", "Description", "Amount"
    );
    for record in rows {
        println!(
            "{:>5}  {:<10}  {:<14}  {:<30}  {:>10}",
            record.id, record.date, record.category, record.description, record.amount
        );
    }
}

fn check_for_command(input: &str) -> UserCommands {
    match input {
        "add" => UserCommands::Add,
        "voice" => UserCommands::Voice,
        "scan" => UserCommands::Scan,
        "edit" => UserCommands::Edit,
        "remove" => UserCommands::Remove,
        "search" => UserCommands::Search,
        "print" => UserCommands::Print,
        "history" => UserCommands::History,
        "dashboard" => UserCommands::Dashboard,
        "import" => UserCommands::Import,
        "exit" | "quit" => UserCommands::Exit,
        _ => UserCommands::Help,
    }
}
