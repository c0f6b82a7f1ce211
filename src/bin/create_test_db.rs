//! Creates a seeded database for trying out Opsdesk locally.

use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use opsdesk::{PasswordHash, ValidatedPassword, initialize_db};

/// A utility for creating a seeded demo database for Opsdesk.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    println!("Creating test users...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;

    connection.execute(
        "INSERT INTO user (email, password, active_workspace_id) VALUES
            ('admin@example.com', ?1, 1),
            ('manager@example.com', ?1, 1),
            ('member@example.com', ?1, 1);",
        (password_hash.to_string(),),
    )?;

    println!("Seeding demo workspace...");

    connection.execute_batch(
        "INSERT INTO workspace (name) VALUES ('Demo Workspace');

        INSERT INTO membership (workspace_id, user_id, role) VALUES
            (1, 1, 'admin'),
            (1, 2, 'manager'),
            (1, 3, 'member');

        INSERT INTO board (workspace_id, name) VALUES (1, 'Launch Prep');
        INSERT INTO task (board_id, title, description, status, assignee_id) VALUES
            (1, 'Write onboarding guide', 'Cover the first log in and timesheets.', 'todo', 3),
            (1, 'Review payroll period', '', 'in_progress', 2),
            (1, 'Set up chart of accounts', '', 'done', 1);

        INSERT INTO time_entry (workspace_id, user_id, date, minutes, description) VALUES
            (1, 2, '2025-07-07', 480, 'Sprint planning and reviews'),
            (1, 3, '2025-07-07', 420, 'Onboarding guide draft'),
            (1, 3, '2025-07-08', 450, 'Onboarding guide edits');

        INSERT INTO account (workspace_id, code, name, kind) VALUES
            (1, '1000', 'Cash', 'asset'),
            (1, '2000', 'Accounts Payable', 'liability'),
            (1, '4000', 'Sales', 'revenue'),
            (1, '6000', 'Wages Expense', 'expense');

        INSERT INTO journal_entry (workspace_id, date, memo) VALUES
            (1, '2025-07-10', 'July invoice #42');
        INSERT INTO entry_line (entry_id, account_id, kind, amount) VALUES
            (1, 1, 'debit', 250000),
            (1, 3, 'credit', 250000);

        INSERT INTO payroll (workspace_id, period_start, period_end) VALUES
            (1, '2025-07-01', '2025-07-14');
        INSERT INTO payroll_transaction (payroll_id, user_id) VALUES
            (1, 1), (1, 2), (1, 3);
        INSERT INTO transaction_item (transaction_id, kind, description, amount, editable) VALUES
            (2, 'wage', 'Logged time (8h 0m)', 20000, 0),
            (2, 'deduction', 'Income tax', 4000, 1),
            (3, 'wage', 'Logged time (14h 30m)', 36250, 0),
            (3, 'deduction', 'Income tax', 7250, 1);",
    )?;

    println!("Success!");

    Ok(())
}
