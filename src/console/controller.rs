/// Interactive menu loop
///
/// Reads selections and field values line by line, runs the matching
/// database operation and prints the outcome. Generic over the streams so the
/// whole loop can be driven from a buffer.

use crate::console::menu::{ConsoleState, MenuChoice, CHOICE_PROMPT, MENU};
use crate::db::{BookReviewInput, Database, Table};
use crate::error::{BookshelfError, Result};
use std::io::{BufRead, Write};
use tracing::debug;

pub struct Console<R, W> {
    input: R,
    output: W,
    state: ConsoleState,
    atomic_insert: bool,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W, atomic_insert: bool) -> Self {
        Self {
            input,
            output,
            state: ConsoleState::MenuPrompt,
            atomic_insert,
        }
    }

    pub fn state(&self) -> ConsoleState {
        self.state
    }

    /// Hand back the output stream, mostly so tests can inspect it
    pub fn into_output(self) -> W {
        self.output
    }

    /// Full session: fresh schema, menu loop until quit, then drop the tables
    ///
    /// Errors returned from here are fatal (schema setup, console I/O, lost
    /// connection). Failures of a single operation are printed and the loop
    /// carries on.
    pub async fn run(&mut self, db: &Database) -> Result<()> {
        let changes = db.reset_schema().await?;
        self.report_dropped(&changes.dropped)?;
        self.report_created(&changes.created)?;

        while self.state != ConsoleState::Terminated {
            self.step(db).await?;
        }

        let dropped = db.drop_tables().await?;
        self.report_dropped(&dropped)?;
        self.output.flush()?;

        Ok(())
    }

    /// Advance the state machine by one transition
    pub async fn step(&mut self, db: &Database) -> Result<()> {
        let next = match self.state {
            ConsoleState::MenuPrompt => {
                write!(self.output, "{}{}", MENU, CHOICE_PROMPT)?;
                self.output.flush()?;
                ConsoleState::AwaitingInput
            }
            ConsoleState::AwaitingInput => match self.read_line() {
                Ok(None) => ConsoleState::Terminated,
                Ok(Some(line)) => match line.parse::<MenuChoice>() {
                    Ok(choice) => ConsoleState::Dispatching(choice),
                    Err(_) => self.invalid_option()?,
                },
                Err(BookshelfError::InvalidInput(_)) => self.invalid_option()?,
                Err(err) => return Err(err),
            },
            ConsoleState::Dispatching(choice) => self.dispatch(choice, db).await?,
            ConsoleState::Terminated => ConsoleState::Terminated,
        };

        debug!(from = ?self.state, to = ?next, "console transition");
        self.state = next;
        Ok(())
    }

    async fn dispatch(&mut self, choice: MenuChoice, db: &Database) -> Result<ConsoleState> {
        let outcome = match choice {
            MenuChoice::Insert => self.insert_record(db).await,
            MenuChoice::Delete => self.delete_record(db).await,
            MenuChoice::Update => self.update_record(db).await,
            MenuChoice::View => self.view_records(db).await,
            MenuChoice::Quit => return Ok(ConsoleState::Terminated),
        };

        match outcome {
            Ok(()) => Ok(ConsoleState::MenuPrompt),
            Err(err) => self.report_failure(choice, err),
        }
    }

    /// Decide whether a failed operation ends the session or just the operation
    fn report_failure(&mut self, choice: MenuChoice, err: BookshelfError) -> Result<ConsoleState> {
        match err {
            BookshelfError::InputClosed => Ok(ConsoleState::Terminated),
            err @ BookshelfError::Io(_) => Err(err),
            err if err.is_connection_failure() => Err(err),
            err => {
                debug!(?choice, error = %err, "menu operation failed");
                writeln!(self.output, "{}", err.user_message())?;
                Ok(ConsoleState::MenuPrompt)
            }
        }
    }

    fn invalid_option(&mut self) -> Result<ConsoleState> {
        writeln!(self.output, "Invalid option. Please try again.")?;
        Ok(ConsoleState::MenuPrompt)
    }

    async fn insert_record(&mut self, db: &Database) -> Result<()> {
        let title = self.prompt("Enter book title: ")?;
        let author = self.prompt("Enter book author: ")?;
        let review_text = self.prompt("Enter review text: ")?;
        let reviewer_name = self.prompt("Enter reviewer's name: ")?;

        let input = BookReviewInput {
            title,
            author,
            review_text,
            reviewer_name,
        };

        let inserted = if self.atomic_insert {
            db.insert_book_with_review_atomic(&input).await?
        } else {
            db.insert_book_with_review(&input).await?
        };

        writeln!(
            self.output,
            "Inserted book {} with review {}.",
            inserted.book_id, inserted.review_id
        )?;
        Ok(())
    }

    async fn delete_record(&mut self, db: &Database) -> Result<()> {
        let review_id = self.prompt_id("Enter review ID to delete: ", "review ID")?;

        if db.delete_review(review_id).await? == 0 {
            writeln!(self.output, "No review found with the given ID.")?;
        } else {
            writeln!(self.output, "Review deleted successfully.")?;
        }
        Ok(())
    }

    async fn update_record(&mut self, db: &Database) -> Result<()> {
        let book_id = self.prompt_id("Enter book ID to update: ", "book ID")?;
        let title = self.prompt("Enter new title: ")?;
        let author = self.prompt("Enter new author: ")?;

        if db.update_book(book_id, &title, &author).await? > 0 {
            writeln!(self.output, "Book updated successfully.")?;
        } else {
            writeln!(self.output, "No book found with the given ID.")?;
        }
        Ok(())
    }

    async fn view_records(&mut self, db: &Database) -> Result<()> {
        let rows = db.list_book_reviews().await?;

        writeln!(self.output, "\nBooks and Reviews:")?;
        for row in rows {
            writeln!(self.output, "{}", row)?;
        }
        Ok(())
    }

    fn report_dropped(&mut self, tables: &[Table]) -> Result<()> {
        for table in tables {
            writeln!(self.output, "Dropping {} table...", table)?;
        }
        Ok(())
    }

    fn report_created(&mut self, tables: &[Table]) -> Result<()> {
        for table in tables {
            writeln!(self.output, "Creating {} table...", table)?;
        }
        Ok(())
    }

    fn prompt(&mut self, label: &str) -> Result<String> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;
        self.read_line()?.ok_or(BookshelfError::InputClosed)
    }

    fn prompt_id(&mut self, label: &str, what: &str) -> Result<i64> {
        let raw = self.prompt(label)?;
        raw.trim().parse::<i64>().map_err(|_| {
            BookshelfError::InvalidInput(format!(
                "{} must be a whole number, got '{}'",
                what,
                raw.trim()
            ))
        })
    }

    /// One line without its terminator, or None at end of input
    ///
    /// The whole line is consumed even when it is not UTF-8, so a bad line
    /// only fails the prompt that read it.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }

        let mut line = String::from_utf8(buf)
            .map_err(|_| BookshelfError::InvalidInput("line is not valid UTF-8".to_string()))?;
        let len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(len);
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    async fn run_session(db: &Database, script: impl AsRef<[u8]>, atomic_insert: bool) -> String {
        let mut console = Console::new(Cursor::new(script.as_ref().to_vec()), Vec::new(), atomic_insert);
        console.run(db).await.unwrap();
        assert_eq!(console.state(), ConsoleState::Terminated);
        String::from_utf8(console.into_output()).unwrap()
    }

    /// Row lines printed by the last View of a session
    fn last_view(output: &str) -> Vec<&str> {
        let section = output.rsplit("Books and Reviews:\n").next().unwrap_or("");
        section
            .lines()
            .take_while(|line| !line.is_empty() && !line.starts_with("Menu:"))
            .collect()
    }

    #[tokio::test]
    async fn test_insert_view_delete_view() {
        let db = Database::new_test().await.unwrap();
        let script = "1\nDune\nHerbert\nGreat read\nAlice\n4\n2\n1\n4\n5\n";

        let output = run_session(&db, script, false).await;

        assert!(output.contains("Inserted book 1 with review 1."));
        assert!(output.contains("Dune by Herbert - Review by Alice: \"Great read\""));
        assert!(output.contains("Review deleted successfully."));
        assert!(last_view(&output).is_empty());
    }

    #[tokio::test]
    async fn test_session_resets_and_cleans_up_schema() {
        let db = Database::new_test().await.unwrap();

        let output = run_session(&db, "5\n", false).await;

        assert!(output.starts_with("Creating Books table...\nCreating Reviews table...\n"));
        assert!(output.ends_with("Dropping Reviews table...\nDropping Books table...\n"));
        assert!(!db.table_exists(Table::Books).await.unwrap());
        assert!(!db.table_exists(Table::Reviews).await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_tables_dropped_at_start() {
        let db = Database::new_test().await.unwrap();
        db.create_tables().await.unwrap();

        let output = run_session(&db, "5\n", false).await;

        assert!(output.starts_with(
            "Dropping Reviews table...\nDropping Books table...\nCreating Books table...\n"
        ));
    }

    #[tokio::test]
    async fn test_update_reflected_in_view() {
        let db = Database::new_test().await.unwrap();
        let script = "1\nDune\nHerbert\nGreat read\nAlice\n3\n1\nDune Messiah\nFrank Herbert\n4\n5\n";

        let output = run_session(&db, script, false).await;

        assert!(output.contains("Book updated successfully."));
        assert_eq!(
            last_view(&output),
            vec!["Dune Messiah by Frank Herbert - Review by Alice: \"Great read\""]
        );
    }

    #[tokio::test]
    async fn test_not_found_messages() {
        let db = Database::new_test().await.unwrap();
        let script = "2\n99\n3\n99\nTitle\nAuthor\n5\n";

        let output = run_session(&db, script, false).await;

        assert!(output.contains("No review found with the given ID."));
        assert!(output.contains("No book found with the given ID."));
    }

    #[tokio::test]
    async fn test_invalid_option_keeps_looping() {
        let db = Database::new_test().await.unwrap();

        let output = run_session(&db, "9\nabc\n4\n5\n", false).await;

        assert_eq!(output.matches("Invalid option. Please try again.").count(), 2);
        assert!(output.contains("Books and Reviews:"));
    }

    #[tokio::test]
    async fn test_non_numeric_id_returns_to_menu() {
        let db = Database::new_test().await.unwrap();

        let output = run_session(&db, "2\nseven\n5\n", false).await;

        assert!(output.contains("review ID must be a whole number, got 'seven'"));
        // menu shown again after the failed operation
        assert_eq!(output.matches("Choose an option: ").count(), 2);
    }

    #[tokio::test]
    async fn test_constraint_violation_returns_to_menu() {
        let db = Database::new_test().await.unwrap();
        let long_review = "a".repeat(1001);
        let script = format!("1\nDune\nHerbert\n{}\nAlice\n4\n5\n", long_review);

        let output = run_session(&db, &script, false).await;

        assert!(output.contains("Database error:"));
        // the orphaned book has no review, so the join hides it
        assert!(last_view(&output).is_empty());
    }

    #[tokio::test]
    async fn test_atomic_insert_mode() {
        let db = Database::new_test().await.unwrap();
        let long_review = "a".repeat(1001);
        let script = format!(
            "1\nDune\nHerbert\n{}\nAlice\n1\nEmma\nAusten\nWitty\nBob\n5\n",
            long_review
        );

        let output = run_session(&db, &script, true).await;

        // first book was rolled back, so the second one reuses id 1
        assert!(output.contains("Inserted book 1 with review 1."));
    }

    #[tokio::test]
    async fn test_end_of_input_quits() {
        let db = Database::new_test().await.unwrap();

        let output = run_session(&db, "1\nDune\n", false).await;

        assert!(output.contains("Enter book author: "));
        assert!(!db.table_exists(Table::Books).await.unwrap());
    }

    #[tokio::test]
    async fn test_windows_line_endings() {
        let db = Database::new_test().await.unwrap();
        let script = "1\r\nDune\r\nHerbert\r\nGreat read\r\nAlice\r\n4\r\n5\r\n";

        let output = run_session(&db, script, false).await;

        assert_eq!(
            last_view(&output),
            vec!["Dune by Herbert - Review by Alice: \"Great read\""]
        );
    }

    #[tokio::test]
    async fn test_closed_connection_is_fatal() {
        let db = Database::new_test().await.unwrap();
        db.reset_schema().await.unwrap();
        let mut console = Console::new(Cursor::new(b"4\n".to_vec()), Vec::new(), false);

        console.step(&db).await.unwrap();
        console.step(&db).await.unwrap();
        db.close().await;
        let err = console.step(&db).await.unwrap_err();

        assert!(err.is_connection_failure());
    }

    #[tokio::test]
    async fn test_non_utf8_menu_choice_is_invalid_option() {
        let db = Database::new_test().await.unwrap();

        let output = run_session(&db, b"\xff\n4\n5\n", false).await;

        assert!(output.contains("Invalid option. Please try again."));
        assert!(output.contains("Books and Reviews:"));
        assert!(!db.table_exists(Table::Books).await.unwrap());
        assert!(!db.table_exists(Table::Reviews).await.unwrap());
    }

    #[tokio::test]
    async fn test_non_utf8_field_aborts_only_that_operation() {
        let db = Database::new_test().await.unwrap();
        let script = b"1\nD\xffune\n1\nDune\nHerbert\nGreat read\nAlice\n4\n5\n";

        let output = run_session(&db, script, false).await;

        assert!(output.contains("Invalid input: line is not valid UTF-8"));
        assert_eq!(
            last_view(&output),
            vec!["Dune by Herbert - Review by Alice: \"Great read\""]
        );
        assert!(!db.table_exists(Table::Books).await.unwrap());
    }

    #[test]
    fn test_missing_generated_key_is_reported() {
        let mut console = Console::new(Cursor::new(Vec::new()), Vec::new(), false);

        let next = console
            .report_failure(MenuChoice::Insert, BookshelfError::GeneratedKeyUnavailable)
            .unwrap();

        assert_eq!(next, ConsoleState::MenuPrompt);
        let output = String::from_utf8(console.into_output()).unwrap();
        assert_eq!(output, "Failed to retrieve generated book ID.\n");
    }

    #[test]
    fn test_input_closed_mid_operation_terminates() {
        let mut console = Console::new(Cursor::new(Vec::new()), Vec::new(), false);

        let next = console
            .report_failure(MenuChoice::Update, BookshelfError::InputClosed)
            .unwrap();

        assert_eq!(next, ConsoleState::Terminated);
    }
}
