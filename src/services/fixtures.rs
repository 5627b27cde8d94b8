//! Demo data loader.
//!
//! Wipes the catalogue (loans first, then books) and loads a fixed set of
//! fifteen books and ten loans. Loan dates are relative to `today`. Every
//! record goes through the regular repository inserts.

use chrono::{Duration, NaiveDate};

use crate::{
    error::AppResult,
    models::{NewBook, NewLoan},
    repository::Repository,
};

const BOOKS: [(&str, &str, &str); 15] = [
    ("1984", "George Orwell", "9780451524935"),
    ("Le Petit Prince", "Antoine de Saint-Exupéry", "9782070612758"),
    ("Harry Potter à l'école des sorciers", "J.K. Rowling", "9782070584628"),
    ("L'Étranger", "Albert Camus", "9782070360024"),
    ("Les Misérables", "Victor Hugo", "9782253096337"),
    ("Le Seigneur des Anneaux", "J.R.R. Tolkien", "9782266154345"),
    ("Crime et Châtiment", "Fiodor Dostoïevski", "9782253085768"),
    ("Cent ans de solitude", "Gabriel García Márquez", "9782020238113"),
    ("L'Alchimiste", "Paulo Coelho", "9782290349960"),
    ("Orgueil et Préjugés", "Jane Austen", "9782290315033"),
    ("La Peste", "Albert Camus", "9782070360420"),
    ("Voyage au bout de la nuit", "Louis-Ferdinand Céline", "9782070360178"),
    ("Les Fleurs du mal", "Charles Baudelaire", "9782253082156"),
    ("Madame Bovary", "Gustave Flaubert", "9782253004714"),
    ("Le Comte de Monte-Cristo", "Alexandre Dumas", "9782253098058"),
];

/// (book index, loaned days ago, returned days ago)
const LOANS: [(usize, i64, Option<i64>); 10] = [
    (0, 5, None),
    (2, 10, None),
    (5, 3, None),
    (1, 30, Some(15)),
    (3, 45, Some(32)),
    (4, 60, Some(48)),
    (1, 90, Some(75)),
    (6, 20, Some(8)),
    (7, 25, Some(12)),
    (8, 35, Some(21)),
];

/// What a fixture load produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureReport {
    pub books: usize,
    pub loans: usize,
    pub open_loans: usize,
}

#[derive(Clone)]
pub struct FixtureService {
    repository: Repository,
}

impl FixtureService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Replace the whole catalogue with the demo data set
    pub async fn load(&self, today: NaiveDate) -> AppResult<FixtureReport> {
        let removed_loans = self.repository.loans.delete_all().await?;
        let removed_books = self.repository.books.delete_all().await?;
        tracing::info!(
            "Cleared catalogue: {} loans, {} books removed",
            removed_loans,
            removed_books
        );

        let mut book_ids = Vec::with_capacity(BOOKS.len());
        for (title, author, isbn) in BOOKS {
            let book = self
                .repository
                .books
                .create(NewBook::new(title, author, isbn))
                .await?;
            tracing::debug!("Fixture book created: {}", book.title);
            book_ids.push(book.id);
        }

        let mut open_loans = 0;
        for (index, loaned, returned) in LOANS {
            let loan = self
                .repository
                .loans
                .create(NewLoan {
                    book_id: book_ids[index],
                    loan_date: today - Duration::days(loaned),
                    return_date: returned.map(|days| today - Duration::days(days)),
                })
                .await?;
            if loan.is_open() {
                open_loans += 1;
            }
        }

        let report = FixtureReport {
            books: book_ids.len(),
            loans: LOANS.len(),
            open_loans,
        };
        tracing::info!(
            "Fixtures loaded: {} books, {} loans ({} open)",
            report.books,
            report.loans,
            report.open_loans
        );
        Ok(report)
    }
}
