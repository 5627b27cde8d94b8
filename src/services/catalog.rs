//! Catalog management service: book queries and book CRUD

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookDetails, BookInput, BookShort, NewBook, Page, PageWindow},
    repository::Repository,
    services::availability,
};

/// Books per catalogue page
pub const BOOKS_PAGE_SIZE: i64 = 10;

/// Loans shown on a book's detail view
pub const RECENT_LOANS_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books by title, author or ISBN and return one page, newest first
    pub async fn list_books(&self, search: Option<&str>, page: i64) -> AppResult<Page<BookShort>> {
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        let total = self.repository.books.count(search.clone()).await?;
        let window = PageWindow::clamp(page, BOOKS_PAGE_SIZE, total);

        let books = self
            .repository
            .books
            .search(search, window.limit(), window.offset())
            .await?;

        let ids = books.iter().map(|b| b.id).collect();
        let open_loans = self.repository.loans.find_open_for_books(ids).await?;

        let items = books
            .into_iter()
            .map(|book| {
                let available = availability::is_available(&book, &open_loans);
                BookShort::new(book, available)
            })
            .collect();

        Ok(window.into_page(items))
    }

    /// Get a book with its availability and most recent loans
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.find_book(id).await?;

        let recent_loans = self
            .repository
            .loans
            .find_by_book(id, RECENT_LOANS_LIMIT)
            .await?;
        let loan_count = self.repository.loans.count_by_book(id).await?;
        let open_loans = self.repository.loans.find_open_for_books(vec![id]).await?;

        Ok(BookDetails {
            available: availability::is_available(&book, &open_loans),
            book,
            loan_count,
            recent_loans,
        })
    }

    /// Register a new book
    pub async fn create_book(&self, input: BookInput) -> AppResult<Book> {
        let book = NewBook::try_from(input)?;
        self.ensure_isbn_free(&book.isbn, None).await?;

        let created = self.repository.books.create(book).await?;
        tracing::info!("Book created: id={} isbn={}", created.id, created.isbn);
        Ok(created)
    }

    /// Overwrite title, author and ISBN of an existing book
    pub async fn update_book(&self, id: i32, input: BookInput) -> AppResult<Book> {
        self.find_book(id).await?;

        let book = NewBook::try_from(input)?;
        self.ensure_isbn_free(&book.isbn, Some(id)).await?;

        let updated = self
            .repository
            .books
            .update(id, book)
            .await?
            .ok_or_else(|| book_not_found(id))?;
        tracing::info!("Book updated: id={}", id);
        Ok(updated)
    }

    /// Delete a book together with all of its loans
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        let loan_count = self.repository.loans.count_by_book(id).await?;
        if !self.repository.books.delete(id).await? {
            return Err(book_not_found(id));
        }
        tracing::info!("Book deleted: id={} ({} loans removed)", id, loan_count);
        Ok(())
    }

    async fn find_book(&self, id: i32) -> AppResult<Book> {
        self.repository
            .books
            .find_by_id(id)
            .await?
            .ok_or_else(|| book_not_found(id))
    }

    async fn ensure_isbn_free(&self, isbn: &str, except: Option<i32>) -> AppResult<()> {
        match self.repository.books.find_by_isbn(isbn.to_string()).await? {
            Some(existing) if Some(existing.id) != except => {
                tracing::debug!("Rejected duplicate ISBN {} (book id={})", isbn, existing.id);
                Err(AppError::DuplicateIsbn(format!(
                    "A book with ISBN {} already exists",
                    isbn
                )))
            }
            _ => Ok(()),
        }
    }
}

pub(crate) fn book_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Book with id {} not found", id))
}
