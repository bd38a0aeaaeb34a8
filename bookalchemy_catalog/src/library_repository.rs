#[cfg(test)]
pub use failing_library_repository::FailingLibraryRepository;
pub use in_memory_library_repository::InMemoryLibraryRepository;
pub use postgres_library_repository::{PostgresLibraryRepository, PostgresLibraryRepositoryConfig};

use crate::api::{
    Author, AuthorId, AuthorWithBooks, Book, BookId, BookQuery, BookWithAuthor, NewAuthor, NewBook,
};

#[cfg(test)]
mod failing_library_repository;
mod in_memory_library_repository;
mod postgres_library_repository;

#[derive(thiserror::Error, Debug)]
pub enum RepositoryError {
    #[error("Author {0} not found")]
    AuthorNotFound(AuthorId),

    #[error("Book {0} not found")]
    BookNotFound(BookId),

    #[error("Database failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

/// Persistence of authors and their books.
/// Every mutating method is atomic: it either applies fully or leaves the store untouched.
#[async_trait::async_trait]
pub trait LibraryRepository: Send + Sync {
    /// Adds author to repository, returns the stored author with its assigned id
    async fn add_author(&self, author: NewAuthor) -> Result<Author, RepositoryError>;
    /// Lists all authors ordered by name
    async fn list_authors(&self) -> Result<Vec<Author>, RepositoryError>;
    /// Retrieves the author together with all books they own
    async fn get_author(&self, author_id: AuthorId) -> Result<AuthorWithBooks, RepositoryError>;
    /// Adds book for an existing author, fails with AuthorNotFound if the author is missing
    async fn add_book(&self, book: NewBook) -> Result<BookWithAuthor, RepositoryError>;
    /// Retrieves book joined with its author
    async fn get_book(&self, book_id: BookId) -> Result<BookWithAuthor, RepositoryError>;
    /// Lists books joined with their authors, filtered and ordered by the query
    async fn list_books(&self, query: &BookQuery) -> Result<Vec<BookWithAuthor>, RepositoryError>;
    /// Removes the book, returns the removed row
    async fn delete_book(&self, book_id: BookId) -> Result<Book, RepositoryError>;
}
