use std::sync::Arc;

use crate::api::{
    Author, AuthorId, AuthorWithBooks, Book, BookId, BookQuery, BookWithAuthor, NewAuthor, NewBook,
};
use crate::library_repository::{InMemoryLibraryRepository, LibraryRepository, RepositoryError};

/// Reads go to the wrapped repository, every write fails as if the database went away
pub struct FailingLibraryRepository {
    inner: Arc<InMemoryLibraryRepository>,
}

impl FailingLibraryRepository {
    pub fn new(inner: Arc<InMemoryLibraryRepository>) -> Self {
        Self { inner }
    }

    fn failure() -> RepositoryError {
        RepositoryError::Other("connection to the database was lost".to_string())
    }
}

#[async_trait::async_trait]
impl LibraryRepository for FailingLibraryRepository {
    async fn add_author(&self, _author: NewAuthor) -> Result<Author, RepositoryError> {
        Err(Self::failure())
    }

    async fn list_authors(&self) -> Result<Vec<Author>, RepositoryError> {
        self.inner.list_authors().await
    }

    async fn get_author(&self, author_id: AuthorId) -> Result<AuthorWithBooks, RepositoryError> {
        self.inner.get_author(author_id).await
    }

    async fn add_book(&self, _book: NewBook) -> Result<BookWithAuthor, RepositoryError> {
        Err(Self::failure())
    }

    async fn get_book(&self, book_id: BookId) -> Result<BookWithAuthor, RepositoryError> {
        self.inner.get_book(book_id).await
    }

    async fn list_books(&self, query: &BookQuery) -> Result<Vec<BookWithAuthor>, RepositoryError> {
        self.inner.list_books(query).await
    }

    async fn delete_book(&self, _book_id: BookId) -> Result<Book, RepositoryError> {
        Err(Self::failure())
    }
}
