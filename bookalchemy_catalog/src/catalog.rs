use std::sync::Arc;

use crate::api::{
    non_blank, AddAuthorForm, AddBookForm, Author, AuthorId, AuthorWithBooks, Book, BookId,
    BookQuery, BookWithAuthor, NewAuthor, NewBook, SortColumn,
};
use crate::library_repository::{LibraryRepository, RepositoryError};

#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum ValidationError {
    #[error("Please enter the author's name")]
    MissingAuthorName,

    #[error("Please enter the book title")]
    MissingBookTitle,

    /// The submitted title is kept so the form can be shown again with it
    #[error("Please select an author from the list")]
    MissingAuthorSelection { title: Option<String> },

    #[error("Selected author {0:?} is not a valid author id")]
    InvalidAuthorId(String),

    #[error("Cannot sort by {0:?}")]
    InvalidSortColumn(String),
}

/// Outcome of every catalog query and command that did not succeed
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Author {0} not found")]
    AuthorNotFound(AuthorId),

    #[error("Book {0} not found")]
    BookNotFound(BookId),

    #[error("Persistence failure: {0}")]
    Persistence(RepositoryError),
}

impl From<RepositoryError> for CatalogError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::AuthorNotFound(author_id) => CatalogError::AuthorNotFound(author_id),
            RepositoryError::BookNotFound(book_id) => CatalogError::BookNotFound(book_id),
            other => CatalogError::Persistence(other),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
/// Result of a listing request, including the query that produced it
pub struct BookListing {
    pub books: Vec<BookWithAuthor>,
    pub query: BookQuery,
}

impl BookListing {
    pub fn count(&self) -> usize {
        self.books.len()
    }

    /// True when a search was requested and nothing matched
    pub fn no_results(&self) -> bool {
        self.query.search.is_some() && self.books.is_empty()
    }
}

impl BookQuery {
    /// Builds a query from raw form values, rejecting unknown sort columns
    pub fn parse(
        search: Option<String>,
        order_by: Option<String>,
    ) -> Result<Self, ValidationError> {
        let order_by = non_blank(order_by)
            .map(|column| {
                column
                    .parse::<SortColumn>()
                    .map_err(|err| ValidationError::InvalidSortColumn(err.0))
            })
            .transpose()?;

        Ok(Self {
            search: non_blank(search),
            order_by,
        })
    }
}

/// Query and command service sitting between the request handlers and the repository
#[derive(Clone)]
pub struct Catalog {
    repository: Arc<dyn LibraryRepository>,
}

impl Catalog {
    pub fn new(repository: Arc<dyn LibraryRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_books(&self, query: BookQuery) -> Result<BookListing, CatalogError> {
        let books = self.repository.list_books(&query).await?;
        Ok(BookListing { books, query })
    }

    pub async fn list_authors(&self) -> Result<Vec<Author>, CatalogError> {
        Ok(self.repository.list_authors().await?)
    }

    pub async fn add_author(&self, form: AddAuthorForm) -> Result<Author, CatalogError> {
        let author_name = non_blank(form.name).ok_or(ValidationError::MissingAuthorName)?;

        let author = self
            .repository
            .add_author(NewAuthor {
                author_name,
                birth_date: non_blank(form.birthdate),
                date_of_death: non_blank(form.date_of_death),
            })
            .await?;
        tracing::info!(
            "Added author {} ({})",
            author.author_id,
            author.author_name
        );
        Ok(author)
    }

    /// Validation order: author selection, author id format, title, author existence
    pub async fn add_book(&self, form: AddBookForm) -> Result<BookWithAuthor, CatalogError> {
        let title = non_blank(form.title);
        let author = non_blank(form.author).ok_or_else(|| {
            ValidationError::MissingAuthorSelection {
                title: title.clone(),
            }
        })?;
        let author_id: AuthorId = author
            .parse()
            .map_err(|_| ValidationError::InvalidAuthorId(author))?;
        let book_title = title.ok_or(ValidationError::MissingBookTitle)?;

        let added = self
            .repository
            .add_book(NewBook {
                book_title,
                isbn: non_blank(form.isbn),
                publication_year: non_blank(form.publication_year),
                detail: non_blank(form.details),
                author_id,
            })
            .await?;
        tracing::info!(
            "Added book {} ({}) by author {}",
            added.book.book_id,
            added.book.book_title,
            author_id
        );
        Ok(added)
    }

    pub async fn book_details(&self, book_id: BookId) -> Result<BookWithAuthor, CatalogError> {
        Ok(self.repository.get_book(book_id).await?)
    }

    pub async fn author_details(
        &self,
        author_id: AuthorId,
    ) -> Result<AuthorWithBooks, CatalogError> {
        Ok(self.repository.get_author(author_id).await?)
    }

    pub async fn delete_book(&self, book_id: BookId) -> Result<Book, CatalogError> {
        let deleted = self.repository.delete_book(book_id).await?;
        tracing::info!("Deleted book {} ({})", deleted.book_id, deleted.book_title);
        Ok(deleted)
    }
}
