use anyhow::Context;
use tokio::sync::Mutex;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Row};

use crate::api::{
    Author, AuthorId, AuthorWithBooks, Book, BookId, BookQuery, BookWithAuthor, NewAuthor, NewBook,
    SortColumn,
};
use crate::library_repository::{LibraryRepository, RepositoryError};

const SELECT_BOOKS_WITH_AUTHOR: &str = "
    SELECT b.book_id, b.book_title, b.isbn, b.publication_year, b.detail, b.author_id, a.author_name
    FROM book b
    JOIN author a ON a.author_id = b.author_id";

/// Single connection, locked for the duration of each call so transactions never interleave
pub struct PostgresLibraryRepository {
    client: Mutex<Client>,
}

pub struct PostgresLibraryRepositoryConfig {
    pub hostname: String,
    pub username: String,
    pub password: String,
}

impl PostgresLibraryRepository {
    pub async fn init(config: PostgresLibraryRepositoryConfig) -> anyhow::Result<Self> {
        let connection_str = format!(
            "postgresql://{}:{}@{}",
            config.username, config.password, config.hostname
        );
        tracing::info!(
            "Postgres connection: {}@{}",
            config.username,
            config.hostname
        );
        let (client, connection) = tokio_postgres::connect(&connection_str, NoTls)
            .await
            .context("Failed to start postgres")?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("Postgres connection error: {}", e);
            }
        });

        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS author (
            author_id       SERIAL PRIMARY KEY,
            author_name     TEXT NOT NULL CHECK (author_name <> ''),
            birth_date      TEXT,
            date_of_death   TEXT
            )
        ",
            )
            .await
            .context("Failed to setup author table")?;

        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS book (
            book_id             SERIAL PRIMARY KEY,
            book_title          TEXT NOT NULL CHECK (book_title <> ''),
            isbn                TEXT,
            publication_year    TEXT,
            detail              TEXT,
            author_id           INTEGER NOT NULL REFERENCES author (author_id) ON DELETE RESTRICT
            )
        ",
            )
            .await
            .context("Failed to setup book table")?;

        Ok(Self {
            client: Mutex::new(client),
        })
    }
}

/// Escapes LIKE wildcards so the search term is matched literally
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for character in search.chars() {
        if matches!(character, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped.push('%');
    escaped
}

/// Text columns compare lowercased in byte order, the same order the in-memory repository uses
/// regardless of the database collation
fn order_clause(order_by: Option<SortColumn>) -> &'static str {
    match order_by {
        None => "b.book_id",
        Some(SortColumn::Title) => r#"lower(b.book_title) COLLATE "C" ASC NULLS LAST, b.book_id"#,
        Some(SortColumn::PublicationYear) => {
            r#"lower(b.publication_year) COLLATE "C" ASC NULLS LAST, b.book_id"#
        }
        Some(SortColumn::AuthorName) => {
            r#"lower(a.author_name) COLLATE "C" ASC NULLS LAST, b.book_id"#
        }
    }
}

fn book_from_row(row: &Row) -> Result<Book, tokio_postgres::Error> {
    Ok(Book {
        book_id: row.try_get("book_id")?,
        book_title: row.try_get("book_title")?,
        isbn: row.try_get("isbn")?,
        publication_year: row.try_get("publication_year")?,
        detail: row.try_get("detail")?,
        author_id: row.try_get("author_id")?,
    })
}

fn book_with_author_from_row(row: &Row) -> Result<BookWithAuthor, tokio_postgres::Error> {
    Ok(BookWithAuthor {
        book: book_from_row(row)?,
        author_name: row.try_get("author_name")?,
    })
}

fn author_from_row(row: &Row) -> Result<Author, tokio_postgres::Error> {
    Ok(Author {
        author_id: row.try_get("author_id")?,
        author_name: row.try_get("author_name")?,
        birth_date: row.try_get("birth_date")?,
        date_of_death: row.try_get("date_of_death")?,
    })
}

#[async_trait::async_trait]
impl LibraryRepository for PostgresLibraryRepository {
    async fn add_author(&self, author: NewAuthor) -> Result<Author, RepositoryError> {
        let mut client = self.client.lock().await;
        let transaction = client.transaction().await?;

        let row = transaction
            .query_one(
                "INSERT INTO author (author_name, birth_date, date_of_death) VALUES ($1, $2, $3)
                 RETURNING author_id, author_name, birth_date, date_of_death",
                &[&author.author_name, &author.birth_date, &author.date_of_death],
            )
            .await?;
        let author = author_from_row(&row)?;

        transaction.commit().await?;
        Ok(author)
    }

    async fn list_authors(&self) -> Result<Vec<Author>, RepositoryError> {
        let client = self.client.lock().await;
        let rows = client
            .query(
                "SELECT author_id, author_name, birth_date, date_of_death FROM author
                 ORDER BY lower(author_name) COLLATE \"C\", author_id",
                &[],
            )
            .await?;
        rows.iter()
            .map(|row| Ok(author_from_row(row)?))
            .collect()
    }

    async fn get_author(&self, author_id: AuthorId) -> Result<AuthorWithBooks, RepositoryError> {
        let client = self.client.lock().await;
        let author_row = client
            .query_opt(
                "SELECT author_id, author_name, birth_date, date_of_death FROM author
                 WHERE author_id = $1",
                &[&author_id],
            )
            .await?
            .ok_or(RepositoryError::AuthorNotFound(author_id))?;

        let book_rows = client
            .query(
                "SELECT book_id, book_title, isbn, publication_year, detail, author_id FROM book
                 WHERE author_id = $1 ORDER BY book_id",
                &[&author_id],
            )
            .await?;

        Ok(AuthorWithBooks {
            author: author_from_row(&author_row)?,
            books: book_rows
                .iter()
                .map(book_from_row)
                .collect::<Result<Vec<_>, tokio_postgres::Error>>()?,
        })
    }

    async fn add_book(&self, book: NewBook) -> Result<BookWithAuthor, RepositoryError> {
        let mut client = self.client.lock().await;
        // Dropping the transaction without commit rolls it back
        let transaction = client.transaction().await?;

        let author_name: String = transaction
            .query_opt(
                "SELECT author_name FROM author WHERE author_id = $1 FOR SHARE",
                &[&book.author_id],
            )
            .await?
            .ok_or(RepositoryError::AuthorNotFound(book.author_id))?
            .try_get(0)?;

        let inserted = transaction
            .query_one(
                "INSERT INTO book (book_title, isbn, publication_year, detail, author_id)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING book_id, book_title, isbn, publication_year, detail, author_id",
                &[
                    &book.book_title,
                    &book.isbn,
                    &book.publication_year,
                    &book.detail,
                    &book.author_id,
                ],
            )
            .await;

        let row = match inserted {
            Ok(row) => row,
            Err(err)
                if err
                    .as_db_error()
                    // This is foreign key violation error
                    .map(|db_err| db_err.code() == &SqlState::FOREIGN_KEY_VIOLATION)
                    .unwrap_or_default() =>
            {
                return Err(RepositoryError::AuthorNotFound(book.author_id));
            }
            Err(other_err) => return Err(other_err.into()),
        };
        let book = book_from_row(&row)?;

        transaction.commit().await?;
        Ok(BookWithAuthor { book, author_name })
    }

    async fn get_book(&self, book_id: BookId) -> Result<BookWithAuthor, RepositoryError> {
        let statement = format!("{SELECT_BOOKS_WITH_AUTHOR} WHERE b.book_id = $1");
        let client = self.client.lock().await;
        let row = client
            .query_opt(statement.as_str(), &[&book_id])
            .await?
            .ok_or(RepositoryError::BookNotFound(book_id))?;
        Ok(book_with_author_from_row(&row)?)
    }

    async fn list_books(&self, query: &BookQuery) -> Result<Vec<BookWithAuthor>, RepositoryError> {
        let pattern = query.search.as_deref().map(like_pattern);
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();
        let mut statement = SELECT_BOOKS_WITH_AUTHOR.to_string();

        if let Some(pattern) = &pattern {
            statement.push_str(" WHERE b.book_title ILIKE $1 OR a.author_name ILIKE $1");
            params.push(pattern);
        }
        // Only enum-provided column names ever reach the ORDER BY clause
        statement.push_str(" ORDER BY ");
        statement.push_str(order_clause(query.order_by));

        let client = self.client.lock().await;
        let rows = client.query(statement.as_str(), &params).await?;
        rows.iter()
            .map(|row| Ok(book_with_author_from_row(row)?))
            .collect()
    }

    async fn delete_book(&self, book_id: BookId) -> Result<Book, RepositoryError> {
        let mut client = self.client.lock().await;
        let transaction = client.transaction().await?;

        let row = transaction
            .query_opt(
                "DELETE FROM book WHERE book_id = $1
                 RETURNING book_id, book_title, isbn, publication_year, detail, author_id",
                &[&book_id],
            )
            .await?
            .ok_or(RepositoryError::BookNotFound(book_id))?;
        let book = book_from_row(&row)?;

        transaction.commit().await?;
        Ok(book)
    }
}
