use std::cmp::Ordering as CmpOrdering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::api::{
    Author, AuthorId, AuthorWithBooks, Book, BookId, BookQuery, BookWithAuthor, NewAuthor, NewBook,
    SortColumn,
};
use crate::library_repository::{LibraryRepository, RepositoryError};

#[derive(Default)]
struct Tables {
    authors: BTreeMap<AuthorId, Author>,
    books: BTreeMap<BookId, Book>,
}

impl Tables {
    fn join(&self, book: &Book) -> Result<BookWithAuthor, RepositoryError> {
        let author = self
            .authors
            .get(&book.author_id)
            .ok_or(RepositoryError::AuthorNotFound(book.author_id))?;
        Ok(BookWithAuthor {
            book: book.clone(),
            author_name: author.author_name.clone(),
        })
    }
}

/// Both tables sit behind one lock so a command never observes a half-applied write
pub struct InMemoryLibraryRepository {
    author_sequence_generator: AtomicI32,
    book_sequence_generator: AtomicI32,
    tables: parking_lot::RwLock<Tables>,
}

impl Default for InMemoryLibraryRepository {
    fn default() -> Self {
        Self {
            author_sequence_generator: AtomicI32::new(1),
            book_sequence_generator: AtomicI32::new(1),
            tables: Default::default(),
        }
    }
}

fn matches_search(entry: &BookWithAuthor, needle: &str) -> bool {
    entry.book.book_title.to_lowercase().contains(needle)
        || entry.author_name.to_lowercase().contains(needle)
}

/// Absent values sort last, like `NULLS LAST` in the postgres repository
fn compare_optional(left: Option<&str>, right: Option<&str>) -> CmpOrdering {
    match (left, right) {
        (Some(left), Some(right)) => left.to_lowercase().cmp(&right.to_lowercase()),
        (Some(_), None) => CmpOrdering::Less,
        (None, Some(_)) => CmpOrdering::Greater,
        (None, None) => CmpOrdering::Equal,
    }
}

fn compare_by(column: SortColumn, left: &BookWithAuthor, right: &BookWithAuthor) -> CmpOrdering {
    let ordering = match column {
        SortColumn::Title => compare_optional(
            Some(left.book.book_title.as_str()),
            Some(right.book.book_title.as_str()),
        ),
        SortColumn::PublicationYear => compare_optional(
            left.book.publication_year.as_deref(),
            right.book.publication_year.as_deref(),
        ),
        SortColumn::AuthorName => compare_optional(
            Some(left.author_name.as_str()),
            Some(right.author_name.as_str()),
        ),
    };
    ordering.then(left.book.book_id.cmp(&right.book.book_id))
}

#[async_trait::async_trait]
impl LibraryRepository for InMemoryLibraryRepository {
    async fn add_author(&self, author: NewAuthor) -> Result<Author, RepositoryError> {
        let author_id = self
            .author_sequence_generator
            .fetch_add(1, Ordering::Relaxed);
        let author = Author {
            author_id,
            author_name: author.author_name,
            birth_date: author.birth_date,
            date_of_death: author.date_of_death,
        };
        self.tables
            .write()
            .authors
            .insert(author_id, author.clone());
        Ok(author)
    }

    async fn list_authors(&self) -> Result<Vec<Author>, RepositoryError> {
        let mut authors: Vec<Author> = self.tables.read().authors.values().cloned().collect();
        authors.sort_by(|left, right| {
            compare_optional(
                Some(left.author_name.as_str()),
                Some(right.author_name.as_str()),
            )
            .then(left.author_id.cmp(&right.author_id))
        });
        Ok(authors)
    }

    async fn get_author(&self, author_id: AuthorId) -> Result<AuthorWithBooks, RepositoryError> {
        let tables = self.tables.read();
        let author = tables
            .authors
            .get(&author_id)
            .cloned()
            .ok_or(RepositoryError::AuthorNotFound(author_id))?;
        let books = tables
            .books
            .values()
            .filter(|book| book.author_id == author_id)
            .cloned()
            .collect();
        Ok(AuthorWithBooks { author, books })
    }

    async fn add_book(&self, book: NewBook) -> Result<BookWithAuthor, RepositoryError> {
        let mut tables = self.tables.write();
        let author_name = tables
            .authors
            .get(&book.author_id)
            .map(|author| author.author_name.clone())
            .ok_or(RepositoryError::AuthorNotFound(book.author_id))?;

        let book_id = self.book_sequence_generator.fetch_add(1, Ordering::Relaxed);
        let book = Book {
            book_id,
            book_title: book.book_title,
            isbn: book.isbn,
            publication_year: book.publication_year,
            detail: book.detail,
            author_id: book.author_id,
        };
        tables.books.insert(book_id, book.clone());
        Ok(BookWithAuthor { book, author_name })
    }

    async fn get_book(&self, book_id: BookId) -> Result<BookWithAuthor, RepositoryError> {
        let tables = self.tables.read();
        let book = tables
            .books
            .get(&book_id)
            .ok_or(RepositoryError::BookNotFound(book_id))?;
        tables.join(book)
    }

    async fn list_books(&self, query: &BookQuery) -> Result<Vec<BookWithAuthor>, RepositoryError> {
        let tables = self.tables.read();
        let needle = query.search.as_deref().map(str::to_lowercase);

        let mut books = tables
            .books
            .values()
            .map(|book| tables.join(book))
            .filter(|entry| match (entry, &needle) {
                (Ok(entry), Some(needle)) => matches_search(entry, needle),
                _ => true,
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(column) = query.order_by {
            books.sort_by(|left, right| compare_by(column, left, right));
        }
        Ok(books)
    }

    async fn delete_book(&self, book_id: BookId) -> Result<Book, RepositoryError> {
        self.tables
            .write()
            .books
            .remove(&book_id)
            .ok_or(RepositoryError::BookNotFound(book_id))
    }
}

#[cfg(test)]
mod in_memory_library_repository_tests {
    use crate::api::{BookQuery, NewAuthor, NewBook, SortColumn};
    use crate::library_repository::{
        InMemoryLibraryRepository, LibraryRepository, RepositoryError,
    };

    fn new_author(name: &str) -> NewAuthor {
        NewAuthor {
            author_name: name.to_string(),
            birth_date: None,
            date_of_death: None,
        }
    }

    fn new_book(title: &str, year: Option<&str>, author_id: i32) -> NewBook {
        NewBook {
            book_title: title.to_string(),
            isbn: None,
            publication_year: year.map(str::to_string),
            detail: None,
            author_id,
        }
    }

    #[tokio::test]
    /// Tests if add_book and get_book work correctly, including the missing author case
    async fn test_add_book_and_get_it() {
        let repo = InMemoryLibraryRepository::default();

        let book_not_found = repo.get_book(20000).await;
        assert!(matches!(
            book_not_found,
            Err(RepositoryError::BookNotFound(20000))
        ));

        let missing_author = repo.add_book(new_book("Orphan", None, 42)).await;
        assert!(matches!(
            missing_author,
            Err(RepositoryError::AuthorNotFound(42))
        ));
        assert!(repo
            .list_books(&BookQuery::default())
            .await
            .unwrap()
            .is_empty());

        let author = repo
            .add_author(NewAuthor {
                author_name: "J. Tolkien".to_string(),
                birth_date: Some("1892-01-03".to_string()),
                date_of_death: Some("1973-09-02".to_string()),
            })
            .await
            .expect("Failed to add author");
        assert_eq!(author.author_id, 1);

        let added = repo
            .add_book(NewBook {
                isbn: Some("978-0261102217".to_string()),
                detail: Some("There and back again".to_string()),
                ..new_book("The Hobbit", Some("1937"), author.author_id)
            })
            .await
            .expect("Failed to add book");
        assert_eq!(added.author_name, "J. Tolkien");
        assert_eq!(added.book.author_id, author.author_id);

        let fetched = repo
            .get_book(added.book.book_id)
            .await
            .expect("Failed to get book");
        assert_eq!(fetched, added);
    }

    #[tokio::test]
    /// Tests search by title and author name, ordering and deletion
    async fn test_list_search_sort_and_delete() {
        let repo = InMemoryLibraryRepository::default();
        let tolkien = repo.add_author(new_author("J. Tolkien")).await.unwrap();
        let austen = repo.add_author(new_author("Jane Austen")).await.unwrap();

        let hobbit = repo
            .add_book(new_book("The Hobbit", Some("1937"), tolkien.author_id))
            .await
            .unwrap();
        let emma = repo
            .add_book(new_book("Emma", Some("1815"), austen.author_id))
            .await
            .unwrap();
        let silmarillion = repo
            .add_book(new_book("Silmarillion", None, tolkien.author_id))
            .await
            .unwrap();

        let all = repo.list_books(&BookQuery::default()).await.unwrap();
        assert_eq!(all, vec![hobbit.clone(), emma.clone(), silmarillion.clone()]);

        let by_title = repo
            .list_books(&BookQuery {
                search: Some("HOBBIT".to_string()),
                order_by: None,
            })
            .await
            .unwrap();
        assert_eq!(by_title, vec![hobbit.clone()]);

        let by_author = repo
            .list_books(&BookQuery {
                search: Some("tolk".to_string()),
                order_by: Some(SortColumn::Title),
            })
            .await
            .unwrap();
        assert_eq!(by_author, vec![silmarillion.clone(), hobbit.clone()]);

        let by_year = repo
            .list_books(&BookQuery {
                search: None,
                order_by: Some(SortColumn::PublicationYear),
            })
            .await
            .unwrap();
        assert_eq!(by_year, vec![emma.clone(), hobbit.clone(), silmarillion.clone()]);

        let by_author_name = repo
            .list_books(&BookQuery {
                search: None,
                order_by: Some(SortColumn::AuthorName),
            })
            .await
            .unwrap();
        assert_eq!(by_author_name, vec![hobbit.clone(), silmarillion.clone(), emma.clone()]);

        let deleted = repo.delete_book(hobbit.book.book_id).await.unwrap();
        assert_eq!(deleted, hobbit.book);
        assert!(matches!(
            repo.delete_book(hobbit.book.book_id).await,
            Err(RepositoryError::BookNotFound(..))
        ));
        assert_eq!(
            repo.list_books(&BookQuery::default()).await.unwrap(),
            vec![emma.clone(), silmarillion.clone()]
        );

        // Same order as the postgres repository: lowercased, byte order
        let anthem = repo
            .add_book(new_book("anthem", None, austen.author_id))
            .await
            .unwrap();
        let by_title = repo
            .list_books(&BookQuery {
                search: None,
                order_by: Some(SortColumn::Title),
            })
            .await
            .unwrap();
        assert_eq!(by_title, vec![anthem, emma, silmarillion]);
    }

    #[tokio::test]
    /// Tests author listing and the author page with owned books
    async fn test_authors_and_their_books() {
        let repo = InMemoryLibraryRepository::default();
        assert!(matches!(
            repo.get_author(1).await,
            Err(RepositoryError::AuthorNotFound(1))
        ));

        let tolkien = repo.add_author(new_author("J. Tolkien")).await.unwrap();
        let austen = repo.add_author(new_author("Jane Austen")).await.unwrap();
        let adams = repo.add_author(new_author("Douglas Adams")).await.unwrap();

        let authors = repo.list_authors().await.unwrap();
        assert_eq!(authors, vec![adams.clone(), tolkien.clone(), austen.clone()]);

        let hobbit = repo
            .add_book(new_book("The Hobbit", None, tolkien.author_id))
            .await
            .unwrap();
        repo.add_book(new_book("Emma", None, austen.author_id))
            .await
            .unwrap();

        let page = repo.get_author(tolkien.author_id).await.unwrap();
        assert_eq!(page.author, tolkien);
        assert_eq!(page.books, vec![hobbit.book]);

        let page = repo.get_author(adams.author_id).await.unwrap();
        assert!(page.books.is_empty());
    }
}
