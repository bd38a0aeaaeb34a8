use std::fmt;
use std::str::FromStr;

use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

pub type AuthorId = i32;
pub type BookId = i32;

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
/// Author stored in the catalog
pub struct Author {
    pub author_id: AuthorId,
    pub author_name: String,
    pub birth_date: Option<String>,
    pub date_of_death: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
/// Author details before an id is assigned by the store
pub struct NewAuthor {
    pub author_name: String,
    pub birth_date: Option<String>,
    pub date_of_death: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
/// Book row as stored in the catalog
pub struct Book {
    pub book_id: BookId,
    pub book_title: String,
    pub isbn: Option<String>,
    pub publication_year: Option<String>,
    pub detail: Option<String>,
    pub author_id: AuthorId,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
/// Book details before an id is assigned by the store
pub struct NewBook {
    pub book_title: String,
    pub isbn: Option<String>,
    pub publication_year: Option<String>,
    pub detail: Option<String>,
    pub author_id: AuthorId,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
/// Book joined with the name of its author
pub struct BookWithAuthor {
    pub book: Book,
    pub author_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct AuthorWithBooks {
    pub author: Author,
    pub books: Vec<Book>,
}

/// Columns the book listing can be ordered by.
/// Wire names are the column names used by the listing form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub enum SortColumn {
    #[serde(rename = "book_title")]
    Title,
    #[serde(rename = "publication_year")]
    PublicationYear,
    #[serde(rename = "author_name")]
    AuthorName,
}

impl SortColumn {
    pub const ALL: [SortColumn; 3] = [
        SortColumn::Title,
        SortColumn::PublicationYear,
        SortColumn::AuthorName,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::Title => "book_title",
            SortColumn::PublicationYear => "publication_year",
            SortColumn::AuthorName => "author_name",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortColumn::Title => "Title",
            SortColumn::PublicationYear => "Publication year",
            SortColumn::AuthorName => "Author",
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
#[error("Unknown sort column {0:?}")]
pub struct UnknownSortColumn(pub String);

impl FromStr for SortColumn {
    type Err = UnknownSortColumn;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SortColumn::ALL
            .into_iter()
            .find(|column| column.as_str() == value)
            .ok_or_else(|| UnknownSortColumn(value.to_string()))
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
/// Filter and ordering applied when listing books
pub struct BookQuery {
    /// Case-insensitive substring matched against book title and author name
    pub search: Option<String>,
    pub order_by: Option<SortColumn>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Apiv2Schema)]
/// Fields posted by the listing page. `delete` and `home` only toggle the confirmation panel
pub struct HomeForm {
    pub order_by: Option<String>,
    pub search: Option<String>,
    pub delete: Option<String>,
    pub home: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Apiv2Schema)]
pub struct AddAuthorForm {
    pub name: Option<String>,
    pub birthdate: Option<String>,
    pub date_of_death: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Apiv2Schema)]
pub struct AddBookForm {
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub publication_year: Option<String>,
    /// Id of the author selected on the form
    pub author: Option<String>,
    pub details: Option<String>,
}

/// Trims a form value, treating blank input as absent
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
