//! Server-rendered HTML pages. Every value coming from the store or a form goes through
//! [`escape`] before it is written into markup.

use std::fmt::Write;

use crate::api::{Author, AuthorWithBooks, Book, BookWithAuthor, SortColumn};
use crate::catalog::BookListing;

/// Visibility of the "delete a book" panel on the listing page
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum ConfirmationPanel {
    #[default]
    Hidden,
    Shown,
}

/// State of the add book form when it is rendered again after a rejected submission
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct AddBookFormState {
    pub title: Option<String>,
    pub error: Option<String>,
    pub show_author_modal: bool,
}

pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn optional(value: &Option<String>) -> String {
    value.as_deref().map(escape).unwrap_or_else(|| "-".to_string())
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - Book Alchemy</title>
</head>
<body>
<nav>
<a href="/">Home</a>
<a href="/add_author">Add author</a>
<a href="/add_book">Add book</a>
</nav>
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn error_banner(error: Option<&str>) -> String {
    error
        .map(|error| format!(r#"<p class="error">{}</p>"#, escape(error)))
        .unwrap_or_default()
}

pub fn home(listing: &BookListing, panel: ConfirmationPanel) -> String {
    let search = listing.query.search.as_deref().unwrap_or_default();
    let mut body = String::new();

    body.push_str("<h1>Book Alchemy</h1>\n");
    let _ = write!(
        body,
        r#"<form method="post" action="/">
<input type="text" name="search" value="{search}" placeholder="Search by title or author">
<select name="order_by">
<option value="">Default order</option>
"#,
        search = escape(search),
    );
    for column in SortColumn::ALL {
        let selected = if listing.query.order_by == Some(column) {
            " selected"
        } else {
            ""
        };
        let _ = writeln!(
            body,
            r#"<option value="{}"{selected}>{}</option>"#,
            column.as_str(),
            column.label()
        );
    }
    body.push_str(
        r#"</select>
<button type="submit">Submit</button>
<button type="submit" name="delete" value="1">Delete a book</button>
<button type="submit" name="home" value="1">Home</button>
</form>
"#,
    );

    if panel == ConfirmationPanel::Shown {
        body.push_str(
            r#"<section class="confirmation-panel">
<p>Select the book you want to delete from the list below.</p>
</section>
"#,
        );
    }

    if listing.no_results() {
        body.push_str(
            r#"<section class="no-results">
<h2>No book found</h2>
<p>Try searching with another keyword or phrase.<br>
Click on the <b>Submit</b> or <b>Home</b> button to get the full list of available books.</p>
</section>
"#,
        );
        return layout("Home", &body);
    }

    let _ = writeln!(body, "<p>{} book(s)</p>", listing.count());
    body.push_str("<ul class=\"books\">\n");
    for entry in &listing.books {
        let book = &entry.book;
        let _ = write!(
            body,
            r#"<li>
<a href="/book/{id}/book_details">{title}</a> by <a href="/author/{author_id}">{author}</a> ({year})
"#,
            id = book.book_id,
            title = escape(&book.book_title),
            author_id = book.author_id,
            author = escape(&entry.author_name),
            year = optional(&book.publication_year),
        );
        if panel == ConfirmationPanel::Shown {
            let _ = write!(
                body,
                r#"<form method="post" action="/book/{}/delete"><button type="submit">Delete</button></form>
"#,
                book.book_id
            );
        }
        body.push_str("</li>\n");
    }
    body.push_str("</ul>\n");

    layout("Home", &body)
}

pub fn add_author_form(error: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Add author</h1>
{error}<form method="post" action="/add_author">
<label>Name <input type="text" name="name" required></label>
<label>Birth date <input type="text" name="birthdate"></label>
<label>Date of death <input type="text" name="date_of_death"></label>
<button type="submit">Add author</button>
</form>
"#,
        error = error_banner(error),
    );
    layout("Add author", &body)
}

pub fn author_added(author: &Author) -> String {
    let body = format!(
        r#"<h1>Author added</h1>
<p><a href="/author/{}">{}</a> was added to the library.</p>
"#,
        author.author_id,
        escape(&author.author_name)
    );
    layout("Author added", &body)
}

pub fn add_book_form(authors: &[Author], state: &AddBookFormState) -> String {
    let mut options = String::new();
    for author in authors {
        let _ = writeln!(
            options,
            r#"<option value="{}">{}</option>"#,
            author.author_id,
            escape(&author.author_name)
        );
    }

    let modal = if state.show_author_modal {
        r#"<div class="modal" role="dialog">
<p>Please select an author. If the author is not in the list, <a href="/add_author">add the author</a> first.</p>
</div>
"#
    } else {
        ""
    };

    let body = format!(
        r#"<h1>Add book</h1>
{modal}{error}<form method="post" action="/add_book">
<label>Title <input type="text" name="title" value="{title}" required></label>
<label>ISBN <input type="text" name="isbn"></label>
<label>Publication year <input type="text" name="publication_year"></label>
<label>Author <select name="author">
<option value="">Select an author</option>
{options}</select></label>
<label>Details <textarea name="details"></textarea></label>
<button type="submit">Add book</button>
</form>
"#,
        error = error_banner(state.error.as_deref()),
        title = escape(state.title.as_deref().unwrap_or_default()),
    );
    layout("Add book", &body)
}

pub fn book_added(added: &BookWithAuthor) -> String {
    let body = format!(
        r#"<h1>Book added</h1>
<p><a href="/book/{}/book_details">{}</a> by {} was added to the library.</p>
"#,
        added.book.book_id,
        escape(&added.book.book_title),
        escape(&added.author_name)
    );
    layout("Book added", &body)
}

pub fn book_details(entry: &BookWithAuthor) -> String {
    let book = &entry.book;
    let body = format!(
        r#"<h1>{title}</h1>
<dl>
<dt>Author</dt><dd><a href="/author/{author_id}">{author}</a></dd>
<dt>ISBN</dt><dd>{isbn}</dd>
<dt>Publication year</dt><dd>{year}</dd>
<dt>Details</dt><dd>{detail}</dd>
</dl>
<a href="/book/{id}/delete">Delete this book</a>
"#,
        title = escape(&book.book_title),
        author_id = book.author_id,
        author = escape(&entry.author_name),
        isbn = optional(&book.isbn),
        year = optional(&book.publication_year),
        detail = optional(&book.detail),
        id = book.book_id,
    );
    layout(&book.book_title, &body)
}

pub fn author_details(page: &AuthorWithBooks) -> String {
    let author = &page.author;
    let mut books = String::new();
    for book in &page.books {
        let _ = writeln!(
            books,
            r#"<li><a href="/book/{}/book_details">{}</a></li>"#,
            book.book_id,
            escape(&book.book_title)
        );
    }
    if page.books.is_empty() {
        books.push_str("<li>No books yet</li>\n");
    }

    let body = format!(
        r#"<h1>{name}</h1>
<dl>
<dt>Born</dt><dd>{birth}</dd>
<dt>Died</dt><dd>{death}</dd>
</dl>
<h2>Books</h2>
<ul>
{books}</ul>
"#,
        name = escape(&author.author_name),
        birth = optional(&author.birth_date),
        death = optional(&author.date_of_death),
    );
    layout(&author.author_name, &body)
}

pub fn delete_confirmation(entry: &BookWithAuthor) -> String {
    let body = format!(
        r#"<h1>Delete book</h1>
<p>Do you really want to delete {} by {}?</p>
<form method="post" action="/book/{}/delete">
<button type="submit">Delete</button>
</form>
<a href="/">Cancel</a>
"#,
        escape(&entry.book.book_title),
        escape(&entry.author_name),
        entry.book.book_id
    );
    layout("Delete book", &body)
}

pub fn book_deleted(book: &Book) -> String {
    let body = format!(
        r#"<h1>Book deleted</h1>
<p>{} was removed from the library.</p>
"#,
        escape(&book.book_title)
    );
    layout("Book deleted", &body)
}

pub fn not_found(message: &str) -> String {
    let body = format!("<h1>Not found</h1>\n<p>{}</p>\n", escape(message));
    layout("Not found", &body)
}

pub fn bad_request(message: &str) -> String {
    let body = format!("<h1>Invalid request</h1>\n<p>{}</p>\n", escape(message));
    layout("Invalid request", &body)
}

pub fn server_error() -> String {
    layout(
        "Error",
        "<h1>Something went wrong</h1>\n<p>The request could not be completed. Please try again.</p>\n",
    )
}
