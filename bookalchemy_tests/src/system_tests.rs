use std::time::UNIX_EPOCH;

use bookalchemy_catalog::api::{AddAuthorForm, AddBookForm, SortColumn};
use bookalchemy_catalog::client::{BookAlchemyClient, Submission};

fn service_url() -> String {
    std::env::var("BOOKALCHEMY_URL").unwrap_or("http://127.0.0.1:5001".to_string())
}

fn unique_suffix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64
}

#[tokio::test]
/// Simple end to end test of the catalog
/// Creates an author
/// Creates a book for the author
/// Finds the book by title and by author name
/// Gets the book details
/// Deletes the book and checks it is gone
async fn bookalchemy_catalog_e2e_test() {
    let client = BookAlchemyClient::new(&service_url()).expect("Failed to create client");
    let suffix = unique_suffix();
    let author_name = format!("Author{}", suffix);
    let title = format!("Title{}", suffix);

    let author_id = match client
        .add_author(&AddAuthorForm {
            name: Some(author_name.clone()),
            birthdate: Some("1892".to_string()),
            date_of_death: None,
        })
        .await
        .expect("Failed to add author")
    {
        Submission::Created(author_id) => author_id,
        Submission::Rejected(page) => panic!("Author rejected {}", page),
    };

    let book_id = match client
        .add_book(&AddBookForm {
            title: Some(title.clone()),
            publication_year: Some("1937".to_string()),
            author: Some(author_id.to_string()),
            ..AddBookForm::default()
        })
        .await
        .expect("Failed to add book")
    {
        Submission::Created(book_id) => book_id,
        Submission::Rejected(page) => panic!("Book rejected {}", page),
    };

    let book_link = format!("/book/{}/book_details", book_id);
    let by_title = client
        .list_books(Some(&title.to_lowercase()), Some(SortColumn::Title))
        .await
        .expect("Failed to search books");
    assert!(by_title.contains(&book_link));

    let by_author = client
        .list_books(Some(&author_name), None)
        .await
        .expect("Failed to search books");
    assert!(by_author.contains(&book_link));

    let details = client
        .get_book_details(book_id)
        .await
        .expect("Failed to get book")
        .expect("Book not found");
    assert!(details.contains(&author_name));

    assert!(client.delete_book(book_id).await.expect("Failed to delete"));
    assert!(!client.delete_book(book_id).await.expect("Failed to delete"));
    assert_eq!(
        client
            .get_book_details(book_id)
            .await
            .expect("Failed to get book"),
        None
    );

    let after_delete = client
        .list_books(Some(&title), None)
        .await
        .expect("Failed to search books");
    assert!(after_delete.contains("No book found"));
}

#[tokio::test]
/// Checks that incomplete forms are rejected without creating anything
async fn bookalchemy_rejected_forms_e2e_test() {
    let client = BookAlchemyClient::new(&service_url()).expect("Failed to create client");
    let title = format!("Unassigned{}", unique_suffix());

    let rejected = client
        .add_author(&AddAuthorForm::default())
        .await
        .expect("Failed to submit author");
    assert!(matches!(rejected, Submission::Rejected(..)));

    let rejected = client
        .add_book(&AddBookForm {
            title: Some(title.clone()),
            ..AddBookForm::default()
        })
        .await
        .expect("Failed to submit book");
    match rejected {
        Submission::Rejected(page) => assert!(page.contains(&title)),
        Submission::Created(book_id) => panic!("Book {} created without author", book_id),
    }

    let listing = client
        .list_books(Some(&title), None)
        .await
        .expect("Failed to search books");
    assert!(listing.contains("No book found"));
}
