use actix_web::error::{InternalError, PathError, QueryPayloadError, UrlencodedError};
use actix_web::http::header::{ContentType, LOCATION};
use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{Error, HttpRequest, HttpResponse, ResponseError};
use paperclip::actix::{
    api_v2_operation,
    web::{self},
};

use crate::api::{AddAuthorForm, AddBookForm, AuthorId, BookId, BookQuery, HomeForm};
use crate::catalog::{Catalog, CatalogError, ValidationError};
use crate::views::{self, AddBookFormState, ConfirmationPanel};

fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(body)
}

/// Renders failures that are not specific to a form
fn error_page(operation: &str, err: CatalogError) -> HttpResponse {
    match &err {
        CatalogError::Validation(err) => {
            html(StatusCode::BAD_REQUEST, views::bad_request(&err.to_string()))
        }
        CatalogError::AuthorNotFound(_) | CatalogError::BookNotFound(_) => {
            html(StatusCode::NOT_FOUND, views::not_found(&err.to_string()))
        }
        CatalogError::Persistence(err) => {
            tracing::error!("{} failed {}", operation, err);
            html(StatusCode::INTERNAL_SERVER_ERROR, views::server_error())
        }
    }
}

/// Path segments that do not parse as an id point at a page that does not exist
pub fn path_error(err: PathError, req: &HttpRequest) -> Error {
    let response = html(
        StatusCode::NOT_FOUND,
        views::not_found(&format!("Nothing found at {}", req.path())),
    );
    InternalError::from_response(err, response).into()
}

/// Keeps the framework status (413 for oversized bodies, 400 otherwise) but renders a page
pub fn form_error(err: UrlencodedError, _req: &HttpRequest) -> Error {
    let response = html(err.status_code(), views::bad_request(&err.to_string()));
    InternalError::from_response(err, response).into()
}

pub fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> Error {
    let response = html(StatusCode::BAD_REQUEST, views::bad_request(&err.to_string()));
    InternalError::from_response(err, response).into()
}

#[api_v2_operation]
pub async fn health() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().finish())
}

/// The panel opens on `delete` and closes on `home` or when the list is re-ordered
fn confirmation_panel(form: &HomeForm) -> ConfirmationPanel {
    let is_set = |flag: &Option<String>| flag.as_deref().is_some_and(|value| !value.is_empty());
    if is_set(&form.delete) && !is_set(&form.home) && !is_set(&form.order_by) {
        ConfirmationPanel::Shown
    } else {
        ConfirmationPanel::Hidden
    }
}

async fn render_listing(catalog: &Catalog, form: HomeForm) -> HttpResponse {
    let panel = confirmation_panel(&form);
    let query = match BookQuery::parse(form.search, form.order_by) {
        Ok(query) => query,
        Err(err) => return error_page("List books", err.into()),
    };

    match catalog.list_books(query).await {
        Ok(listing) => {
            let panel = if listing.no_results() {
                ConfirmationPanel::Hidden
            } else {
                panel
            };
            html(StatusCode::OK, views::home(&listing, panel))
        }
        Err(err) => error_page("List books", err),
    }
}

#[api_v2_operation]
pub async fn list_books(
    catalog: Data<Catalog>,
    query: web::Query<HomeForm>,
) -> Result<HttpResponse, Error> {
    Ok(render_listing(&catalog, query.into_inner()).await)
}

#[api_v2_operation]
pub async fn search_books(
    catalog: Data<Catalog>,
    form: web::Form<HomeForm>,
) -> Result<HttpResponse, Error> {
    Ok(render_listing(&catalog, form.into_inner()).await)
}

#[api_v2_operation]
pub async fn add_author_form() -> Result<HttpResponse, Error> {
    Ok(html(StatusCode::OK, views::add_author_form(None)))
}

#[api_v2_operation]
pub async fn add_author(
    catalog: Data<Catalog>,
    form: web::Form<AddAuthorForm>,
) -> Result<HttpResponse, Error> {
    Ok(match catalog.add_author(form.into_inner()).await {
        Ok(author) => HttpResponse::Created()
            .append_header((LOCATION, format!("/author/{}", author.author_id)))
            .content_type(ContentType::html())
            .body(views::author_added(&author)),
        Err(CatalogError::Validation(err)) => html(
            StatusCode::UNPROCESSABLE_ENTITY,
            views::add_author_form(Some(&err.to_string())),
        ),
        Err(err) => error_page("Add author", err),
    })
}

#[api_v2_operation]
pub async fn add_book_form(catalog: Data<Catalog>) -> Result<HttpResponse, Error> {
    Ok(match catalog.list_authors().await {
        Ok(authors) => html(
            StatusCode::OK,
            views::add_book_form(&authors, &AddBookFormState::default()),
        ),
        Err(err) => error_page("List authors", err),
    })
}

#[api_v2_operation]
pub async fn add_book(
    catalog: Data<Catalog>,
    form: web::Form<AddBookForm>,
) -> Result<HttpResponse, Error> {
    let form = form.into_inner();
    let submitted_title = form.title.clone();

    let state = match catalog.add_book(form).await {
        Ok(added) => {
            return Ok(HttpResponse::Created()
                .append_header((
                    LOCATION,
                    format!("/book/{}/book_details", added.book.book_id),
                ))
                .content_type(ContentType::html())
                .body(views::book_added(&added)))
        }
        Err(CatalogError::Validation(ValidationError::MissingAuthorSelection { title })) => {
            AddBookFormState {
                title,
                error: None,
                show_author_modal: true,
            }
        }
        Err(err @ (CatalogError::Validation(_) | CatalogError::AuthorNotFound(_))) => {
            AddBookFormState {
                title: submitted_title,
                error: Some(err.to_string()),
                show_author_modal: false,
            }
        }
        Err(err) => return Ok(error_page("Add book", err)),
    };

    Ok(match catalog.list_authors().await {
        Ok(authors) => html(
            StatusCode::UNPROCESSABLE_ENTITY,
            views::add_book_form(&authors, &state),
        ),
        Err(err) => error_page("List authors", err),
    })
}

/// Read-only, served for both GET and POST
#[api_v2_operation]
pub async fn book_details(
    catalog: Data<Catalog>,
    book_id: web::Path<BookId>,
) -> Result<HttpResponse, Error> {
    Ok(match catalog.book_details(book_id.into_inner()).await {
        Ok(entry) => html(StatusCode::OK, views::book_details(&entry)),
        Err(err) => error_page("Get book", err),
    })
}

/// Shows what would be deleted, never mutates
#[api_v2_operation]
pub async fn confirm_delete_book(
    catalog: Data<Catalog>,
    book_id: web::Path<BookId>,
) -> Result<HttpResponse, Error> {
    Ok(match catalog.book_details(book_id.into_inner()).await {
        Ok(entry) => html(StatusCode::OK, views::delete_confirmation(&entry)),
        Err(err) => error_page("Get book", err),
    })
}

#[api_v2_operation]
pub async fn delete_book(
    catalog: Data<Catalog>,
    book_id: web::Path<BookId>,
) -> Result<HttpResponse, Error> {
    Ok(match catalog.delete_book(book_id.into_inner()).await {
        Ok(book) => html(StatusCode::OK, views::book_deleted(&book)),
        Err(err) => error_page("Delete book", err),
    })
}

#[api_v2_operation]
pub async fn author_details(
    catalog: Data<Catalog>,
    author_id: web::Path<AuthorId>,
) -> Result<HttpResponse, Error> {
    Ok(match catalog.author_details(author_id.into_inner()).await {
        Ok(page) => html(StatusCode::OK, views::author_details(&page)),
        Err(err) => error_page("Get author", err),
    })
}
