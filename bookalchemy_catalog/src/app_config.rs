use actix_web::web::{FormConfig, PathConfig, QueryConfig};
use paperclip::actix::web;

use crate::handlers;

/// Book details are free text, so forms may be much larger than the 16 KiB framework default
pub const FORM_LIMIT: usize = 1024 * 1024;

pub fn config_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(PathConfig::default().error_handler(handlers::path_error))
        .app_data(QueryConfig::default().error_handler(handlers::query_error))
        .app_data(
            FormConfig::default()
                .limit(FORM_LIMIT)
                .error_handler(handlers::form_error),
        )
        .service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(
            web::resource("/")
                .route(web::get().to(handlers::list_books))
                .route(web::post().to(handlers::search_books)),
        )
        .service(
            web::resource("/add_author")
                .route(web::get().to(handlers::add_author_form))
                .route(web::post().to(handlers::add_author)),
        )
        .service(
            web::resource("/add_book")
                .route(web::get().to(handlers::add_book_form))
                .route(web::post().to(handlers::add_book)),
        )
        .service(
            web::resource("/author/{author_id}").route(web::get().to(handlers::author_details)),
        )
        .service(
            web::scope("/book/{book_id}")
                .service(
                    web::resource("/book_details")
                        .route(web::get().to(handlers::book_details))
                        .route(web::post().to(handlers::book_details)),
                )
                .service(
                    web::resource("/delete")
                        .route(web::get().to(handlers::confirm_delete_book))
                        .route(web::post().to(handlers::delete_book)),
                ),
        );
}
