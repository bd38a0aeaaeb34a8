use anyhow::{bail, Context};
use reqwest::header::LOCATION;
use reqwest::{Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::RetryTransientMiddleware;
use reqwest_tracing::TracingMiddleware;

use crate::api::{AddAuthorForm, AddBookForm, AuthorId, BookId, HomeForm, SortColumn};

/// Outcome of a form submission that the site may reject with a validation message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission<T> {
    Created(T),
    /// Form was rejected, contains the re-rendered form page
    Rejected(String),
}

pub struct BookAlchemyClient {
    url: String,
    client: ClientWithMiddleware,
}

impl BookAlchemyClient {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let client = ClientBuilder::new(reqwest_client)
            // Insert the tracing middleware
            .with(TracingMiddleware::default())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    async fn error_text(response: Response) -> String {
        response.text().await.unwrap_or_default()
    }

    /// Reads the id out of a `Location` header of the form `{prefix}{id}{suffix}`
    fn created_id(response: &Response, prefix: &str, suffix: &str) -> anyhow::Result<i32> {
        let location_header = response
            .headers()
            .get(LOCATION)
            .context("No location header")?;

        location_header
            .to_str()
            .context("Failed to convert header to str")?
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(suffix))
            .context("Invalid location header")?
            .parse()
            .context("Failed to parse id")
    }

    /// Calls POST / with the search and order_by fields
    /// Returns the rendered listing page
    pub async fn list_books(
        &self,
        search: Option<&str>,
        order_by: Option<SortColumn>,
    ) -> anyhow::Result<String> {
        let form = HomeForm {
            search: search.map(str::to_string),
            order_by: order_by.map(|column| column.as_str().to_string()),
            ..HomeForm::default()
        };
        let response = self
            .client
            .post(format!("{}/", self.url))
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Failed to list books {}", Self::error_text(response).await)
        }
        Ok(response.text().await?)
    }

    /// Calls POST /add_author endpoint
    /// Returns id of the created author, or the rejected form page
    pub async fn add_author(&self, form: &AddAuthorForm) -> anyhow::Result<Submission<AuthorId>> {
        let response = self
            .client
            .post(format!("{}/add_author", self.url))
            .form(form)
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => Ok(Submission::Created(Self::created_id(
                &response, "/author/", "",
            )?)),
            StatusCode::UNPROCESSABLE_ENTITY => Ok(Submission::Rejected(response.text().await?)),
            _ => bail!("Failed to add author {}", Self::error_text(response).await),
        }
    }

    /// Calls POST /add_book endpoint
    /// Returns id of the created book, or the rejected form page
    pub async fn add_book(&self, form: &AddBookForm) -> anyhow::Result<Submission<BookId>> {
        let response = self
            .client
            .post(format!("{}/add_book", self.url))
            .form(form)
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => Ok(Submission::Created(Self::created_id(
                &response,
                "/book/",
                "/book_details",
            )?)),
            StatusCode::UNPROCESSABLE_ENTITY => Ok(Submission::Rejected(response.text().await?)),
            _ => bail!("Failed to add book {}", Self::error_text(response).await),
        }
    }

    /// Calls GET /book/{book_id}/book_details endpoint
    /// Returns the details page, None if the book does not exist
    pub async fn get_book_details(&self, book_id: BookId) -> anyhow::Result<Option<String>> {
        let response = self
            .client
            .get(format!("{}/book/{}/book_details", self.url, book_id))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            Ok(None)
        } else if response.status().is_success() {
            Ok(Some(response.text().await?))
        } else {
            bail!("Failed to get book {}", Self::error_text(response).await)
        }
    }

    /// Calls POST /book/{book_id}/delete endpoint
    /// Returns true if the book was deleted and false if it did not exist
    pub async fn delete_book(&self, book_id: BookId) -> anyhow::Result<bool> {
        let response = self
            .client
            .post(format!("{}/book/{}/delete", self.url, book_id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            Ok(false)
        } else if response.status().is_success() {
            Ok(true)
        } else {
            bail!("Failed to delete book {}", Self::error_text(response).await)
        }
    }
}
