use axum::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{guard_collection, guard_instance};
use crate::app::AppState;
use crate::authz::resources::BOOK;
use crate::authz::{Action, ResourceLookup};
use crate::errors::AppResult;
use crate::jwt::Identity;
use crate::models::library::{Book, BookCreateRequest, BookUpdateRequest};
use crate::utils::{required, utc_now};

const BOOK_COLUMNS: &str = "id, title, author_name, publication_year, created_at, updated_at";

#[async_trait]
impl ResourceLookup<Book> for SqlitePool {
    type Error = sqlx::Error;

    async fn fetch(&self, id: Uuid) -> Result<Option<Book>, sqlx::Error> {
        sqlx::query_as::<_, Book>(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"))
            .bind(id)
            .fetch_optional(self)
            .await
    }
}

pub async fn list_books(
    State(state): State<AppState>,
    Identity(identity): Identity,
) -> AppResult<Json<Vec<Book>>> {
    guard_collection(&state, &identity, Action::List, BOOK)?;

    let books = sqlx::query_as::<_, Book>(&format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY title ASC"))
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(books))
}

pub async fn create_book(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Json(payload): Json<BookCreateRequest>,
) -> AppResult<(StatusCode, Json<Book>)> {
    guard_collection(&state, &identity, Action::Create, BOOK)?;

    let now = utc_now();
    let book = Book {
        id: Uuid::new_v4(),
        title: required("title", &payload.title)?,
        author_name: required("author_name", &payload.author_name)?,
        publication_year: payload.publication_year,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(&format!("INSERT INTO books ({BOOK_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?)"))
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.author_name)
        .bind(book.publication_year)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&state.pool)
        .await?;

    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn get_book(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Book>> {
    let book: Book = guard_instance(&state, &identity, Action::Retrieve, BOOK, id).await?;
    Ok(Json(book))
}

pub async fn update_book(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<BookUpdateRequest>,
) -> AppResult<Json<Book>> {
    let mut book: Book = guard_instance(&state, &identity, Action::Update, BOOK, id).await?;

    if let Some(title) = payload.title.as_deref() {
        book.title = required("title", title)?;
    }
    if let Some(author_name) = payload.author_name.as_deref() {
        book.author_name = required("author_name", author_name)?;
    }
    if payload.publication_year.is_some() {
        book.publication_year = payload.publication_year;
    }
    book.updated_at = utc_now();

    sqlx::query("UPDATE books SET title = ?, author_name = ?, publication_year = ?, updated_at = ? WHERE id = ?")
        .bind(&book.title)
        .bind(&book.author_name)
        .bind(book.publication_year)
        .bind(book.updated_at)
        .bind(book.id)
        .execute(&state.pool)
        .await?;

    Ok(Json(book))
}

pub async fn delete_book(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let book: Book = guard_instance(&state, &identity, Action::Delete, BOOK, id).await?;

    sqlx::query("DELETE FROM books WHERE id = ?")
        .bind(book.id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
