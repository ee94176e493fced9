use axum::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use super::notifications::notify;
use super::{guard_collection, guard_instance};
use crate::app::AppState;
use crate::authz::resources::{COMMENT, POST};
use crate::authz::{Action, IdentityContext, ResourceLookup};
use crate::errors::{AppError, AppResult};
use crate::jwt::Identity;
use crate::models::blog::{
    Comment, CommentCreateRequest, CommentQuery, CommentUpdateRequest, Post, PostCreateRequest, PostQuery,
    PostUpdateRequest,
};
use crate::utils::{required, utc_now};

const POST_COLUMNS: &str = "id, author_id, title, content, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, post_id, author_id, content, created_at, updated_at";

#[async_trait]
impl ResourceLookup<Post> for SqlitePool {
    type Error = sqlx::Error;

    async fn fetch(&self, id: Uuid) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?"))
            .bind(id)
            .fetch_optional(self)
            .await
    }
}

#[async_trait]
impl ResourceLookup<Comment> for SqlitePool {
    type Error = sqlx::Error;

    async fn fetch(&self, id: Uuid) -> Result<Option<Comment>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(&format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?"))
            .bind(id)
            .fetch_optional(self)
            .await
    }
}

fn author_of(identity: &IdentityContext) -> AppResult<Uuid> {
    identity
        .principal_id()
        .ok_or_else(|| AppError::unauthorized("authentication required"))
}

/// Posts newest first; `author` filters by author, `search` matches title or content.
pub async fn list_posts(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Query(query): Query<PostQuery>,
) -> AppResult<Json<Vec<Post>>> {
    guard_collection(&state, &identity, Action::List, POST)?;

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {POST_COLUMNS} FROM posts WHERE 1 = 1"));

    if let Some(author) = query.author {
        builder.push(" AND author_id = ").push_bind(author);
    }

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        builder
            .push(" AND (title LIKE ")
            .push_bind(pattern.clone())
            .push(" OR content LIKE ")
            .push_bind(pattern)
            .push(")");
    }

    builder.push(" ORDER BY created_at DESC");

    let posts = builder.build_query_as::<Post>().fetch_all(&state.pool).await?;
    Ok(Json(posts))
}

pub async fn create_post(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Json(payload): Json<PostCreateRequest>,
) -> AppResult<(StatusCode, Json<Post>)> {
    guard_collection(&state, &identity, Action::Create, POST)?;
    let author_id = author_of(&identity)?;

    let title = required("title", &payload.title)?;
    let now = utc_now();
    let post = Post {
        id: Uuid::new_v4(),
        author_id: Some(author_id),
        title,
        content: payload.content,
        created_at: now,
        updated_at: now,
    };

    sqlx::query("INSERT INTO posts (id, author_id, title, content, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)")
        .bind(post.id)
        .bind(post.author_id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&state.pool)
        .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Post>> {
    let post: Post = guard_instance(&state, &identity, Action::Retrieve, POST, id).await?;
    Ok(Json(post))
}

pub async fn update_post(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostUpdateRequest>,
) -> AppResult<Json<Post>> {
    let mut post: Post = guard_instance(&state, &identity, Action::Update, POST, id).await?;

    if let Some(title) = payload.title.as_deref() {
        post.title = required("title", title)?;
    }
    if let Some(content) = payload.content {
        post.content = content;
    }
    post.updated_at = utc_now();

    sqlx::query("UPDATE posts SET title = ?, content = ?, updated_at = ? WHERE id = ?")
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.updated_at)
        .bind(post.id)
        .execute(&state.pool)
        .await?;

    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let post: Post = guard_instance(&state, &identity, Action::Delete, POST, id).await?;

    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(post.id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_comments(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Query(query): Query<CommentQuery>,
) -> AppResult<Json<Vec<Comment>>> {
    guard_collection(&state, &identity, Action::List, COMMENT)?;

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {COMMENT_COLUMNS} FROM comments"));
    if let Some(post_id) = query.post {
        builder.push(" WHERE post_id = ").push_bind(post_id);
    }
    builder.push(" ORDER BY created_at ASC");

    let comments = builder.build_query_as::<Comment>().fetch_all(&state.pool).await?;
    Ok(Json(comments))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Json(payload): Json<CommentCreateRequest>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    guard_collection(&state, &identity, Action::Create, COMMENT)?;
    let author_id = author_of(&identity)?;

    let post = ResourceLookup::<Post>::fetch(&state.pool, payload.post_id)
        .await?
        .ok_or_else(|| AppError::bad_request("post does not exist"))?;

    let content = required("content", &payload.content)?;
    let now = utc_now();
    let comment = Comment {
        id: Uuid::new_v4(),
        post_id: payload.post_id,
        author_id: Some(author_id),
        content,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO comments (id, post_id, author_id, content, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(comment.id)
    .bind(comment.post_id)
    .bind(comment.author_id)
    .bind(&comment.content)
    .bind(comment.created_at)
    .bind(comment.updated_at)
    .execute(&state.pool)
    .await?;

    if let Some(post_author) = post.author_id {
        notify(&state.pool, post_author, author_id, "commented on your post", POST, post.id).await?;
    }

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn get_comment(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Comment>> {
    let comment: Comment = guard_instance(&state, &identity, Action::Retrieve, COMMENT, id).await?;
    Ok(Json(comment))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentUpdateRequest>,
) -> AppResult<Json<Comment>> {
    let mut comment: Comment = guard_instance(&state, &identity, Action::Update, COMMENT, id).await?;

    comment.content = required("content", &payload.content)?;
    comment.updated_at = utc_now();

    sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE id = ?")
        .bind(&comment.content)
        .bind(comment.updated_at)
        .bind(comment.id)
        .execute(&state.pool)
        .await?;

    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let comment: Comment = guard_instance(&state, &identity, Action::Delete, COMMENT, id).await?;

    sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(comment.id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
