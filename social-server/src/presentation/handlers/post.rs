use crate::application::post_service::PostService;
use crate::data::post_store::PostgresPostStore;
use crate::domain::error::DomainError;
use crate::domain::user::Actor;
use crate::presentation::dto::{CreateCommentRequest, CreatePostRequest, DeletedResponse};
use crate::presentation::utils::AuthenticatedUser;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, delete, get, post, put, web};
use tracing::info;
use uuid::Uuid;

#[post("")]
async fn create_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<PostService<PostgresPostStore>>,
    payload: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, DomainError> {
    let actor = Actor::from(&user);
    let post = service.create_post(&actor, &payload.text).await?;

    info!(
        request_id = %request_id(&req),
        user_id = %user.id,
        post_id = %post.id,
        "post created"
    );

    Ok(HttpResponse::Ok().json(post))
}

#[get("")]
async fn get_posts(
    req: HttpRequest,
    _user: AuthenticatedUser,
    service: web::Data<PostService<PostgresPostStore>>,
) -> Result<HttpResponse, DomainError> {
    let posts = service.get_posts().await?;

    info!(
        request_id = %request_id(&req),
        count = posts.len(),
        "posts retrieved"
    );

    Ok(HttpResponse::Ok().json(posts))
}

#[get("/{id}")]
async fn get_post(
    _user: AuthenticatedUser,
    service: web::Data<PostService<PostgresPostStore>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post = service.get_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

#[delete("/{id}")]
async fn delete_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<PostService<PostgresPostStore>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    service.delete_post(user.id, post_id).await?;

    info!(
        request_id = %request_id(&req),
        user_id = %user.id,
        post_id = %post_id,
        "post deleted"
    );

    Ok(HttpResponse::Ok().json(DeletedResponse {
        message: "post removed",
    }))
}

#[put("/like/{id}")]
async fn like_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<PostService<PostgresPostStore>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let likes = service.like_post(user.id, post_id).await?;

    info!(
        request_id = %request_id(&req),
        user_id = %user.id,
        post_id = %post_id,
        "post liked"
    );

    Ok(HttpResponse::Ok().json(likes))
}

#[put("/unlike/{id}")]
async fn unlike_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<PostService<PostgresPostStore>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let likes = service.unlike_post(user.id, post_id).await?;

    info!(
        request_id = %request_id(&req),
        user_id = %user.id,
        post_id = %post_id,
        "post unliked"
    );

    Ok(HttpResponse::Ok().json(likes))
}

#[post("/comment/{id}")]
async fn add_comment(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<PostService<PostgresPostStore>>,
    payload: web::Json<CreateCommentRequest>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let actor = Actor::from(&user);
    let comments = service.add_comment(&actor, post_id, &payload.text).await?;

    info!(
        request_id = %request_id(&req),
        user_id = %user.id,
        post_id = %post_id,
        "comment added"
    );

    Ok(HttpResponse::Ok().json(comments))
}

#[delete("/comment/{id}/{comment_id}")]
async fn delete_comment(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<PostService<PostgresPostStore>>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, DomainError> {
    let (post_id, comment_id) = path.into_inner();
    let comments = service.delete_comment(user.id, post_id, comment_id).await?;

    info!(
        request_id = %request_id(&req),
        user_id = %user.id,
        post_id = %post_id,
        comment_id = %comment_id,
        "comment deleted"
    );

    Ok(HttpResponse::Ok().json(comments))
}

fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<crate::presentation::middleware::RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}
