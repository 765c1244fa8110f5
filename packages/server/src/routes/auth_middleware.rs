use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{
    error::GameError,
    utils::session::{self, Session},
};

/// `Authorization: Bearer <token>` を検証し、`Session` をリクエストに載せる
pub async fn auth_middleware(mut request: Request, next: Next) -> Result<Response, GameError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned)
        .ok_or(GameError::InvalidSession)?;

    let claims = session::verify_token(&token)?;
    request.extensions_mut().insert(Session::from(claims));
    Ok(next.run(request).await)
}
