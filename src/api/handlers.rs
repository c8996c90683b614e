//! Route handlers for the page and script endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde_json::Value;

use super::error::ApiError;
use super::gate::is_truthy;
use super::routes::AppState;
use super::types::{Envelope, LoginRequest, RegisterRequest, SecurityCheckRequest};
use super::views;
use crate::actions::{LoginAction, RegisterAction};
use crate::session::Session;
use crate::{AppError, SecretString, UserRepository};

const PRINCIPAL_KEY: &str = "iduser";
const LOGIN_PATH: &str = "/Login";

/// Maps the expected outcomes of a form submission to a `status: 1`
/// envelope; anything else is a fault.
fn form_failure(err: AppError) -> Result<Envelope, ApiError> {
    match err {
        AppError::InvalidCredentials => Ok(Envelope::error("Incorrect username or password.")),
        AppError::PasswordMismatch => Ok(Envelope::error("Passwords do not match")),
        AppError::UserAlreadyExists => Ok(Envelope::error("Username is already taken")),
        AppError::Validation(e) => Ok(Envelope::error(e.to_string())),
        other => Err(ApiError::from(other)),
    }
}

async fn page(session: &Session, view: &str) -> Result<Html<String>, ApiError> {
    Ok(views::render(view, &session.snapshot().await?))
}

/// GET /
pub async fn index(session: Session) -> Result<Redirect, ApiError> {
    let logged_in = session
        .get(PRINCIPAL_KEY)
        .await?
        .is_some_and(|v| is_truthy(&v));

    Ok(if logged_in {
        Redirect::to("/VariablesDeInicio")
    } else {
        Redirect::to(LOGIN_PATH)
    })
}

/// GET /Login
pub async fn login_page(session: Session) -> Result<Html<String>, ApiError> {
    page(&session, "Login").await
}

/// POST /Login
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub async fn login<U>(
    State(state): State<AppState<U>>,
    session: Session,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Envelope, ApiError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
{
    let Json(body) = payload?;
    let action = LoginAction::new(state.user_repo, state.hasher);
    let password = SecretString::new(body.password);

    match action.execute(&body.username, &password).await {
        Ok(user) => {
            session.set(PRINCIPAL_KEY, &user.iduser).await?;
            log::info!(target: "agrosense::api", "msg=\"user logged in\" iduser=\"{}\"", user.iduser);
            Ok(Envelope::ok().redirect("/"))
        }
        Err(err) => form_failure(err),
    }
}

/// GET /Register
pub async fn register_page(session: Session) -> Result<Html<String>, ApiError> {
    page(&session, "Register").await
}

/// POST /Register
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub async fn register<U>(
    State(state): State<AppState<U>>,
    session: Session,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Envelope, ApiError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
{
    let Json(body) = payload?;
    let action = RegisterAction::new(state.user_repo, state.hasher);
    let password = SecretString::new(body.password);
    let confirm_password = SecretString::new(body.confirm_password);

    match action
        .execute(&body.username, &password, &confirm_password)
        .await
    {
        Ok(user) => {
            session.set(PRINCIPAL_KEY, &user.iduser).await?;
            Ok(Envelope::ok().redirect("/"))
        }
        Err(err) => form_failure(err),
    }
}

/// GET /Logout
pub async fn logout_page(session: Session) -> Result<Redirect, ApiError> {
    session.clear().await?;
    Ok(Redirect::to(LOGIN_PATH))
}

/// POST /Logout
pub async fn logout(session: Session) -> Result<Envelope, ApiError> {
    session.clear().await?;
    Ok(Envelope::ok().redirect(LOGIN_PATH))
}

/// POST /SecurityCheck
///
/// The page script echoes the account id it was rendered with and the one
/// the user typed. Any disagreement with the session ends it.
pub async fn security_check(
    session: Session,
    payload: Result<Json<SecurityCheckRequest>, JsonRejection>,
) -> Result<Envelope, ApiError> {
    let Json(body) = payload?;
    let stored = session.get(PRINCIPAL_KEY).await?;

    let matches = body.const_iduser == body.input_iduser
        && stored.as_ref().and_then(Value::as_str) == Some(body.const_iduser.as_str());

    if !matches {
        log::warn!(target: "agrosense::api", "msg=\"security check failed\"");
        session.clear().await?;
        return Ok(Envelope::error("Security check failed").redirect(LOGIN_PATH));
    }

    Ok(Envelope::ok())
}

/// GET /VariablesDeInicio
pub async fn initial_variables(session: Session) -> Result<Html<String>, ApiError> {
    page(&session, "VariablesDeInicio").await
}

/// GET /DatosDeCampo
pub async fn field_data(session: Session) -> Result<Html<String>, ApiError> {
    page(&session, "DatosDeCampo").await
}

/// GET /Principal
pub async fn principal(session: Session) -> Result<Html<String>, ApiError> {
    page(&session, "Principal").await
}

/// POST /UploadData
///
/// Measurements are accepted as any JSON document and acknowledged.
pub async fn upload_data(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Envelope, ApiError> {
    let Json(_measurements) = payload?;
    Ok(Envelope::ok())
}

/// Fallback for unrouted paths. Runs behind the gate like any other route.
pub async fn not_found() -> Response {
    (
        axum::http::StatusCode::NOT_FOUND,
        Envelope::error("Not found"),
    )
        .into_response()
}
