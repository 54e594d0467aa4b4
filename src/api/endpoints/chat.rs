//! Chat endpoints.
//!
//! - `GET /api/chat/:flow`: log, exchange state, empty-state tips
//! - `PUT /api/chat/:flow/input`: store the composer draft
//! - `POST /api/chat/:flow/send`: send a message (or the draft), wait for the reply
//! - `POST /api/chat/:flow/reset`: clear the log
//! - `PUT /api/clinician/patient`: select the clinician chat's patient

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{parse_flow, ApiContext};
use crate::chat::ChatSnapshot;
use crate::models::{ChatFlow, Message};

const MAX_MESSAGE_CHARS: usize = 2000;

fn check_length(text: &str) -> Result<(), ApiError> {
    if text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Message too long (max {MAX_MESSAGE_CHARS} chars)"
        )));
    }
    Ok(())
}

#[derive(Deserialize)]
pub struct ChatSendRequest {
    /// Absent: send the stored draft.
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub struct DraftRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct ChatSendResponse {
    pub reply: Message,
    pub disclaimer: &'static str,
}

#[derive(Deserialize)]
pub struct SelectPatientRequest {
    pub patient_id: Option<String>,
}

pub async fn view(
    State(ctx): State<ApiContext>,
    Path(flow): Path<String>,
) -> Result<Json<ChatSnapshot>, ApiError> {
    let flow = parse_flow(&flow)?;
    Ok(Json(ctx.core.chat(flow).snapshot()))
}

pub async fn send(
    State(ctx): State<ApiContext>,
    Path(flow): Path<String>,
    Json(req): Json<ChatSendRequest>,
) -> Result<Json<ChatSendResponse>, ApiError> {
    let flow = parse_flow(&flow)?;
    let reply = match req.message {
        Some(message) => {
            check_length(&message)?;
            ctx.core.send_message(flow, &message).await?
        }
        None => ctx.core.send_input(flow).await?,
    };
    Ok(Json(ChatSendResponse {
        reply,
        disclaimer: "This is AI-generated information. Always consult with a healthcare professional.",
    }))
}

pub async fn set_input(
    State(ctx): State<ApiContext>,
    Path(flow): Path<String>,
    Json(req): Json<DraftRequest>,
) -> Result<Json<ChatSnapshot>, ApiError> {
    let flow = parse_flow(&flow)?;
    check_length(&req.text)?;
    let chat = ctx.core.chat(flow);
    chat.set_input(req.text);
    Ok(Json(chat.snapshot()))
}

pub async fn reset(
    State(ctx): State<ApiContext>,
    Path(flow): Path<String>,
) -> Result<Json<ChatSnapshot>, ApiError> {
    let flow = parse_flow(&flow)?;
    let chat = ctx.core.chat(flow);
    chat.reset()?;
    Ok(Json(chat.snapshot()))
}

pub async fn select_patient(
    State(ctx): State<ApiContext>,
    Json(req): Json<SelectPatientRequest>,
) -> Result<Json<ChatSnapshot>, ApiError> {
    ctx.core.select_patient(req.patient_id.as_deref())?;
    Ok(Json(ctx.core.chat(ChatFlow::Clinician).snapshot()))
}
