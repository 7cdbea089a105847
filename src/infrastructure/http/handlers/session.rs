//! Session Handlers
//!
//! 挂载/卸载收听会话，以及把 UI 操作翻译成播放意图

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::{
    DispatchIntentCommand, GetSessionStateQuery, Intent, ListSessionsQuery, MountSessionCommand,
    UnmountSessionCommand,
};
use crate::domain::session::Origin;
use crate::infrastructure::http::dto::{
    parse_version, ApiResponse, BookDto, SessionListDto, SessionStateDto, SessionSummaryDto,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 投递意图并包装响应
async fn dispatch(
    state: &AppState,
    session_id: String,
    intent: Intent,
    notice: Option<String>,
) -> Result<Json<ApiResponse<SessionStateDto>>, ApiError> {
    let result = state
        .dispatch_intent_handler
        .handle(DispatchIntentCommand { session_id, intent })
        .await?;

    Ok(Json(ApiResponse::success(SessionStateDto {
        session_id: result.session_id,
        created_at: None,
        notice,
        state: result.snapshot,
    })))
}

// ============================================================================
// Mount / Unmount
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct MountRequest {
    #[serde(default)]
    pub book: Option<BookDto>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub autoplay: bool,
}

pub async fn mount_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MountRequest>,
) -> Result<Json<ApiResponse<SessionStateDto>>, ApiError> {
    let book = req.book.map(BookDto::into_book).transpose()?;
    let (version, notice) = match req.version.as_deref() {
        Some(raw) => {
            let (version, notice) = parse_version(raw, state.default_version);
            (Some(version), notice)
        }
        None => (None, None),
    };

    let result = state
        .mount_session_handler
        .handle(MountSessionCommand {
            book,
            version,
            autoplay: req.autoplay,
        })
        .await?;

    Ok(Json(ApiResponse::success(SessionStateDto {
        session_id: result.session_id,
        created_at: Some(result.created_at),
        notice,
        state: result.snapshot,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SessionIdRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct UnmountResponseDto {
    pub session_id: String,
}

pub async fn unmount_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionIdRequest>,
) -> Result<Json<ApiResponse<UnmountResponseDto>>, ApiError> {
    let result = state
        .unmount_session_handler
        .handle(UnmountSessionCommand::client_close(req.session_id))
        .await?;

    Ok(Json(ApiResponse::success(UnmountResponseDto {
        session_id: result.session_id,
    })))
}

// ============================================================================
// Queries
// ============================================================================

pub async fn get_session_state(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionIdRequest>,
) -> Result<Json<ApiResponse<SessionStateDto>>, ApiError> {
    let result = state
        .get_session_state_handler
        .handle(GetSessionStateQuery {
            session_id: req.session_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(SessionStateDto {
        session_id: result.session_id,
        created_at: Some(result.created_at),
        notice: None,
        state: result.snapshot,
    })))
}

pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SessionListDto>>, ApiError> {
    let sessions: Vec<SessionSummaryDto> = state
        .list_sessions_handler
        .handle(ListSessionsQuery)
        .await?
        .into_iter()
        .map(|s| SessionSummaryDto {
            session_id: s.session_id,
            transport_state: s.transport_state,
            book_title: s.book_title,
            last_activity: s.last_activity,
        })
        .collect();

    Ok(Json(ApiResponse::success(SessionListDto {
        total: sessions.len(),
        sessions,
    })))
}

// ============================================================================
// Transport
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TransportRequest {
    pub session_id: String,
    #[serde(default)]
    pub origin: Origin,
}

pub async fn play(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TransportRequest>,
) -> Result<Json<ApiResponse<SessionStateDto>>, ApiError> {
    dispatch(&state, req.session_id, Intent::Play { origin: req.origin }, None).await
}

pub async fn pause(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TransportRequest>,
) -> Result<Json<ApiResponse<SessionStateDto>>, ApiError> {
    dispatch(&state, req.session_id, Intent::Pause { origin: req.origin }, None).await
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub session_id: String,
    /// 目标位置（秒）
    pub position: f64,
    #[serde(default)]
    pub origin: Origin,
}

pub async fn seek(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SeekRequest>,
) -> Result<Json<ApiResponse<SessionStateDto>>, ApiError> {
    let intent = Intent::Seek {
        position: req.position,
        origin: req.origin,
    };
    dispatch(&state, req.session_id, intent, None).await
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipDirection {
    Forward,
    Backward,
}

#[derive(Debug, Deserialize)]
pub struct SkipRequest {
    pub session_id: String,
    pub direction: SkipDirection,
    /// 为空时使用配置的默认步长
    #[serde(default)]
    pub seconds: Option<f64>,
    #[serde(default)]
    pub origin: Origin,
}

pub async fn skip(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SkipRequest>,
) -> Result<Json<ApiResponse<SessionStateDto>>, ApiError> {
    let intent = match req.direction {
        SkipDirection::Forward => Intent::SkipForward {
            seconds: req.seconds,
            origin: req.origin,
        },
        SkipDirection::Backward => Intent::SkipBackward {
            seconds: req.seconds,
            origin: req.origin,
        },
    };
    dispatch(&state, req.session_id, intent, None).await
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    pub session_id: String,
    pub volume: f32,
}

pub async fn set_volume(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VolumeRequest>,
) -> Result<Json<ApiResponse<SessionStateDto>>, ApiError> {
    let intent = Intent::SetVolume { volume: req.volume };
    dispatch(&state, req.session_id, intent, None).await
}

pub async fn gesture(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionIdRequest>,
) -> Result<Json<ApiResponse<SessionStateDto>>, ApiError> {
    dispatch(&state, req.session_id, Intent::Gesture, None).await
}

// ============================================================================
// Switching
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SetVersionRequest {
    pub session_id: String,
    pub version: String,
    #[serde(default)]
    pub autoplay: bool,
    #[serde(default)]
    pub origin: Origin,
}

pub async fn set_version(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetVersionRequest>,
) -> Result<Json<ApiResponse<SessionStateDto>>, ApiError> {
    let (version, notice) = parse_version(&req.version, state.default_version);
    let intent = Intent::SetVersion {
        version,
        autoplay: req.autoplay,
        origin: req.origin,
    };
    dispatch(&state, req.session_id, intent, notice).await
}

#[derive(Debug, Deserialize)]
pub struct SetBookRequest {
    pub session_id: String,
    /// 为空表示清空当前书籍
    #[serde(default)]
    pub book: Option<BookDto>,
    #[serde(default)]
    pub autoplay: bool,
    #[serde(default)]
    pub origin: Origin,
}

pub async fn set_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetBookRequest>,
) -> Result<Json<ApiResponse<SessionStateDto>>, ApiError> {
    let book = req.book.map(BookDto::into_book).transpose()?;
    let intent = Intent::SetBook {
        book,
        autoplay: req.autoplay,
        origin: req.origin,
    };
    dispatch(&state, req.session_id, intent, None).await
}
