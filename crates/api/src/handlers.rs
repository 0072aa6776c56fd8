//! Request handlers

use axum::{extract::State, http::StatusCode, Json};
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::protocol::{
    BookingEnvelope, BookingView, ConversationView, CreateBookingRequest, MessagePageView,
    MessageView, MessagesQuery, OpenConversationRequest, PostMessageRequest, ReissueView,
    RespondQuery, StatusView,
};
use crate::state::ApiState;

pub async fn health() -> &'static str {
    "ok"
}

/// `POST /book`
///
/// The response token goes to the provider only; the requester just gets the
/// pending booking.
pub async fn create_booking(
    State(state): State<ApiState>,
    JsonBody(req): JsonBody<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingEnvelope>)> {
    let outcome = state
        .run_blocking(move |m| m.request_booking(req.user_id, req.provider_id, &req.description))
        .await?;

    let (requested, warnings) = outcome.into_parts();
    Ok((
        StatusCode::CREATED,
        Json(BookingEnvelope {
            booking: requested.booking.into(),
            warnings,
        }),
    ))
}

/// `GET /respond?token=&decision=[&price=]`
pub async fn respond(
    State(state): State<ApiState>,
    QueryParams(query): QueryParams<RespondQuery>,
) -> Result<Json<BookingEnvelope>> {
    let decision = query.decision()?;
    let token = query.token()?.to_string();
    debug!(decision = decision.as_str(), "Booking response received");

    let outcome = state
        .run_blocking(move |m| m.respond(&token, decision))
        .await?;

    let (booking, warnings) = outcome.into_parts();
    Ok(Json(BookingEnvelope {
        booking: booking.into(),
        warnings,
    }))
}

/// `GET /status/:booking_id`
pub async fn booking_status(
    State(state): State<ApiState>,
    PathParam(booking_id): PathParam<Uuid>,
) -> Result<Json<StatusView>> {
    let status = state
        .run_blocking(move |m| m.lifecycle().get_status(booking_id))
        .await?;
    Ok(Json(StatusView { booking_id, status }))
}

/// `GET /user/:user_id`
pub async fn user_bookings(
    State(state): State<ApiState>,
    PathParam(user_id): PathParam<Uuid>,
) -> Result<Json<Vec<BookingView>>> {
    let bookings = state
        .run_blocking(move |m| m.lifecycle().list_for_user(user_id))
        .await?;
    Ok(Json(bookings.into_iter().map(BookingView::from).collect()))
}

/// `POST /bookings/:booking_id/reissue`
pub async fn reissue_link(
    State(state): State<ApiState>,
    PathParam(booking_id): PathParam<Uuid>,
) -> Result<Json<ReissueView>> {
    let outcome = state
        .run_blocking(move |m| m.reissue_link(booking_id))
        .await?;
    Ok(Json(ReissueView::new(&outcome.value, outcome.warnings)))
}

/// `POST /conversations`
pub async fn open_conversation(
    State(state): State<ApiState>,
    JsonBody(req): JsonBody<OpenConversationRequest>,
) -> Result<Json<ConversationView>> {
    let conversation = state
        .run_blocking(move |m| {
            m.conversations()
                .ensure_conversation(req.participant_a, req.participant_b, req.booking_id)
        })
        .await?;
    Ok(Json(conversation.into()))
}

/// `GET /conversations/user/:user_id`
pub async fn user_conversations(
    State(state): State<ApiState>,
    PathParam(user_id): PathParam<Uuid>,
) -> Result<Json<Vec<ConversationView>>> {
    let conversations = state
        .run_blocking(move |m| m.conversations().list_conversations_for_user(user_id))
        .await?;
    Ok(Json(
        conversations
            .into_iter()
            .map(ConversationView::from)
            .collect(),
    ))
}

/// `POST /conversations/:conversation_id/messages`
pub async fn post_message(
    State(state): State<ApiState>,
    PathParam(conversation_id): PathParam<Uuid>,
    JsonBody(req): JsonBody<PostMessageRequest>,
) -> Result<(StatusCode, Json<MessageView>)> {
    let message = state
        .run_blocking(move |m| {
            m.conversations()
                .post_message(conversation_id, req.sender_id, &req.content)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(message.into())))
}

/// `GET /conversations/:conversation_id/messages?cursor=&limit=`
pub async fn list_messages(
    State(state): State<ApiState>,
    PathParam(conversation_id): PathParam<Uuid>,
    QueryParams(query): QueryParams<MessagesQuery>,
) -> Result<Json<MessagePageView>> {
    let cursor = query.cursor()?;
    let limit = state.config.page_size(query.limit);

    let page = state
        .run_blocking(move |m| m.conversations().list_messages(conversation_id, cursor, limit))
        .await?;
    Ok(Json(page.into()))
}
