use std::time::Instant;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use futures_util::StreamExt;
use plexus_common::{now_ms, AliasId, RequestId};
use plexus_protocol::openai::types::{Choice, Usage};
use plexus_protocol::openai::{ChatCompletionRequestBody, ChatCompletionResponse};
use plexus_transform::{build_provider_request, converter::from_openai, parse::parse_provider_response};
use plexus_usage::{CostCalculator, TraceEntry, TraceStatus};
use tokio_stream::wrappers::ReceiverStream;

use crate::error::ApiError;
use crate::state::AppState;
use crate::stream_pipeline::spawn_openai_sse;
use crate::validate::validate_openai;

pub async fn chat_completions(
    State(state): State<AppState>,
    Json(body): Json<ChatCompletionRequestBody>,
) -> Result<Response, ApiError> {
    validate_openai(&body)?;

    let request_id = RequestId::from(uuid::Uuid::new_v4().to_string().as_str());
    let started_at_unix_ms = now_ms();
    let start = Instant::now();

    let unified = from_openai(&body);
    let alias_id = AliasId::from(body.model.as_str());
    let snapshot = state.config.current();
    let pricing = snapshot.alias(&alias_id).map(|a| a.pricing.clone()).unwrap_or_default();

    let seed: u64 = rand::random();
    let route = state
        .router
        .resolve(&snapshot, &state.cooldowns, &state.quotas, &alias_id, seed)
        .map_err(ApiError::from_router_error)?;
    drop(snapshot);

    let provider_request = build_provider_request(&unified, route.provider.kind);

    if unified.stream {
        let upstream = state
            .invoker
            .call_stream(&route, &provider_request)
            .await
            .map_err(ApiError::from_provider_error)?;
        let rendered = spawn_openai_sse(upstream, started_at_unix_ms);

        let state = state.clone();
        let provider_id = route.provider_id.clone();
        tokio::spawn(async move {
            let final_state = rendered.done.await.ok();
            let status = final_state.as_ref().map(|f| f.status).unwrap_or(TraceStatus::ClientCancelled);
            let usage = final_state.as_ref().and_then(|f| f.usage);
            let provider_ttft_ms = final_state.as_ref().and_then(|f| f.provider_ttft_ms);
            if status != TraceStatus::UpstreamError {
                state.cooldowns.record_success(&provider_id);
            }
            let duration_ms = start.elapsed().as_millis() as u64;
            record_trace(
                &state,
                request_id,
                alias_id,
                provider_id,
                body.model.clone(),
                started_at_unix_ms,
                duration_ms,
                usage,
                provider_ttft_ms,
                &pricing,
                status,
                None,
            );
        });

        let body_stream = ReceiverStream::new(rendered.rx).map(Ok::<Bytes, std::io::Error>);
        let mut response = axum::body::Body::from_stream(body_stream).into_response();
        response
            .headers_mut()
            .insert(axum::http::header::CONTENT_TYPE, "text/event-stream".parse().unwrap());
        return Ok(response);
    }

    match state.invoker.call_unary(&route, &provider_request).await {
        Ok(value) => {
            state.cooldowns.record_success(&route.provider_id);
            let parsed = parse_provider_response(&value, route.provider.kind);
            let duration_ms = start.elapsed().as_millis() as u64;

            record_trace(
                &state,
                request_id.clone(),
                alias_id,
                route.provider_id.clone(),
                body.model.clone(),
                started_at_unix_ms,
                duration_ms,
                Some(parsed.usage),
                None,
                &pricing,
                TraceStatus::Ok,
                None,
            );

            let response = ChatCompletionResponse {
                id: request_id.to_string(),
                object: "chat.completion".to_owned(),
                created: started_at_unix_ms / 1000,
                model: body.model,
                choices: vec![Choice {
                    index: 0,
                    message: plexus_protocol::openai::types::ChatMessage {
                        role: plexus_protocol::openai::types::ChatRole::Assistant,
                        content: Some(serde_json::Value::String(parsed.content)),
                        name: None,
                        tool_call_id: None,
                        tool_calls: Vec::new(),
                    },
                    finish_reason: Some(finish_reason_str(parsed.finish_reason).to_owned()),
                }],
                usage: Usage {
                    prompt_tokens: parsed.usage.input_tokens,
                    completion_tokens: parsed.usage.output_tokens,
                    total_tokens: parsed.usage.total_tokens,
                    completion_tokens_details: None,
                    prompt_tokens_details: None,
                },
            };
            Ok(Json(response).into_response())
        }
        Err(err) => {
            if let Some((reason, status, retry_after)) = err.classify() {
                state.cooldowns.record_failure(&route.provider_id, reason, status, retry_after, Some(err.to_string()));
            }
            let duration_ms = start.elapsed().as_millis() as u64;
            record_trace(
                &state,
                request_id,
                alias_id,
                route.provider_id.clone(),
                body.model,
                started_at_unix_ms,
                duration_ms,
                None,
                None,
                &pricing,
                TraceStatus::UpstreamError,
                Some(err.to_string()),
            );
            Err(ApiError::from_provider_error(err))
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn record_trace(
    state: &AppState,
    request_id: RequestId,
    alias_id: AliasId,
    provider_id: plexus_common::ProviderId,
    model: String,
    started_at_unix_ms: i64,
    duration_ms: u64,
    usage: Option<plexus_protocol::UnifiedUsage>,
    provider_ttft_ms: Option<u64>,
    pricing: &plexus_config::PricingOverride,
    status: TraceStatus,
    error_message: Option<String>,
) {
    let usage = usage.unwrap_or_default();
    let cached = usage.cached_tokens.unwrap_or(0).max(0) as u64;
    let reasoning = usage.reasoning_tokens.unwrap_or(0).max(0) as u64;
    let input = usage.input_tokens.max(0) as u64;
    let output = usage.output_tokens.max(0) as u64;
    let total = usage.total_tokens.max(0) as u64;

    let cost_usd = CostCalculator::estimate(pricing, input, output, cached, reasoning);

    let entry = TraceEntry {
        request_id,
        alias_id,
        provider_id,
        model,
        started_at_unix_ms,
        duration_ms,
        provider_ttft_ms,
        input_tokens: input,
        output_tokens: output,
        reasoning_tokens: reasoning,
        total_tokens: total,
        tokens_per_second: TraceEntry::tokens_per_second(duration_ms, output),
        cost_usd,
        status,
        error_message,
    };
    state.metrics.observe(&entry);
    state.usage_recorder.record(entry);
}

fn finish_reason_str(reason: plexus_protocol::FinishReason) -> &'static str {
    use plexus_protocol::FinishReason::*;
    match reason {
        Stop => "stop",
        Length => "length",
        ToolCalls => "tool_calls",
        ContentFilter => "content_filter",
        Error => "stop",
    }
}
