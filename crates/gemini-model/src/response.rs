use std::pin::Pin;
use std::task::{Context, Poll, ready};

use little_chat_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
};
use pin_project_lite::pin_project;

use crate::Error;
use crate::io::Sse;
use crate::proto::GenerateContentResponse;

struct PartialState {
    sse: Sse,
    // A chunk may carry both text and the finish reason. The text is
    // delivered first, and the reason is kept here for the next poll.
    pending_finish_reason: Option<ModelFinishReason>,
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    pub struct GeminiResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl GeminiResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            pending_finish_reason: None,
        };
        Self {
            next_event_fut: Some(Box::pin(next_event(partial_state))),
        }
    }
}

impl ModelResponse for GeminiResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, _)) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        // The stream may still have more data to pull, create a new future
        // for the next event.
        *this.next_event_fut = Some(Box::pin(next_event(partial_state)));

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(mut partial_state: PartialState) -> NextEvent {
    if let Some(reason) = partial_state.pending_finish_reason.take() {
        return Ok((Some(ModelResponseEvent::Completed(reason)), partial_state));
    }

    loop {
        let data = match partial_state.sse.next_event().await {
            Ok(Some(data)) => data,
            Ok(None) => return Ok((None, partial_state)),
            Err(err) => {
                return Err(Error::new(
                    format!("broken event stream: {err:?}"),
                    ErrorKind::Other,
                ));
            }
        };
        trace!("got sse event: {data}");

        let chunk = serde_json::from_str::<GenerateContentResponse>(&data)
            .map_err(|err| {
                Error::new(format!("malformed response: {err}"), ErrorKind::Other)
            })?;
        if let Some(reason) =
            chunk.prompt_feedback.and_then(|feedback| feedback.block_reason)
        {
            return Err(Error::new(
                format!("prompt was blocked: {reason}"),
                ErrorKind::Moderated,
            ));
        }

        let Some(candidate) = chunk.candidates.first() else {
            continue;
        };
        if let Some(reason) = candidate.finish_reason.as_deref() {
            partial_state.pending_finish_reason = Some(finish_reason(reason)?);
        }

        let text = candidate.text();
        if !text.is_empty() {
            return Ok((
                Some(ModelResponseEvent::TextDelta(text)),
                partial_state,
            ));
        }
        if let Some(reason) = partial_state.pending_finish_reason.take() {
            return Ok((
                Some(ModelResponseEvent::Completed(reason)),
                partial_state,
            ));
        }
    }
}

fn finish_reason(reason: &str) -> Result<ModelFinishReason, Error> {
    match reason {
        "STOP" => Ok(ModelFinishReason::Stop),
        "MAX_TOKENS" => Ok(ModelFinishReason::MaxTokens),
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT"
        | "SPII" => Err(Error::new(
            format!("response was blocked: {reason}"),
            ErrorKind::Moderated,
        )),
        _ => Ok(ModelFinishReason::Other),
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;
    use little_chat_model::ModelProviderError;

    use super::*;
    use crate::io::Chunks;

    async fn collect_events(
        chunks: Vec<Bytes>,
    ) -> (Vec<ModelResponseEvent>, Option<Error>) {
        let sse = Sse::new(Chunks::from_vec_deque(chunks.into()));
        let mut resp = pin!(GeminiResponse::from_sse(sse));
        let mut events = vec![];
        loop {
            match poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await {
                Ok(Some(event)) => events.push(event),
                Ok(None) => return (events, None),
                Err(err) => return (events, Some(err)),
            }
        }
    }

    #[tokio::test]
    async fn test_simple_events() {
        let (events, err) = collect_events(vec![Bytes::from_static(
            include_bytes!("../fixtures/stream_response.txt"),
        )])
        .await;
        assert!(err.is_none());
        assert_eq!(
            events,
            vec![
                ModelResponseEvent::TextDelta("Two dogs ".to_owned()),
                ModelResponseEvent::TextDelta("have eight ".to_owned()),
                ModelResponseEvent::TextDelta("paws.".to_owned()),
                ModelResponseEvent::Completed(ModelFinishReason::Stop),
            ]
        );
    }

    #[tokio::test]
    async fn test_blocked_response() {
        let (events, err) = collect_events(vec![
            Bytes::from_static(
                b"data: {\"candidates\": [{\"content\": {\"parts\": \
                  [{\"text\": \"Well\"}]}}]}\r\n\r\n",
            ),
            Bytes::from_static(
                b"data: {\"candidates\": [{\"finishReason\": \
                  \"SAFETY\"}]}\r\n\r\n",
            ),
        ])
        .await;
        assert_eq!(
            events,
            vec![ModelResponseEvent::TextDelta("Well".to_owned())]
        );
        let err = err.unwrap();
        assert_eq!(err.kind(), ErrorKind::Moderated);
        assert_eq!(err.message(), "response was blocked: SAFETY");
    }

    #[tokio::test]
    async fn test_blocked_prompt() {
        let (events, err) = collect_events(vec![Bytes::from_static(
            b"data: {\"promptFeedback\": {\"blockReason\": \"OTHER\"}}\n\n",
        )])
        .await;
        assert!(events.is_empty());
        assert_eq!(err.unwrap().kind(), ErrorKind::Moderated);
    }

    #[tokio::test]
    async fn test_malformed_chunk() {
        let (_, err) = collect_events(vec![Bytes::from_static(
            b"data: {\"candidates\": \n\n",
        )])
        .await;
        let err = err.unwrap();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert!(err.message().starts_with("malformed response"));
    }
}
