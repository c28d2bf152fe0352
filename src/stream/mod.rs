//! Reassembly of a chat-completion event stream into complete values.
//!
//! The pipeline has three stages:
//! - event framing: `eventsource-stream` turns body bytes into framed events
//! - delta extraction: `choices[0].delta.content` is pulled out of each event
//!   (the `[DONE]` sentinel ends the stream)
//! - value re-assembly: fragments go through [`JsonValueAssembler`], and every
//!   completed value is yielded as one UTF-8 encoded chunk

pub mod assembler;
pub mod delta;

use std::pin::Pin;

use bytes::Bytes;
use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use tracing::{debug, warn};

pub use assembler::JsonValueAssembler;
pub use delta::{extract_delta, DeltaEvent, DONE_SENTINEL};

use crate::error::SubtransError;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, SubtransError>> + Send>>;

/// Wrap an event-stream response body into a stream of complete values.
///
/// An absent body yields an empty stream. The stream closes cleanly on end of
/// data or on the `[DONE]` sentinel, after the assembler has flushed any
/// final value. Framing and parse failures end the stream with an error.
pub fn parse_streamed_response<S, B, E>(body: Option<S>) -> ByteStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let out = async_stream::stream! {
        let mut assembler = JsonValueAssembler::new();
        let mut fragments = 0usize;

        if let Some(body) = body {
            let mut events = Box::pin(body.eventsource());

            while let Some(item) = events.next().await {
                let event = match item {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("Event stream failed: {}", e);
                        yield Err(SubtransError::Stream(e.to_string()));
                        return;
                    }
                };

                let text = match extract_delta(&event.data) {
                    Ok(DeltaEvent::Content(text)) => text,
                    Ok(DeltaEvent::Skip) => continue,
                    Ok(DeltaEvent::Done) => {
                        debug!("Received {} after {} fragments", DONE_SENTINEL, fragments);
                        break;
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };
                fragments += 1;

                match assembler.write(&text) {
                    Ok(values) => {
                        for value in values {
                            yield Ok(encode_value(value));
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        } else {
            debug!("Response has no body; closing stream");
        }

        match assembler.end() {
            Ok(values) => {
                for value in values {
                    yield Ok(encode_value(value));
                }
            }
            Err(e) => yield Err(e),
        }
    };

    Box::pin(out)
}

/// [`parse_streamed_response`] over a `reqwest` response body
pub fn parse_streamed_response_from(response: reqwest::Response) -> ByteStream {
    parse_streamed_response(Some(response.bytes_stream()))
}

/// Strings are emitted as their raw contents, anything else as compact JSON
fn encode_value(value: Value) -> Bytes {
    match value {
        Value::String(text) => Bytes::from(text),
        other => Bytes::from(other.to_string()),
    }
}
