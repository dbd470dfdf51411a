use async_trait::async_trait;
use futures::stream;
use medscan_gateway::{
    Error, Result,
    llm::{ChatCompletionRequest, CompletionStreamer, FragmentStream},
};
use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

/// One scripted upstream item.
#[derive(Debug, Clone)]
pub enum Step {
    Text(&'static str),
    Fail(&'static str),
}

/// Mock LLM provider that replays a fixed fragment script per call.
#[derive(Debug, Default)]
pub struct ScriptedStreamer {
    pub script: Vec<Step>,
    pub call_error: Option<String>,
    pub requests: Arc<Mutex<Vec<ChatCompletionRequest>>>,
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedStreamer {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            script,
            ..Default::default()
        }
    }

    pub fn with_texts(texts: &[&'static str]) -> Self {
        Self::new(texts.iter().copied().map(Step::Text).collect())
    }

    pub fn failing_call(error: impl Into<String>) -> Self {
        Self {
            call_error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn get_requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionStreamer for ScriptedStreamer {
    async fn stream_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<FragmentStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        if let Some(ref error) = self.call_error {
            return Err(Error::llm(error.clone()));
        }

        Ok(scripted_stream(self.script.clone()))
    }
}

/// Mock LLM provider that hands out pre-built streams, one per call, in order.
#[derive(Default)]
pub struct QueuedStreamer {
    streams: Mutex<VecDeque<FragmentStream>>,
    calls: AtomicUsize,
}

impl QueuedStreamer {
    pub fn push(&self, stream: FragmentStream) {
        self.streams.lock().unwrap().push_back(stream);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionStreamer for QueuedStreamer {
    async fn stream_chat_completion(
        &self,
        _request: ChatCompletionRequest,
    ) -> Result<FragmentStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.streams
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::llm("no stream queued"))
    }
}

pub fn scripted_stream(script: Vec<Step>) -> FragmentStream {
    Box::pin(stream::iter(script.into_iter().map(|step| match step {
        Step::Text(text) => Ok(text.to_string()),
        Step::Fail(message) => Err(Error::upstream_stream(message)),
    })))
}

/// Wraps a stream and counts how many items were pulled from it.
pub fn counting_stream(inner: FragmentStream, pulled: Arc<AtomicUsize>) -> FragmentStream {
    use futures::StreamExt;

    Box::pin(inner.inspect(move |_| {
        pulled.fetch_add(1, Ordering::SeqCst);
    }))
}
