//! Repeated independent generation and answer extraction.

use crate::types::Answer;
use docqa_core::config::GenerationConfig;
use docqa_core::{AppError, AppResult};
use docqa_llm::{LlmClient, LlmRequest};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Duration;

/// Per-call generation parameters.
#[derive(Debug, Clone)]
pub struct SamplerOptions {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout: Option<Duration>,
    /// Requests in flight at once; 1 issues them strictly one after another.
    pub concurrency: usize,
    pub answer_marker: String,
    /// Search the marker in prompt + completion instead of the completion alone.
    pub echo_prompt: bool,
}

impl SamplerOptions {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout_secs.map(Duration::from_secs),
            concurrency: config.concurrency,
            answer_marker: config.answer_marker.clone(),
            echo_prompt: config.echo_prompt,
        }
    }
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self::from_config(&GenerationConfig::default())
    }
}

/// Draws `sample_count` independent generations for one prompt.
pub struct GenerationSampler {
    client: Arc<dyn LlmClient>,
    options: SamplerOptions,
}

impl GenerationSampler {
    pub fn new(client: Arc<dyn LlmClient>, options: SamplerOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> &SamplerOptions {
        &self.options
    }

    /// Request `sample_count` generations and return the non-empty answers
    /// in sample order.
    ///
    /// Samples without an answer are dropped, not retried, so the result may
    /// be shorter than `sample_count`. Duplicates are kept. Any failed call
    /// fails the whole sampling.
    pub async fn sample(&self, prompt: &str, sample_count: usize) -> AppResult<Vec<Answer>> {
        if sample_count == 0 {
            return Ok(Vec::new());
        }

        let request = self.build_request(prompt);
        let concurrency = self.options.concurrency.max(1);

        let transcripts: Vec<String> = stream::iter(0..sample_count)
            .map(|index| self.generate_once(&request, index))
            .buffered(concurrency)
            .try_collect()
            .await?;

        let answers: Vec<Answer> = transcripts
            .iter()
            .enumerate()
            .filter_map(|(index, transcript)| {
                let answer = extract_answer(transcript, &self.options.answer_marker);
                match &answer {
                    Some(answer) => tracing::info!("Sample {}: {}", index + 1, answer),
                    None => tracing::debug!("Sample {} produced no answer, discarded", index + 1),
                }
                answer
            })
            .collect();

        tracing::debug!(
            "Kept {} of {} samples from {}",
            answers.len(),
            sample_count,
            self.client.provider_name()
        );

        Ok(answers)
    }

    fn build_request(&self, prompt: &str) -> LlmRequest {
        let mut request = LlmRequest::new(prompt, self.options.model.clone());
        if let Some(max_tokens) = self.options.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = self.options.temperature {
            request = request.with_temperature(temperature);
        }
        request
    }

    /// One generation call, returning the text the marker is searched in.
    async fn generate_once(&self, request: &LlmRequest, index: usize) -> AppResult<String> {
        tracing::debug!("Requesting sample {}", index + 1);

        let call = self.client.complete(request);
        let response = match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                AppError::Llm(format!(
                    "Sample {} timed out after {}s",
                    index + 1,
                    limit.as_secs_f32()
                ))
            })??,
            None => call.await?,
        };

        if self.options.echo_prompt {
            Ok(format!("{}{}", request.prompt, response.content))
        } else {
            Ok(response.content)
        }
    }
}

/// Take the text after the last `marker` in `transcript`.
///
/// Returns `None` when the marker is missing or nothing but whitespace
/// follows it.
pub fn extract_answer(transcript: &str, marker: &str) -> Option<Answer> {
    if marker.is_empty() {
        return Answer::new(transcript);
    }
    let position = transcript.rfind(marker)?;
    Answer::new(&transcript[position + marker.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docqa_llm::LlmResponse;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const MARKER: &str = "### Answer:";

    /// Returns scripted completions in call order.
    struct ScriptedClient {
        replies: Mutex<Vec<String>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl ScriptedClient {
        fn new(replies: &[&str]) -> Self {
            let mut replies: Vec<String> = replies.iter().map(|r| r.to_string()).collect();
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| AppError::Llm("script exhausted".to_string()))?;
            Ok(LlmResponse::text(reply, request.model.clone()))
        }
    }

    fn options(echo_prompt: bool) -> SamplerOptions {
        SamplerOptions {
            model: "test-model".to_string(),
            temperature: None,
            max_tokens: None,
            timeout: None,
            concurrency: 1,
            answer_marker: MARKER.to_string(),
            echo_prompt,
        }
    }

    fn texts(answers: &[Answer]) -> Vec<&str> {
        answers.iter().map(Answer::as_str).collect()
    }

    #[test]
    fn test_extract_after_last_marker() {
        let transcript = "### Answer: draft\n### Answer:  100 degrees \n";
        assert_eq!(extract_answer(transcript, MARKER).unwrap().as_str(), "100 degrees");
    }

    #[test]
    fn test_extract_missing_or_empty() {
        assert!(extract_answer("no marker here", MARKER).is_none());
        assert!(extract_answer("text ### Answer:   \n", MARKER).is_none());
    }

    #[tokio::test]
    async fn test_sample_keeps_order_and_duplicates() {
        let client = Arc::new(ScriptedClient::new(&[
            "### Answer: one",
            "### Answer: two",
            "### Answer: one",
        ]));
        let sampler = GenerationSampler::new(client.clone(), options(false));

        let answers = sampler.sample("prompt", 3).await.unwrap();
        assert_eq!(texts(&answers), vec!["one", "two", "one"]);
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_sample_discards_empty_without_retry() {
        let client = Arc::new(ScriptedClient::new(&[
            "rambling without marker",
            "### Answer: 100",
            "### Answer:",
        ]));
        let sampler = GenerationSampler::new(client.clone(), options(false));

        let answers = sampler.sample("prompt", 3).await.unwrap();
        assert_eq!(texts(&answers), vec!["100"]);
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_echo_prompt_uses_prompt_marker() {
        let client = Arc::new(ScriptedClient::new(&[" 100 degrees", "  "]));
        let sampler = GenerationSampler::new(client, options(true));

        let answers = sampler.sample("Context...\n### Answer:", 2).await.unwrap();
        assert_eq!(texts(&answers), vec!["100 degrees"]);
    }

    #[tokio::test]
    async fn test_zero_samples_never_calls_model() {
        let client = Arc::new(ScriptedClient::new(&[]));
        let sampler = GenerationSampler::new(client.clone(), options(false));

        assert!(sampler.sample("prompt", 0).await.unwrap().is_empty());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_call_failure_propagates() {
        let client = Arc::new(ScriptedClient::new(&["### Answer: only one"]));
        let sampler = GenerationSampler::new(client, options(false));

        let result = sampler.sample("prompt", 2).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }

    #[tokio::test]
    async fn test_concurrent_sampling_collects_every_sample() {
        let client = Arc::new(ScriptedClient {
            delay: Some(Duration::from_millis(5)),
            ..ScriptedClient::new(&["### Answer: x"; 4])
        });
        let sampler = GenerationSampler::new(
            client.clone(),
            SamplerOptions {
                concurrency: 4,
                ..options(false)
            },
        );

        let answers = sampler.sample("prompt", 4).await.unwrap();
        assert_eq!(texts(&answers), vec!["x"; 4]);
        assert_eq!(client.calls.load(Ordering::SeqCst), 4);
    }

    /// Answers by call number; earlier calls take longer to finish.
    struct StaggeredClient {
        answers: Vec<&'static str>,
        calls: AtomicUsize,
        finished: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl LlmClient for StaggeredClient {
        fn provider_name(&self) -> &str {
            "staggered"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            let wait = (self.answers.len() - index) as u64 * 20;
            tokio::time::sleep(Duration::from_millis(wait)).await;
            self.finished.lock().unwrap().push(index);
            Ok(LlmResponse::text(
                format!("### Answer: {}", self.answers[index]),
                request.model.clone(),
            ))
        }
    }

    #[tokio::test]
    async fn test_concurrent_answers_follow_request_order() {
        let client = Arc::new(StaggeredClient {
            answers: vec!["a", "b", "c", "d"],
            calls: AtomicUsize::new(0),
            finished: Mutex::new(Vec::new()),
        });
        let sampler = GenerationSampler::new(
            client.clone(),
            SamplerOptions {
                concurrency: 4,
                ..options(false)
            },
        );

        let answers = sampler.sample("prompt", 4).await.unwrap();
        assert_eq!(texts(&answers), vec!["a", "b", "c", "d"]);
        assert_eq!(*client.finished.lock().unwrap(), vec![3, 2, 1, 0]);
    }

    #[tokio::test]
    async fn test_default_options_drop_marker_free_reply() {
        let client = Arc::new(ScriptedClient::new(&["### Answer: 100", "I am not sure."]));
        let sampler = GenerationSampler::new(client, SamplerOptions::default());

        let answers = sampler.sample("Question...\n### Answer:", 2).await.unwrap();
        assert_eq!(texts(&answers), vec!["100"]);
    }

    #[tokio::test]
    async fn test_timeout_is_llm_error() {
        let client = Arc::new(ScriptedClient {
            delay: Some(Duration::from_millis(200)),
            ..ScriptedClient::new(&["### Answer: late"])
        });
        let sampler = GenerationSampler::new(
            client,
            SamplerOptions {
                timeout: Some(Duration::from_millis(10)),
                ..options(false)
            },
        );

        let err = sampler.sample("prompt", 1).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_options_from_config() {
        let config = GenerationConfig {
            timeout_secs: Some(30),
            temperature: Some(0.7),
            ..GenerationConfig::default()
        };
        let options = SamplerOptions::from_config(&config);
        assert_eq!(options.timeout, Some(Duration::from_secs(30)));
        assert_eq!(options.temperature, Some(0.7));
        assert_eq!(options.answer_marker, "### Answer:");
        assert!(!options.echo_prompt);
    }
}
