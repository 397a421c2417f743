
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use crate::{
    facade::{SummarizeError, Summarizer},
    registry::StrategyRegistry,
    tokenizer::{DecodeOptions, EncodePolicy, PaddingPolicy, TokenCodec},
    types::{CancelToken, GenerationParams, SummaryPath},
};
use stubs::{echo_entry, failing_entry, InterningCodec};

fn echo_summarizer(model_id: &str, counter: Arc<AtomicUsize>) -> Summarizer {
    let mut registry = StrategyRegistry::new();
    registry.register(model_id, echo_entry(model_id, counter));
    Summarizer::new(registry)
}

#[test]
fn test_direct_path_returns_tagged_nonempty_summary() {
    let counter = Arc::new(AtomicUsize::new(0));
    let summarizer = echo_summarizer("echo", counter);
    let params = GenerationParams::new(3, 1, 1.0, 1);

    let summary = summarizer
        .summarize("A B. C D. E F.", "echo", SummaryPath::Direct, &params)
        .unwrap();

    assert!(!summary.text.is_empty());
    assert_eq!(summary.model_id, "echo");
    assert_eq!(summary.path, SummaryPath::Direct);
    // The echo model truncates to max_length tokens.
    assert!(summary.text.split_whitespace().count() <= 3);
    assert_eq!(summary.text, "A B. C");
}

#[test]
fn test_pipeline_path_returns_tagged_summary() {
    let counter = Arc::new(AtomicUsize::new(0));
    let summarizer = echo_summarizer("echo", counter);
    let params = GenerationParams::new(3, 1, 1.0, 1);

    let summary = summarizer
        .summarize("A B. C D. E F.", "echo", SummaryPath::Pipeline, &params)
        .unwrap();

    assert_eq!(summary.path, SummaryPath::Pipeline);
    assert!(summary.text.split_whitespace().count() <= 3);
}

#[test]
fn test_both_paths_agree_for_the_echo_strategy() {
    let counter = Arc::new(AtomicUsize::new(0));
    let summarizer = echo_summarizer("echo", counter);
    let params = GenerationParams::new(4, 1, 1.0, 1);

    let direct = summarizer
        .summarize("one two three four five", "echo", SummaryPath::Direct, &params)
        .unwrap();
    let pipeline = summarizer
        .summarize("one two three four five", "echo", SummaryPath::Pipeline, &params)
        .unwrap();

    assert_eq!(direct.text, pipeline.text);
    assert_ne!(direct.path, pipeline.path);
}

#[test]
fn test_unknown_model_is_reported() {
    let counter = Arc::new(AtomicUsize::new(0));
    let summarizer = echo_summarizer("echo", counter);
    let params = GenerationParams::new(3, 1, 1.0, 1);

    let err = summarizer
        .summarize("some text", "missing", SummaryPath::Direct, &params)
        .unwrap_err();

    match err {
        SummarizeError::UnknownModel(inner) => assert_eq!(inner.0, "missing"),
        other => panic!("expected UnknownModel, got {other:?}"),
    }
}

#[test]
fn test_invalid_params_fail_before_loading() {
    let counter = Arc::new(AtomicUsize::new(0));
    let summarizer = echo_summarizer("echo", counter.clone());
    let params = GenerationParams::new(100, 200, 1.0, 1);

    let err = summarizer
        .summarize("some text", "echo", SummaryPath::Direct, &params)
        .unwrap_err();

    assert!(matches!(err, SummarizeError::InvalidParams(_)));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn test_repeated_calls_load_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let summarizer = echo_summarizer("echo", counter.clone());
    let params = GenerationParams::new(8, 1, 1.0, 1);

    for _ in 0..3 {
        summarizer
            .summarize("repeated input text", "echo", SummaryPath::Direct, &params)
            .unwrap();
    }

    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_empty_input_surfaces_as_encoding_failure() {
    let counter = Arc::new(AtomicUsize::new(0));
    let summarizer = echo_summarizer("echo", counter);
    let params = GenerationParams::new(3, 1, 1.0, 1);

    let err = summarizer
        .summarize("   ", "echo", SummaryPath::Direct, &params)
        .unwrap_err();

    match err {
        SummarizeError::Invocation { model_id, path, .. } => {
            assert_eq!(model_id, "echo");
            assert_eq!(path, SummaryPath::Direct);
        }
        other => panic!("expected Invocation, got {other:?}"),
    }
}

#[test]
fn test_generation_failure_names_model_and_path() {
    let mut registry = StrategyRegistry::new();
    registry.register("failing", failing_entry());
    let summarizer = Summarizer::new(registry);
    let params = GenerationParams::new(3, 1, 1.0, 1);

    let err = summarizer
        .summarize("some text", "failing", SummaryPath::Pipeline, &params)
        .unwrap_err();

    let rendered = err.to_string();
    assert!(rendered.contains("pipeline"));
    assert!(rendered.contains("failing"));
}

#[test]
fn test_cancelled_token_aborts_generation() {
    let counter = Arc::new(AtomicUsize::new(0));
    let summarizer = echo_summarizer("echo", counter);
    let params = GenerationParams::new(3, 1, 1.0, 1);
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = summarizer
        .summarize_with_cancel("some text", "echo", SummaryPath::Direct, &params, &cancel)
        .unwrap_err();

    assert!(matches!(err, SummarizeError::Invocation { .. }));
}

#[test]
fn test_errors_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SummarizeError>();
    assert_send_sync::<crate::models::ModelError>();
    assert_send_sync::<crate::tokenizer::CodecError>();
}

#[test]
fn test_decode_is_deterministic() {
    let codec = InterningCodec::new();
    let encoded = codec
        .encode("alpha beta gamma alpha", &EncodePolicy::default())
        .unwrap();

    let options = DecodeOptions::skipping_special_tokens();
    let first = codec.decode(&encoded.ids, &options).unwrap();
    let second = codec.decode(&encoded.ids, &options).unwrap();

    assert_eq!(first, second);
    assert_eq!(first, "alpha beta gamma alpha");
}

#[test]
fn test_missing_pad_token_is_surfaced() {
    let codec = InterningCodec::without_pad_token();
    let policy = EncodePolicy {
        truncation: true,
        padding: PaddingPolicy::Longest,
    };

    let err = codec.encode("some text", &policy).unwrap_err();
    assert!(matches!(
        err,
        crate::tokenizer::CodecError::MissingPadToken
    ));

    let relaxed = EncodePolicy {
        truncation: true,
        padding: PaddingPolicy::None,
    };
    assert!(codec.encode("some text", &relaxed).is_ok());
}

#[test]
fn test_shared_cache_across_facades() {
    let counter = Arc::new(AtomicUsize::new(0));
    let cache = Arc::new(crate::cache::ModelCache::new());
    let params = GenerationParams::new(4, 1, 1.0, 1);

    let mut first_registry = StrategyRegistry::new();
    first_registry.register("echo", echo_entry("echo", counter.clone()));
    let first = Summarizer::with_cache(first_registry, cache.clone());

    let mut second_registry = StrategyRegistry::new();
    second_registry.register("echo", echo_entry("echo", counter.clone()));
    let second = Summarizer::with_cache(second_registry, cache);

    first
        .summarize("shared cache text", "echo", SummaryPath::Direct, &params)
        .unwrap();
    second
        .summarize("shared cache text", "echo", SummaryPath::Direct, &params)
        .unwrap();

    assert_eq!(counter.load(Ordering::SeqCst), 1);
}
