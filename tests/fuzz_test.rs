use endyos::assistant::SubmitOutcome;
use endyos::commands::{BrowserMatcher, DataApiMatcher, Matcher, MediaMatcher, Prompt};
use endyos::core::text_normalizer::normalize;
use tokio::time::Instant;

mod common;
use common::TestContext;

const GARBAGE: &[&str] = &[
    "asdfghjkl",
    "!!! @@@ ###",
    "1234567890",
    "**__~~``##",
    "[](<>)![]()",
    "extremely long string that doesn't mean anything to the system at all but might cause buffer issues if we were in C but we are in Rust so it's just a long string",
    "ñ¿¡😀🎵",
    "",
    " ",
];

#[test]
fn test_garbage_matches_no_command() {
    let matchers: Vec<Box<dyn Matcher>> = vec![
        Box::new(MediaMatcher),
        Box::new(BrowserMatcher),
        Box::new(DataApiMatcher::default()),
    ];

    for text in GARBAGE {
        let prompt = Prompt::new(text);
        for matcher in &matchers {
            assert!(
                matcher.match_prompt(&prompt).is_none(),
                "{} matched garbage '{}'",
                matcher.name(),
                text
            );
        }
    }
}

#[test]
fn test_normalizer_is_idempotent_on_garbage() {
    for text in GARBAGE {
        let once = normalize(text);
        assert_eq!(normalize(&once), once, "not idempotent for '{}'", text);
        assert_eq!(once.trim(), once);
    }
}

#[tokio::test]
async fn test_prompt_flood_stays_stable() {
    let ctx = TestContext::new();
    let prompts = ["busca en youtube lofi", "clima en Tokio", "abre github", "hola"];

    let start = Instant::now();
    for i in 0..100 {
        let outcome = ctx.assistant.submit(prompts[i % prompts.len()]).await;
        assert!(!matches!(outcome, SubmitOutcome::Busy));
    }
    println!("Processed 100 prompts in {:?}", start.elapsed());

    // One generator call and one weather call; everything else from cache
    assert_eq!(ctx.generator.calls(), 1);
    assert_eq!(
        ctx.weather.calls.load(std::sync::atomic::Ordering::SeqCst),
        1
    );
    assert!(matches!(
        ctx.assistant.submit("hola").await,
        SubmitOutcome::Generated(_)
    ));
}
