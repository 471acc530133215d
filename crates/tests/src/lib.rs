//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Operator properties verified step by step
//! - Demo scenarios against configuration-driven contexts
//! - `GET /hello` round-trip over a real socket

#[cfg(test)]
mod contract_tests {
    use contracts::{FlowError, SubscriptionState};

    #[test]
    fn test_terminal_states() {
        assert!(SubscriptionState::Completed.is_terminal());
        assert!(!SubscriptionState::Emitting.is_terminal());
        assert_eq!(FlowError::Cancelled.stage(), None);
    }
}

#[cfg(test)]
mod operator_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use contracts::{FlowError, Person, SubscriptionState};
    use stream_engine::{build, Sequence, Stage, WorkerPool};
    use verifier::scenarios::{self, ScenarioContext, FIRST_NAMES, LAST_NAMES, WORDS};
    use verifier::{StepVerifier, VerifyError};

    const DELAY: Duration = Duration::from_millis(10);

    fn names(items: &[&str]) -> Sequence<String> {
        Sequence::just(items.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_concat_with_delay_keeps_order() {
        let sequence = names(&FIRST_NAMES)
            .delay_elements(DELAY)
            .concat_with(names(&LAST_NAMES).delay_elements(DELAY))
            .log("concat");

        let elapsed = StepVerifier::create(sequence)
            .expect_subscription()
            .expect_next(strings(&["Blenders", "Old", "Johnnie", "Pride", "Monk", "Walker"]))
            .verify_complete()
            .await
            .unwrap();
        assert!(elapsed >= DELAY * 6);
    }

    #[tokio::test]
    async fn test_even_numbers_are_all_fifty() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);

        StepVerifier::create(scenarios::even_numbers())
            .then_consume_while(move |n| {
                counter.fetch_add(1, Ordering::SeqCst);
                n % 2 == 0
            })
            .verify_complete()
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 50);

        let evens = scenarios::even_numbers().collect_list().await.unwrap();
        assert_eq!(evens, (1..=50).map(|n| n * 2).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn test_zip_length_is_shorter_side() {
        let sequence = names(&FIRST_NAMES).zip_with(names(&LAST_NAMES[..2]), |a, b| format!("{a} {b}"));
        StepVerifier::create(sequence)
            .expect_next(strings(&["Blenders Pride", "Old Monk"]))
            .verify_complete()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_person_names_upper_cased_without_mutation() {
        let people = scenarios::people();
        let originals = people.clone();

        StepVerifier::create(Sequence::just(people).map(Person::with_upper_name))
            .expect_subscription()
            .assert_next(|p| assert_eq!(p.name, "JOHN"))
            .assert_next(|p| {
                assert_eq!(p.name, "JACK");
                assert_eq!(p.email, "jack@gmail.com");
            })
            .verify_complete()
            .await
            .unwrap();

        assert_eq!(originals[0].name, "John");
    }

    #[tokio::test]
    async fn test_filter_upper_repeat_on_worker_pool() {
        let sequence = build(
            vec![names(&WORDS)],
            vec![
                Stage::filter(|s: &String| s.len() >= 5),
                Stage::run_on(WorkerPool::new("upper", 4)),
                Stage::map(|s: String| s.to_uppercase()),
                Stage::repeat(1),
            ],
        );

        StepVerifier::create(sequence)
            .expect_subscription()
            .expect_next(strings(&["GOOGLE", "STACKOVERFLOW", "GOOGLE", "STACKOVERFLOW"]))
            .verify_complete()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rebuild_gives_identical_output() {
        let ctx = ScenarioContext::new(Duration::from_millis(1), WorkerPool::new("rebuild", 3));
        let first = scenarios::filter_upper_repeat(&ctx).collect_list().await.unwrap();
        let second = scenarios::filter_upper_repeat(&ctx).collect_list().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_delayed_sentence_in_order() {
        let started = Instant::now();
        StepVerifier::create(names(&["hello", "there"]).delay_elements(DELAY))
            .expect_subscription()
            .expect_next(strings(&["hello", "there"]))
            .verify_complete()
            .await
            .unwrap();
        assert!(started.elapsed() >= DELAY * 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_out_of_order_workers_emit_input_order() {
        let sequence = Sequence::range(0, 32)
            .run_on(WorkerPool::new("jitter", 8))
            .map(|n| {
                // odd elements are slow, so even ones finish first
                if n % 2 == 1 {
                    std::thread::sleep(Duration::from_millis(5));
                }
                n
            });

        StepVerifier::create(sequence)
            .expect_next(0..32)
            .verify_complete()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failing_map_names_stage_and_stops() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pulled);

        let sequence = Sequence::range(1, 10)
            .do_on_next(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .try_map(|n| if n == 3 { Err(format!("cannot map {n}")) } else { Ok(n) });

        StepVerifier::create(sequence)
            .expect_next([1, 2])
            .expect_error(|e| {
                matches!(e, FlowError::Transform { stage, message }
                    if stage == "map#2" && message == "cannot map 3")
            })
            .verify()
            .await
            .unwrap();
        assert_eq!(pulled.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cancel_stops_emissions() {
        let mut subscription = Sequence::range(1, 1_000).delay_elements(Duration::from_millis(1)).subscribe();
        assert_eq!(subscription.next().await, Some(Ok(1)));

        subscription.cancel();
        assert_eq!(subscription.state(), SubscriptionState::Cancelled);
        assert_eq!(subscription.next().await, None);
        assert_eq!(subscription.metrics().emitted_count(), 1);
    }

    #[tokio::test]
    async fn test_verifier_reports_wrong_terminal() {
        let err = StepVerifier::create(Sequence::just([1]))
            .expect_next([1])
            .verify_error()
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::UnexpectedSignal { step: 1, .. }));
    }
}

#[cfg(test)]
mod scenario_tests {
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use verifier::{ScenarioContext, SCENARIOS};

    #[tokio::test]
    async fn test_all_scenarios_pass_with_configured_context() {
        let config = ConfigLoader::load_from_str(
            "[engine]\nworker_threads = 2\ndemo_delay_ms = 5\n",
            ConfigFormat::Toml,
        )
        .unwrap();
        let ctx = ScenarioContext::from_engine(&config.engine);
        assert_eq!(ctx.delay, Duration::from_millis(5));

        for scenario in SCENARIOS.iter() {
            let elapsed = scenario.verify(&ctx).await;
            assert!(elapsed.is_ok(), "{} failed: {:?}", scenario.name, elapsed);
        }
    }
}

#[cfg(test)]
mod http_tests {
    use contracts::ServerConfig;
    use reqwest::{header, StatusCode};
    use server::HttpServer;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_hello_round_trip() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            greeting: "hello".to_string(),
        };
        let server = HttpServer::bind(&config).await.unwrap();
        let url = format!("http://{}/hello", server.local_addr().unwrap());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve(async {
            let _ = shutdown_rx.await;
        }));

        let client = reqwest::Client::new();
        let response = client.get(&url).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(response.text().await.unwrap(), "hello");

        // a second request on the same client still sees the greeting
        let again = client.get(&url).send().await.unwrap().text().await.unwrap();
        assert_eq!(again, "hello");
        drop(client);

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
