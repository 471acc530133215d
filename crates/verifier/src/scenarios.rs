//! Demo scenarios
//!
//! Each scenario builds a small pipeline exercising one or two operators and
//! knows how to verify its own output.

use std::time::Duration;

use contracts::{EngineConfig, Person};
use futures::future::{BoxFuture, FutureExt};
use stream_engine::{Sequence, WorkerPool};

use crate::error::VerifyError;
use crate::step::StepVerifier;

/// Knobs shared by all scenarios
#[derive(Debug, Clone)]
pub struct ScenarioContext {
    /// Per-element delay for the delayed scenarios
    pub delay: Duration,
    /// Pool for offloaded stages
    pub pool: WorkerPool,
}

impl ScenarioContext {
    pub fn new(delay: Duration, pool: WorkerPool) -> Self {
        Self { delay, pool }
    }

    pub fn from_engine(engine: &EngineConfig) -> Self {
        Self::new(
            Duration::from_millis(engine.demo_delay_ms),
            WorkerPool::new("demo", engine.worker_threads),
        )
    }
}

impl Default for ScenarioContext {
    fn default() -> Self {
        Self::from_engine(&EngineConfig::default())
    }
}

type VerifyFuture = BoxFuture<'static, Result<Duration, VerifyError>>;

/// Named, runnable demo
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    render: fn(&ScenarioContext) -> Sequence<String>,
    verify: fn(&ScenarioContext) -> VerifyFuture,
}

impl Scenario {
    /// Build the scenario with elements rendered as strings
    pub fn build(&self, ctx: &ScenarioContext) -> Sequence<String> {
        (self.render)(ctx)
    }

    /// Run the scenario's own step verification
    pub async fn verify(&self, ctx: &ScenarioContext) -> Result<Duration, VerifyError> {
        (self.verify)(ctx).await
    }
}

pub static SCENARIOS: [Scenario; 6] = [
    Scenario {
        name: "concat_with_delay",
        description: "two delayed name lists drained one after the other",
        render: concat_with_delay,
        verify: verify_concat_with_delay,
    },
    Scenario {
        name: "even_numbers",
        description: "even numbers out of 1..=100",
        render: |_| even_numbers().map(|n| n.to_string()),
        verify: verify_even_numbers,
    },
    Scenario {
        name: "continuous_sentence",
        description: "delayed words arriving in order",
        render: continuous_sentence,
        verify: verify_continuous_sentence,
    },
    Scenario {
        name: "person_upper_name",
        description: "person records with upper-cased names",
        render: |_| person_upper_name().map(|p| p.name),
        verify: verify_person_upper_name,
    },
    Scenario {
        name: "zip_names",
        description: "two delayed name lists paired by index",
        render: zip_names,
        verify: verify_zip_names,
    },
    Scenario {
        name: "filter_upper_repeat",
        description: "long words upper-cased on a worker pool, repeated once",
        render: filter_upper_repeat,
        verify: verify_filter_upper_repeat,
    },
];

/// Look up a scenario by name
pub fn find(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.name == name)
}

pub fn names() -> impl Iterator<Item = &'static str> {
    SCENARIOS.iter().map(|s| s.name)
}

// ===== Pipelines =====

pub const FIRST_NAMES: [&str; 3] = ["Blenders", "Old", "Johnnie"];
pub const LAST_NAMES: [&str; 3] = ["Pride", "Monk", "Walker"];
pub const WORDS: [&str; 4] = ["google", "abc", "fb", "stackoverflow"];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn concat_with_delay(ctx: &ScenarioContext) -> Sequence<String> {
    let first = Sequence::just(strings(&FIRST_NAMES)).delay_elements(ctx.delay);
    let second = Sequence::just(strings(&LAST_NAMES)).delay_elements(ctx.delay);
    first.concat_with(second).log("concat_with_delay")
}

pub fn even_numbers() -> Sequence<i64> {
    Sequence::range(1, 100)
        .filter(|n| n % 2 == 0)
        .log("even_numbers")
}

pub fn continuous_sentence(ctx: &ScenarioContext) -> Sequence<String> {
    Sequence::just(strings(&["hello", "there"]))
        .delay_elements(ctx.delay)
        .log("continuous_sentence")
}

pub fn people() -> Vec<Person> {
    vec![
        Person::new("John", "john@gmail.com", "12345678"),
        Person::new("Jack", "jack@gmail.com", "12345678"),
    ]
}

pub fn person_upper_name() -> Sequence<Person> {
    Sequence::just(people()).map(Person::with_upper_name)
}

pub fn zip_names(ctx: &ScenarioContext) -> Sequence<String> {
    let first = Sequence::just(strings(&FIRST_NAMES)).delay_elements(ctx.delay);
    let second = Sequence::just(strings(&LAST_NAMES)).delay_elements(ctx.delay);
    first
        .zip_with(second, |a, b| format!("{a} {b}"))
        .log("zip_names")
}

pub fn filter_upper_repeat(ctx: &ScenarioContext) -> Sequence<String> {
    let pool = ctx.pool.clone();
    Sequence::just(strings(&WORDS))
        .filter(|s| s.len() >= 5)
        .flat_map(move |word| {
            Sequence::just([word])
                .run_on(pool.clone())
                .map(|s| s.to_uppercase())
        })
        .repeat(1)
        .log("filter_upper_repeat")
}

// ===== Verification =====

fn verify_concat_with_delay(ctx: &ScenarioContext) -> VerifyFuture {
    StepVerifier::create(concat_with_delay(ctx))
        .expect_subscription()
        .expect_next(strings(&["Blenders", "Old", "Johnnie", "Pride", "Monk", "Walker"]))
        .verify_complete()
        .boxed()
}

fn verify_even_numbers(_: &ScenarioContext) -> VerifyFuture {
    StepVerifier::create(even_numbers())
        .expect_subscription()
        .expect_next_matches("first even", |n| *n == 2)
        .then_consume_while(|n| n % 2 == 0)
        .verify_complete()
        .boxed()
}

fn verify_continuous_sentence(ctx: &ScenarioContext) -> VerifyFuture {
    StepVerifier::create(continuous_sentence(ctx))
        .expect_subscription()
        .expect_next(strings(&["hello", "there"]))
        .verify_complete()
        .boxed()
}

fn verify_person_upper_name(_: &ScenarioContext) -> VerifyFuture {
    StepVerifier::create(person_upper_name())
        .expect_subscription()
        .expect_next_matches("name JOHN", |p| p.name == "JOHN")
        .expect_next_matches("name JACK", |p| p.name == "JACK")
        .verify_complete()
        .boxed()
}

fn verify_zip_names(ctx: &ScenarioContext) -> VerifyFuture {
    StepVerifier::create(zip_names(ctx))
        .expect_subscription()
        .expect_next(strings(&["Blenders Pride", "Old Monk", "Johnnie Walker"]))
        .verify_complete()
        .boxed()
}

fn verify_filter_upper_repeat(ctx: &ScenarioContext) -> VerifyFuture {
    StepVerifier::create(filter_upper_repeat(ctx))
        .expect_subscription()
        .expect_next(strings(&["GOOGLE", "STACKOVERFLOW", "GOOGLE", "STACKOVERFLOW"]))
        .verify_complete()
        .boxed()
}
