//! Pipeline Walkthrough
//!
//! Builds a declarative pipeline, drives it into a push-style subscriber and
//! prints what arrived.
//!
//! Run with: cargo run -p streamlab_demos --bin pipeline_walkthrough [config.toml]

use std::path::Path;
use std::time::Duration;

use config_loader::ConfigLoader;
use contracts::{FlowError, Person, Subscriber};
use stream_engine::{Pipeline, Sequence, Stage, WorkerPool};

/// Prints every signal it receives
struct PrintingSubscriber {
    received: usize,
}

impl Subscriber<Person> for PrintingSubscriber {
    fn name(&self) -> &str {
        "printer"
    }

    async fn on_next(&mut self, person: Person) -> Result<(), FlowError> {
        self.received += 1;
        println!("  {} <{}>", person.name, person.email);
        Ok(())
    }

    async fn on_error(&mut self, error: &FlowError) {
        println!("  failed: {error}");
    }

    async fn on_complete(&mut self) {
        println!("  done, {} people", self.received);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = ConfigLoader::load_or_default(std::env::args().nth(1).as_deref().map(Path::new))?;
    tracing::info!(
        worker_threads = config.engine.worker_threads,
        delay_ms = config.engine.demo_delay_ms,
        "Configuration loaded"
    );

    let sources = vec![
        Sequence::just(vec![
            Person::new("John", "john@gmail.com", "12345678"),
            Person::new("Jack", "jack@gmail.com", "12345678"),
        ]),
        Sequence::just(vec![Person::new("Jill", "jill@gmail.com", "87654321")]),
    ];

    let sequence = Pipeline::new(sources)
        .stage(Stage::filter(|p: &Person| !p.email.is_empty()))
        .stage(Stage::run_on(WorkerPool::new(
            "walkthrough",
            config.engine.worker_threads,
        )))
        .stage(Stage::map(Person::with_upper_name))
        .stage(Stage::delay(Duration::from_millis(config.engine.demo_delay_ms)))
        .build();

    println!("Stages: {:?}", sequence.stages());

    let handle = sequence.subscribe_with(PrintingSubscriber { received: 0 });
    let state = handle.join().await;
    tracing::info!(%state, "Walkthrough finished");

    Ok(())
}
