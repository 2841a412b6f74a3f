//! Request composition strategies.
//!
//! Every strategy fetches the same ids (`1..=count` by default) and differs
//! only in how requests are ordered and overlapped. Against a server with a
//! fixed per-request delay `d`, a sequential run over `n` ids costs roughly
//! `n * d` while a concurrent run costs roughly `d`.

use crate::{client::MotorcycleClient, error::Result};
use core::fmt;
use futures::{
    StreamExt, TryFutureExt, TryStreamExt,
    future::{join_all, try_join_all},
};
use motostream_core::types::{Motorcycle, MotorcycleId, Specification};
use std::time::{Duration, Instant};

/// How a [`Composer`] orders its requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Strategy {
    /// One fetch after another.
    Sequential,
    /// All fetches in flight at once; the first failure aborts the batch.
    Concurrent,
    /// All fetches in flight at once; non-2xx responses are skipped.
    Exchange,
    /// Motorcycle then specification per id, chains overlapping across ids.
    Nested,
    /// Motorcycle then specification per id, one id at a time.
    NestedSequential,
    /// Subscribe to the stream and detach after a fixed number of items.
    Stream,
}

impl Strategy {
    pub const ALL: [Self; 6] = [
        Self::Sequential,
        Self::Concurrent,
        Self::Exchange,
        Self::Nested,
        Self::NestedSequential,
        Self::Stream,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Concurrent => "concurrent",
            Self::Exchange => "exchange",
            Self::Nested => "nested",
            Self::NestedSequential => "nested-sequential",
            Self::Stream => "stream",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one strategy run.
#[derive(Debug)]
pub struct StrategyReport {
    pub strategy: Strategy,
    pub requested: usize,
    pub received: usize,
    pub elapsed: Duration,
}

impl StrategyReport {
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    pub fn report(&self) {
        println!(
            "{:<20} | {:>10} requested | {:>10} received | {:>10.2} ms",
            self.strategy.name(),
            self.requested,
            self.received,
            self.elapsed_ms(),
        );
    }
}

#[derive(Clone, Debug)]
pub struct Composer {
    client: MotorcycleClient,
    ids: Vec<MotorcycleId>,
    take: usize,
}

impl Composer {
    /// Composes requests for ids `1..=count`, bounding streams to `take`
    /// items.
    pub fn new(client: MotorcycleClient, count: usize, take: usize) -> Self {
        Self {
            client,
            ids: (1..=count).map(MotorcycleId::from).collect(),
            take,
        }
    }

    /// Replaces the ids fetched by every request-based strategy.
    pub fn with_ids<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<MotorcycleId>,
    {
        self.ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn client(&self) -> &MotorcycleClient {
        &self.client
    }

    pub fn ids(&self) -> &[MotorcycleId] {
        &self.ids
    }

    pub async fn sequential(&self) -> Result<Vec<Motorcycle>> {
        let mut motos = Vec::with_capacity(self.ids.len());
        for id in &self.ids {
            let moto = self.client.fetch_motorcycle(id).await?;
            tracing::info!("Received motorcycle {}", moto.id);
            motos.push(moto);
        }
        Ok(motos)
    }

    /// Results are returned in id order even though completion order is not
    /// defined.
    pub async fn concurrent(&self) -> Result<Vec<Motorcycle>> {
        try_join_all(self.ids.iter().map(|id| {
            self.client
                .fetch_motorcycle(id)
                .inspect_ok(|moto| tracing::info!("Received motorcycle {}", moto.id))
                .inspect_err(move |e| tracing::warn!("Fetching motorcycle {id} failed: {e}"))
        }))
        .await
    }

    /// Like [`concurrent`](Self::concurrent), but an id answered with a
    /// non-2xx status is dropped from the result instead of failing the
    /// batch. Transport failures still abort.
    pub async fn exchange(&self) -> Result<Vec<Motorcycle>> {
        let results = join_all(
            self.ids
                .iter()
                .map(|id| self.client.try_fetch_motorcycle(id)),
        )
        .await;

        let mut motos = Vec::with_capacity(results.len());
        for result in results {
            if let Some(moto) = result? {
                motos.push(moto);
            }
        }
        Ok(motos)
    }

    /// Each specification request starts only once its motorcycle has
    /// arrived, but different ids proceed independently.
    pub async fn nested(&self) -> Result<Vec<(Motorcycle, Specification)>> {
        try_join_all(self.ids.iter().map(|id| {
            self.fetch_with_specification(id)
                .inspect_err(move |e| tracing::warn!("Nested fetch for {id} failed: {e}"))
        }))
        .await
    }

    pub async fn nested_sequential(&self) -> Result<Vec<(Motorcycle, Specification)>> {
        let mut pairs = Vec::with_capacity(self.ids.len());
        for id in &self.ids {
            pairs.push(self.fetch_with_specification(id).await?);
        }
        Ok(pairs)
    }

    /// Takes at most `take` items from the stream and drops the subscription.
    ///
    /// Ending early is not an error; fewer items are returned if the stream
    /// completes first.
    pub async fn bounded_stream(&self) -> Result<Vec<Motorcycle>> {
        let stream = self.client.stream_motorcycles().await?;
        let motos: Vec<Motorcycle> = stream
            .take(self.take)
            .inspect_ok(|moto| tracing::info!("Streamed motorcycle {}", moto.id))
            .try_collect()
            .await?;
        tracing::debug!("Detaching from stream after {} items", motos.len());
        Ok(motos)
    }

    /// Runs `strategy` once and times it.
    pub async fn run(&self, strategy: Strategy) -> Result<StrategyReport> {
        tracing::info!("Running {strategy} strategy");
        let start = Instant::now();

        let (requested, received) = match strategy {
            Strategy::Sequential => (self.ids.len(), self.sequential().await?.len()),
            Strategy::Concurrent => (self.ids.len(), self.concurrent().await?.len()),
            Strategy::Exchange => (self.ids.len(), self.exchange().await?.len()),
            Strategy::Nested => (self.ids.len() * 2, self.nested().await?.len() * 2),
            Strategy::NestedSequential => (
                self.ids.len() * 2,
                self.nested_sequential().await?.len() * 2,
            ),
            Strategy::Stream => (self.take, self.bounded_stream().await?.len()),
        };

        let report = StrategyReport {
            strategy,
            requested,
            received,
            elapsed: start.elapsed(),
        };
        tracing::info!("Elapsed time: {:.0} ms", report.elapsed_ms());
        Ok(report)
    }

    async fn fetch_with_specification(
        &self,
        id: &MotorcycleId,
    ) -> Result<(Motorcycle, Specification)> {
        let moto = self.client.fetch_motorcycle(id).await?;
        let spec = self.client.fetch_specification(&moto.id).await?;
        tracing::info!("Received {} with specification {:?}", moto.id, spec);
        Ok((moto, spec))
    }
}

/// Runs every strategy in order, stopping at the first failure.
pub async fn run_all(composer: &Composer, strategies: &[Strategy]) -> Result<Vec<StrategyReport>> {
    let mut reports = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        reports.push(composer.run(*strategy).await?);
    }
    Ok(reports)
}

/// Prints the summary table for `reports`.
pub fn print_summary(reports: &[StrategyReport]) {
    println!("\n=== Strategy Summary ===");
    println!(
        "{:<20} | {:>20} | {:>19} | {:>13}",
        "Strategy", "Requested", "Received", "Time (ms)"
    );
    println!("{}", "-".repeat(80));
    for report in reports {
        report.report();
    }
}
