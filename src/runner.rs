//! Schedules scenarios with bounded concurrency and a per-scenario timeout.
//!
//! Two independent knobs: `workers` caps how many units run at once, and
//! `fully_parallel` decides whether a unit is one scenario or one whole group
//! whose scenarios then run in declaration order.

use futures::FutureExt;
use futures::stream::{self, StreamExt};
use std::any::Any;
use std::fmt::{self, Display};
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use crate::harness::Harness;
use crate::suite::Scenario;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Status {
    Passed,
    Failed(String),
    TimedOut,
}

#[derive(Clone, Debug)]
pub struct Outcome {
    pub group: &'static str,
    pub name: &'static str,
    pub status: Status,
    pub elapsed: Duration,
}

#[derive(Clone, Default, Debug)]
pub struct Report {
    pub outcomes: Vec<Outcome>,
}

impl Report {
    pub fn passed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == Status::Passed)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status != Status::Passed)
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for outcome in &self.outcomes {
            let mark = match &outcome.status {
                Status::Passed => "ok",
                Status::Failed(..) => "FAILED",
                Status::TimedOut => "TIMED OUT",
            };
            writeln!(
                f,
                "{mark:>9}  {} > {} ({} ms)",
                outcome.group,
                outcome.name,
                outcome.elapsed.as_millis()
            )?;
            if let Status::Failed(reason) = &outcome.status {
                writeln!(f, "           {reason}")?;
            }
        }
        write!(
            f,
            "{} passed, {} failed",
            self.passed(),
            self.outcomes.len() - self.passed()
        )
    }
}

pub struct Runner<'a> {
    harness: &'a Harness,
    workers: usize,
    timeout: Duration,
    fully_parallel: bool,
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_owned()
    }
}

impl<'a> Runner<'a> {
    pub fn new(harness: &'a Harness) -> Self {
        let config = harness.config();
        Self {
            harness,
            workers: config.workers.max(1),
            timeout: config.timeout(),
            fully_parallel: config.fully_parallel,
        }
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn fully_parallel(mut self, fully_parallel: bool) -> Self {
        self.fully_parallel = fully_parallel;
        self
    }

    async fn run_one(&self, index: usize, scenario: Scenario) -> (usize, Outcome) {
        let started = Instant::now();
        // On timeout the scenario future is dropped, abandoning any request in flight.
        let result = tokio::time::timeout(
            self.timeout,
            AssertUnwindSafe((scenario.run)(self.harness)).catch_unwind(),
        )
        .await;
        let status = match result {
            Ok(Ok(Ok(()))) => Status::Passed,
            Ok(Ok(Err(error))) => Status::Failed(error.to_string()),
            Ok(Err(panic)) => Status::Failed(panic_message(&*panic)),
            Err(..) => Status::TimedOut,
        };
        let elapsed = started.elapsed();
        match &status {
            Status::Passed => log::info!("ok {:?} ({:?})", scenario, elapsed),
            Status::Failed(reason) => log::error!("FAILED {:?}: {}", scenario, reason),
            Status::TimedOut => log::error!("TIMED OUT {:?} after {:?}", scenario, self.timeout),
        }
        let outcome = Outcome {
            group: scenario.group,
            name: scenario.name,
            status,
            elapsed,
        };
        (index, outcome)
    }

    pub async fn run(&self, scenarios: Vec<Scenario>) -> Report {
        log::info!(
            "running {} scenarios on {} workers ({})",
            scenarios.len(),
            self.workers,
            if self.fully_parallel { "fully parallel" } else { "serial within group" }
        );
        let indexed = scenarios.into_iter().enumerate();

        let mut outcomes: Vec<(usize, Outcome)> = if self.fully_parallel {
            stream::iter(indexed)
                .map(|(index, scenario)| self.run_one(index, scenario))
                .buffer_unordered(self.workers)
                .collect()
                .await
        } else {
            let mut groups: Vec<Vec<(usize, Scenario)>> = Vec::new();
            for (index, scenario) in indexed {
                match groups
                    .iter_mut()
                    .find(|group| group[0].1.group == scenario.group)
                {
                    Some(group) => group.push((index, scenario)),
                    None => groups.push(vec![(index, scenario)]),
                }
            }
            stream::iter(groups)
                .map(|group| async move {
                    let mut outcomes = Vec::with_capacity(group.len());
                    for (index, scenario) in group {
                        outcomes.push(self.run_one(index, scenario).await);
                    }
                    outcomes
                })
                .buffer_unordered(self.workers)
                .flat_map(stream::iter)
                .collect()
                .await
        };

        outcomes.sort_by_key(|(index, _)| *index);
        Report {
            outcomes: outcomes.into_iter().map(|(_, outcome)| outcome).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::factory::UserOverrides;
    use crate::fixture::with_user;
    use crate::{Error, Result};
    use futures::future::BoxFuture;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn harness() -> Harness {
        Harness::new(Config {
            endpoint: "http://127.0.0.1:9/graphql".to_owned(),
            workers: 4,
            ..Config::default()
        })
        .unwrap()
    }

    fn scenario(
        group: &'static str,
        name: &'static str,
        run: crate::suite::ScenarioFn,
    ) -> Scenario {
        Scenario { group, name, run }
    }

    fn passes(_: &Harness) -> BoxFuture<'_, Result<()>> {
        async { Ok::<_, Error>(()) }.boxed()
    }

    fn fails(_: &Harness) -> BoxFuture<'_, Result<()>> {
        async { Err(Error::Assertion("totalCount is 0".to_owned())) }.boxed()
    }

    fn panics(_: &Harness) -> BoxFuture<'_, Result<()>> {
        async {
            if true {
                panic!("boom");
            }
            Ok::<_, Error>(())
        }
        .boxed()
    }

    fn hangs(_: &Harness) -> BoxFuture<'_, Result<()>> {
        async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, Error>(())
        }
        .boxed()
    }

    fn slow_fixture(harness: &Harness) -> BoxFuture<'_, Result<()>> {
        with_user(harness.client(), UserOverrides::default(), |_| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .boxed()
    }

    async fn track(current: &AtomicUsize, peak: &AtomicUsize) -> Result<()> {
        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(40)).await;
        current.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    static SERIAL_CURRENT: AtomicUsize = AtomicUsize::new(0);
    static SERIAL_PEAK: AtomicUsize = AtomicUsize::new(0);
    static PARALLEL_CURRENT: AtomicUsize = AtomicUsize::new(0);
    static PARALLEL_PEAK: AtomicUsize = AtomicUsize::new(0);

    fn serial_probe(_: &Harness) -> BoxFuture<'_, Result<()>> {
        track(&SERIAL_CURRENT, &SERIAL_PEAK).boxed()
    }

    fn parallel_probe(_: &Harness) -> BoxFuture<'_, Result<()>> {
        track(&PARALLEL_CURRENT, &PARALLEL_PEAK).boxed()
    }

    #[tokio::test]
    async fn reports_every_kind_of_outcome_in_order() {
        let harness = harness();
        let report = Runner::new(&harness)
            .timeout(Duration::from_millis(100))
            .run(vec![
                scenario("a", "passes", passes),
                scenario("b", "fails", fails),
                scenario("c", "panics", panics),
                scenario("d", "hangs", hangs),
            ])
            .await;

        let statuses: Vec<_> = report.outcomes.iter().map(|o| o.status.clone()).collect();
        assert_eq!(statuses[0], Status::Passed);
        assert_eq!(
            statuses[1],
            Status::Failed("assertion failed: totalCount is 0".to_owned())
        );
        assert_eq!(statuses[2], Status::Failed("panicked: boom".to_owned()));
        assert_eq!(statuses[3], Status::TimedOut);
        assert_eq!(report.passed(), 1);
        assert!(!report.is_success());
        assert!(report.to_string().ends_with("1 passed, 3 failed"));
    }

    #[tokio::test]
    async fn group_runs_in_order_unless_fully_parallel() {
        let harness = harness();
        let group = |run: crate::suite::ScenarioFn| {
            (0..3)
                .map(|_| scenario("users", "probe", run))
                .collect::<Vec<_>>()
        };

        let report = Runner::new(&harness)
            .fully_parallel(false)
            .run(group(serial_probe))
            .await;
        assert!(report.is_success());
        assert_eq!(SERIAL_PEAK.load(Ordering::SeqCst), 1);

        let report = Runner::new(&harness)
            .fully_parallel(true)
            .workers(3)
            .run(group(parallel_probe))
            .await;
        assert!(report.is_success());
        assert_eq!(PARALLEL_PEAK.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn groups_share_the_worker_bound() {
        let harness = harness();
        let scenarios = vec![
            scenario("a", "one", passes),
            scenario("b", "two", passes),
            scenario("a", "three", passes),
        ];
        let report = Runner::new(&harness).workers(1).run(scenarios).await;
        let names: Vec<_> = report.outcomes.iter().map(|o| o.name).collect();
        assert_eq!(names, vec!["one", "two", "three"]);
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn timed_out_scenario_releases_its_fixture() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("createUser"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "createUser": {
                        "user": {
                            "id": 31,
                            "name": "Test User 1",
                            "email": "test.user.1@example.com",
                            "gender": "male",
                            "status": "active"
                        }
                    }
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("deleteUser"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": { "deleteUser": { "user": null } } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let harness = Harness::new(Config {
            endpoint: server.uri(),
            ..Config::default()
        })
        .unwrap();
        let report = Runner::new(&harness)
            .timeout(Duration::from_millis(300))
            .run(vec![scenario("users", "slow", slow_fixture)])
            .await;
        assert_eq!(report.outcomes[0].status, Status::TimedOut);

        let deletes = || async {
            server
                .received_requests()
                .await
                .unwrap_or_default()
                .iter()
                .filter(|request| String::from_utf8_lossy(&request.body).contains("deleteUser"))
                .count()
        };
        for _ in 0..100 {
            if deletes().await > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(deletes().await, 1);
    }
}
