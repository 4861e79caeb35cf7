//! Fleet coordination across concurrent stream jobs.
//!
//! The coordinator owns every supervisor, the pump threads draining them,
//! and the single mapping of live jobs. Pump threads report exits over a
//! channel and never touch the mapping; only coordinator paths mutate it
//! (insertion at launch, removal on exit events, clearing at teardown).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use super::errors::LaunchError;
use super::process::{ProcessState, StreamSupervisor};
use crate::config::ConfigError;
use crate::models::StreamJob;

/// A job's pump loop finished and its process reached a terminal state.
#[derive(Debug, Clone)]
pub struct JobExit {
    pub job: String,
    pub state: ProcessState,
}

/// Owns and coordinates the supervisors of every live stream job.
pub struct FleetCoordinator {
    supervisors: Mutex<HashMap<String, Arc<StreamSupervisor>>>,
    pumps: Mutex<Vec<thread::JoinHandle<()>>>,
    events: Sender<JobExit>,
    inbox: Mutex<Receiver<JobExit>>,
    shutting_down: AtomicBool,
}

impl FleetCoordinator {
    pub fn new() -> Self {
        let (events, inbox) = mpsc::channel();
        Self {
            supervisors: Mutex::new(HashMap::new()),
            pumps: Mutex::new(Vec::new()),
            events,
            inbox: Mutex::new(inbox),
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Number of jobs currently live.
    pub fn live_count(&self) -> usize {
        self.supervisors.lock().len()
    }

    /// The supervisor for a live job, if any.
    pub fn supervisor(&self, job: &str) -> Option<Arc<StreamSupervisor>> {
        self.supervisors.lock().get(job).cloned()
    }

    /// True once a coordinated shutdown has begun.
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Start every configured job; each pump loop runs on its own thread.
    ///
    /// All commands are constructed before anything launches, so a
    /// configuration error aborts the whole fleet without side effects. A
    /// launch failure after that is fatal for its job only: it is logged
    /// and the remaining jobs still start. Returns the number launched.
    pub fn launch_all(&self, jobs: &[StreamJob]) -> Result<usize, ConfigError> {
        let mut prepared = Vec::with_capacity(jobs.len());
        for job in jobs {
            prepared.push((job.name.clone(), job.command()?));
        }

        let mut started = 0;
        for (name, args) in prepared {
            tracing::info!(job = %name, command = %args.join(" "), "launching");
            match self.launch_supervisor(StreamSupervisor::new(name.clone(), args)) {
                Ok(()) => started += 1,
                Err(err) => tracing::error!(job = %name, error = %err, "launch failed"),
            }
        }
        Ok(started)
    }

    /// Start one prepared supervisor and spawn its pump thread.
    pub fn launch_supervisor(&self, supervisor: StreamSupervisor) -> Result<(), LaunchError> {
        let supervisor = Arc::new(supervisor);
        supervisor.start()?;

        let name = supervisor.job_name().to_string();
        self.supervisors.lock().insert(name, Arc::clone(&supervisor));

        let events = self.events.clone();
        let handle = thread::spawn(move || {
            supervisor.pump();
            // The receiver may already be gone during teardown
            let _ = events.send(JobExit {
                job: supervisor.job_name().to_string(),
                state: supervisor.state(),
            });
        });
        self.pumps.lock().push(handle);
        Ok(())
    }

    /// Block until the next job reaches a terminal state.
    ///
    /// The job is removed from the live mapping. Outside a coordinated
    /// shutdown this is an unexpected exit: it is reported as such and no
    /// restart is attempted - restarting is the operator's call.
    pub fn await_any(&self) -> Option<JobExit> {
        let exit = self.inbox.lock().recv().ok()?;
        self.supervisors.lock().remove(&exit.job);
        if self.is_shutting_down() {
            tracing::info!(job = %exit.job, state = ?exit.state, "job stopped");
        } else {
            tracing::warn!(job = %exit.job, state = ?exit.state, "job exited unexpectedly");
        }
        Some(exit)
    }

    /// Block until every launched job has reached a terminal state.
    pub fn await_all(&self) -> Vec<JobExit> {
        let mut exits = Vec::new();
        while self.live_count() > 0 {
            match self.await_any() {
                Some(exit) => exits.push(exit),
                None => break,
            }
        }
        exits
    }

    /// Stop every live job and wait for fleet-wide quiescence.
    ///
    /// Re-entrant calls during an in-progress shutdown are ignored. Stops
    /// run in parallel, so total shutdown latency is bounded by one grace
    /// period plus the terminate wait - not one per job.
    pub fn stop_all(&self, grace: Duration) {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }

        let live: Vec<Arc<StreamSupervisor>> =
            self.supervisors.lock().values().cloned().collect();
        tracing::info!(jobs = live.len(), "stopping all streams");

        thread::scope(|scope| {
            for supervisor in &live {
                scope.spawn(move || {
                    supervisor.stop(grace);
                });
            }
        });

        let pumps: Vec<_> = self.pumps.lock().drain(..).collect();
        for pump in pumps {
            let _ = pump.join();
        }
        self.supervisors.lock().clear();
        tracing::info!("all streams stopped");
    }
}

impl Default for FleetCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sleeper(job: &str) -> StreamSupervisor {
        StreamSupervisor::with_program(job, "sleep", vec!["30".to_string()])
    }

    fn oneshot(job: &str, program: &str) -> StreamSupervisor {
        StreamSupervisor::with_program(job, program, Vec::new())
    }

    #[cfg(unix)]
    #[test]
    fn stop_all_reaches_quiescence_in_parallel() {
        let fleet = FleetCoordinator::new();
        fleet.launch_supervisor(sleeper("a")).unwrap();
        fleet.launch_supervisor(sleeper("b")).unwrap();
        fleet.launch_supervisor(sleeper("c")).unwrap();
        assert_eq!(fleet.live_count(), 3);

        let a = fleet.supervisor("a").unwrap();
        let b = fleet.supervisor("b").unwrap();
        let c = fleet.supervisor("c").unwrap();

        let begun = Instant::now();
        fleet.stop_all(Duration::from_millis(200));

        // Parallel: well under 3 jobs x (grace + term wait)
        assert!(begun.elapsed() < Duration::from_secs(3));
        assert!(a.state().is_terminal());
        assert!(b.state().is_terminal());
        assert!(c.state().is_terminal());
        assert_eq!(fleet.live_count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn stop_all_is_reentrant() {
        let fleet = FleetCoordinator::new();
        fleet.launch_supervisor(sleeper("solo")).unwrap();

        fleet.stop_all(Duration::from_millis(100));
        assert!(fleet.is_shutting_down());
        // Second call returns immediately without touching anything
        fleet.stop_all(Duration::from_millis(100));
        assert_eq!(fleet.live_count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn unexpected_exit_removes_only_that_job() {
        let fleet = FleetCoordinator::new();
        fleet.launch_supervisor(oneshot("flaky", "false")).unwrap();
        fleet.launch_supervisor(sleeper("steady")).unwrap();

        let exit = fleet.await_any().unwrap();
        assert_eq!(exit.job, "flaky");
        assert_eq!(exit.state, ProcessState::Exited(Some(1)));

        // The sibling is untouched
        assert_eq!(fleet.live_count(), 1);
        let steady = fleet.supervisor("steady").unwrap();
        assert_eq!(steady.state(), ProcessState::Running);

        fleet.stop_all(Duration::from_millis(100));
    }

    #[cfg(unix)]
    #[test]
    fn await_all_drains_every_job() {
        let fleet = FleetCoordinator::new();
        fleet.launch_supervisor(oneshot("one", "true")).unwrap();
        fleet.launch_supervisor(oneshot("two", "true")).unwrap();

        let exits = fleet.await_all();
        assert_eq!(exits.len(), 2);
        assert!(exits
            .iter()
            .all(|exit| exit.state == ProcessState::Exited(Some(0))));
        assert_eq!(fleet.live_count(), 0);
    }

    #[test]
    fn failed_launch_leaves_fleet_empty() {
        let fleet = FleetCoordinator::new();
        let result = fleet.launch_supervisor(oneshot("ghost", "camcast-no-such-binary"));
        assert!(matches!(result, Err(LaunchError::NotFound { .. })));
        assert_eq!(fleet.live_count(), 0);
    }
}
