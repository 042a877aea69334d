use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use sql_dispatch::prelude::*;

use crate::args::StressConfig;

/// What a run observed.
#[derive(Debug)]
pub(crate) struct Outcome {
    pub(crate) updates: i64,
    pub(crate) callbacks: usize,
    pub(crate) elapsed: Duration,
}

impl Outcome {
    pub(crate) fn matches(&self, config: &StressConfig) -> bool {
        usize::try_from(self.updates).is_ok_and(|n| n == config.expected_updates())
            && self.callbacks == config.expected_callbacks()
    }
}

const INCREMENT: &str = "UPDATE counter SET n = n + 1 WHERE id = 1";

pub(crate) fn run(config: &StressConfig) -> Result<Outcome, DispatchError> {
    remove_stale_files(config);
    let info = format!("localhost;0;stress;;{}", config.db.display());
    let conn = Arc::new(Connection::with_options(SqliteDriver::new(), config.dispatch.clone()));
    conn.initialize(&info)?;
    conn.execute_now("CREATE TABLE counter (id INTEGER PRIMARY KEY, n INTEGER NOT NULL)")?;
    conn.execute_now("INSERT INTO counter VALUES (1, 0)")?;

    let started = Instant::now();
    let producers: Vec<_> = (0..config.producers)
        .map(|p| {
            let conn = Arc::clone(&conn);
            let config = config.clone();
            thread::Builder::new()
                .name(format!("producer-{p}"))
                .spawn(move || produce(&conn, &config, p))
                .map_err(|e| DispatchError::Worker(format!("failed to spawn producer {p}: {e}")))
        })
        .collect::<Result<_, _>>()?;
    for handle in producers {
        handle
            .join()
            .map_err(|_| DispatchError::Worker("producer thread panicked".into()))??;
    }
    tracing::info!("producers finished in {:?}", started.elapsed());

    let deadline = started + config.timeout();
    let expected = i64::try_from(config.expected_updates()).unwrap_or(i64::MAX);
    let mut finished = HashSet::new();
    let updates = loop {
        finished.extend(conn.drain_callback_results().into_keys());
        let updates = read_counter(&conn)?;
        let settled = updates >= expected && finished.len() >= config.expected_callbacks();
        if settled || Instant::now() >= deadline {
            break updates;
        }
        thread::sleep(Duration::from_millis(5));
    };

    let in_flight = conn.pending_work();
    if in_flight > 0 {
        tracing::warn!("timed out with {in_flight} items still queued");
    }
    let elapsed = started.elapsed();
    conn.uninitialise();

    Ok(Outcome {
        updates,
        callbacks: finished.len(),
        elapsed,
    })
}

fn read_counter(conn: &SqliteDispatcher) -> Result<i64, DispatchError> {
    Ok(conn
        .fetch("SELECT n FROM counter WHERE id = 1")?
        .and_then(|rs| rs.field(0).map(Field::get_i64))
        .unwrap_or(0))
}

fn produce(
    conn: &SqliteDispatcher,
    config: &StressConfig,
    producer: usize,
) -> Result<(), DispatchError> {
    let mut own_batch = false;
    for i in 0..config.statements {
        if config.batch_every > 0 && i % config.batch_every == 0 {
            own_batch = open_batch(conn)?;
        }
        conn.queue_execute(INCREMENT)?;
        if own_batch && (i + 1) % config.batch_every == 0 {
            conn.commit_batch()?;
            own_batch = false;
        }
    }
    if own_batch {
        conn.commit_batch()?;
    }

    for c in 0..config.callbacks {
        let id = (producer * config.callbacks + c) as CorrelationId;
        let message = Some(format!("producer {producer}"));
        conn.queue_callback_query(id, "SELECT n FROM counter", message)?;
    }
    Ok(())
}

/// Try to open a batch. Another producer's open batch collects our statements too and its
/// owner commits them, so losing the race is fine.
fn open_batch(conn: &SqliteDispatcher) -> Result<bool, DispatchError> {
    match conn.begin_batch() {
        Ok(()) => Ok(true),
        Err(DispatchError::BatchAlreadyOpen) => Ok(false),
        Err(err) => Err(err),
    }
}

fn remove_stale_files(config: &StressConfig) {
    for suffix in ["", "-wal", "-shm"] {
        let mut path = config.db.clone().into_os_string();
        path.push(suffix);
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::debug!("removed {}", path.to_string_lossy()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => tracing::warn!("could not remove {}: {err}", path.to_string_lossy()),
        }
    }
}
