use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::Context;
use chrono::Utc;
use tokio::{
    sync::Mutex,
    time::{sleep, Duration},
};
use tracing::{info, warn};

use oven_common::{CookPlan, Food};

pub const MARKER_WORKING: &str = "working";
pub const MARKER_DONE: &str = "done";

/// File-based side channel for the countdown and the fire alarm. Nothing
/// reads these back into memory; they are purely external signals.
#[derive(Clone)]
pub struct StatusStore {
    dir: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

impl StatusStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir: Arc::new(dir),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn write_cook_marker(&self, food: Food, marker: &str) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        tokio::fs::create_dir_all(self.dir.as_ref()).await?;
        let path = self.dir.join(format!("{}.cook", food.as_str()));
        tokio::fs::write(&path, marker)
            .await
            .with_context(|| format!("failed to write cook marker at {}", path.display()))?;
        Ok(())
    }

    pub async fn write_fire_alarm(&self) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        tokio::fs::create_dir_all(self.dir.as_ref()).await?;
        let path = self.dir.join("fire.alarm");
        let body = format!("triggered at {}", Utc::now().to_rfc3339());
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("failed to write fire alarm at {}", path.display()))?;
        Ok(())
    }

    #[cfg(test)]
    async fn read_cook_marker(&self, food: Food) -> Option<String> {
        tokio::fs::read_to_string(self.dir.join(format!("{}.cook", food.as_str())))
            .await
            .ok()
    }
}

struct RunningCook {
    food: Food,
    stop: Arc<AtomicBool>,
}

/// Owns the active countdown. The countdown task itself never touches the
/// appliance engine; it only writes markers through the store.
pub struct CookRunner {
    store: StatusStore,
    tick: Duration,
    grace: Duration,
    current: Option<RunningCook>,
}

impl CookRunner {
    pub fn new(store: StatusStore, tick: Duration, grace: Duration) -> Self {
        Self {
            store,
            tick,
            grace,
            current: None,
        }
    }

    /// Arming while a countdown is active supersedes it: the old run is asked
    /// to stop cooperatively and given one grace period to finalize the
    /// marker for its own food before the new run writes anything.
    pub async fn arm(&mut self, plan: CookPlan) -> anyhow::Result<()> {
        if let Some(previous) = self.current.take() {
            info!("superseding active cook for {}", previous.food.as_str());
            previous.stop.store(true, Ordering::Relaxed);
            sleep(self.grace).await;
        }

        self.store
            .write_cook_marker(plan.food, MARKER_WORKING)
            .await?;

        let stop = Arc::new(AtomicBool::new(false));
        let food = plan.food;
        tokio::spawn(countdown(
            self.store.clone(),
            plan,
            Arc::clone(&stop),
            self.tick,
        ));
        self.current = Some(RunningCook { food, stop });
        Ok(())
    }
}

async fn countdown(store: StatusStore, plan: CookPlan, stop: Arc<AtomicBool>, tick: Duration) {
    let mut remaining = plan.duration_secs;
    while remaining > 0 {
        sleep(tick).await;
        if stop.load(Ordering::Relaxed) {
            // Superseded: close out this run's own food and exit early.
            finish(&store, plan.food).await;
            return;
        }
        remaining -= 1;
    }

    info!("cook cycle for {} ran to completion", plan.food.as_str());
    finish(&store, plan.food).await;
}

async fn finish(store: &StatusStore, food: Food) {
    if let Err(err) = store.write_cook_marker(food, MARKER_DONE).await {
        warn!("cook marker write failed for {}: {err:#}", food.as_str());
    }
}
