//! warehouse: a small robot fleet filling orders on a fixed floor.
//!
//! Usage: `warehouse [config.json]`.  The optional JSON file overrides any
//! subset of `FleetConfig` fields.  Set `RUST_LOG=debug` to follow every
//! assignment and station hand-off.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wf_core::{FleetConfig, GridPos, ProductId, RobotId, SimRng};
use wf_dispatch::{DispatchError, DispatchObserver, MemoryInventory};
use wf_fleet::FleetBuilder;
use wf_robot::Task;
use wf_spatial::FloorPlan;
use wf_station::{Station, StationKind};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:        u64   = 42;
const ORDER_COUNT: usize = 24;
const STOCK_EVERY: usize = 6;      // one restock per this many orders
const RUN_LIMIT:   Duration = Duration::from_secs(30);

// 4 robots, 2 chargers, 2 packing bays, 1 loading dock, 7 shelves.
const FLOOR: &str = "
    ; warehouse floor, row 0 at the top
    C . . . . . . . . L
    . . S S . . S S . .
    . . # # . . # # . .
    R . . . . . . . . R
    . . S S . . S . . .
    R . . . . . . . . R
    P . . . . C . . . P
";

// ── Observer ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct CountingObserver {
    completed:     AtomicUsize,
    failed:        AtomicUsize,
    pending:       AtomicUsize,
    charge_waits:  AtomicUsize,
    handoffs:      AtomicUsize,
}

impl DispatchObserver for CountingObserver {
    fn on_pending(&self, _task: &Task) {
        self.pending.fetch_add(1, Ordering::Relaxed);
    }

    fn on_finished(&self, _robot: RobotId, _task: &Task, succeeded: bool) {
        let counter = if succeeded { &self.completed } else { &self.failed };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn on_charge_waiter(&self, _robot: RobotId) {
        self.charge_waits.fetch_add(1, Ordering::Relaxed);
    }

    fn on_reserved_handoff(&self, _robot: RobotId, _station: &Station) {
        self.handoffs.fetch_add(1, Ordering::Relaxed);
    }
}

// ── Setup ─────────────────────────────────────────────────────────────────────

fn load_config() -> Result<FleetConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(FleetConfig::default());
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let config: FleetConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;
    Ok(config)
}

/// One product per shelf, product ids starting at 1.
fn stock_shelves(shelves: &[GridPos], rng: &mut SimRng) -> MemoryInventory {
    let inventory = MemoryInventory::new();
    for (i, &shelf) in shelves.iter().enumerate() {
        inventory.insert(ProductId(i as u32 + 1), shelf, rng.gen_range(4..12));
    }
    inventory
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_thread_names(true)
        .init();

    let config = load_config()?;
    let plan = FloorPlan::parse(FLOOR)?;
    println!("=== warehouse fleet ===");
    println!("{}", plan.render());
    println!(
        "Robots: {}  |  Shelves: {}  |  Orders: {ORDER_COUNT}  |  Seed: {SEED}",
        plan.robots.len(),
        plan.shelves.len()
    );
    println!();

    let mut rng = SimRng::new(SEED);
    let catalogue: Vec<ProductId> = (1..=plan.shelves.len() as u32).map(ProductId).collect();
    let robot_count = plan.robots.len();
    let inventory = Arc::new(stock_shelves(&plan.shelves, &mut rng));
    let observer = Arc::new(CountingObserver::default());

    let mut fleet = FleetBuilder::new(config, plan)
        .inventory(Arc::clone(&inventory) as _)
        .observer(Arc::clone(&observer) as _)
        .battery((0..robot_count).map(|_| rng.gen_range(35.0..100.0)).collect())
        .build()?;
    let loading = fleet
        .pool(StationKind::Loading)
        .stations()
        .first()
        .map(|s| s.id)
        .context("floor has no loading dock")?;

    fleet.start()?;
    let t0 = Instant::now();

    let mut rejected = 0;
    for i in 0..ORDER_COUNT {
        let product = *rng.choose(&catalogue).context("floor has no shelves")?;
        match fleet.create_order(product, rng.gen_range(1..=3)) {
            Ok(_) => {}
            Err(err @ DispatchError::InsufficientStock { .. }) => {
                rejected += 1;
                warn!(error = %err, "order rejected");
            }
            Err(err) => return Err(err.into()),
        }
        if (i + 1) % STOCK_EVERY == 0 {
            let product = *rng.choose(&catalogue).context("floor has no shelves")?;
            fleet.create_stock(loading, product, 5)?;
        }
    }

    let drained = fleet.wait_idle(RUN_LIMIT);
    let elapsed = t0.elapsed();
    if !drained {
        warn!(pending = fleet.pending_tasks().len(), "run limit reached with work outstanding");
    }
    fleet.shutdown();
    info!(secs = elapsed.as_secs_f64(), "run finished");

    // ── Summary ───────────────────────────────────────────────────────────
    println!();
    println!("Run complete in {:.3} s", elapsed.as_secs_f64());
    println!("  tasks completed : {}", observer.completed.load(Ordering::Relaxed));
    println!("  tasks failed    : {}", observer.failed.load(Ordering::Relaxed));
    println!("  times pending   : {}", observer.pending.load(Ordering::Relaxed));
    println!("  charge waiters  : {}", observer.charge_waits.load(Ordering::Relaxed));
    println!("  charger handoffs: {}", observer.handoffs.load(Ordering::Relaxed));
    println!("  orders rejected : {rejected}");
    println!();

    println!("{:<8} {:<10} {:>8}  {:<20}", "Robot", "Position", "Battery", "State");
    println!("{}", "-".repeat(50));
    for robot in fleet.robots() {
        let status = robot.snapshot();
        println!(
            "{:<8} {:<10} {:>7.1}%  {:<20}",
            robot.id().0,
            status.position.to_string(),
            status.battery,
            status.state,
        );
    }
    println!();

    println!("{:<10} {:>8}", "Product", "Stock");
    println!("{}", "-".repeat(19));
    for (product, quantity) in inventory.snapshot() {
        println!("{:<10} {:>8}", product.0, quantity);
    }

    Ok(())
}
