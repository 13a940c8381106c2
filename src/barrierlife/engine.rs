use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::coordinator::{BarrierCoordinator, Command};
use super::error::EngineError;
use super::grid::Grid;
use super::memory::SharedGridMemory;
use super::plan::PartitionPlan;
use super::rules::DEAD;
use super::worker::PartitionWorker;

const DEFAULT_DENSITY: f64 = 0.5;

/// What a spawned engine thread is. Handed to the thread's entry point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Coordinator,
    Worker(usize),
}

impl Role {
    pub fn thread_name(self) -> String {
        match self {
            Role::Coordinator => "barrier-life-coordinator".to_owned(),
            Role::Worker(i) => format!("barrier-life-worker-{i}"),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Coordinator => f.write_str("coordinator"),
            Role::Worker(i) => write!(f, "worker-{i}"),
        }
    }
}

/// How generation 0 is filled.
#[derive(Clone, Debug, PartialEq)]
pub enum SeedPolicy {
    /// Each cell independently alive with probability `density`.
    /// `seed: None` draws from OS entropy.
    Random { seed: Option<u64>, density: f64 },
    /// Row-major `N * N` plane; non-zero bytes are alive.
    Cells(Vec<u8>),
    Empty,
}

impl Default for SeedPolicy {
    fn default() -> Self {
        SeedPolicy::Random {
            seed: None,
            density: DEFAULT_DENSITY,
        }
    }
}

impl From<Grid> for SeedPolicy {
    fn from(grid: Grid) -> Self {
        SeedPolicy::Cells(grid.into_cells())
    }
}

/// Configuration for a BarrierLife engine instance.
///
/// `EngineConfig::new(n)` gives an `n * n` grid with an auto-sized worker
/// pool and random seeding; the builder methods override individual knobs.
#[derive(Clone, Debug, Default)]
pub struct EngineConfig {
    pub grid_size: usize,
    /// Number of partition workers.
    /// `None` means the largest divisor of `grid_size` not above the physical core count.
    pub worker_count: Option<usize>,
    pub seed: SeedPolicy,
    /// Fan-in deadline per round. `None` waits indefinitely.
    pub step_timeout: Option<Duration>,
}

impl EngineConfig {
    pub fn new(grid_size: usize) -> Self {
        Self {
            grid_size,
            ..Self::default()
        }
    }

    pub fn worker_count(mut self, n: usize) -> Self {
        self.worker_count = Some(n);
        self
    }

    pub fn seed(mut self, seed: impl Into<SeedPolicy>) -> Self {
        self.seed = seed.into();
        self
    }

    pub fn step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }
}

#[inline]
fn auto_worker_count_for(grid_size: usize, physical: usize) -> usize {
    let cap = physical.clamp(1, grid_size.max(1));
    (1..=cap)
        .rev()
        .find(|k| grid_size % k == 0)
        .unwrap_or(1)
}

fn resolve_worker_count(config: &EngineConfig) -> usize {
    config
        .worker_count
        .unwrap_or_else(|| auto_worker_count_for(config.grid_size, num_cpus::get_physical()))
}

fn validate(grid_size: usize, workers: usize) -> Result<(), EngineError> {
    if grid_size == 0 {
        return Err(EngineError::ZeroGridSize);
    }
    // Both planes together must be addressable.
    if grid_size
        .checked_mul(grid_size)
        .and_then(|cells| cells.checked_mul(2))
        .is_none_or(|bytes| bytes > isize::MAX as usize)
    {
        return Err(EngineError::GridTooLarge { grid_size });
    }
    if workers == 0 {
        return Err(EngineError::ZeroWorkers);
    }
    if workers > grid_size {
        return Err(EngineError::TooManyWorkers {
            grid_size,
            worker_count: workers,
        });
    }
    if grid_size % workers != 0 {
        return Err(EngineError::UnevenPartition {
            grid_size,
            worker_count: workers,
        });
    }
    Ok(())
}

fn seed_plane(grid_size: usize, policy: &SeedPolicy) -> Result<Vec<u8>, EngineError> {
    let cells = grid_size * grid_size;
    match policy {
        SeedPolicy::Random { seed, density } => {
            if !(0.0..=1.0).contains(density) {
                return Err(EngineError::InvalidDensity(*density));
            }
            let grid = match seed {
                Some(seed) => Grid::random_seeded(grid_size, *density, *seed),
                None => {
                    let mut rng = rand::rngs::StdRng::from_os_rng();
                    Grid::random(grid_size, *density, &mut rng)
                }
            };
            Ok(grid.into_cells())
        }
        SeedPolicy::Cells(plane) => {
            if plane.len() != cells {
                return Err(EngineError::SeedSizeMismatch {
                    expected: cells,
                    actual: plane.len(),
                });
            }
            Ok(plane.clone())
        }
        SeedPolicy::Empty => Ok(vec![DEAD; cells]),
    }
}

/// Spawn a named engine thread; `entry` receives the role it was spawned for.
fn spawn_role<F, T>(role: Role, entry: F) -> io::Result<JoinHandle<T>>
where
    F: FnOnce(Role) -> T + Send + 'static,
    T: Send + 'static,
{
    thread::Builder::new()
        .name(role.thread_name())
        .spawn(move || {
            let span = tracing::debug_span!("barrier_life", %role);
            let _entered = span.enter();
            entry(role)
        })
}

/// Read-only view of one published generation.
///
/// Borrows the engine, so no `step` can start while a view is alive.
#[derive(Clone, Copy)]
pub struct GenerationView<'a> {
    generation: u64,
    size: usize,
    cells: &'a [u8],
}

impl<'a> GenerationView<'a> {
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        assert!(x < self.size, "x = {x} is outside a {0}x{0} grid", self.size);
        self.cells[y * self.size + x] != DEAD
    }

    #[inline]
    pub fn row(&self, y: usize) -> &'a [u8] {
        &self.cells[y * self.size..][..self.size]
    }

    #[inline]
    pub fn as_slice(&self) -> &'a [u8] {
        self.cells
    }

    pub fn population(&self) -> u64 {
        self.cells.iter().filter(|&&c| c != DEAD).count() as u64
    }

    pub fn to_grid(&self) -> Grid {
        Grid::from_plane(self.size, self.cells.to_vec())
    }
}

impl fmt::Debug for GenerationView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationView")
            .field("generation", &self.generation)
            .field("size", &self.size)
            .field("population", &self.population())
            .finish()
    }
}

/// Handle to a running engine: K partition workers plus one coordinator.
pub struct BarrierLife {
    memory: Arc<SharedGridMemory>,
    plan: PartitionPlan,
    commands: Sender<Command>,
    coordinator: Option<JoinHandle<()>>,
}

impl BarrierLife {
    /// Validate `config`, allocate shared memory, seed generation 0 and
    /// start every thread. Configuration errors are returned before any
    /// thread is spawned.
    pub fn initialize(config: EngineConfig) -> Result<Self, EngineError> {
        let size = config.grid_size;
        let workers = resolve_worker_count(&config);
        validate(size, workers)?;
        let seed = seed_plane(size, &config.seed)?;

        let plan = PartitionPlan::row_bands(size, workers);
        let memory = Arc::new(SharedGridMemory::new(size, workers, &seed));

        let mut handles = Vec::with_capacity(workers);
        for (index, partition) in plan.iter().enumerate() {
            let worker = PartitionWorker::new(index, *partition, Arc::clone(&memory));
            let entry = move |role: Role| {
                debug_assert_eq!(role, Role::Worker(worker.index()));
                worker.run()
            };
            match spawn_role(Role::Worker(index), entry) {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    memory.close_all();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(EngineError::Spawn(err));
                }
            }
        }

        let (commands, inbox) = crossbeam_channel::bounded(1);
        let coordinator =
            BarrierCoordinator::new(Arc::clone(&memory), handles, config.step_timeout);
        // On spawn failure the closure (and the coordinator in it) is dropped,
        // which closes the flags and joins the workers.
        let coordinator = spawn_role(Role::Coordinator, move |role| {
            debug_assert_eq!(role, Role::Coordinator);
            coordinator.serve(inbox)
        })?;

        info!(
            grid_size = size,
            workers,
            timeout = ?config.step_timeout,
            "barrier-life engine started"
        );
        Ok(Self {
            memory,
            plan,
            commands,
            coordinator: Some(coordinator),
        })
    }

    /// Advance one generation. Blocks until every partition has finished it.
    pub fn step(&mut self) -> Result<GenerationView<'_>, EngineError> {
        self.advance()?;
        Ok(self.view())
    }

    /// Advance `n` generations, returning a view of the last.
    pub fn step_n(&mut self, n: u64) -> Result<GenerationView<'_>, EngineError> {
        for _ in 0..n {
            self.advance()?;
        }
        Ok(self.view())
    }

    fn advance(&mut self) -> Result<u64, EngineError> {
        let (reply, response) = crossbeam_channel::bounded(1);
        self.commands
            .send(Command::Step { reply })
            .map_err(|_| EngineError::CoordinatorGone)?;
        let generation = response.recv().map_err(|_| EngineError::CoordinatorGone)??;
        debug_assert_eq!(generation, self.memory.generation());
        Ok(generation)
    }

    /// The current generation, without stepping.
    pub fn view(&self) -> GenerationView<'_> {
        // SAFETY: rounds only run inside `advance`, which needs `&mut self`;
        // the returned view borrows `self`, so none can start while it lives.
        let cells = unsafe { self.memory.current_cells() };
        GenerationView {
            generation: self.memory.generation(),
            size: self.memory.size(),
            cells,
        }
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.memory.generation()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.memory.size()
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.plan.len()
    }

    #[inline]
    pub fn plan(&self) -> &PartitionPlan {
        &self.plan
    }

    #[inline]
    pub fn memory(&self) -> &SharedGridMemory {
        &self.memory
    }

    /// Stop every worker and the coordinator, then release shared memory.
    pub fn shutdown(mut self) -> Result<(), EngineError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        let Some(coordinator) = self.coordinator.take() else {
            return Ok(());
        };
        // A send error means the coordinator already exited; join it anyway.
        let _ = self.commands.send(Command::Shutdown);
        if coordinator.join().is_err() {
            warn!("coordinator thread panicked");
            return Err(EngineError::CoordinatorGone);
        }
        debug!(generation = self.memory.generation(), "barrier-life engine stopped");
        Ok(())
    }
}

impl Drop for BarrierLife {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
