use std::{
    sync::mpsc,
    thread::{self, JoinHandle},
    time::{Duration, SystemTime},
};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{engine, Cell, CellState, FocusPolicy, Pos, SimConfig, World};

/// Commands the simulation thread serves between ticks. Every mutation of
/// the live world goes through here, so nothing interleaves with a step.
pub enum SimCmd<W>
where
    W: World,
{
    Snapshot(mpsc::Sender<W>),
    Paint(Pos, CellState),
    SetConfig(SimConfig),
    SetTickInterval(Duration),
    TogglePause,
    Reset(FocusPolicy),
}

pub struct SimHandle<W>
where
    W: World,
{
    sender: mpsc::Sender<SimCmd<W>>,
}

impl<W> SimHandle<W>
where
    W: World,
{
    pub fn new(sender: mpsc::Sender<SimCmd<W>>) -> Self {
        Self { sender }
    }

    pub fn snapshot(&self) -> W {
        let (sender, receiver) = mpsc::channel();
        self.sender.send(SimCmd::Snapshot(sender)).unwrap();
        receiver.recv().unwrap()
    }

    /// Brush edit. Painting `Infected` uses the live config's duration;
    /// painting `Healthy` erases the cell.
    pub fn paint(&self, pos: Pos, state: CellState) {
        self.sender.send(SimCmd::Paint(pos, state)).unwrap();
    }

    /// Replaces the parameters used from the next tick on.
    pub fn set_config(&self, config: SimConfig) {
        self.sender.send(SimCmd::SetConfig(config)).unwrap();
    }

    /// Changes the simulation speed; takes effect for the next tick.
    pub fn set_tick_interval(&self, interval: Duration) {
        self.sender.send(SimCmd::SetTickInterval(interval)).unwrap();
    }

    pub fn toggle_pause(&self) {
        self.sender.send(SimCmd::TogglePause).unwrap();
    }

    pub fn reset(&self, focus: FocusPolicy) {
        self.sender.send(SimCmd::Reset(focus)).unwrap();
    }
}

#[derive(Debug)]
pub struct Sim<W>
where
    W: World,
{
    thread: JoinHandle<()>,
    sender: mpsc::Sender<SimCmd<W>>,
}

impl<W> Sim<W>
where
    W: World,
{
    pub fn spawn(
        config: SimConfig,
        focus: FocusPolicy,
        seed: Option<u64>,
        tick_interval: Duration,
    ) -> Self {
        let mut rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let world: W = engine::seed(&config, focus, &mut rng);

        let (sender, receiver) = mpsc::channel();
        let thread =
            thread::spawn(move || sim_loop(receiver, world, config, tick_interval, rng));

        Self { sender, thread }
    }

    pub fn handle(&self) -> SimHandle<W> {
        let sender = self.sender.clone();
        SimHandle { sender }
    }

    pub fn join(self) {
        self.thread.join().unwrap();
    }
}

const EVT_CHECK_TIMEOUT: Duration = Duration::from_millis(10);

fn sim_loop<W>(
    receiver: mpsc::Receiver<SimCmd<W>>,
    mut world: W,
    mut config: SimConfig,
    mut tick_interval: Duration,
    mut rng: ChaCha8Rng,
) where
    W: World,
{
    let mut paused = false;
    let mut last_update = SystemTime::now();

    loop {
        while let Ok(cmd) = receiver.try_recv() {
            match cmd {
                SimCmd::Snapshot(sender) => sender.send(world.clone()).unwrap(),
                SimCmd::Paint(pos, state) => {
                    let cell = match state {
                        CellState::Healthy => Cell::healthy(),
                        CellState::Infected => Cell::infected(config.infection_duration),
                        CellState::Dead => Cell::dead(),
                        CellState::Recovered => Cell::recovered(),
                    };
                    world.set(pos, cell);
                }
                SimCmd::SetConfig(new_config) => config = new_config,
                SimCmd::SetTickInterval(interval) => tick_interval = interval,
                SimCmd::TogglePause => paused = !paused,
                SimCmd::Reset(focus) => world = engine::seed(&config, focus, &mut rng),
            }
        }

        let elapsed = SystemTime::now().duration_since(last_update).unwrap();
        if !paused && elapsed > tick_interval {
            world = engine::step(&world, &config, &mut rng);
            last_update = SystemTime::now();
        }

        thread::sleep(EVT_CHECK_TIMEOUT);
    }
}
