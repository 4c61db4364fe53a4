use std::{
    io::{stdin, stdout, Write},
    process::exit,
    sync::mpsc,
    thread::{self, JoinHandle},
    time::Duration,
};

use termion::{
    event::{Event, Key, MouseButton, MouseEvent},
    input::{MouseTerminal, TermRead},
    raw::IntoRawMode,
};

use crate::{pos, CellState, FocusPolicy, Neighborhood, Pos, SimConfig, SimHandle, World};

use canvas::Canvas;
mod canvas;

pub struct View {
    thread: JoinHandle<()>,
}

impl View {
    pub fn spawn<W>(
        handle: SimHandle<W>,
        config: SimConfig,
        focus: FocusPolicy,
        tick_interval: Duration,
    ) -> Self
    where
        W: World,
    {
        let thread = thread::spawn(move || view_loop(handle, config, focus, tick_interval));
        Self { thread }
    }

    pub fn join(self) {
        self.thread.join().unwrap();
    }
}

#[derive(Debug, PartialEq)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, PartialEq)]
pub enum InputCmd {
    Exit,
    Move(Dir),
    TogglePause,
    Reset,
    ToggleBrush,
    CycleNeighborhood,
    AdjustInfectionChance(f64),
    AdjustDeathChance(f64),
    AdjustDuration(i64),
    /// Tick-interval change in milliseconds.
    AdjustTickInterval(i64),
    /// 1-based terminal cell the mouse is pressed or dragged over.
    Paint { column: u16, row: u16 },
}

fn input_loop(sender: mpsc::Sender<InputCmd>) {
    // the mouse terminal wrapper enables mouse reporting for its lifetime
    let stdout = MouseTerminal::from(stdout().into_raw_mode().unwrap());
    let mut left_held = false;
    for event in stdin().events() {
        if let Some(command) = translate(event.unwrap(), &mut left_held) {
            sender.send(command).unwrap();
        }
    }
    drop(stdout);
}

/// Maps a terminal event to a command. `Hold` events carry no button, so the
/// brush only follows drags while the left button is known to be down.
fn translate(event: Event, left_held: &mut bool) -> Option<InputCmd> {
    let command = match event {
        Event::Key(Key::Char('q')) => InputCmd::Exit,
        Event::Key(Key::Up) => InputCmd::Move(Dir::Up),
        Event::Key(Key::Down) => InputCmd::Move(Dir::Down),
        Event::Key(Key::Left) => InputCmd::Move(Dir::Left),
        Event::Key(Key::Right) => InputCmd::Move(Dir::Right),
        Event::Key(Key::Char(' ')) => InputCmd::TogglePause,
        Event::Key(Key::Char('r')) => InputCmd::Reset,
        Event::Key(Key::Char('x')) => InputCmd::ToggleBrush,
        Event::Key(Key::Char('n')) => InputCmd::CycleNeighborhood,
        Event::Key(Key::Char('[')) => InputCmd::AdjustInfectionChance(-0.05),
        Event::Key(Key::Char(']')) => InputCmd::AdjustInfectionChance(0.05),
        Event::Key(Key::Char('{')) => InputCmd::AdjustDeathChance(-0.05),
        Event::Key(Key::Char('}')) => InputCmd::AdjustDeathChance(0.05),
        Event::Key(Key::Char(',')) => InputCmd::AdjustDuration(-1),
        Event::Key(Key::Char('.')) => InputCmd::AdjustDuration(1),
        Event::Key(Key::Char('-')) => InputCmd::AdjustTickInterval(25),
        Event::Key(Key::Char('+')) | Event::Key(Key::Char('=')) => {
            InputCmd::AdjustTickInterval(-25)
        }
        Event::Mouse(MouseEvent::Press(button, column, row)) => {
            *left_held = button == MouseButton::Left;
            if !*left_held {
                return None;
            }
            InputCmd::Paint { column, row }
        }
        Event::Mouse(MouseEvent::Hold(column, row)) if *left_held => {
            InputCmd::Paint { column, row }
        }
        Event::Mouse(MouseEvent::Release(_, _)) => {
            *left_held = false;
            return None;
        }
        _ => return None,
    };
    Some(command)
}

const VIEW_REFRESH_INTERVAL: Duration = Duration::from_millis(50);

fn view_loop<W>(handle: SimHandle<W>, config: SimConfig, focus: FocusPolicy, tick_interval: Duration)
where
    W: World,
{
    let (sender, receiver) = mpsc::channel();
    let _input_handle = thread::spawn(|| input_loop(sender));

    let (width, height) = termion::terminal_size().unwrap();
    let mut ui = UiState {
        // start with the world origin at the middle of the screen
        view_origin: pos!(-i64::from(width) / 2, -i64::from(height) / 2),
        config,
        focus,
        tick_interval,
        paused: false,
        brush_infecting: true,
    };

    loop {
        handle_inputs(&receiver, &handle, &mut ui);
        let world = handle.snapshot();
        display_world(&ui, &world);
        thread::sleep(VIEW_REFRESH_INTERVAL);
    }
}

struct UiState {
    view_origin: Pos,
    config: SimConfig,
    focus: FocusPolicy,
    tick_interval: Duration,
    paused: bool,
    brush_infecting: bool,
}

const TICK_INTERVAL_BOUNDS_MS: (i64, i64) = (20, 2000);

fn handle_inputs<W>(receiver: &mpsc::Receiver<InputCmd>, handle: &SimHandle<W>, ui: &mut UiState)
where
    W: World,
{
    while let Ok(cmd) = receiver.try_recv() {
        match cmd {
            InputCmd::Exit => exit(0),
            InputCmd::Move(direction) => {
                ui.view_origin = ui.view_origin
                    + match direction {
                        Dir::Up => pos!(0, -4),
                        Dir::Down => pos!(0, 4),
                        Dir::Left => pos!(-4, 0),
                        Dir::Right => pos!(4, 0),
                    }
            }
            InputCmd::TogglePause => {
                ui.paused = !ui.paused;
                handle.toggle_pause();
            }
            InputCmd::Reset => handle.reset(ui.focus),
            InputCmd::ToggleBrush => ui.brush_infecting = !ui.brush_infecting,
            InputCmd::CycleNeighborhood => {
                ui.config.neighborhood = match ui.config.neighborhood {
                    Neighborhood::Moore => Neighborhood::VonNeumann,
                    Neighborhood::VonNeumann => Neighborhood::Moore,
                };
                handle.set_config(ui.config);
            }
            InputCmd::AdjustInfectionChance(delta) => {
                ui.config.infection_chance = (ui.config.infection_chance + delta).clamp(0.0, 1.0);
                handle.set_config(ui.config);
            }
            InputCmd::AdjustDeathChance(delta) => {
                ui.config.death_chance = (ui.config.death_chance + delta).clamp(0.0, 1.0);
                handle.set_config(ui.config);
            }
            InputCmd::AdjustDuration(delta) => {
                let duration = i64::from(ui.config.infection_duration) + delta;
                ui.config.infection_duration = duration.max(0) as u32;
                handle.set_config(ui.config);
            }
            InputCmd::AdjustTickInterval(delta) => {
                let (min, max) = TICK_INTERVAL_BOUNDS_MS;
                let ms = (ui.tick_interval.as_millis() as i64 + delta).clamp(min, max);
                ui.tick_interval = Duration::from_millis(ms as u64);
                handle.set_tick_interval(ui.tick_interval);
            }
            InputCmd::Paint { column, row } => {
                // termion reports 1-based cells; one terminal cell is one
                // world cell, so projecting is a plain offset add
                let pos = ui.view_origin + pos!(i64::from(column) - 1, i64::from(row) - 1);
                let state = if ui.brush_infecting {
                    CellState::Infected
                } else {
                    CellState::Healthy
                };
                handle.paint(pos, state);
            }
        }
    }
}

fn display_world<W>(ui: &UiState, world: &W)
where
    W: World,
{
    let mut canvas = Canvas::from_screen();
    canvas.layer(|local| match world.get(ui.view_origin + local).state {
        CellState::Healthy => None,
        CellState::Infected => Some('#'),
        CellState::Dead => Some('x'),
        CellState::Recovered => Some('o'),
    });
    canvas.display();

    let counts = world.counts();
    let neighborhood = match ui.config.neighborhood {
        Neighborhood::Moore => "moore",
        Neighborhood::VonNeumann => "von-neumann",
    };
    let status = format!(
        "infected {} dead {} recovered {} | chance {:.2} duration {} death {:.2} {} tick {}ms | {} | brush: {}",
        counts.infected,
        counts.dead,
        counts.recovered,
        ui.config.infection_chance,
        ui.config.infection_duration,
        ui.config.death_chance,
        neighborhood,
        ui.tick_interval.as_millis(),
        if ui.paused { "paused" } else { "running" },
        if ui.brush_infecting { "infect" } else { "heal" },
    );

    let (_, height) = termion::terminal_size().unwrap();
    let goto = termion::cursor::Goto(1, height);
    print!("{goto}{status}");
    stdout().flush().unwrap();
}

#[test]
fn test_only_left_button_paints() {
    let mut left_held = false;

    // right-button press and the drags that follow it do nothing
    let press = Event::Mouse(MouseEvent::Press(MouseButton::Right, 5, 5));
    assert_eq!(translate(press, &mut left_held), None);
    let hold = Event::Mouse(MouseEvent::Hold(6, 5));
    assert_eq!(translate(hold, &mut left_held), None);

    // left press paints and arms the drag
    let press = Event::Mouse(MouseEvent::Press(MouseButton::Left, 5, 5));
    assert_eq!(
        translate(press, &mut left_held),
        Some(InputCmd::Paint { column: 5, row: 5 })
    );
    let hold = Event::Mouse(MouseEvent::Hold(6, 5));
    assert_eq!(
        translate(hold, &mut left_held),
        Some(InputCmd::Paint { column: 6, row: 5 })
    );

    // release disarms it again
    let release = Event::Mouse(MouseEvent::Release(6, 5));
    assert_eq!(translate(release, &mut left_held), None);
    let hold = Event::Mouse(MouseEvent::Hold(7, 5));
    assert_eq!(translate(hold, &mut left_held), None);
}

#[test]
fn test_speed_keys_map_to_tick_adjustments() {
    let mut left_held = false;
    assert_eq!(
        translate(Event::Key(Key::Char('-')), &mut left_held),
        Some(InputCmd::AdjustTickInterval(25))
    );
    assert_eq!(
        translate(Event::Key(Key::Char('+')), &mut left_held),
        Some(InputCmd::AdjustTickInterval(-25))
    );
    assert_eq!(
        translate(Event::Key(Key::Char('=')), &mut left_held),
        Some(InputCmd::AdjustTickInterval(-25))
    );
}
