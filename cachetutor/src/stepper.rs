use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use log::debug;

/// Position within a trace of `len` steps
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StepCursor {
    len: usize,
    current: usize,
}

impl StepCursor {
    pub fn new(len: usize) -> Self {
        Self { len, current: 0 }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.len
    }

    /// Moves forward, returning false if already on the last step
    pub fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn previous(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Moves to `index`, counting from 0. Out of range indices leave the cursor where it is
    pub fn jump(&mut self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.current = index;
        true
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }
}

/// Something for the tutorial loop to react to
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Event {
    /// A line typed by the user
    Command(String),
    /// The auto-advance timer fired. Carries the generation of the run that sent it
    Tick(u64),
    InputClosed,
}

/// Fixed-delay auto-advance timer
///
/// Each run gets a new generation number and stamps its ticks with it. Pausing bumps nothing but
/// drops the run, so any tick still in flight is ignored and the step index stays put
pub struct AutoPlay {
    interval: Duration,
    generation: u64,
    running: Option<Arc<AtomicBool>>,
}

impl AutoPlay {
    pub fn new(interval: Duration) -> Self {
        Self { interval, generation: 0, running: None }
    }

    pub fn is_playing(&self) -> bool {
        self.running.is_some()
    }

    /// Starts ticking into `events`. Does nothing if already playing
    pub fn start(&mut self, events: Sender<Event>) {
        if self.running.is_some() {
            return;
        }
        self.generation += 1;
        let generation = self.generation;
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = stopped.clone();
        let interval = self.interval;
        thread::spawn(move || loop {
            thread::sleep(interval);
            if flag.load(Ordering::Acquire) || events.send(Event::Tick(generation)).is_err() {
                break;
            }
        });
        debug!("auto-advance {generation} started every {interval:?}");
        self.running = Some(stopped);
    }

    /// Stops ticking. Takes effect immediately, see [`AutoPlay::accepts`]
    pub fn pause(&mut self) {
        if let Some(stopped) = self.running.take() {
            stopped.store(true, Ordering::Release);
            debug!("auto-advance {} paused", self.generation);
        }
    }

    /// Whether a tick should move the cursor. Ticks from a paused run are stale
    pub fn accepts(&self, generation: u64) -> bool {
        self.is_playing() && generation == self.generation
    }
}

impl Drop for AutoPlay {
    fn drop(&mut self) {
        self.pause();
    }
}

/// What the loop should do after an event
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Control {
    /// Show the step at this index
    Show(usize),
    /// Nothing to redraw
    Unchanged,
    Help,
    Quit,
}

/// Interactive walk through a fixed trace. Never touches the cache
pub struct Tutorial {
    cursor: StepCursor,
    autoplay: AutoPlay,
    events: Sender<Event>,
}

impl Tutorial {
    /// # Arguments
    ///
    /// * `len`: Number of steps in the trace
    /// * `interval`: Delay between auto-advanced steps
    /// * `events`: Where the timer sends its ticks, normally the channel the loop reads
    ///
    /// returns: Tutorial
    pub fn new(len: usize, interval: Duration, events: Sender<Event>) -> Self {
        Self {
            cursor: StepCursor::new(len),
            autoplay: AutoPlay::new(interval),
            events,
        }
    }

    pub fn cursor(&self) -> &StepCursor {
        &self.cursor
    }

    pub fn is_playing(&self) -> bool {
        self.autoplay.is_playing()
    }

    pub fn play(&mut self) {
        if !self.cursor.is_last() {
            self.autoplay.start(self.events.clone());
        }
    }

    pub fn handle(&mut self, event: Event) -> Control {
        match event {
            Event::Tick(generation) => {
                if !self.autoplay.accepts(generation) {
                    return Control::Unchanged;
                }
                let moved = self.cursor.next();
                if self.cursor.is_last() {
                    self.autoplay.pause();
                }
                if moved {
                    Control::Show(self.cursor.current())
                } else {
                    Control::Unchanged
                }
            }
            Event::InputClosed => Control::Quit,
            Event::Command(command) => self.command(command.trim()),
        }
    }

    fn command(&mut self, command: &str) -> Control {
        let mut words = command.split_whitespace();
        match (words.next(), words.next()) {
            (None | Some("n" | "next"), None) => self.moved(|cursor| cursor.next()),
            (Some("p" | "prev" | "previous"), None) => self.moved(|cursor| cursor.previous()),
            (Some("j" | "jump"), Some(step)) => match step.parse::<usize>() {
                // Steps are numbered from 1 on screen
                Ok(step) if step > 0 => self.moved(|cursor| cursor.jump(step - 1)),
                _ => Control::Help,
            },
            (Some("r" | "reset"), None) => {
                self.autoplay.pause();
                self.cursor.reset();
                Control::Show(0)
            }
            (Some("play"), None) => {
                self.play();
                Control::Unchanged
            }
            (Some("pause"), None) => {
                self.autoplay.pause();
                Control::Unchanged
            }
            (Some("q" | "quit"), None) => Control::Quit,
            _ => Control::Help,
        }
    }

    fn moved(&mut self, movement: impl FnOnce(&mut StepCursor) -> bool) -> Control {
        if movement(&mut self.cursor) {
            Control::Show(self.cursor.current())
        } else {
            Control::Unchanged
        }
    }
}
