use std::fmt;
use std::thread;
use std::time::Duration;

use autosweep_core::*;
use serde::Serialize;

pub fn cell_glyph(view: CellView) -> char {
    use CellView::*;
    match view {
        Covered => '#',
        Flagged => 'F',
        Naked(0) => '.',
        Naked(count) => char::from(b'0' + count),
        Exploded => '*',
        Mine => 'M',
        FalseFlag => 'X',
    }
}

/// One string per row, north first.
pub fn board_rows(field: &Field) -> Vec<String> {
    let (width, height) = field.size();
    (0..height)
        .map(|y| (0..width).map(|x| cell_glyph(field.view((x, y)))).collect())
        .collect()
}

/// Prints progress to the terminal and sleeps where the emphasis asks.
///
/// Without `watch` only log records are produced and emphasis is ignored.
#[derive(Clone, Debug, Default)]
pub struct TerminalPresenter {
    emphasis: EmphasisTable,
    watch: bool,
}

impl TerminalPresenter {
    pub fn new(emphasis: EmphasisTable, watch: bool) -> Self {
        Self { emphasis, watch }
    }
}

impl Presenter for TerminalPresenter {
    fn emphasis(&self, stage: Stage) -> Emphasis {
        if self.watch {
            self.emphasis.get(stage)
        } else {
            Emphasis::default()
        }
    }

    fn pause(&mut self, millis: u32) {
        thread::sleep(Duration::from_millis(millis.into()));
    }

    fn render(&mut self, event: StepEvent<'_>, field: &Field) {
        match event {
            StepEvent::Active { queue, coords } => {
                log::trace!("{:?} queue picked {:?}", queue, coords)
            }
            StepEvent::Pair { a, b } => log::trace!("Pairing {:?} with {:?}", a, b),
            StepEvent::Batch { queue, added } => {
                log::trace!("{} added to {:?} queue", added.len(), queue)
            }
            StepEvent::Redundant { queue, removed } => {
                log::trace!("{} dropped from {:?} queue", removed.len(), queue)
            }
            StepEvent::ToFlag { cells } => log::trace!("Flagging {:?}", cells),
            StepEvent::Uncovered { .. } | StepEvent::Marked { .. } => {
                if self.watch {
                    println!("{}\n", board_rows(field).join("\n"));
                }
            }
            StepEvent::Detonated { triggered } => log::info!("Mine hit at {:?}", triggered),
            StepEvent::AllClear => log::info!("All clear"),
        }
    }
}

/// End-of-game report, printed as text or JSON.
#[derive(Clone, Debug, Serialize)]
pub struct Summary {
    pub size: Coord2,
    pub mines: CellCount,
    pub seed: u64,
    pub direction: Direction,
    pub state: EngineState,
    pub naked: CellCount,
    pub safes_left: CellCount,
    pub mines_left: isize,
    pub steps: u64,
    /// Mine layout, in the format `--replay` takes.
    pub layout: String,
    pub board: Vec<String>,
}

impl Summary {
    pub fn new<P: Presenter>(engine: &Engine<P>, seed: u64) -> Self {
        let field = engine.field();
        let layout = field
            .mine_coords()
            .iter()
            .map(|(x, y)| format!("{x},{y}"))
            .collect::<Vec<_>>()
            .join(";");
        Self {
            size: field.size(),
            mines: field.total_mines(),
            seed,
            direction: engine.direction(),
            state: engine.state(),
            naked: field.naked_count(),
            safes_left: engine.safes_left(),
            mines_left: engine.mines_left(),
            steps: engine.steps(),
            layout,
            board: board_rows(field),
        }
    }

    pub fn headline(&self) -> &'static str {
        match self.state {
            EngineState::Won => "All clear!",
            EngineState::GameOver => "Boom!",
            _ => "There are still cells to clear...",
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.board {
            writeln!(f, "{row}")?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.headline())?;
        writeln!(
            f,
            "{}x{} with {} mines, seed {}, direction {}",
            self.size.0, self.size.1, self.mines, self.seed, self.direction
        )?;
        writeln!(
            f,
            "{} safe cells left, {} mines unflagged, {} solver steps",
            self.safes_left, self.mines_left, self.steps
        )?;
        writeln!(f, "replay: --replay '{}'", self.layout)
    }
}
