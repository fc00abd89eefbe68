use alloc::vec::Vec;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    #[default]
    Idle,
    Draining(QueueKind),
    GameOver,
    Won,
}

impl EngineState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::GameOver | Self::Won)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Solve the Block of every newly naked or re-flagged neighborhood.
    pub auto_solve: bool,
    /// Pair up cells the Block rules could not decide.
    pub hyper_solve: bool,
    /// Queue steps one command may take before propagation is abandoned.
    pub step_limit: Option<u64>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            auto_solve: true,
            hyper_solve: true,
            step_limit: None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Status {
    Playing,
    Lost,
    Won,
}

/// Hyper queue head waiting to be paired with the entries that were queued
/// alongside it. Partners are popped from the back.
#[derive(Clone, Debug)]
struct Pairing {
    head: Coord2,
    partners: Vec<Coord2>,
}

/// Runs one game: player commands plus the solver that propagates them.
///
/// Three queues feed the solver, drained by strict priority: `clear` (cells
/// to uncover), `auto` (naked cells whose Block should be solved) and
/// `hyper` (naked cells left for pairwise solving). A drain in progress is
/// marked busy and sits on an explicit stack; after every step the engine
/// checks whether a higher priority queue needs to start, so the stack never
/// holds the same queue twice.
#[derive(Debug)]
pub struct Engine<P = NullPresenter> {
    field: Field,
    options: EngineOptions,
    selector: DirectionSelector,
    clear_queue: WorkQueue,
    auto_queue: WorkQueue,
    hyper_queue: WorkQueue,
    drains: SmallVec<[QueueKind; 3]>,
    pairing: Option<Pairing>,
    status: Status,
    rng: SmallRng,
    steps: u64,
    presenter: P,
}

impl Engine {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self::with_presenter(config, seed, NullPresenter)
    }

    /// Replays a fixed mine layout instead of placing mines randomly.
    pub fn replay(size: Coord2, mine_coords: &[Coord2], seed: u64) -> Result<Self> {
        Self::replay_with_presenter(size, mine_coords, seed, NullPresenter)
    }
}

impl<P: Presenter> Engine<P> {
    pub fn with_presenter(config: GameConfig, seed: u64, presenter: P) -> Self {
        Self::from_field(Field::new(config), seed, presenter)
    }

    pub fn replay_with_presenter(
        size: Coord2,
        mine_coords: &[Coord2],
        seed: u64,
        presenter: P,
    ) -> Result<Self> {
        let field = Field::with_mines(size, mine_coords)?;
        Ok(Self::from_field(field, seed, presenter))
    }

    fn from_field(field: Field, seed: u64, presenter: P) -> Self {
        let selector = DirectionSelector::default();
        Self {
            field,
            options: EngineOptions::default(),
            clear_queue: WorkQueue::new(QueueKind::Clear, selector.clone()),
            auto_queue: WorkQueue::new(QueueKind::Auto, selector.clone()),
            hyper_queue: WorkQueue::new(QueueKind::Hyper, selector.clone()),
            selector,
            drains: SmallVec::new(),
            pairing: None,
            status: Status::Playing,
            rng: SmallRng::seed_from_u64(seed),
            steps: 0,
            presenter,
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_direction(self, direction: Direction) -> Self {
        self.selector.set(direction);
        self
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub fn set_options(&mut self, options: EngineOptions) {
        self.options = options;
    }

    /// Handle on the live direction; changes apply from the next pick on.
    pub fn direction_selector(&self) -> DirectionSelector {
        self.selector.clone()
    }

    pub fn direction(&self) -> Direction {
        self.selector.get()
    }

    pub fn set_direction(&self, direction: Direction) {
        self.selector.set(direction);
    }

    pub fn queue(&self, kind: QueueKind) -> &WorkQueue {
        match kind {
            QueueKind::Clear => &self.clear_queue,
            QueueKind::Auto => &self.auto_queue,
            QueueKind::Hyper => &self.hyper_queue,
        }
    }

    fn queue_mut(&mut self, kind: QueueKind) -> &mut WorkQueue {
        match kind {
            QueueKind::Clear => &mut self.clear_queue,
            QueueKind::Auto => &mut self.auto_queue,
            QueueKind::Hyper => &mut self.hyper_queue,
        }
    }

    pub fn state(&self) -> EngineState {
        match (self.status, self.drains.last()) {
            (Status::Lost, _) => EngineState::GameOver,
            (Status::Won, _) => EngineState::Won,
            (Status::Playing, Some(&kind)) => EngineState::Draining(kind),
            (Status::Playing, None) => EngineState::Idle,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.status == Status::Lost
    }

    pub fn is_won(&self) -> bool {
        self.status == Status::Won
    }

    pub fn is_finished(&self) -> bool {
        self.status != Status::Playing
    }

    /// Mines not yet flagged. Negative when there are more flags than mines.
    pub fn mines_left(&self) -> isize {
        (self.field.total_mines() as isize) - (self.field.flagged_count() as isize)
    }

    pub fn safes_left(&self) -> CellCount {
        self.field
            .safe_cell_count()
            .saturating_sub(self.field.naked_count())
    }

    /// Queue steps taken over the whole game.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn into_presenter(self) -> P {
        self.presenter
    }

    pub fn uncover(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.field.validate_coords(coords)?;
        let outcome = self.uncover_cell(coords);
        self.propagate();
        Ok(self.settle(outcome))
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        let coords = self.field.validate_coords(coords)?;
        let outcome = self.toggle_flag_cell(coords);
        self.propagate();
        Ok(outcome)
    }

    /// Solves the Block around a naked cell, uncovers anything else.
    pub fn left_click(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.field.validate_coords(coords)?;
        if self.is_finished() {
            return Ok(RevealOutcome::NoChange);
        }
        if !self.field[coords].is_naked() {
            return self.uncover(coords);
        }

        let naked_before = self.field.naked_count();
        self.solve_block_at(coords);
        self.propagate();
        let outcome = if self.field.naked_count() != naked_before {
            RevealOutcome::Revealed
        } else {
            RevealOutcome::NoChange
        };
        Ok(self.settle(outcome))
    }

    /// Runs single-cell deduction around a naked `center`.
    pub fn solve_block(&mut self, center: Coord2) -> Result<()> {
        let center = self.field.validate_coords(center)?;
        if self.field[center].is_naked() {
            self.solve_block_at(center);
            self.propagate();
        }
        Ok(())
    }

    /// Runs pairwise deduction on two naked cells.
    pub fn solve_neighborhood(&mut self, a: Coord2, b: Coord2) -> Result<()> {
        let a = self.field.validate_coords(a)?;
        let b = self.field.validate_coords(b)?;
        if self.is_finished() || !self.field[a].is_naked() || !self.field[b].is_naked() {
            return Ok(());
        }
        if let Some(hood) = Neighborhood::new(&self.field, a, b) {
            self.apply_neighborhood(&hood);
            self.propagate();
        }
        Ok(())
    }

    /// Drains whatever is still queued, e.g. after turning solvers back on.
    pub fn run(&mut self) {
        self.propagate();
    }

    fn settle(&self, outcome: RevealOutcome) -> RevealOutcome {
        if !outcome.has_update() {
            return outcome;
        }
        outcome
            | match self.status {
                Status::Lost => RevealOutcome::HitMine,
                Status::Won => RevealOutcome::Won,
                Status::Playing => RevealOutcome::NoChange,
            }
    }

    fn uncover_cell(&mut self, coords: Coord2) -> RevealOutcome {
        self.clear_queue.remove(coords);
        if self.is_finished() {
            return RevealOutcome::NoChange;
        }
        let cell = self.field[coords];
        if cell.is_naked() || cell.is_flagged() {
            return RevealOutcome::NoChange;
        }

        if !self.field.mines_placed() {
            self.field.place_mines(coords, &mut self.rng);
        }
        self.field.uncover(coords);
        self.presenter
            .render(StepEvent::Uncovered { coords }, &self.field);

        if self.field.is_triggered() {
            self.lose(coords);
            return RevealOutcome::HitMine;
        }
        if self.field.is_all_clear() {
            self.status = Status::Won;
            log::debug!("All clear after uncovering {:?}", coords);
            self.presenter.render(StepEvent::AllClear, &self.field);
            return RevealOutcome::Won;
        }

        let block = Block::new(&self.field, coords);
        if self.field[coords].surrounding_mines() == 0 {
            self.enqueue(QueueKind::Clear, block.unknown());
        } else if self.options.auto_solve {
            let mut useful: NeighborSet = block.naked().iter().copied().collect();
            useful.push(coords);
            for &pos in &useful {
                self.hyper_queue.remove(pos);
            }
            self.enqueue(QueueKind::Auto, &useful);
            self.clean_up(QueueKind::Auto);
            self.clean_up(QueueKind::Hyper);
        }
        RevealOutcome::Revealed
    }

    fn toggle_flag_cell(&mut self, coords: Coord2) -> MarkOutcome {
        if self.is_finished() {
            return MarkOutcome::NoChange;
        }
        let outcome = self.field.toggle_flag(coords);
        if !outcome.has_update() {
            return outcome;
        }
        self.presenter
            .render(StepEvent::Marked { coords, outcome }, &self.field);

        if self.options.auto_solve {
            let useful: NeighborSet = self
                .field
                .neighbors(coords)
                .filter(|&pos| self.field[pos].is_naked() && self.field.has_unknown_neighbors(pos))
                .collect();
            for &pos in &useful {
                self.hyper_queue.remove(pos);
            }
            self.enqueue(QueueKind::Auto, &useful);
        }
        outcome
    }

    fn solve_block_at(&mut self, center: Coord2) {
        if self.is_finished() {
            return;
        }
        let block = Block::new(&self.field, center);
        let decision = block.solve();
        log::trace!("Block {:?} solved as {:?}", center, decision);

        match decision {
            Decision::Clear => self.enqueue(QueueKind::Clear, block.unknown()),
            Decision::Flag => self.flag_all(block.unknown()),
            Decision::Unknown => {
                if !self.options.hyper_solve || self.hyper_queue.contains(center) {
                    return;
                }
                let mut leftovers: NeighborSet = SmallVec::new();
                leftovers.push(center);
                for &pos in block.naked() {
                    if self.hyper_queue.contains(pos) || self.auto_queue.contains(pos) {
                        continue;
                    }
                    if self.field.has_unknown_neighbors(pos) {
                        leftovers.push(pos);
                    }
                }
                let added: NeighborSet = leftovers
                    .into_iter()
                    .filter(|&pos| self.hyper_queue.append(pos))
                    .collect();
                self.presenter.render(
                    StepEvent::Batch {
                        queue: QueueKind::Hyper,
                        added: &added,
                    },
                    &self.field,
                );
            }
        }
    }

    fn apply_neighborhood(&mut self, hood: &Neighborhood) {
        if self.is_finished() {
            return;
        }
        let deduction = hood.solve();
        if deduction.is_empty() {
            return;
        }
        log::trace!(
            "Pair {:?}/{:?} clears {:?}, flags {:?}",
            hood.a().center(),
            hood.b().center(),
            deduction.clear,
            deduction.flag
        );
        self.enqueue(QueueKind::Clear, &deduction.clear);
        self.flag_all(&deduction.flag);
    }

    /// Flags every still unknown cell of `cells`, one at a time, in the order
    /// the live direction would process them.
    fn flag_all(&mut self, cells: &[Coord2]) {
        let mut to_flag: NeighborSet = cells
            .iter()
            .copied()
            .filter(|&pos| self.field[pos].is_unknown())
            .collect();
        if to_flag.is_empty() {
            return;
        }
        self.selector.get().orient(&mut to_flag, &mut self.rng);
        self.presenter
            .render(StepEvent::ToFlag { cells: &to_flag }, &self.field);
        self.emphasize(Stage::ToFlag);

        while let Some(index) = self.selector.get().pick(to_flag.len()) {
            let pos = to_flag.remove(index);
            if self.field[pos].is_unknown() {
                self.toggle_flag_cell(pos);
            }
        }
    }

    fn enqueue(&mut self, kind: QueueKind, batch: &[Coord2]) {
        let queue = match kind {
            QueueKind::Clear => &mut self.clear_queue,
            QueueKind::Auto => &mut self.auto_queue,
            QueueKind::Hyper => &mut self.hyper_queue,
        };
        let added = queue.add_batch(batch.iter().copied(), &mut self.rng);
        if added.is_empty() {
            return;
        }
        self.presenter.render(
            StepEvent::Batch {
                queue: kind,
                added: &added,
            },
            &self.field,
        );
        self.emphasize(Stage::AddBatch);
    }

    fn clean_up(&mut self, kind: QueueKind) {
        let queue = match kind {
            QueueKind::Clear => &mut self.clear_queue,
            QueueKind::Auto => &mut self.auto_queue,
            QueueKind::Hyper => &mut self.hyper_queue,
        };
        let removed = queue.clean_up(&self.field);
        if removed.is_empty() {
            return;
        }
        self.presenter.render(
            StepEvent::Redundant {
                queue: kind,
                removed: &removed,
            },
            &self.field,
        );
        self.emphasize(Stage::Redundant);
    }

    fn emphasize(&mut self, stage: Stage) {
        if let Some(millis) = self.presenter.emphasis(stage).pause_for() {
            self.presenter.pause(millis);
        }
    }

    fn lose(&mut self, triggered: Coord2) {
        self.status = Status::Lost;
        self.halt();
        log::debug!("Mine triggered at {:?}", triggered);
        self.presenter
            .render(StepEvent::Detonated { triggered }, &self.field);
    }

    /// Empties every queue and forgets all drains in progress.
    fn halt(&mut self) {
        for queue in [
            &mut self.clear_queue,
            &mut self.auto_queue,
            &mut self.hyper_queue,
        ] {
            queue.clear();
            queue.set_busy(false);
        }
        self.drains.clear();
        self.pairing = None;
    }

    /// Starts draining the most urgent queue that is allowed to start.
    fn spark(&mut self) {
        let clear_busy = self.clear_queue.is_busy();
        let auto_busy = self.auto_queue.is_busy();
        let hyper_busy = self.hyper_queue.is_busy();

        let next = if !self.clear_queue.is_empty() && !clear_busy {
            QueueKind::Clear
        } else if !self.auto_queue.is_empty() && !clear_busy && !auto_busy {
            QueueKind::Auto
        } else if !self.hyper_queue.is_empty() && !clear_busy && !auto_busy && !hyper_busy {
            QueueKind::Hyper
        } else {
            return;
        };

        self.queue_mut(next).set_busy(true);
        self.drains.push(next);
        log::trace!("Draining {:?} queue", next);
    }

    fn propagate(&mut self) {
        let mut run_steps: u64 = 0;
        while self.status != Status::Lost {
            self.spark();
            let Some(&kind) = self.drains.last() else {
                break;
            };

            if let Some(limit) = self.options.step_limit {
                if run_steps >= limit {
                    log::warn!("Propagation abandoned after {} steps", run_steps);
                    self.halt();
                    break;
                }
            }

            if self.step(kind) {
                run_steps += 1;
                self.steps += 1;
            } else {
                self.queue_mut(kind).set_busy(false);
                self.drains.pop();
                log::trace!("{:?} queue exhausted", kind);
            }
        }
    }

    /// Processes one entry of `kind`. Returns `false` once it is exhausted.
    /// After a win, leftover entries are only removed.
    fn step(&mut self, kind: QueueKind) -> bool {
        if kind == QueueKind::Hyper {
            return self.step_hyper();
        }

        let queue = match kind {
            QueueKind::Clear => &mut self.clear_queue,
            _ => &mut self.auto_queue,
        };
        queue.re_orient(&mut self.rng);
        let Some(coords) = queue.select() else {
            return false;
        };
        if !self.is_finished() {
            self.presenter
                .render(StepEvent::Active { queue: kind, coords }, &self.field);
            self.emphasize(Stage::of(kind));
        }

        if kind == QueueKind::Clear {
            self.uncover_cell(coords);
        } else {
            self.auto_queue.remove(coords);
            self.solve_block_at(coords);
        }
        true
    }

    fn step_hyper(&mut self) -> bool {
        if let Some(pairing) = &mut self.pairing {
            if let Some(partner) = pairing.partners.pop() {
                let head = pairing.head;
                if self.is_finished() {
                    return true;
                }
                if let Some(hood) = Neighborhood::new(&self.field, head, partner) {
                    self.presenter.render(
                        StepEvent::Pair {
                            a: head,
                            b: partner,
                        },
                        &self.field,
                    );
                    self.emphasize(Stage::HyperQueue);
                    self.apply_neighborhood(&hood);
                }
                return true;
            }
            self.pairing = None;
        }

        self.hyper_queue.re_orient(&mut self.rng);
        let Some(head) = self.hyper_queue.select() else {
            return false;
        };
        self.hyper_queue.remove(head);
        if self.is_finished() {
            return true;
        }
        self.presenter.render(
            StepEvent::Active {
                queue: QueueKind::Hyper,
                coords: head,
            },
            &self.field,
        );
        self.pairing = Some(Pairing {
            head,
            partners: self.hyper_queue.as_slice().to_vec(),
        });
        true
    }
}
