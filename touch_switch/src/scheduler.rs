//! Deferred tasks run by a cooperative tick.
//!
//! Nothing here sleeps or spawns: a task is a due-time and a kind, and
//! [`Scheduler::take_due`] hands back whatever has come due by `now`.  The
//! caller runs it and re-arms it if it wants to repeat.

/// The kinds of deferred work a switch schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Proximity check of the liveness gate; re-armed every interval.
    LivenessCheck,
    /// One-shot check run shortly after start.
    PostStart,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScheduledTask {
    due:  f32,
    kind: TaskKind,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    pub fn new() -> Self { Self::default() }

    /// Queue `kind` to run at time `due`.
    pub fn schedule(&mut self, kind: TaskKind, due: f32) {
        self.tasks.push(ScheduledTask { due, kind });
    }

    /// Remove and return every task due at or before `now`, earliest first.
    pub fn take_due(&mut self, now: f32) -> Vec<TaskKind> {
        let mut due: Vec<ScheduledTask> = Vec::new();
        self.tasks.retain(|t| {
            if t.due <= now {
                due.push(*t);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due.total_cmp(&b.due));
        due.into_iter().map(|t| t.kind).collect()
    }

    /// Due-time of the next pending task of `kind`.
    pub fn next_due(&self, kind: TaskKind) -> Option<f32> {
        self.tasks
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.due)
            .min_by(|a, b| a.total_cmp(b))
    }

    pub fn is_empty(&self) -> bool { self.tasks.is_empty() }
}
