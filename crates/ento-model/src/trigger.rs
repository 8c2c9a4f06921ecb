/// `BEFORE`/`AFTER` placement of a trigger relative to its event (§6
/// "Triggers").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTiming {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
}

impl TriggerEvent {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            TriggerEvent::Insert => "INSERT",
            TriggerEvent::Update => "UPDATE",
            TriggerEvent::Delete => "DELETE",
        }
    }
}

/// A row-level trigger declared on an entity (§4.3 "an `UpdatedTime` field
/// registers a PostgreSQL trigger on its entity", §6 "Triggers"). The DDL
/// compiler derives the trigger's backing function name from `name`,
/// `when`, and `body` (§6: `YT-<Table>-<trigger>-<whenHash>-<bodyHash>`), so
/// editing either forces a drop+recreate of both on the next sync.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub name: String,
    pub timing: TriggerTiming,
    pub events: Vec<TriggerEvent>,
    pub when: Option<String>,
    pub body: String,
}

impl Trigger {
    pub fn new(name: impl Into<String>, timing: TriggerTiming, events: Vec<TriggerEvent>, body: impl Into<String>) -> Self {
        Trigger {
            name: name.into(),
            timing,
            events,
            when: None,
            body: body.into(),
        }
    }

    pub fn with_when(mut self, when: impl Into<String>) -> Self {
        self.when = Some(when.into());
        self
    }
}
