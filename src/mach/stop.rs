use super::Address;
use std::rc::Rc;
use tracing::trace;

/// Why the machine wants to stop running, with whatever the host
/// needs to service the request.
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// Wait for frame flyback.
    Frame,
    /// A sound channel's queue is full.
    Sound,
    /// Wait for a console reply.
    Input { prompt: Rc<str> },
    /// STOP statement: halt but keep a continue point.
    Stop,
    /// END statement or the program ran off its end.
    End,
    /// The break key with ON BREAK STOP in effect.
    Break,
    /// The escape key.
    Escape,
    Load { name: Rc<str>, run: bool },
    Chain { name: Rc<str>, merge: bool, line: Option<u16> },
    Save { name: Rc<str> },
    /// NEW: throw the whole machine state away.
    New,
}

impl StopReason {
    pub fn priority(&self) -> u8 {
        use StopReason::*;
        match self {
            Frame => 20,
            Sound => 43,
            Input { .. } => 45,
            Stop | End => 60,
            Break => 80,
            Escape => 85,
            Load { .. } | Chain { .. } | Save { .. } => 90,
            New => 99,
        }
    }
}

/// One suspend request. `resume` is the dispatch address to re-enter
/// at when the wait is satisfied (the suspending op itself for
/// retried waits like INPUT and SOUND).
#[derive(Debug, Clone, PartialEq)]
pub struct StopRecord {
    pub reason: StopReason,
    pub resume: Option<Address>,
}

/// ## The stop-record holder
///
/// At most one suspend request exists at a time. A new request
/// overwrites the current one only when its priority is
/// greater-or-equal, or when forced; the displaced record is
/// snapshotted so a cancelled wait can be resumed later (CONT).

#[derive(Debug, Default)]
pub struct Stop {
    current: Option<StopRecord>,
    saved: Option<StopRecord>,
}

impl Stop {
    pub fn new() -> Stop {
        Stop::default()
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.saved = None;
    }

    pub fn is_set(&self) -> bool {
        self.current.is_some()
    }

    pub fn reason(&self) -> Option<&StopReason> {
        self.current.as_ref().map(|r| &r.reason)
    }

    /// Priority-gated overwrite. Returns whether the request won.
    pub fn submit(&mut self, record: StopRecord) -> bool {
        match &self.current {
            Some(current) if record.reason.priority() < current.reason.priority() => {
                trace!(
                    new = ?record.reason,
                    current = ?current.reason,
                    "stop request refused"
                );
                false
            }
            _ => {
                trace!(new = ?record.reason, "stop request accepted");
                self.saved = self.current.take();
                self.current = Some(record);
                true
            }
        }
    }

    /// Unconditional overwrite.
    pub fn force(&mut self, record: StopRecord) {
        self.saved = self.current.take();
        self.current = Some(record);
    }

    /// Hand the current record to the driver loop, clearing it.
    pub fn take(&mut self) -> Option<StopRecord> {
        self.current.take()
    }

    /// The snapshot of whatever the last accepted request displaced.
    pub fn take_saved(&mut self) -> Option<StopRecord> {
        self.saved.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> StopRecord {
        StopRecord {
            reason: StopReason::Frame,
            resume: None,
        }
    }

    fn escape() -> StopRecord {
        StopRecord {
            reason: StopReason::Escape,
            resume: None,
        }
    }

    fn input(resume: Address) -> StopRecord {
        StopRecord {
            reason: StopReason::Input { prompt: "? ".into() },
            resume: Some(resume),
        }
    }

    #[test]
    fn test_escape_wins_either_order() {
        let mut stop = Stop::new();
        assert!(stop.submit(frame()));
        assert!(stop.submit(escape()));
        assert_eq!(stop.reason(), Some(&StopReason::Escape));

        let mut stop = Stop::new();
        assert!(stop.submit(escape()));
        assert!(!stop.submit(frame()));
        assert_eq!(stop.reason(), Some(&StopReason::Escape));
    }

    #[test]
    fn test_file_wait_outranks_escape() {
        let mut stop = Stop::new();
        assert!(stop.submit(StopRecord {
            reason: StopReason::Save { name: "X".into() },
            resume: None,
        }));
        assert!(!stop.submit(escape()));
    }

    #[test]
    fn test_equal_priority_overwrites() {
        let mut stop = Stop::new();
        assert!(stop.submit(frame()));
        assert!(stop.submit(frame()));
    }

    #[test]
    fn test_displaced_wait_is_snapshotted() {
        let mut stop = Stop::new();
        assert!(stop.submit(input(42)));
        assert!(stop.submit(escape()));
        let saved = stop.take_saved().unwrap();
        assert_eq!(saved.resume, Some(42));
    }

    #[test]
    fn test_force_ignores_priority() {
        let mut stop = Stop::new();
        assert!(stop.submit(escape()));
        stop.force(frame());
        assert_eq!(stop.reason(), Some(&StopReason::Frame));
    }
}
