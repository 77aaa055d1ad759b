use crate::fetch::ResourceKind;
use std::collections::HashMap;

/// Tag carried by an in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    kind: ResourceKind,
    seq: u64,
}

impl Ticket {
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

/// Hands out monotonically increasing tickets and remembers the latest one
/// per resource kind. A response is applied only if its ticket is still the
/// latest for its kind.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    next: u64,
    latest: HashMap<ResourceKind, u64>,
}

impl RequestSequencer {
    pub fn issue(&mut self, kind: ResourceKind) -> Ticket {
        self.next += 1;
        self.latest.insert(kind, self.next);
        Ticket {
            kind,
            seq: self.next,
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.get(&ticket.kind) == Some(&ticket.seq)
    }
}
