//! Firmware integration tests
//!
//! Helpers for driving one synchronized link end to end on the host: a
//! fake UART side, the dispatch manager, and a hand-cranked clock.

use std::rc::Rc;

use fw_core::{FakeLink, LineSender, MessageRouter, SerialMessageManager};
use st_shared::ManualTime;

/// One link under test: router, dispatch manager, fake wire, clock.
pub struct LinkHarness {
    pub router: MessageRouter,
    pub manager: SerialMessageManager,
    pub link: FakeLink,
    pub time: ManualTime,
}

impl LinkHarness {
    pub fn new() -> Self {
        let router = MessageRouter::leaked();
        Self {
            router,
            manager: SerialMessageManager::new(router),
            link: FakeLink::new(router),
            time: ManualTime::new(),
        }
    }

    /// A producer handle for items on this link.
    pub fn sender(&self) -> Rc<LineSender> {
        self.manager.sender()
    }
}

impl Default for LinkHarness {
    fn default() -> Self {
        Self::new()
    }
}
