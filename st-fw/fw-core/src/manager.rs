//! Envelope dispatch for one serial link.

extern crate alloc;

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use hashbrown::HashMap;
use log::{debug, warn};
use st_shared::RxHandler;
use st_sync::serializer;
use st_sync::DecodeStats;

use crate::message_router::{LineSender, MessageRouter};

/// One unmatched-name warning per this many drops.
const UNMATCHED_WARN_EVERY: u32 = 16;

/// Per-link message manager: decodes inbound lines and dispatches each
/// envelope to the one registered handler whose name matches.
///
/// The manager references the link's router; it does not own the link.
/// Handlers are shared with the application (`Rc<RefCell<_>>`), so the same
/// value can be read locally and updated from the wire. An envelope whose
/// name matches no handler is dropped and counted: no buffering, no retry.
pub struct SerialMessageManager {
    router: MessageRouter,
    handlers: HashMap<String, Rc<RefCell<dyn RxHandler>>>,
    stats: DecodeStats,
    unmatched: u32,
}

impl SerialMessageManager {
    pub fn new(router: MessageRouter) -> Self {
        Self {
            router,
            handlers: HashMap::new(),
            stats: DecodeStats::new(),
            unmatched: 0,
        }
    }

    /// A new producer handle onto this link's outbound queue.
    pub fn sender(&self) -> Rc<LineSender> {
        Rc::new(LineSender::new(self.router))
    }

    /// Register `handler` under its own name, replacing any previous
    /// registration of that name.
    pub fn register(&mut self, handler: Rc<RefCell<dyn RxHandler>>) {
        let name = String::from(handler.borrow().name());
        if self.handlers.insert(name.clone(), handler).is_some() {
            warn!("handler {} re-registered", name);
        }
    }

    pub fn deregister(&mut self, name: &str) {
        self.handlers.remove(name);
    }

    /// Drain the inbound queue, decoding and dispatching every line.
    ///
    /// Returns the number of envelopes delivered to a handler.
    pub fn poll(&mut self) -> usize {
        let lines: Vec<String> = self.router.receive_all();
        let mut delivered = 0;
        for line in lines {
            let envelope = match serializer::deserialize_envelope(&line) {
                Ok(envelope) => {
                    self.stats.record_ok();
                    envelope
                }
                Err(e) => {
                    self.stats.record_failure(&e);
                    continue;
                }
            };
            match self.handlers.get(&envelope.name) {
                Some(handler) => {
                    handler.borrow_mut().on_envelope(&envelope);
                    delivered += 1;
                }
                None => {
                    self.unmatched = self.unmatched.wrapping_add(1);
                    if self.unmatched % UNMATCHED_WARN_EVERY == 1 {
                        warn!(
                            "no handler for {:?} ({} unmatched so far)",
                            envelope.name, self.unmatched
                        );
                    } else {
                        debug!("no handler for {:?}", envelope.name);
                    }
                }
            }
        }
        delivered
    }

    /// Decode statistics for this link.
    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    /// Envelopes dropped for want of a matching handler.
    pub fn unmatched(&self) -> u32 {
        self.unmatched
    }
}
