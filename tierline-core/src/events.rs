use tierline_shared::models::events::DomainEvent;

/// Destination for domain events. Dispatch is synchronous and fire-and-forget:
/// the sink enqueues and returns, delivery failures never reach the caller.
pub trait EventSink: Send + Sync {
    fn dispatch(&self, event: DomainEvent);
}
