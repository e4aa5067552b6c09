use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("streamchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter =
    Counter::new("streamchat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("streamchat.client.request_duration_seconds");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("streamchat.stream.chunks");
pub(crate) static STREAM_SKIPPED_EVENTS: Counter =
    Counter::new("streamchat.stream.skipped_events");
pub(crate) static STREAM_BYTES: Counter = Counter::new("streamchat.stream.bytes");

pub(crate) static CONSUMER_REQUESTS: Counter = Counter::new("streamchat.consumer.requests");
pub(crate) static CONSUMER_FRAGMENTS: Counter = Counter::new("streamchat.consumer.fragments");
pub(crate) static CONSUMER_ERRORS: Counter = Counter::new("streamchat.consumer.errors");
pub(crate) static CONSUMER_TTFF: Moments =
    Moments::new("streamchat.consumer.time_to_first_fragment_seconds");

pub(crate) static SESSION_EXCHANGES: Counter = Counter::new("streamchat.session.exchanges");
pub(crate) static SESSION_FAILED_EXCHANGES: Counter =
    Counter::new("streamchat.session.failed_exchanges");
pub(crate) static SESSION_RESETS: Counter = Counter::new("streamchat.session.resets");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_SKIPPED_EVENTS);
    collector.register_counter(&STREAM_BYTES);

    collector.register_counter(&CONSUMER_REQUESTS);
    collector.register_counter(&CONSUMER_FRAGMENTS);
    collector.register_counter(&CONSUMER_ERRORS);
    collector.register_moments(&CONSUMER_TTFF);

    collector.register_counter(&SESSION_EXCHANGES);
    collector.register_counter(&SESSION_FAILED_EXCHANGES);
    collector.register_counter(&SESSION_RESETS);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_all_biometrics() {
        register_biometrics(Collector::new());
    }
}
