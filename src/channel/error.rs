quick_error! {
    /// Misuse of the publish/subscribe contract
    #[derive(Debug)]
    pub enum ChannelError {
        /// `request(n)` was called with `n <= 0`
        InvalidDemand(n: i64) {
            display("non-positive demand requested: {}", n)
        }
        /// An item was emitted while no demand was outstanding
        DemandExceeded {
            display("item emitted without outstanding demand")
        }
        /// The publisher already has a sink
        AlreadySubscribed {
            display("publisher supports a single subscriber")
        }
        /// Subscription was cancelled by the sink
        Cancelled {
            display("subscription is cancelled")
        }
        /// Terminal signal was already emitted
        Finished {
            display("publisher is already finished")
        }
    }
}
