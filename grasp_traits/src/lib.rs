pub mod clock;
pub mod msg;

pub use clock::{Clock, MonotonicClock};
pub use msg::{AxisCommand, HandCommand, HandMode, HandStatus, JointSample};

/// Sink for hand command snapshots (the command channel).
pub trait HandCommander {
    fn send(&mut self, cmd: &HandCommand) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: HandCommander + ?Sized> HandCommander for Box<T> {
    fn send(&mut self, cmd: &HandCommand) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).send(cmd)
    }
}
