//! Test and helper mocks for grasp_core

use grasp_traits::HandCommander;
use grasp_traits::msg::HandCommand;

/// Records every published command. With `fail` set, every send errors after
/// being recorded, which exercises the publish-failure path.
#[derive(Debug, Default, Clone)]
pub struct RecordingCommander {
    pub sent: Vec<HandCommand>,
    pub fail: bool,
}

impl RecordingCommander {
    pub fn failing() -> Self {
        Self {
            sent: Vec::new(),
            fail: true,
        }
    }

    pub fn last(&self) -> Option<&HandCommand> {
        self.sent.last()
    }

    /// Drain the recorded commands.
    pub fn take(&mut self) -> Vec<HandCommand> {
        std::mem::take(&mut self.sent)
    }
}

impl HandCommander for RecordingCommander {
    fn send(&mut self, cmd: &HandCommand) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.sent.push(*cmd);
        if self.fail {
            return Err(Box::new(std::io::Error::other("command channel closed")));
        }
        Ok(())
    }
}
