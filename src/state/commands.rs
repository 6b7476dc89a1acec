//! Command types for inter-thread communication.
//!
//! Save commands are sent to the mapping worker via an mpsc channel; each
//! command carries a oneshot-style channel for the response so service
//! callers get a synchronous answer.

use std::path::PathBuf;
use std::sync::mpsc;

/// Commands handled by the mapping worker.
#[derive(Debug)]
pub enum MapCommand {
    /// Save the assembled map as a point cloud under `dir`.
    SaveMap {
        /// Target directory; created if missing.
        dir: PathBuf,
    },

    /// Save every submap as its own point cloud under `dir`.
    SaveSubmaps {
        /// Target directory; created if missing.
        dir: PathBuf,
    },
}

/// Result of a command execution.
pub type CommandResult = Result<CommandResponse, String>;

/// Response data from command execution.
#[derive(Debug, Clone)]
pub enum CommandResponse {
    /// Map saved successfully.
    MapSaved {
        /// Path of the written file.
        path: String,
    },

    /// Submaps saved successfully.
    SubmapsSaved {
        /// Number of submap files written.
        count: usize,
        /// Directory the files were written to.
        dir: String,
    },
}

/// Command with response channel for acknowledgment.
pub struct CommandWithResponse {
    /// The command to execute.
    pub command: MapCommand,
    /// Channel to send response back.
    pub response_tx: mpsc::Sender<CommandResult>,
}

impl std::fmt::Debug for CommandWithResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandWithResponse")
            .field("command", &self.command)
            .field("response_tx", &"...")
            .finish()
    }
}

/// Sender end of the command channel (held by the service side).
pub type CommandSender = mpsc::Sender<CommandWithResponse>;

/// Receiver end of the command channel (held by the mapping worker).
pub type CommandReceiver = mpsc::Receiver<CommandWithResponse>;

/// Create a new command channel pair.
pub fn create_command_channel() -> (CommandSender, CommandReceiver) {
    mpsc::channel()
}

/// Send a command and wait for the response.
pub fn send_command_sync(
    sender: &CommandSender,
    command: MapCommand,
    timeout_ms: u64,
) -> CommandResult {
    use std::time::Duration;

    let (response_tx, response_rx) = mpsc::channel();

    sender
        .send(CommandWithResponse {
            command,
            response_tx,
        })
        .map_err(|_| "Mapping worker not responding (channel closed)".to_string())?;

    response_rx
        .recv_timeout(Duration::from_millis(timeout_ms))
        .map_err(|e| match e {
            mpsc::RecvTimeoutError::Timeout => "Map command timeout".to_string(),
            mpsc::RecvTimeoutError::Disconnected => "Mapping worker disconnected".to_string(),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_send_command_sync_round_trip() {
        let (tx, rx) = create_command_channel();

        let handler = thread::spawn(move || {
            while let Ok(cmd) = rx.recv_timeout(Duration::from_millis(200)) {
                let response = match cmd.command {
                    MapCommand::SaveMap { dir } => CommandResponse::MapSaved {
                        path: dir.join("map.ply").display().to_string(),
                    },
                    MapCommand::SaveSubmaps { dir } => CommandResponse::SubmapsSaved {
                        count: 0,
                        dir: dir.display().to_string(),
                    },
                };
                cmd.response_tx.send(Ok(response)).ok();
            }
        });

        let result = send_command_sync(
            &tx,
            MapCommand::SaveMap {
                dir: PathBuf::from("/tmp/maps"),
            },
            1000,
        );
        assert!(matches!(result, Ok(CommandResponse::MapSaved { .. })));

        drop(tx);
        handler.join().unwrap();
    }

    #[test]
    fn test_send_command_times_out_without_handler() {
        let (tx, rx) = create_command_channel();

        let result = send_command_sync(
            &tx,
            MapCommand::SaveSubmaps {
                dir: PathBuf::from("/tmp/maps"),
            },
            20,
        );
        assert!(result.is_err());
        drop(rx);
    }
}
