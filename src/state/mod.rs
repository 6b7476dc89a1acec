//! Cross-thread primitives: hand-off buffers, publication gating, shared
//! pipeline state, and the command channel.

mod buffer;
mod commands;
mod gate;
mod shared;

pub use buffer::PipelineBuffer;
pub use commands::{
    CommandReceiver, CommandResponse, CommandResult, CommandSender, CommandWithResponse,
    MapCommand, create_command_channel, send_command_sync,
};
pub use gate::PublicationGate;
pub use shared::{PipelineState, PipelineStateHandle};
