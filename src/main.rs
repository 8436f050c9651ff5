//! Binary entrypoint that launches the chat memory server.

use std::process::ExitCode;

use chat_memory::start_chat_memory;

/// Start the server with configuration taken from `CHAT_MEMORY_*` variables.
fn main() -> ExitCode {
    start_chat_memory::run()
}
