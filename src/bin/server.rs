//! Chat memory server binary.
//! Run with: cargo run --bin chat-memory-server

use std::process::ExitCode;

use chat_memory::start_chat_memory;

fn main() -> ExitCode {
    start_chat_memory::run()
}
