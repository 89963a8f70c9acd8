//! Operator controls read from the terminal
//!
//! Each line typed on stdin is one key (`q`, `l`, `t`, `d`, `+`, `-`, `s`).
//! A reader thread forwards them over a channel so the frame loop only ever
//! does a non-blocking poll.

use ledwatch_core::{ControlCommand, ControlInput};
use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use tracing::{debug, warn};

pub struct StdinControls {
    rx: Receiver<ControlCommand>,
}

impl StdinControls {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                for command in parse_line(&line) {
                    if tx.send(command).is_err() {
                        return;
                    }
                }
            }
            debug!("stdin closed, no more operator controls");
        });
        Self { rx }
    }
}

/// Every bound key on the line, in order.
pub fn parse_line(line: &str) -> Vec<ControlCommand> {
    line.chars()
        .filter(|c| !c.is_whitespace())
        .filter_map(|c| {
            let command = ControlCommand::from_key(c);
            if command.is_none() {
                warn!(key = %c, "unbound key");
            }
            command
        })
        .collect()
}

impl ControlInput for StdinControls {
    fn poll(&mut self) -> Option<ControlCommand> {
        match self.rx.try_recv() {
            Ok(command) => Some(command),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}
