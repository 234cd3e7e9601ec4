use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use chrono::Utc;

use crate::pipeline::{FetchBatch, build_source, collect};
use crate::state::{Delta, ProviderCommand};

/// Runs fetches on a background thread, one command at a time.
pub fn spawn_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        for cmd in cmd_rx {
            match cmd {
                ProviderCommand::Refresh(settings) => {
                    if tx.send(Delta::FetchStarted).is_err() {
                        return;
                    }
                    let batch = match build_source(&settings) {
                        Ok(source) => collect(&settings, source.as_ref(), Utc::now()),
                        Err(err) => FetchBatch::source_failed(Utc::now(), format!("{err:#}")),
                    };
                    if tx.send(Delta::BatchLoaded(batch)).is_err() {
                        return;
                    }
                }
            }
        }
    });
}
